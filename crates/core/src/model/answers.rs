use std::collections::{HashMap, HashSet};

use crate::model::ids::QuestionId;
use crate::model::session::QuizSession;

/// Per-session interaction state: selections, flags and reveals.
///
/// Every session question gets a `None` selection up front, so an unanswered
/// question is distinguishable from an id that was never in the session.
/// Flags keep toggle order for the end-of-run review list. Reveals are
/// ephemeral and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    selections: HashMap<QuestionId, Option<usize>>,
    flagged: Vec<QuestionId>,
    revealed: HashSet<QuestionId>,
}

impl AnswerSheet {
    /// Fresh sheet for a session, with every question pre-seeded unanswered.
    #[must_use]
    pub fn for_session(session: &QuizSession) -> Self {
        let selections = session
            .questions()
            .iter()
            .map(|q| (q.id().clone(), None))
            .collect();
        Self {
            selections,
            flagged: Vec::new(),
            revealed: HashSet::new(),
        }
    }

    /// Rebuild a sheet from persisted selections and flags.
    ///
    /// Reveals restart cleared. Both maps are restricted to ids still in
    /// the session so vanished questions do not linger.
    #[must_use]
    pub fn from_persisted(
        session: &QuizSession,
        selections: &HashMap<QuestionId, Option<usize>>,
        flagged: &[QuestionId],
    ) -> Self {
        let mut sheet = Self::for_session(session);
        for (id, choice) in selections {
            if let Some(slot) = sheet.selections.get_mut(id) {
                *slot = *choice;
            }
        }
        for id in flagged {
            if sheet.selections.contains_key(id) && !sheet.flagged.contains(id) {
                sheet.flagged.push(id.clone());
            }
        }
        sheet
    }

    /// Record a choice for `id`. Ids outside the session are ignored.
    pub fn select(&mut self, id: &QuestionId, choice: usize) {
        if let Some(slot) = self.selections.get_mut(id) {
            *slot = Some(choice);
        }
    }

    /// The recorded choice for `id`, if any.
    #[must_use]
    pub fn selected(&self, id: &QuestionId) -> Option<usize> {
        self.selections.get(id).copied().flatten()
    }

    #[must_use]
    pub fn is_answered(&self, id: &QuestionId) -> bool {
        self.selected(id).is_some()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.values().filter(|v| v.is_some()).count()
    }

    /// Flip the flag on `id`; returns the new state.
    pub fn toggle_flag(&mut self, id: &QuestionId) -> bool {
        if let Some(pos) = self.flagged.iter().position(|f| f == id) {
            self.flagged.remove(pos);
            false
        } else {
            self.flagged.push(id.clone());
            true
        }
    }

    #[must_use]
    pub fn is_flagged(&self, id: &QuestionId) -> bool {
        self.flagged.iter().any(|f| f == id)
    }

    /// Flagged ids in toggle order.
    #[must_use]
    pub fn flagged(&self) -> &[QuestionId] {
        &self.flagged
    }

    /// Flip the reveal on `id`; returns the new state.
    pub fn toggle_reveal(&mut self, id: &QuestionId) -> bool {
        if self.revealed.remove(id) {
            false
        } else {
            self.revealed.insert(id.clone());
            true
        }
    }

    /// Force the reveal on (learn mode does this on answer).
    pub fn mark_revealed(&mut self, id: &QuestionId) {
        self.revealed.insert(id.clone());
    }

    #[must_use]
    pub fn is_revealed(&self, id: &QuestionId) -> bool {
        self.revealed.contains(id)
    }

    /// The full selection map, for scoring and persistence.
    #[must_use]
    pub fn selections(&self) -> &HashMap<QuestionId, Option<usize>> {
        &self.selections
    }
}
