use std::fmt;

use quiz_core::model::{
    AnswerSheet, Question, QuizConfig, QuizMode, QuizSession, ScoreSummary,
};

use super::progress::SessionProgress;
use crate::error::SessionError;

/// In-memory stepping through one session.
///
/// Holds the immutable snapshot plus the mutable answer sheet and cursor.
/// Navigation is free-form (the user can revisit questions); scoring is
/// side-effect free and can run at any point.
pub struct SessionRunner {
    config: QuizConfig,
    session: QuizSession,
    sheet: AnswerSheet,
    current: usize,
}

impl SessionRunner {
    /// Start a fresh runner with every question unanswered.
    #[must_use]
    pub fn new(config: QuizConfig, session: QuizSession) -> Self {
        let sheet = AnswerSheet::for_session(&session);
        Self {
            config,
            session,
            sheet,
            current: 0,
        }
    }

    /// Rebuild a runner from persisted state.
    ///
    /// The stored cursor is clamped into range in case the session shrank
    /// since it was written.
    #[must_use]
    pub fn resume(
        config: QuizConfig,
        session: QuizSession,
        sheet: AnswerSheet,
        current: usize,
    ) -> Self {
        let current = if session.is_empty() {
            0
        } else {
            current.min(session.len() - 1)
        };
        Self {
            config,
            session,
            sheet,
            current,
        }
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.config.mode
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.question(self.current)
    }

    /// Record a choice for the current question.
    ///
    /// Learn mode reveals the explanation immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentQuestion` on an empty session, or
    /// `SessionError::ChoiceOutOfRange` if `choice` does not address a
    /// choice of the current question.
    pub fn select_answer(&mut self, choice: usize) -> Result<(), SessionError> {
        let Some(question) = self.current_question() else {
            return Err(SessionError::NoCurrentQuestion);
        };
        if choice >= question.choices().len() {
            return Err(SessionError::ChoiceOutOfRange {
                choice,
                choices: question.choices().len(),
            });
        }
        let id = question.id().clone();
        self.sheet.select(&id, choice);
        if self.config.mode == QuizMode::Learn {
            self.sheet.mark_revealed(&id);
        }
        Ok(())
    }

    /// Flip the flag on the current question; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentQuestion` on an empty session.
    pub fn toggle_flag(&mut self) -> Result<bool, SessionError> {
        let Some(question) = self.current_question() else {
            return Err(SessionError::NoCurrentQuestion);
        };
        let id = question.id().clone();
        Ok(self.sheet.toggle_flag(&id))
    }

    /// Flip the reveal on the current question; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentQuestion` on an empty session.
    pub fn toggle_reveal(&mut self) -> Result<bool, SessionError> {
        let Some(question) = self.current_question() else {
            return Err(SessionError::NoCurrentQuestion);
        };
        let id = question.id().clone();
        Ok(self.sheet.toggle_reveal(&id))
    }

    /// Whether the current question's explanation should be shown.
    ///
    /// Learn mode shows it once the question is answered; exam mode only on
    /// an explicit reveal.
    #[must_use]
    pub fn explanation_visible(&self) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        match self.config.mode {
            QuizMode::Learn => {
                self.sheet.is_answered(question.id()) || self.sheet.is_revealed(question.id())
            }
            QuizMode::Exam => self.sheet.is_revealed(question.id()),
        }
    }

    /// Advance to the next question; returns false at the end.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.session.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Step back to the previous question; returns false at the start.
    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jump directly to a question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IndexOutOfRange` if `index` is not a session
    /// position.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.session.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.session.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.session.len();
        let answered = self.sheet.answered_count();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            all_answered: answered == total,
        }
    }

    /// Score the session as it stands.
    #[must_use]
    pub fn score(&self) -> ScoreSummary {
        ScoreSummary::from_answers(self.session.questions(), self.sheet.selections())
    }

    /// Questions currently answered wrong or not at all, in session order.
    #[must_use]
    pub fn mistakes(&self) -> Vec<Question> {
        self.session
            .questions()
            .iter()
            .filter(|q| self.sheet.selected(q.id()) != Some(q.answer_index()))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRunner")
            .field("seed", &self.session.seed())
            .field("questions", &self.session.len())
            .field("current", &self.current)
            .field("answered", &self.sheet.answered_count())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, QuestionDraft, QuestionId, TagName};
    use quiz_core::time::fixed_now;

    fn question(id: &str, answer: usize) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            section: "Basics".to_string(),
            tags: vec![TagName::new("accounts").unwrap()],
            difficulty: Difficulty::Foundation,
            prompt: format!("Prompt {id}"),
            choices: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            answer_index: answer,
            explanation: "Because.".to_string(),
            deep_dive: None,
        }
        .validate()
        .unwrap()
    }

    fn runner(mode: QuizMode, answers: &[usize]) -> SessionRunner {
        let questions: Vec<Question> = answers
            .iter()
            .enumerate()
            .map(|(i, answer)| question(&format!("q{i}"), *answer))
            .collect();
        let session = QuizSession::new("seed".to_string(), questions, fixed_now());
        let mut config = QuizConfig::default();
        config.mode = mode;
        SessionRunner::new(config, session)
    }

    #[test]
    fn learn_mode_reveals_on_answer() {
        let mut r = runner(QuizMode::Learn, &[0, 1]);
        assert!(!r.explanation_visible());

        r.select_answer(0).unwrap();
        assert!(r.explanation_visible());
    }

    #[test]
    fn exam_mode_keeps_explanations_hidden_until_toggled() {
        let mut r = runner(QuizMode::Exam, &[0, 1]);
        r.select_answer(0).unwrap();
        assert!(!r.explanation_visible());

        assert!(r.toggle_reveal().unwrap());
        assert!(r.explanation_visible());
        assert!(!r.toggle_reveal().unwrap());
        assert!(!r.explanation_visible());
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut r = runner(QuizMode::Learn, &[0, 1]);
        assert!(!r.previous());
        assert!(r.next());
        assert!(!r.next());
        assert_eq!(r.current_index(), 1);

        assert!(r.previous());
        assert_eq!(r.current_index(), 0);

        assert!(r.jump_to(2).is_err());
        r.jump_to(1).unwrap();
        assert_eq!(r.current_index(), 1);
    }

    #[test]
    fn out_of_range_choice_is_rejected() {
        let mut r = runner(QuizMode::Learn, &[0]);
        assert!(matches!(
            r.select_answer(3).unwrap_err(),
            SessionError::ChoiceOutOfRange { choice: 3, choices: 3 }
        ));
    }

    #[test]
    fn empty_session_has_no_current_question() {
        let session = QuizSession::new("seed".to_string(), Vec::new(), fixed_now());
        let mut r = SessionRunner::new(QuizConfig::default(), session);
        assert!(r.current_question().is_none());
        assert!(matches!(
            r.select_answer(0).unwrap_err(),
            SessionError::NoCurrentQuestion
        ));
        assert!(!r.explanation_visible());
    }

    #[test]
    fn progress_tracks_answered_counts() {
        let mut r = runner(QuizMode::Learn, &[0, 1, 2]);
        r.select_answer(0).unwrap();
        r.next();
        r.select_answer(2).unwrap();

        let progress = r.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.remaining, 1);
        assert!(!progress.all_answered);
    }

    #[test]
    fn mistakes_include_wrong_and_unanswered_questions() {
        let mut r = runner(QuizMode::Learn, &[0, 1, 2]);
        r.select_answer(0).unwrap(); // correct
        r.next();
        r.select_answer(0).unwrap(); // wrong, answer is 1
        // third question left unanswered

        let mistakes: Vec<String> = r.mistakes().iter().map(|q| q.id().to_string()).collect();
        assert_eq!(mistakes, vec!["q1", "q2"]);
    }

    #[test]
    fn resume_clamps_a_stale_cursor() {
        let questions = vec![question("q0", 0)];
        let session = QuizSession::new("seed".to_string(), questions, fixed_now());
        let sheet = AnswerSheet::for_session(&session);
        let r = SessionRunner::resume(QuizConfig::default(), session, sheet, 7);
        assert_eq!(r.current_index(), 0);
    }
}
