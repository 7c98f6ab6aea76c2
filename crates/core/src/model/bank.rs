use std::collections::HashMap;

use thiserror::Error;

use crate::model::config::QuizConfig;
use crate::model::ids::QuestionId;
use crate::model::question::{Difficulty, Question};
use crate::model::tag::TagName;

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),
}

/// The static, immutable set of questions loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
}

impl QuestionBank {
    /// Build a bank, indexing questions by id.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut by_id = HashMap::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            if by_id.insert(question.id().clone(), index).is_some() {
                return Err(BankError::DuplicateId(question.id().clone()));
            }
        }
        Ok(Self { questions, by_id })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.by_id.get(id).map(|&index| &self.questions[index])
    }

    /// Questions for the given ids in order, silently dropping unknown ids.
    ///
    /// Used to replay a persisted session against a bank that may have
    /// changed since the run started.
    #[must_use]
    pub fn select_by_ids(&self, ids: &[QuestionId]) -> Vec<Question> {
        ids.iter()
            .filter_map(|id| self.question(id).cloned())
            .collect()
    }

    /// Setup-screen preview: how many questions match the config's
    /// difficulty *and* tag filters.
    ///
    /// Note the asymmetry with the session builder, which draws on the
    /// difficulty filter alone.
    #[must_use]
    pub fn pool_size(&self, config: &QuizConfig) -> usize {
        self.questions
            .iter()
            .filter(|q| q.matches_difficulty(&config.difficulties))
            .filter(|q| q.matches_any_tag(&config.tags))
            .count()
    }

    #[must_use]
    pub fn stats(&self) -> BankStats {
        BankStats::collect(&self.questions)
    }
}

//
// ─── BANK STATISTICS ───────────────────────────────────────────────────────────
//

/// Question counts per section, tag and difficulty, each sorted by
/// descending count (ties keep first-seen order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankStats {
    sections: Vec<(String, usize)>,
    tags: Vec<(TagName, usize)>,
    difficulties: Vec<(Difficulty, usize)>,
}

impl BankStats {
    /// Aggregate counts from a question list. Pure; empty input yields
    /// empty lists.
    #[must_use]
    pub fn collect(questions: &[Question]) -> Self {
        let mut sections: Vec<(String, usize)> = Vec::new();
        let mut tags: Vec<(TagName, usize)> = Vec::new();
        let mut difficulties: Vec<(Difficulty, usize)> = Vec::new();

        for question in questions {
            bump(&mut sections, question.section().to_string());
            bump(&mut difficulties, question.difficulty());
            for tag in question.tags() {
                bump(&mut tags, tag.clone());
            }
        }

        sections.sort_by(|a, b| b.1.cmp(&a.1));
        tags.sort_by(|a, b| b.1.cmp(&a.1));
        difficulties.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            sections,
            tags,
            difficulties,
        }
    }

    #[must_use]
    pub fn sections(&self) -> &[(String, usize)] {
        &self.sections
    }

    #[must_use]
    pub fn tags(&self) -> &[(TagName, usize)] {
        &self.tags
    }

    #[must_use]
    pub fn difficulties(&self) -> &[(Difficulty, usize)] {
        &self.difficulties
    }
}

fn bump<K: PartialEq>(counts: &mut Vec<(K, usize)>, key: K) {
    if let Some(entry) = counts.iter_mut().find(|(k, _)| *k == key) {
        entry.1 += 1;
    } else {
        counts.push((key, 1));
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionDraft;

    fn question(id: &str, section: &str, tags: &[&str], difficulty: Difficulty) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            section: section.to_string(),
            tags: tags.iter().map(|t| TagName::new(*t).unwrap()).collect(),
            difficulty,
            prompt: format!("Prompt {id}"),
            choices: vec!["A".to_string(), "B".to_string()],
            answer_index: 0,
            explanation: "Because.".to_string(),
            deep_dive: None,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = QuestionBank::new(vec![
            question("q1", "Basics", &[], Difficulty::Foundation),
            question("q1", "Basics", &[], Difficulty::Advanced),
        ])
        .unwrap_err();
        assert_eq!(err, BankError::DuplicateId(QuestionId::new("q1")));
    }

    #[test]
    fn select_by_ids_preserves_order_and_drops_unknown() {
        let bank = QuestionBank::new(vec![
            question("q1", "Basics", &[], Difficulty::Foundation),
            question("q2", "Basics", &[], Difficulty::Foundation),
        ])
        .unwrap();

        let picked = bank.select_by_ids(&[
            QuestionId::new("q2"),
            QuestionId::new("ghost"),
            QuestionId::new("q1"),
        ]);
        let ids: Vec<&str> = picked.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, vec!["q2", "q1"]);
    }

    #[test]
    fn pool_size_honors_difficulty_and_tags() {
        let bank = QuestionBank::new(vec![
            question("q1", "Basics", &["accounts"], Difficulty::Foundation),
            question("q2", "Basics", &["fees"], Difficulty::Foundation),
            question("q3", "Basics", &["accounts"], Difficulty::Expert),
        ])
        .unwrap();

        let mut config = QuizConfig::default();
        config.difficulties = vec![Difficulty::Foundation];
        assert_eq!(bank.pool_size(&config), 2);

        config.tags = vec![TagName::new("accounts").unwrap()];
        assert_eq!(bank.pool_size(&config), 1);
    }

    #[test]
    fn stats_sort_by_descending_count() {
        let stats = BankStats::collect(&[
            question("q1", "Runtime", &["fees"], Difficulty::Advanced),
            question("q2", "Runtime", &["fees", "compute"], Difficulty::Advanced),
            question("q3", "Basics", &["accounts"], Difficulty::Foundation),
        ]);

        assert_eq!(stats.sections()[0], ("Runtime".to_string(), 2));
        assert_eq!(stats.sections()[1], ("Basics".to_string(), 1));
        assert_eq!(stats.tags()[0], (TagName::new("fees").unwrap(), 2));
        assert_eq!(stats.difficulties()[0], (Difficulty::Advanced, 2));
    }

    #[test]
    fn empty_bank_yields_empty_stats() {
        let stats = BankStats::collect(&[]);
        assert!(stats.sections().is_empty());
        assert!(stats.tags().is_empty());
        assert!(stats.difficulties().is_empty());
    }
}
