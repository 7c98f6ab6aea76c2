use chrono::{DateTime, Utc};

use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// One ordered, sized, seeded draw of questions presented to the user.
///
/// The snapshot is immutable after construction; interaction state lives in
/// the `AnswerSheet` alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    seed: String,
    questions: Vec<Question>,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    #[must_use]
    pub fn new(seed: String, questions: Vec<Question>, started_at: DateTime<Utc>) -> Self {
        Self {
            seed,
            questions,
            started_at,
        }
    }

    /// The resolved seed; replaying it over the same bank reproduces the run.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
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
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Question ids in presentation order, for persistence and replay.
    #[must_use]
    pub fn question_ids(&self) -> Vec<QuestionId> {
        self.questions.iter().map(|q| q.id().clone()).collect()
    }
}
