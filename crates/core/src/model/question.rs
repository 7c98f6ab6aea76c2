use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::tag::TagName;

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty bucket for a question.
///
/// The three buckets are fixed; score breakdowns always report all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    Foundation,
    Advanced,
    Expert,
}

impl Difficulty {
    /// All buckets in canonical order.
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Foundation,
        Difficulty::Advanced,
        Difficulty::Expert,
    ];

    /// Wire/storage name of the bucket.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Foundation => "foundation",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
        }
    }

    /// Human-facing label of the bucket.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Foundation => "Foundation",
            Difficulty::Advanced => "Advanced",
            Difficulty::Expert => "Expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty: {0}")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "foundation" => Ok(Difficulty::Foundation),
            "advanced" => Ok(Difficulty::Advanced),
            "expert" => Ok(Difficulty::Expert),
            other => Err(ParseDifficultyError(other.to_string())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Raw question fields before validation, as read from a bank file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub section: String,
    pub tags: Vec<TagName>,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
    pub explanation: String,
    pub deep_dive: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id, section, prompt or explanation is
    /// blank, fewer than two choices are given, any choice is blank, or the
    /// answer index does not address a choice.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.id.as_str().trim().is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if self.section.trim().is_empty() {
            return Err(QuestionError::EmptySection { id: self.id });
        }
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id: self.id });
        }
        if self.choices.len() < 2 {
            return Err(QuestionError::TooFewChoices {
                id: self.id,
                len: self.choices.len(),
            });
        }
        if let Some(index) = self.choices.iter().position(|c| c.trim().is_empty()) {
            return Err(QuestionError::EmptyChoice { id: self.id, index });
        }
        if self.answer_index >= self.choices.len() {
            return Err(QuestionError::AnswerIndexOutOfRange {
                id: self.id,
                index: self.answer_index,
                choices: self.choices.len(),
            });
        }
        if self.explanation.trim().is_empty() {
            return Err(QuestionError::EmptyExplanation { id: self.id });
        }

        Ok(Question {
            id: self.id,
            section: self.section,
            tags: self.tags,
            difficulty: self.difficulty,
            prompt: self.prompt,
            choices: self.choices,
            answer_index: self.answer_index,
            explanation: self.explanation,
            deep_dive: self.deep_dive,
        })
    }
}

/// A single validated multiple-choice question.
///
/// Immutable once built; sessions hold cloned snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    section: String,
    tags: Vec<TagName>,
    difficulty: Difficulty,
    prompt: String,
    choices: Vec<String>,
    answer_index: usize,
    explanation: String,
    deep_dive: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    #[must_use]
    pub fn tags(&self) -> &[TagName] {
        &self.tags
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn deep_dive(&self) -> Option<&str> {
        self.deep_dive.as_deref()
    }

    /// True when `choice` addresses the correct answer.
    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer_index
    }

    /// True when this question's difficulty is in `allowed`.
    #[must_use]
    pub fn matches_difficulty(&self, allowed: &[Difficulty]) -> bool {
        allowed.contains(&self.difficulty)
    }

    /// True when this question carries at least one of `wanted`.
    ///
    /// An empty `wanted` list matches everything.
    #[must_use]
    pub fn matches_any_tag(&self, wanted: &[TagName]) -> bool {
        wanted.is_empty() || wanted.iter().any(|tag| self.tags.contains(tag))
    }
}

//
// ─── VALIDATION ERRORS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id} has an empty section")]
    EmptySection { id: QuestionId },

    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} needs at least two choices, got {len}")]
    TooFewChoices { id: QuestionId, len: usize },

    #[error("question {id} has an empty choice at index {index}")]
    EmptyChoice { id: QuestionId, index: usize },

    #[error("question {id} answer index {index} is out of range for {choices} choices")]
    AnswerIndexOutOfRange {
        id: QuestionId,
        index: usize,
        choices: usize,
    },

    #[error("question {id} has an empty explanation")]
    EmptyExplanation { id: QuestionId },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(id),
            section: "Basics".to_string(),
            tags: vec![TagName::new("accounts").unwrap()],
            difficulty: Difficulty::Foundation,
            prompt: "What is an account?".to_string(),
            choices: vec!["A ledger entry".to_string(), "A wallet app".to_string()],
            answer_index: 0,
            explanation: "Accounts hold state.".to_string(),
            deep_dive: None,
        }
    }

    #[test]
    fn valid_draft_builds_question() {
        let question = draft("q1").validate().unwrap();
        assert_eq!(question.id().as_str(), "q1");
        assert!(question.is_correct(0));
        assert!(!question.is_correct(1));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let mut d = draft("q1");
        d.prompt = "   ".to_string();
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::EmptyPrompt { .. }
        ));
    }

    #[test]
    fn answer_index_must_address_a_choice() {
        let mut d = draft("q1");
        d.answer_index = 2;
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::AnswerIndexOutOfRange { index: 2, choices: 2, .. }
        ));
    }

    #[test]
    fn single_choice_is_rejected() {
        let mut d = draft("q1");
        d.choices = vec!["only".to_string()];
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::TooFewChoices { len: 1, .. }
        ));
    }

    #[test]
    fn difficulty_round_trips_through_str() {
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.as_str().parse::<Difficulty>().unwrap(), difficulty);
        }
        assert!("legendary".parse::<Difficulty>().is_err());
    }

    #[test]
    fn empty_tag_filter_matches_everything() {
        let question = draft("q1").validate().unwrap();
        assert!(question.matches_any_tag(&[]));
        assert!(question.matches_any_tag(&[TagName::new("accounts").unwrap()]));
        assert!(!question.matches_any_tag(&[TagName::new("fees").unwrap()]));
    }
}
