use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::question::Difficulty;
use crate::model::tag::TagName;

/// Session lengths offered by the setup screen.
pub const QUIZ_LENGTH_PRESETS: [usize; 6] = [10, 20, 30, 40, 60, 80];

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// Feedback intensity for a run.
///
/// Learn reveals the explanation as soon as a question is answered; exam
/// holds explanations until the user asks or the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizMode {
    #[default]
    Learn,
    Exam,
}

impl QuizMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Learn => "learn",
            QuizMode::Exam => "exam",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz mode: {0}")]
pub struct ParseModeError(String);

impl FromStr for QuizMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learn" => Ok(QuizMode::Learn),
            "exam" => Ok(QuizMode::Exam),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// User-chosen knobs for one run.
///
/// Fields are public and freely mutable before a session is built; the
/// session snapshots whatever is current at start time. The tag list narrows
/// the pool-size preview only, not the draw itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    /// Requested number of questions; the draw is capped by the pool size.
    pub count: usize,
    /// Difficulty buckets admitted into the pool. Empty means an empty pool.
    pub difficulties: Vec<Difficulty>,
    /// Topic focus; empty means no tag filter.
    pub tags: Vec<TagName>,
    pub mode: QuizMode,
    /// Optional reproducibility seed; blank or `None` draws a fresh one.
    pub seed: Option<String>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            count: 30,
            difficulties: vec![Difficulty::Foundation, Difficulty::Advanced],
            tags: Vec::new(),
            mode: QuizMode::default(),
            seed: None,
        }
    }
}

impl QuizConfig {
    /// True when `difficulty` is admitted by this config.
    #[must_use]
    pub fn allows_difficulty(&self, difficulty: Difficulty) -> bool {
        self.difficulties.contains(&difficulty)
    }

    /// The seed with blanks normalized away.
    #[must_use]
    pub fn trimmed_seed(&self) -> Option<&str> {
        self.seed
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
