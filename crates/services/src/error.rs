//! Shared error types for the services crate.

use thiserror::Error;

use storage::StorageError;

use crate::sessions::QuizPhase;

/// Errors emitted by the session runner and workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no question is active")]
    NoCurrentQuestion,

    #[error("choice {choice} is out of range for {choices} choices")]
    ChoiceOutOfRange { choice: usize, choices: usize },

    #[error("question index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot {operation} during the {phase} phase")]
    Phase {
        operation: &'static str,
        phase: QuizPhase,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
