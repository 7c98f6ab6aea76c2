use thiserror::Error;

use crate::model::{BankError, QuestionError, TagError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Bank(#[from] BankError),
}
