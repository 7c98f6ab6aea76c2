use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use quiz_core::model::{
    BankError, ParseDifficultyError, QuestionBank, QuestionDraft, QuestionError, QuestionId,
    TagError, TagName,
};

/// Errors raised while loading a question-bank file.
///
/// Unlike the two state blobs, the bank is program input: a malformed bank
/// is a real error, never silently degraded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankFileError {
    #[error("cannot read bank file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("bank file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Difficulty(#[from] ParseDifficultyError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error(transparent)]
    Bank(#[from] BankError),
}

/// On-disk shape of one bank question, mirroring the original data file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankQuestionRecord {
    id: String,
    section: String,
    #[serde(default)]
    tags: Vec<String>,
    difficulty: String,
    prompt: String,
    choices: Vec<String>,
    answer_index: usize,
    explanation: String,
    #[serde(default)]
    deep_dive: Option<String>,
}

impl BankQuestionRecord {
    fn into_draft(self) -> Result<QuestionDraft, BankFileError> {
        let tags = self
            .tags
            .into_iter()
            .map(TagName::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QuestionDraft {
            id: QuestionId::new(self.id),
            section: self.section,
            tags,
            difficulty: self.difficulty.parse()?,
            prompt: self.prompt,
            choices: self.choices,
            answer_index: self.answer_index,
            explanation: self.explanation,
            deep_dive: self.deep_dive,
        })
    }
}

/// Parse a JSON array of questions into a validated bank.
///
/// # Errors
///
/// Returns `BankFileError` for malformed JSON, unknown difficulty or tag
/// strings, invalid questions, or duplicate ids.
pub fn load_bank_from_str(raw: &str) -> Result<QuestionBank, BankFileError> {
    let records: Vec<BankQuestionRecord> = serde_json::from_str(raw)?;
    let questions = records
        .into_iter()
        .map(|record| Ok(record.into_draft()?.validate()?))
        .collect::<Result<Vec<_>, BankFileError>>()?;
    Ok(QuestionBank::new(questions)?)
}

/// Read and parse a question-bank file.
///
/// # Errors
///
/// Returns `BankFileError::Read` if the file cannot be read, otherwise the
/// same errors as [`load_bank_from_str`].
pub fn load_bank_from_path(path: &Path) -> Result<QuestionBank, BankFileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| BankFileError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_bank_from_str(&raw)
}
