#![forbid(unsafe_code)]

pub mod bank;
pub mod json;
pub mod repository;

pub use bank::{load_bank_from_path, load_bank_from_str, BankFileError};
pub use json::{JsonInitError, JsonStore};
pub use repository::{
    ConfigRecord, InMemoryRepository, RecordError, ScoreEntry, SessionRecord,
    SessionStateRepository, StatsRecord, StatsRepository, Storage, StorageError,
    MAX_RECENT_SCORES,
};
