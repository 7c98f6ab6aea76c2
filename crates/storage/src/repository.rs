use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quiz_core::model::{
    AnswerSheet, ParseDifficultyError, ParseModeError, QuestionId, QuizConfig, QuizSession,
    ScoreSummary, TagError, TagName,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// How many recent run scores the lifetime stats keep.
pub const MAX_RECENT_SCORES: usize = 6;

//
// ─── SESSION RECORD ────────────────────────────────────────────────────────────
//

/// Persisted shape of the quiz configuration.
///
/// Enums travel as their wire strings so the blob stays readable and the
/// domain types stay serde-light; `config()` re-validates on the way back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    pub count: usize,
    pub difficulties: Vec<String>,
    pub tags: Vec<String>,
    pub mode: String,
    #[serde(default)]
    pub seed: Option<String>,
}

/// Persisted shape for an in-progress session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub config: ConfigRecord,
    pub answers: HashMap<QuestionId, Option<usize>>,
    pub current_index: usize,
    pub seed: String,
    pub question_ids: Vec<QuestionId>,
    /// Epoch milliseconds, matching the blob's original wire shape.
    pub started_at: i64,
    pub mode: String,
    pub flagged: Vec<QuestionId>,
}

/// Errors raised when a persisted record no longer maps onto the domain.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    #[error(transparent)]
    Difficulty(#[from] ParseDifficultyError),

    #[error(transparent)]
    Mode(#[from] ParseModeError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error("timestamp out of range: {0}")]
    Timestamp(i64),
}

impl SessionRecord {
    /// Snapshot the live session state for persistence.
    #[must_use]
    pub fn capture(
        config: &QuizConfig,
        session: &QuizSession,
        sheet: &AnswerSheet,
        current_index: usize,
    ) -> Self {
        Self {
            config: ConfigRecord {
                count: config.count,
                difficulties: config
                    .difficulties
                    .iter()
                    .map(|d| d.as_str().to_string())
                    .collect(),
                tags: config.tags.iter().map(|t| t.as_str().to_string()).collect(),
                mode: config.mode.as_str().to_string(),
                seed: config.seed.clone(),
            },
            answers: sheet.selections().clone(),
            current_index,
            seed: session.seed().to_string(),
            question_ids: session.question_ids(),
            started_at: session.started_at().timestamp_millis(),
            mode: config.mode.as_str().to_string(),
            flagged: sheet.flagged().to_vec(),
        }
    }

    /// Re-validate the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if a stored difficulty, tag or mode string no
    /// longer parses.
    pub fn config(&self) -> Result<QuizConfig, RecordError> {
        let difficulties = self
            .config
            .difficulties
            .iter()
            .map(|d| d.parse())
            .collect::<Result<Vec<_>, _>>()?;
        let tags = self
            .config
            .tags
            .iter()
            .map(TagName::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QuizConfig {
            count: self.config.count,
            difficulties,
            tags,
            mode: self.config.mode.parse()?,
            seed: self.config.seed.clone(),
        })
    }

    /// The recorded start time.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Timestamp` if the stored millis do not form a
    /// valid timestamp.
    pub fn started_at_utc(&self) -> Result<DateTime<Utc>, RecordError> {
        DateTime::<Utc>::from_timestamp_millis(self.started_at)
            .ok_or(RecordError::Timestamp(self.started_at))
    }
}

//
// ─── STATS RECORD ──────────────────────────────────────────────────────────────
//

/// One finished run in the recent-score history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub accuracy: f64,
    pub total: usize,
    pub correct: usize,
    /// Epoch milliseconds.
    pub at: i64,
}

/// Persisted lifetime statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub total_runs: u64,
    pub total_answered: u64,
    pub total_correct: u64,
    pub last_scores: Vec<ScoreEntry>,
}

impl StatsRecord {
    /// Fold one finished run into the lifetime totals.
    ///
    /// The new score is prepended and the history is truncated to
    /// `MAX_RECENT_SCORES` entries, newest first.
    pub fn record_run(&mut self, summary: &ScoreSummary, at: DateTime<Utc>) {
        self.total_runs += 1;
        self.total_answered += summary.total() as u64;
        self.total_correct += summary.correct() as u64;
        self.last_scores.insert(
            0,
            ScoreEntry {
                accuracy: summary.accuracy(),
                total: summary.total(),
                correct: summary.correct(),
                at: at.timestamp_millis(),
            },
        );
        self.last_scores.truncate(MAX_RECENT_SCORES);
    }

    /// Lifetime accuracy percentage, rounded to one decimal.
    #[must_use]
    pub fn lifetime_accuracy(&self) -> f64 {
        quiz_core::model::percent_one_decimal(
            self.total_correct as usize,
            self.total_answered as usize,
        )
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for the in-progress session blob.
///
/// Loads degrade to `None` when nothing usable is stored; saves may fail and
/// callers decide whether to surface or swallow that.
pub trait SessionStateRepository: Send + Sync {
    /// Fetch the stored session, if one is present and readable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for faults beyond "absent or unreadable".
    fn load_session(&self) -> Result<Option<SessionRecord>, StorageError>;

    /// Persist or replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Remove the stored session. Removing an absent record is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the removal itself fails.
    fn clear_session(&self) -> Result<(), StorageError>;
}

/// Repository contract for the lifetime stats blob.
pub trait StatsRepository: Send + Sync {
    /// Fetch the stored stats, defaulting to zeroes when absent or unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for faults beyond "absent or unreadable".
    fn load_stats(&self) -> Result<StatsRecord, StorageError>;

    /// Persist or replace the stored stats.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    fn save_stats(&self, record: &StatsRecord) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    session: Arc<Mutex<Option<SessionRecord>>>,
    stats: Arc<Mutex<StatsRecord>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStateRepository for InMemoryRepository {
    fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        let guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        *guard = Some(record.clone());
        Ok(())
    }

    fn clear_session(&self) -> Result<(), StorageError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

impl StatsRepository for InMemoryRepository {
    fn load_stats(&self) -> Result<StatsRecord, StorageError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save_stats(&self, record: &StatsRecord) -> Result<(), StorageError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        *guard = record.clone();
        Ok(())
    }
}

/// Aggregates the two state repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionStateRepository>,
    pub stats: Arc<dyn StatsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionStateRepository> = Arc::new(repo.clone());
        let stats: Arc<dyn StatsRepository> = Arc::new(repo);
        Self { sessions, stats }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, QuestionDraft, QuizMode};
    use quiz_core::time::fixed_now;
    use std::collections::HashMap;

    fn sample_session() -> (QuizConfig, QuizSession, AnswerSheet) {
        let questions: Vec<_> = ["q1", "q2"]
            .iter()
            .map(|id| {
                QuestionDraft {
                    id: QuestionId::new(*id),
                    section: "Basics".to_string(),
                    tags: vec![TagName::new("accounts").unwrap()],
                    difficulty: Difficulty::Foundation,
                    prompt: format!("Prompt {id}"),
                    choices: vec!["A".to_string(), "B".to_string()],
                    answer_index: 0,
                    explanation: "Because.".to_string(),
                    deep_dive: None,
                }
                .validate()
                .unwrap()
            })
            .collect();
        let session = QuizSession::new("seed-1".to_string(), questions, fixed_now());
        let mut sheet = AnswerSheet::for_session(&session);
        sheet.select(&QuestionId::new("q1"), 1);
        sheet.toggle_flag(&QuestionId::new("q2"));
        (QuizConfig::default(), session, sheet)
    }

    #[test]
    fn session_record_round_trips_config() {
        let (config, session, sheet) = sample_session();
        let record = SessionRecord::capture(&config, &session, &sheet, 1);

        assert_eq!(record.seed, "seed-1");
        assert_eq!(record.current_index, 1);
        assert_eq!(record.flagged, vec![QuestionId::new("q2")]);
        assert_eq!(record.started_at, fixed_now().timestamp_millis());

        let restored = record.config().unwrap();
        assert_eq!(restored.count, config.count);
        assert_eq!(restored.difficulties, config.difficulties);
        assert_eq!(restored.mode, QuizMode::Learn);
    }

    #[test]
    fn corrupt_difficulty_string_fails_config_mapping() {
        let (config, session, sheet) = sample_session();
        let mut record = SessionRecord::capture(&config, &session, &sheet, 0);
        record.config.difficulties = vec!["legendary".to_string()];
        assert!(matches!(
            record.config().unwrap_err(),
            RecordError::Difficulty(_)
        ));
    }

    #[test]
    fn stats_record_keeps_a_bounded_history_newest_first() {
        let summary = ScoreSummary::from_answers(&[], &HashMap::new());

        let mut stats = StatsRecord::default();
        for run in 0..10_i64 {
            let at = fixed_now() + chrono::Duration::minutes(run);
            stats.record_run(&summary, at);
        }

        assert_eq!(stats.total_runs, 10);
        assert_eq!(stats.last_scores.len(), MAX_RECENT_SCORES);
        assert_eq!(
            stats.last_scores[0].at,
            (fixed_now() + chrono::Duration::minutes(9)).timestamp_millis()
        );
        assert!(stats.last_scores[0].at > stats.last_scores[1].at);
    }

    #[test]
    fn in_memory_repository_round_trips() {
        let (config, session, sheet) = sample_session();
        let record = SessionRecord::capture(&config, &session, &sheet, 0);

        let repo = InMemoryRepository::new();
        assert!(repo.load_session().unwrap().is_none());
        repo.save_session(&record).unwrap();
        assert_eq!(repo.load_session().unwrap(), Some(record));
        repo.clear_session().unwrap();
        assert!(repo.load_session().unwrap().is_none());

        assert_eq!(repo.load_stats().unwrap(), StatsRecord::default());
    }
}
