use std::sync::Arc;

use quiz_core::model::ScoreSummary;
use quiz_core::Clock;
use storage::{StatsRecord, StatsRepository};

/// Folds finished runs into the persisted lifetime statistics.
///
/// Stats are advisory, so every storage fault degrades to zeroes on read
/// and to a dropped write on save, logged but never surfaced.
#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    repo: Arc<dyn StatsRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn StatsRepository>) -> Self {
        Self { clock, repo }
    }

    /// Current lifetime stats, zeroed when nothing usable is stored.
    #[must_use]
    pub fn load(&self) -> StatsRecord {
        match self.repo.load_stats() {
            Ok(stats) => stats,
            Err(err) => {
                log::warn!("treating unreadable lifetime stats as empty: {err}");
                StatsRecord::default()
            }
        }
    }

    /// Fold one finished run into the stats and persist the result.
    ///
    /// Returns the updated record either way; a failed write keeps the
    /// in-memory result for this process.
    pub fn record_run(&self, summary: &ScoreSummary) -> StatsRecord {
        let mut stats = self.load();
        stats.record_run(summary, self.clock.now());
        if let Err(err) = self.repo.save_stats(&stats) {
            log::warn!("failed to persist lifetime stats: {err}");
        }
        stats
    }
}
