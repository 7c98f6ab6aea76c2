use crate::json::{decode, encode, JsonStore, STATS_SCHEMA_VERSION};
use crate::repository::{StatsRecord, StatsRepository, StorageError};

impl StatsRepository for JsonStore {
    fn load_stats(&self) -> Result<StatsRecord, StorageError> {
        let Some(raw) = JsonStore::read_blob(&self.stats_path()) else {
            return Ok(StatsRecord::default());
        };
        Ok(decode(&raw, STATS_SCHEMA_VERSION, "stats").unwrap_or_default())
    }

    fn save_stats(&self, record: &StatsRecord) -> Result<(), StorageError> {
        let blob = encode(record, STATS_SCHEMA_VERSION)?;
        JsonStore::write_blob(&self.stats_path(), &blob)
    }
}
