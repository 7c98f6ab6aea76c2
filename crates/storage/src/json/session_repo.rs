use crate::json::{decode, encode, JsonStore, SESSION_SCHEMA_VERSION};
use crate::repository::{SessionRecord, SessionStateRepository, StorageError};

impl SessionStateRepository for JsonStore {
    fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        let Some(raw) = JsonStore::read_blob(&self.session_path()) else {
            return Ok(None);
        };
        Ok(decode(&raw, SESSION_SCHEMA_VERSION, "session"))
    }

    fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let blob = encode(record, SESSION_SCHEMA_VERSION)?;
        JsonStore::write_blob(&self.session_path(), &blob)
    }

    fn clear_session(&self) -> Result<(), StorageError> {
        JsonStore::remove_blob(&self.session_path())
    }
}
