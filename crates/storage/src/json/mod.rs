use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::repository::{SessionStateRepository, StatsRepository, Storage, StorageError};

mod envelope;
mod session_repo;
mod stats_repo;

pub(crate) use envelope::{decode, encode, SESSION_SCHEMA_VERSION, STATS_SCHEMA_VERSION};

const SESSION_FILE: &str = "session.json";
const STATS_FILE: &str = "stats.json";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JsonInitError {
    #[error("cannot create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// File-backed store keeping the two state blobs in a data directory.
///
/// Reads follow the silent-degradation contract: a missing, unreadable or
/// unparseable file loads as absent. Writes report their errors and leave
/// the fire-and-forget decision to the caller.
#[derive(Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `JsonInitError` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, JsonInitError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| JsonInitError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub(crate) fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub(crate) fn stats_path(&self) -> PathBuf {
        self.dir.join(STATS_FILE)
    }

    /// Read a blob file, degrading any failure to "absent".
    pub(crate) fn read_blob(path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Some(raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("treating unreadable {} as absent: {err}", path.display());
                None
            }
        }
    }

    pub(crate) fn write_blob(path: &Path, contents: &str) -> Result<(), StorageError> {
        std::fs::write(path, contents).map_err(|e| StorageError::Io(e.to_string()))
    }

    pub(crate) fn remove_blob(path: &Path) -> Result<(), StorageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err.to_string())),
        }
    }
}

impl Storage {
    /// Build a `Storage` backed by JSON files under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `JsonInitError` if the data directory cannot be created.
    pub fn json(dir: impl Into<PathBuf>) -> Result<Self, JsonInitError> {
        let store = JsonStore::open(dir)?;
        let sessions: Arc<dyn SessionStateRepository> = Arc::new(store.clone());
        let stats: Arc<dyn StatsRepository> = Arc::new(store);
        Ok(Self { sessions, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JsonStore>();
    }
}
