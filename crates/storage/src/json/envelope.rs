use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

pub(crate) const SESSION_SCHEMA_VERSION: u32 = 1;
pub(crate) const STATS_SCHEMA_VERSION: u32 = 1;

/// Versioned wrapper around a persisted record.
///
/// The version gate is what lets shape drift degrade to "absent" instead of
/// silently deserializing garbage into a half-matching struct.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Decode a versioned blob, degrading every failure to `None`.
pub(crate) fn decode<T: DeserializeOwned>(raw: &str, expected_version: u32, what: &str) -> Option<T> {
    let envelope: Envelope<T> = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(err) => {
            log::warn!("treating malformed {what} blob as absent: {err}");
            return None;
        }
    };
    if envelope.version != expected_version {
        log::warn!(
            "treating {what} blob with unknown version {} as absent (expected {expected_version})",
            envelope.version
        );
        return None;
    }
    Some(envelope.data)
}

/// Encode a record into its versioned blob.
pub(crate) fn encode<T: Serialize>(data: &T, version: u32) -> Result<String, StorageError> {
    serde_json::to_string(&Envelope { version, data })
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_unknown_version() {
        let raw = encode(&42_u32, 3).unwrap();
        assert_eq!(decode::<u32>(&raw, 3, "test"), Some(42));
        assert_eq!(decode::<u32>(&raw, 1, "test"), None);
    }

    #[test]
    fn decode_degrades_malformed_json_to_absent() {
        assert_eq!(decode::<u32>("{not json", 1, "test"), None);
        assert_eq!(decode::<u32>("{\"data\":1}", 1, "test"), None);
    }
}
