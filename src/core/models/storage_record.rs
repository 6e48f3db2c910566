use serde::{Deserialize, Serialize};

use crate::core::errors::{KeysealError, Result};

/// Canonical record sealed inside a storage envelope.
///
/// Serialized as `{"publicKey": ..., "privateKey": ...}`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecord {
    pub public_key: String,
    pub private_key: String,
}

impl StorageRecord {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| KeysealError::EncryptionFailed {
            reason: format!("Could not serialize storage record: {e}"),
        })
    }

    /// Parse a decrypted payload.
    ///
    /// The payload must have a structured (object or array) top level
    /// and carry both keys.
    pub fn from_json(payload: &str) -> Result<Self> {
        if !has_structured_payload(payload) {
            return Err(KeysealError::MalformedContainer {
                detail: "payload is not a JSON object or array".into(),
            });
        }
        serde_json::from_str(payload).map_err(|e| KeysealError::MalformedContainer {
            detail: e.to_string(),
        })
    }
}

impl std::fmt::Debug for StorageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageRecord")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// True if `text` parses as JSON whose top level is an object or an array.
pub fn has_structured_payload(text: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(text),
        Ok(serde_json::Value::Object(_) | serde_json::Value::Array(_))
    )
}
