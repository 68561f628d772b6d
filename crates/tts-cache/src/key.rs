//! Cache key derivation

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// File extension shared by every cached artifact
pub const ARTIFACT_EXTENSION: &str = "wav";

/// Separates the voice identifier from the text in the digest input.
/// Voice identifiers must not contain it.
pub const KEY_DELIMITER: &str = "::";

/// Hex-encoded SHA-256 content address of a (voice, normalized text) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `voice_id` and already-normalized `text`.
    ///
    /// No normalization happens here; callers collapse whitespace first so
    /// that equivalent requests land on the same artifact.
    pub fn derive(voice_id: &str, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(voice_id.as_bytes());
        hasher.update(KEY_DELIMITER.as_bytes());
        hasher.update(text.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Artifact file name, e.g. `<hex>.wav`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, ARTIFACT_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
