//! Content-addressed speech artifact cache
//!
//! Derives stable keys for (voice, text) pairs, maps them to `.wav` files in a
//! single flat directory, and keeps the directory within a byte budget by
//! evicting the least recently used artifacts. The directory itself is the
//! only source of truth: nothing is indexed in memory.

mod error;
mod key;
mod store;
mod types;

pub use error::{CacheError, Result};
pub use key::{CacheKey, ARTIFACT_EXTENSION, KEY_DELIMITER};
pub use store::{is_artifact_file_name, ArtifactStore};
pub use types::{Artifact, CacheStats, EvictionReport};
