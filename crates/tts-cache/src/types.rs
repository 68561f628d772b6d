//! Cache types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A cached artifact as observed during a directory scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Statistics about the cache directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub artifacts: usize,
    pub total_size: u64,
    pub max_size: u64,
}

/// Outcome of one budget enforcement pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvictionReport {
    /// Artifacts seen by the scan
    pub scanned: usize,
    pub total_before: u64,
    pub total_after: u64,
    pub evicted: Vec<PathBuf>,
    /// Deletions that failed and were skipped
    pub failed: usize,
}

impl EvictionReport {
    pub fn within_budget(&self, max_size: u64) -> bool {
        self.total_after <= max_size
    }
}
