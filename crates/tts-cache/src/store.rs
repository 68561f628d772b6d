//! File-based artifact store with size-bounded LRU retention

use crate::error::{CacheError, Result};
use crate::key::{CacheKey, ARTIFACT_EXTENSION};
use crate::types::{Artifact, CacheStats, EvictionReport};
use chrono::{DateTime, Utc};
use std::fs::{File, FileTimes};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Owns a flat directory of `<hex>.wav` artifacts.
///
/// Every operation goes to disk; the directory listing is the only record of
/// what is cached, so concurrent writers and external cleanup never leave the
/// store with a stale view.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    cache_dir: PathBuf,
    /// Maximum combined size of all artifacts in bytes
    max_size: u64,
}

impl ArtifactStore {
    pub fn new(cache_dir: PathBuf, max_size: u64) -> Self {
        Self {
            cache_dir,
            max_size,
        }
    }

    /// Ensure the cache directory exists
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;
        info!(cache_dir = ?self.cache_dir, max_size = self.max_size, "Cache initialized");
        Ok(())
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// Size of the artifact at `path`, or `None` if it does not exist.
    ///
    /// Any stat failure other than not-found is an error, not a miss.
    pub async fn lookup(&self, path: &Path) -> Result<Option<u64>> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Stat {
                path: path.to_path_buf(),
                source: Box::new(e),
            }),
        }
    }

    /// Mark an artifact as recently used. Best-effort: failures are logged.
    ///
    /// The file is opened read-only; setting timestamps only needs ownership,
    /// so read-only artifacts are refreshed too.
    pub async fn touch(&self, path: &Path) {
        let target = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            let now = SystemTime::now();
            let file = File::open(&target)?;
            file.set_times(FileTimes::new().set_accessed(now).set_modified(now))
        })
        .await;

        match result {
            Ok(Ok(())) => debug!(path = %path.display(), "Refreshed artifact timestamp"),
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "Failed to refresh artifact timestamp")
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Touch task failed"),
        }
    }

    /// Delete the oldest artifacts until the total size fits the budget.
    ///
    /// Candidates are ordered by modification time, then by path. A file that
    /// cannot be deleted is logged and skipped; only a failure to list the
    /// directory is returned as an error.
    pub async fn enforce_budget(&self) -> Result<EvictionReport> {
        let artifacts = self.scan().await?;
        Ok(self.evict_oldest(artifacts).await)
    }

    async fn evict_oldest(&self, mut artifacts: Vec<Artifact>) -> EvictionReport {
        let total: u64 = artifacts.iter().map(|a| a.size).sum();

        let mut report = EvictionReport {
            scanned: artifacts.len(),
            total_before: total,
            total_after: total,
            ..Default::default()
        };

        if total <= self.max_size {
            debug!(total, max_size = self.max_size, "Cache within budget");
            return report;
        }

        artifacts.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.path.cmp(&b.path))
        });

        let mut remaining = total;
        for artifact in artifacts {
            if remaining <= self.max_size {
                break;
            }

            match fs::remove_file(&artifact.path).await {
                Ok(()) => {}
                // Removed by someone else; the space is free either way
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %artifact.path.display(), "Artifact already removed");
                }
                Err(e) => {
                    error!(
                        path = %artifact.path.display(),
                        error = %e,
                        "Failed to remove cached artifact"
                    );
                    report.failed += 1;
                    continue;
                }
            }

            remaining = remaining.saturating_sub(artifact.size);
            info!(
                path = %artifact.path.display(),
                size = artifact.size,
                "Evicted artifact to enforce cache limit"
            );
            report.evicted.push(artifact.path);
        }

        report.total_after = remaining;
        if !report.within_budget(self.max_size) {
            warn!(
                total = remaining,
                max_size = self.max_size,
                failed = report.failed,
                "Cache still over budget after eviction pass"
            );
        }

        report
    }

    /// Current cache statistics, computed from a fresh directory scan
    pub async fn stats(&self) -> Result<CacheStats> {
        let artifacts = self.scan().await?;
        Ok(CacheStats {
            artifacts: artifacts.len(),
            total_size: artifacts.iter().map(|a| a.size).sum(),
            max_size: self.max_size,
        })
    }

    /// List regular files matching the artifact naming convention
    async fn scan(&self) -> Result<Vec<Artifact>> {
        let scan_error = |e: std::io::Error| CacheError::Scan {
            dir: self.cache_dir.clone(),
            source: Box::new(e),
        };

        let mut entries = fs::read_dir(&self.cache_dir).await.map_err(scan_error)?;
        let mut artifacts = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(scan_error)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_artifact_file_name(name) {
                continue;
            }

            // Entries can vanish between listing and stat
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(file = name, error = %e, "Skipping unreadable cache entry");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }

            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            artifacts.push(Artifact {
                path: entry.path(),
                size: meta.len(),
                modified: DateTime::<Utc>::from(modified),
            });
        }

        Ok(artifacts)
    }
}

/// Whether `name` follows the artifact naming convention (`<key>.wav`).
///
/// In-progress synthesis output carries a trailing `.tmp` and never matches.
pub fn is_artifact_file_name(name: &str) -> bool {
    let path = Path::new(name);
    path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION)
        && path
            .file_stem()
            .map(|stem| !stem.is_empty())
            .unwrap_or(false)
}
