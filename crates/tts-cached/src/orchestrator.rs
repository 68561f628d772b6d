//! Request orchestration: normalize, look up, synthesize on miss, play

use crate::error::{Result, TtsError};
use crate::playback::{self, Player};
use crate::synth::{synthesize, SpeechEngine};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tts_cache::{ArtifactStore, CacheKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    CacheHit,
    CacheMiss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::CacheHit => "cache_hit",
            CacheStatus::CacheMiss => "cache_miss",
        }
    }
}

/// Result of a successful request
#[derive(Debug, Clone)]
pub struct TtsOutcome {
    pub status: CacheStatus,
    pub key: CacheKey,
    /// Artifact identifier, `<key>.wav`
    pub file: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RequestStats {
    pub hits: u64,
    pub misses: u64,
}

/// Collapse whitespace runs to single spaces and trim the ends
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct TtsService {
    voice_id: String,
    store: ArtifactStore,
    engine: Arc<dyn SpeechEngine>,
    player: Arc<dyn Player>,
    synth_timeout: Duration,
    play_timeout: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TtsService {
    pub fn new(
        voice_id: String,
        store: ArtifactStore,
        engine: Arc<dyn SpeechEngine>,
        player: Arc<dyn Player>,
        synth_timeout: Duration,
        play_timeout: Duration,
    ) -> Self {
        Self {
            voice_id,
            store,
            engine,
            player,
            synth_timeout,
            play_timeout,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn request_stats(&self) -> RequestStats {
        RequestStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Speak `text`, reusing a cached artifact when one exists.
    ///
    /// Playback is started in the background and never awaited. Concurrent
    /// misses for the same text may both synthesize; each publishes its
    /// artifact with an atomic rename so the result is always complete.
    pub async fn speak(&self, text: &str) -> Result<TtsOutcome> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(TtsError::EmptyInput);
        }

        let key = CacheKey::derive(&self.voice_id, &normalized);
        let path = self.store.path_for(&key);
        let file = key.file_name();

        if self.store.lookup(&path).await?.is_some() {
            self.store.touch(&path).await;
            self.hits.fetch_add(1, Ordering::Relaxed);
            playback::dispatch(self.player.clone(), path, self.play_timeout);

            info!(key = %key, file = %file, "cache_hit");
            return Ok(TtsOutcome {
                status: CacheStatus::CacheHit,
                key,
                file,
            });
        }

        synthesize(self.engine.as_ref(), &normalized, &path, self.synth_timeout).await?;
        self.misses.fetch_add(1, Ordering::Relaxed);

        self.trim_cache().await;

        playback::dispatch(self.player.clone(), path, self.play_timeout);

        info!(key = %key, file = %file, "cache_miss");
        Ok(TtsOutcome {
            status: CacheStatus::CacheMiss,
            key,
            file,
        })
    }

    /// Run the eviction pass after a miss. Failures are logged, never returned.
    async fn trim_cache(&self) {
        match self.store.enforce_budget().await {
            Ok(report) if !report.evicted.is_empty() || report.failed > 0 => info!(
                evicted = report.evicted.len(),
                failed = report.failed,
                total_after = report.total_after,
                "Cache budget enforced"
            ),
            Ok(_) => {}
            Err(e) => error!(error = %e, "Failed to enforce cache limit"),
        }
    }
}
