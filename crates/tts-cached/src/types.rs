//! Wire types for the TTS daemon

use crate::orchestrator::{CacheStatus, RequestStats, TtsOutcome};
use serde::{Deserialize, Serialize};
use tts_cache::CacheStats;

/// Body of `POST /tts`
#[derive(Debug, Clone, Deserialize)]
pub struct TtsRequest {
    /// A missing field is treated like empty text
    #[serde(default)]
    pub text: String,
}

/// Successful `POST /tts` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsResponse {
    pub status: CacheStatus,
    pub file: String,
}

impl From<TtsOutcome> for TtsResponse {
    fn from(outcome: TtsOutcome) -> Self {
        Self {
            status: outcome.status,
            file: outcome.file,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub voice_id: String,
    /// `None` when the cache directory could not be scanned
    pub cache: Option<CacheStats>,
    pub requests: RequestStats,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_cache::CacheKey;

    #[test]
    fn test_request_missing_text_defaults_to_empty() {
        let req: TtsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.text, "");
    }

    #[test]
    fn test_response_serialization() {
        let key = CacheKey::derive("default", "hello world");
        let response = TtsResponse::from(TtsOutcome {
            status: CacheStatus::CacheMiss,
            file: key.file_name(),
            key: key.clone(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "cache_miss");
        assert_eq!(json["file"], format!("{}.wav", key));
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            voice_id: "default".to_string(),
            cache: Some(CacheStats {
                artifacts: 3,
                total_size: 1500,
                max_size: 4096,
            }),
            requests: RequestStats { hits: 7, misses: 3 },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["uptime_secs"], 3600);
        assert_eq!(json["cache"]["artifacts"], 3);
        assert_eq!(json["requests"]["hits"], 7);
    }
}
