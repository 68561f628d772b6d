//! Error types for the TTS cache daemon

use crate::synth::SynthesisError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;
use tts_cache::CacheError;

#[derive(Debug)]
pub enum TtsError {
    /// Request text was empty after normalization
    EmptyInput,
    /// The cache directory or an artifact could not be inspected
    Storage(CacheError),
    Synthesis(SynthesisError),
    Config(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for TtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtsError::EmptyInput => write!(f, "Empty input"),
            TtsError::Storage(err) => write!(f, "Storage error: {}", err),
            TtsError::Synthesis(err) => write!(f, "Synthesis error: {}", err),
            TtsError::Config(msg) => write!(f, "Configuration error: {}", msg),
            TtsError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for TtsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TtsError::Storage(err) => Some(err),
            TtsError::Synthesis(err) => Some(err),
            TtsError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<CacheError> for TtsError {
    fn from(err: CacheError) -> Self {
        TtsError::Storage(err)
    }
}

impl From<SynthesisError> for TtsError {
    fn from(err: SynthesisError) -> Self {
        TtsError::Synthesis(err)
    }
}

impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for TtsError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        TtsError::Config(err.to_string())
    }
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            TtsError::EmptyInput => (StatusCode::BAD_REQUEST, "text is required".to_string()),
            TtsError::Storage(_) | TtsError::Synthesis(_) | TtsError::Io(_) => {
                tracing::error!(error = %self, "TTS request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            TtsError::Config(_) => {
                tracing::error!(error = %self, "Configuration error during request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;
