//! HTTP submission to the tts-cached /tts endpoint

use crate::error::{PipeUpError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4410/tts";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TtsResponse {
    pub status: String,
    pub file: String,
}

/// POST `text` to the server and decode its answer
pub async fn submit(server_url: &str, text: &str) -> Result<TtsResponse> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

    debug!(url = server_url, chars = text.len(), "Submitting text");
    let response = client
        .post(server_url)
        .json(&TtsRequest { text })
        .send()
        .await?;

    let status = response.status();
    let body = response.bytes().await?;

    if status != StatusCode::OK {
        return Err(PipeUpError::Server {
            status,
            body: String::from_utf8_lossy(&body).trim().to_string(),
        });
    }

    Ok(serde_json::from_slice(&body)?)
}
