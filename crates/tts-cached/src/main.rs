//! tts-cached - text-to-speech daemon with an on-disk audio cache
//!
//! Synthesizes posted text with Piper, keeps the resulting wav files in a
//! size-bounded cache directory, and plays them through an external player.

mod config;
mod error;
mod orchestrator;
mod playback;
mod server;
mod synth;
mod types;

use crate::config::{Cli, TtsConfig};
use crate::error::Result;
use crate::orchestrator::TtsService;
use crate::playback::CommandPlayer;
use crate::server::{start_server, ServerState, SharedState};
use crate::synth::PiperEngine;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use tts_cache::ArtifactStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("tts_cached=info".parse()?);

    // Use JSON format for Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting tts-cached...");

    let mut config = TtsConfig::from_cli(Cli::parse())?;
    config.prepare_cache_dir()?;
    info!(
        piper_exec = %config.piper_exec.display(),
        piper_model = %config.piper_model.display(),
        piper_flags = ?config.piper_flags,
        cache_dir = %config.cache_dir.display(),
        listen_addr = %config.listen_addr,
        play_cmd = %config.play_cmd,
        play_args = ?config.play_args,
        voice_id = %config.voice_id,
        cache_max_bytes = config.cache_max_bytes,
        "Loaded configuration"
    );

    let store = ArtifactStore::new(config.cache_dir.clone(), config.cache_max_bytes);
    store.init().await?;

    let engine = PiperEngine::new(
        config.piper_exec.clone(),
        config.piper_model.clone(),
        config.piper_flags.clone(),
    );
    let player = CommandPlayer::new(config.play_cmd.clone(), config.play_args.clone());

    let service = TtsService::new(
        config.voice_id.clone(),
        store,
        Arc::new(engine),
        Arc::new(player),
        config.synth_timeout,
        config.play_timeout,
    );
    let state: SharedState = Arc::new(ServerState::new(service));

    // Serve until a shutdown signal arrives
    start_server(state, config.listen_addr).await?;

    info!("Shutdown complete");
    Ok(())
}
