//! Command-line and environment configuration

use crate::error::{Result, TtsError};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tts_cache::KEY_DELIMITER;

pub const DEFAULT_PIPER_EXEC: &str = "/usr/local/bin/piper";
pub const DEFAULT_CACHE_DIR: &str = "/var/cache/tts-cached";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:4410";
pub const DEFAULT_PLAY_CMD: &str = "/usr/bin/aplay";
pub const DEFAULT_VOICE_ID: &str = "default";
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 512 * 1024 * 1024;

/// Text-to-speech daemon with an on-disk audio cache
#[derive(Debug, Clone, Parser)]
#[command(name = "tts-cached", version, about)]
pub struct Cli {
    /// Path to the piper executable
    #[arg(long, env = "PIPER_EXEC", default_value = DEFAULT_PIPER_EXEC)]
    pub piper_exec: PathBuf,

    /// Path to the piper voice model (required)
    #[arg(long, env = "PIPER_MODEL")]
    pub piper_model: Option<PathBuf>,

    /// Additional piper flags, space separated
    #[arg(long, env = "PIPER_FLAGS", allow_hyphen_values = true)]
    pub piper_flags: Option<String>,

    /// Directory holding cached wav files
    #[arg(long, env = "CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// Playback command
    #[arg(long, env = "PLAY_CMD", default_value = DEFAULT_PLAY_CMD)]
    pub play_cmd: String,

    /// Extra playback arguments, space separated
    #[arg(long, env = "PLAY_ARGS", allow_hyphen_values = true)]
    pub play_args: Option<String>,

    /// Voice identifier mixed into every cache key
    #[arg(long, env = "VOICE_ID", default_value = DEFAULT_VOICE_ID)]
    pub voice_id: String,

    /// Maximum total size of cached audio in bytes
    #[arg(long, env = "CACHE_MAX_BYTES", default_value_t = DEFAULT_CACHE_MAX_BYTES)]
    pub cache_max_bytes: u64,

    /// Deadline for one synthesis run, in seconds
    #[arg(long, env = "SYNTH_TIMEOUT_SECS", default_value_t = 60)]
    pub synth_timeout_secs: u64,

    /// Deadline for one playback run, in seconds
    #[arg(long, env = "PLAY_TIMEOUT_SECS", default_value_t = 120)]
    pub play_timeout_secs: u64,
}

/// Validated daemon configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub piper_exec: PathBuf,
    pub piper_model: PathBuf,
    pub piper_flags: Vec<String>,
    pub cache_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub play_cmd: String,
    pub play_args: Vec<String>,
    pub voice_id: String,
    pub cache_max_bytes: u64,
    pub synth_timeout: Duration,
    pub play_timeout: Duration,
}

impl TtsConfig {
    /// Validate parsed arguments. Does not touch the filesystem.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let piper_model = cli
            .piper_model
            .filter(|m| !m.as_os_str().is_empty())
            .ok_or_else(|| {
                TtsError::Config("PIPER_MODEL is required (flag or env)".to_string())
            })?;

        let listen_addr = cli.listen_addr.trim().parse::<SocketAddr>().map_err(|e| {
            TtsError::Config(format!("invalid listen address {:?}: {}", cli.listen_addr, e))
        })?;

        let voice_id = cli.voice_id.trim().to_string();
        if voice_id.is_empty() {
            return Err(TtsError::Config("VOICE_ID must not be empty".to_string()));
        }
        if voice_id.contains(KEY_DELIMITER) {
            return Err(TtsError::Config(format!(
                "VOICE_ID must not contain {:?}",
                KEY_DELIMITER
            )));
        }

        if cli.cache_max_bytes == 0 {
            return Err(TtsError::Config(
                "invalid CACHE_MAX_BYTES; must be positive integer".to_string(),
            ));
        }

        if cli.synth_timeout_secs == 0 || cli.play_timeout_secs == 0 {
            return Err(TtsError::Config("timeouts must be positive".to_string()));
        }
        if cli.play_timeout_secs <= cli.synth_timeout_secs {
            return Err(TtsError::Config(
                "PLAY_TIMEOUT_SECS must be longer than SYNTH_TIMEOUT_SECS".to_string(),
            ));
        }

        Ok(Self {
            piper_exec: cli.piper_exec,
            piper_model,
            piper_flags: split_args(cli.piper_flags.as_deref()),
            cache_dir: cli.cache_dir,
            listen_addr,
            play_cmd: cli.play_cmd,
            play_args: split_args(cli.play_args.as_deref()),
            voice_id,
            cache_max_bytes: cli.cache_max_bytes,
            synth_timeout: Duration::from_secs(cli.synth_timeout_secs),
            play_timeout: Duration::from_secs(cli.play_timeout_secs),
        })
    }

    /// Create the cache directory and resolve it to an absolute path
    pub fn prepare_cache_dir(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)?;
        self.cache_dir = std::fs::canonicalize(&self.cache_dir)?;
        Ok(())
    }
}

fn split_args(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
