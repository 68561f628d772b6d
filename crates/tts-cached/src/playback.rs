//! Best-effort audio playback

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug)]
pub enum PlaybackError {
    Spawn {
        program: String,
        source: Box<io::Error>,
    },
    Io(Box<io::Error>),
    Exit(Option<i32>),
    Timeout(Duration),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::Spawn { program, source } => {
                write!(f, "failed to start {}: {}", program, source)
            }
            PlaybackError::Io(err) => write!(f, "player IO failed: {}", err),
            PlaybackError::Exit(Some(code)) => write!(f, "player exited with status {}", code),
            PlaybackError::Exit(None) => write!(f, "player terminated by signal"),
            PlaybackError::Timeout(deadline) => {
                write!(f, "player exceeded deadline of {:?}", deadline)
            }
        }
    }
}

impl std::error::Error for PlaybackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlaybackError::Spawn { source, .. } => Some(source.as_ref()),
            PlaybackError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for PlaybackError {
    fn from(err: io::Error) -> Self {
        PlaybackError::Io(Box::new(err))
    }
}

#[async_trait]
pub trait Player: Send + Sync {
    async fn play(&self, path: &Path) -> Result<(), PlaybackError>;
}

/// Plays a file by running `cmd args... <path>`
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    cmd: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(cmd: String, args: Vec<String>) -> Self {
        Self { cmd, args }
    }
}

#[async_trait]
impl Player for CommandPlayer {
    async fn play(&self, path: &Path) -> Result<(), PlaybackError> {
        info!(cmd = %self.cmd, args = ?self.args, path = %path.display(), "Playback start");

        let status = Command::new(&self.cmd)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| PlaybackError::Spawn {
                program: self.cmd.clone(),
                source: Box::new(e),
            })?;

        if !status.success() {
            return Err(PlaybackError::Exit(status.code()));
        }
        Ok(())
    }
}

/// Start playback in the background and return immediately.
///
/// The task runs to completion or `deadline` regardless of what happens to
/// the request that started it. The handle is only useful to tests.
pub fn dispatch(player: Arc<dyn Player>, path: PathBuf, deadline: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = Instant::now();
        let result = match tokio::time::timeout(deadline, player.play(&path)).await {
            Ok(result) => result,
            Err(_) => Err(PlaybackError::Timeout(deadline)),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => info!(path = %path.display(), elapsed_ms, "Playback finished"),
            Err(e) => error!(path = %path.display(), elapsed_ms, error = %e, "Playback failed"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StallingPlayer {
        finished: AtomicBool,
    }

    #[async_trait]
    impl Player for StallingPlayer {
        async fn play(&self, _path: &Path) -> Result<(), PlaybackError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_enforces_deadline() {
        let player = Arc::new(StallingPlayer {
            finished: AtomicBool::new(false),
        });

        let handle = dispatch(
            player.clone(),
            PathBuf::from("/cache/abc.wav"),
            Duration::from_millis(20),
        );

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("playback task should stop at its deadline")
            .unwrap();
        assert!(!player.finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_missing_player_is_spawn_error() {
        let player = CommandPlayer::new("/nonexistent/player-binary".to_string(), Vec::new());

        let err = player.play(Path::new("/cache/abc.wav")).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_player_passes_path_last() {
        // `sh -c <script> sh <path>` exposes the path as $1
        let player = CommandPlayer::new(
            "sh".to_string(),
            vec![
                "-c".to_string(),
                "test \"$1\" = /cache/abc.wav".to_string(),
                "sh".to_string(),
            ],
        );

        player.play(Path::new("/cache/abc.wav")).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_player_reports_exit_status() {
        let player = CommandPlayer::new(
            "sh".to_string(),
            vec!["-c".to_string(), "exit 3".to_string(), "sh".to_string()],
        );

        let err = player.play(Path::new("/cache/abc.wav")).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Exit(Some(3))));
    }

    #[test]
    fn test_timeout_display() {
        let err = PlaybackError::Timeout(Duration::from_secs(120));
        assert_eq!(format!("{}", err), "player exceeded deadline of 120s");
    }
}
