//! Speech synthesis through an external engine
//!
//! The engine renders into a private temporary file next to the artifact,
//! which is renamed into place only after the engine succeeds. Readers of the
//! cache directory therefore never see a partially written artifact.

use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Trailing suffix of in-progress synthesis output
pub const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug)]
pub enum SynthesisError {
    Spawn {
        program: PathBuf,
        source: Box<io::Error>,
    },
    Io(Box<io::Error>),
    /// The engine exited unsuccessfully
    Exit {
        code: Option<i32>,
        stderr: String,
    },
    Timeout(Duration),
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: Box<io::Error>,
    },
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisError::Spawn { program, source } => {
                write!(f, "failed to start {}: {}", program.display(), source)
            }
            SynthesisError::Io(err) => write!(f, "engine IO failed: {}", err),
            SynthesisError::Exit { code, stderr } => {
                match code {
                    Some(code) => write!(f, "engine exited with status {}", code)?,
                    None => write!(f, "engine terminated by signal")?,
                }
                if !stderr.is_empty() {
                    write!(f, " ({})", stderr)?;
                }
                Ok(())
            }
            SynthesisError::Timeout(deadline) => {
                write!(f, "engine exceeded deadline of {:?}", deadline)
            }
            SynthesisError::Rename { from, to, source } => write!(
                f,
                "rename {} -> {} failed: {}",
                from.display(),
                to.display(),
                source
            ),
        }
    }
}

impl std::error::Error for SynthesisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthesisError::Spawn { source, .. } => Some(source.as_ref()),
            SynthesisError::Io(err) => Some(err.as_ref()),
            SynthesisError::Rename { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for SynthesisError {
    fn from(err: io::Error) -> Self {
        SynthesisError::Io(Box::new(err))
    }
}

/// Something that turns text into an audio file at a given path
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn render(&self, text: &str, out_path: &Path) -> Result<(), SynthesisError>;
}

/// Runs the Piper CLI, feeding text on stdin
#[derive(Debug, Clone)]
pub struct PiperEngine {
    exec: PathBuf,
    model: PathBuf,
    flags: Vec<String>,
}

impl PiperEngine {
    pub fn new(exec: PathBuf, model: PathBuf, flags: Vec<String>) -> Self {
        Self { exec, model, flags }
    }

    fn args(&self, out_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-m".into(),
            self.model.clone().into_os_string(),
            "-f".into(),
            out_path.as_os_str().to_owned(),
        ];
        args.extend(self.flags.iter().map(OsString::from));
        args
    }
}

#[async_trait]
impl SpeechEngine for PiperEngine {
    async fn render(&self, text: &str, out_path: &Path) -> Result<(), SynthesisError> {
        let args = self.args(out_path);
        info!(exec = %self.exec.display(), args = ?args, "Invoking piper");

        let mut child = Command::new(&self.exec)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SynthesisError::Spawn {
                program: self.exec.clone(),
                source: Box::new(e),
            })?;

        // Dropping stdin closes the pipe so the engine sees EOF
        let mut write_result = Ok(());
        if let Some(mut stdin) = child.stdin.take() {
            write_result = stdin.write_all(text.as_bytes()).await;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(SynthesisError::Exit {
                code: output.status.code(),
                stderr,
            });
        }
        write_result?;

        Ok(())
    }
}

/// Synthesize `text` into `out_path`, bounded by `deadline`.
///
/// On any failure the temporary output is removed and nothing appears at
/// `out_path`.
pub async fn synthesize(
    engine: &dyn SpeechEngine,
    text: &str,
    out_path: &Path,
    deadline: Duration,
) -> Result<(), SynthesisError> {
    let tmp_path = temp_path_for(out_path);
    let start = Instant::now();

    // A timed-out render is dropped, which kills the engine process
    let rendered = match tokio::time::timeout(deadline, engine.render(text, &tmp_path)).await {
        Ok(result) => result,
        Err(_) => Err(SynthesisError::Timeout(deadline)),
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if let Err(e) = rendered {
        discard(&tmp_path).await;
        error!(path = %out_path.display(), elapsed_ms, error = %e, "Synthesis failed");
        return Err(e);
    }
    info!(path = %out_path.display(), elapsed_ms, "Synthesis completed");

    if let Err(e) = fs::rename(&tmp_path, out_path).await {
        discard(&tmp_path).await;
        return Err(SynthesisError::Rename {
            from: tmp_path,
            to: out_path.to_path_buf(),
            source: Box::new(e),
        });
    }

    Ok(())
}

/// Unique temporary path for one synthesis of `out_path`.
///
/// Concurrent misses for the same key each get their own file, so the last
/// rename wins without two engines ever writing one file.
fn temp_path_for(out_path: &Path) -> PathBuf {
    static NONCE: AtomicU64 = AtomicU64::new(0);
    let nonce = NONCE.fetch_add(1, Ordering::Relaxed);

    let mut name = out_path.as_os_str().to_owned();
    name.push(format!(".{}.{}", nonce, TEMP_SUFFIX));
    PathBuf::from(name)
}

async fn discard(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed temporary synthesis output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove temporary synthesis output"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tts_cache::is_artifact_file_name;

    struct WritingEngine;

    #[async_trait]
    impl SpeechEngine for WritingEngine {
        async fn render(&self, text: &str, out_path: &Path) -> Result<(), SynthesisError> {
            fs::write(out_path, format!("wav:{}", text)).await?;
            Ok(())
        }
    }

    /// Writes partial output and then fails
    struct FailingEngine;

    #[async_trait]
    impl SpeechEngine for FailingEngine {
        async fn render(&self, _text: &str, out_path: &Path) -> Result<(), SynthesisError> {
            fs::write(out_path, b"partial").await?;
            Err(SynthesisError::Exit {
                code: Some(1),
                stderr: "model not found".to_string(),
            })
        }
    }

    /// Writes partial output and never finishes in time
    struct StallingEngine;

    #[async_trait]
    impl SpeechEngine for StallingEngine {
        async fn render(&self, _text: &str, out_path: &Path) -> Result<(), SynthesisError> {
            fs::write(out_path, b"partial").await?;
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    /// Claims success without producing output
    struct SilentEngine;

    #[async_trait]
    impl SpeechEngine for SilentEngine {
        async fn render(&self, _text: &str, _out_path: &Path) -> Result<(), SynthesisError> {
            Ok(())
        }
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_synthesize_renames_into_place() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("abc.wav");

        synthesize(&WritingEngine, "hello", &out, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "wav:hello");
        assert_eq!(dir_names(dir.path()), vec!["abc.wav"]);
    }

    #[tokio::test]
    async fn test_failed_synthesis_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("abc.wav");

        let err = synthesize(&FailingEngine, "hello", &out, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::Exit { code: Some(1), .. }));
        assert!(dir_names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_deadline_exceeded_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("abc.wav");

        let err = synthesize(&StallingEngine, "hello", &out, Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::Timeout(_)));
        assert!(dir_names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_engine_output_is_rename_error() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("abc.wav");

        let err = synthesize(&SilentEngine, "hello", &out, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::Rename { .. }));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let dir = tempdir().unwrap();
        let engine = PiperEngine::new(
            dir.path().join("no-such-piper"),
            PathBuf::from("voice.onnx"),
            Vec::new(),
        );
        let out = dir.path().join("abc.wav");

        let err = synthesize(&engine, "hello", &out, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, SynthesisError::Spawn { .. }));
        assert!(dir_names(dir.path()).is_empty());
    }

    #[test]
    fn test_temp_paths_are_unique_and_hidden_from_the_store() {
        let out = Path::new("/cache/abc.wav");
        let first = temp_path_for(out);
        let second = temp_path_for(out);

        assert_ne!(first, second);
        for tmp in [&first, &second] {
            let name = tmp.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("abc.wav."));
            assert!(name.ends_with(".tmp"));
            assert!(!is_artifact_file_name(name));
        }
    }

    #[test]
    fn test_piper_args() {
        let engine = PiperEngine::new(
            PathBuf::from("/usr/local/bin/piper"),
            PathBuf::from("/models/en.onnx"),
            vec!["--length_scale".to_string(), "1.1".to_string()],
        );

        let args = engine.args(Path::new("/cache/abc.wav.0.tmp"));
        assert_eq!(
            args,
            vec![
                OsString::from("-m"),
                OsString::from("/models/en.onnx"),
                OsString::from("-f"),
                OsString::from("/cache/abc.wav.0.tmp"),
                OsString::from("--length_scale"),
                OsString::from("1.1"),
            ]
        );
    }

    #[test]
    fn test_exit_error_display_includes_stderr() {
        let err = SynthesisError::Exit {
            code: Some(2),
            stderr: "bad model".to_string(),
        };
        assert_eq!(format!("{}", err), "engine exited with status 2 (bad model)");
    }
}
