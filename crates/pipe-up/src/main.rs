//! pipe-up - submit text to tts-cached from the command line

mod client;
mod error;
mod input;

use crate::client::{submit, DEFAULT_SERVER_URL};
use crate::input::resolve_text;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Submit text to tts-cached.
///
/// Input modes: `-f <path>` reads a file, `-f -` reads stdin, otherwise the
/// remaining arguments are spoken.
#[derive(Debug, Parser)]
#[command(name = "pipe-up", version, about)]
struct Cli {
    /// Text file to read ('-' for stdin)
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// tts-cached /tts endpoint URL
    #[arg(long, env = "TTS_CACHED_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Text to speak when no file is given
    #[arg(num_args = 1.., trailing_var_arg = true)]
    text: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Quiet unless RUST_LOG asks for more; output goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pipe_up=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let text = match resolve_text(cli.file.as_deref(), &cli.text, &mut std::io::stdin().lock()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: {}\n", e);
            let _ = Cli::command().print_help();
            return ExitCode::FAILURE;
        }
    };

    match submit(&cli.server, &text).await {
        Ok(response) => {
            println!("status={} file={}", response.status, response.file);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("submit failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
