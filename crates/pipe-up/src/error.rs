//! Error types for the pipe-up client

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum PipeUpError {
    NoInput,
    EmptyInput,
    ReadStdin(Box<std::io::Error>),
    ReadFile {
        path: PathBuf,
        source: Box<std::io::Error>,
    },
    Http(Box<reqwest::Error>),
    /// The server answered with a non-200 status
    Server {
        status: reqwest::StatusCode,
        body: String,
    },
    Decode(serde_json::Error),
}

impl fmt::Display for PipeUpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeUpError::NoInput => write!(f, "no input provided"),
            PipeUpError::EmptyInput => write!(f, "input is empty"),
            PipeUpError::ReadStdin(err) => write!(f, "read stdin: {}", err),
            PipeUpError::ReadFile { path, source } => {
                write!(f, "read {}: {}", path.display(), source)
            }
            PipeUpError::Http(err) => write!(f, "post to server: {}", err),
            PipeUpError::Server { status, body } => {
                write!(f, "server returned {}: {}", status, body)
            }
            PipeUpError::Decode(err) => write!(f, "decode response: {}", err),
        }
    }
}

impl std::error::Error for PipeUpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipeUpError::ReadStdin(err) => Some(err.as_ref()),
            PipeUpError::ReadFile { source, .. } => Some(source.as_ref()),
            PipeUpError::Http(err) => Some(err.as_ref()),
            PipeUpError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PipeUpError {
    fn from(err: reqwest::Error) -> Self {
        PipeUpError::Http(Box::new(err))
    }
}

impl From<serde_json::Error> for PipeUpError {
    fn from(err: serde_json::Error) -> Self {
        PipeUpError::Decode(err)
    }
}

pub type Result<T> = std::result::Result<T, PipeUpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        assert_eq!(format!("{}", PipeUpError::NoInput), "no input provided");
        assert_eq!(format!("{}", PipeUpError::EmptyInput), "input is empty");
    }

    #[test]
    fn test_server_error_display() {
        let err = PipeUpError::Server {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: r#"{"error":"text is required"}"#.to_string(),
        };
        assert_eq!(
            format!("{}", err),
            r#"server returned 400 Bad Request: {"error":"text is required"}"#
        );
    }
}
