//! Input selection for the client

use crate::error::{PipeUpError, Result};
use std::io::Read;
use std::path::PathBuf;

/// Choose the text to submit.
///
/// `-` reads stdin, any other file argument reads that file, and without a
/// file the positional arguments are joined with spaces.
pub fn resolve_text(
    file: Option<&str>,
    args: &[String],
    stdin: &mut dyn Read,
) -> Result<String> {
    let file = file.map(str::trim).filter(|f| !f.is_empty());

    let raw = match file {
        Some("-") => {
            let mut buf = String::new();
            stdin
                .read_to_string(&mut buf)
                .map_err(|e| PipeUpError::ReadStdin(Box::new(e)))?;
            buf
        }
        Some(path) => std::fs::read_to_string(path).map_err(|e| PipeUpError::ReadFile {
            path: PathBuf::from(path),
            source: Box::new(e),
        })?,
        None if !args.is_empty() => args.join(" "),
        None => return Err(PipeUpError::NoInput),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PipeUpError::EmptyInput);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reads_stdin_for_dash() {
        let mut stdin = Cursor::new("  from stdin \n");
        let text = resolve_text(Some("-"), &args(&["ignored"]), &mut stdin).unwrap();
        assert_eq!(text, "from stdin");
    }

    #[test]
    fn test_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("speech.txt");
        std::fs::write(&path, "\nfrom file\n").unwrap();

        let text = resolve_text(Some(path.to_str().unwrap()), &[], &mut Cursor::new("")).unwrap();
        assert_eq!(text, "from file");
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let err = resolve_text(Some(path.to_str().unwrap()), &[], &mut Cursor::new(""))
            .unwrap_err();
        assert!(matches!(err, PipeUpError::ReadFile { .. }));
    }

    #[test]
    fn test_joins_args() {
        let text = resolve_text(None, &args(&["hello", "world"]), &mut Cursor::new("")).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_no_input() {
        let err = resolve_text(None, &[], &mut Cursor::new("unused")).unwrap_err();
        assert!(matches!(err, PipeUpError::NoInput));
    }

    #[test]
    fn test_blank_input_is_empty() {
        let err = resolve_text(Some("-"), &[], &mut Cursor::new(" \n\t")).unwrap_err();
        assert!(matches!(err, PipeUpError::EmptyInput));

        let err = resolve_text(None, &args(&["  ", ""]), &mut Cursor::new("")).unwrap_err();
        assert!(matches!(err, PipeUpError::EmptyInput));
    }
}
