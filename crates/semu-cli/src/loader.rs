//! Reads JSON program descriptions from disk.

use std::fs;
use std::path::{Path, PathBuf};

use semu_core::ProgramSource;
use thiserror::Error;
use tracing::debug;

/// Failure to turn a file into a [`ProgramSource`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not a valid program description.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Parses a program description from JSON text.
///
/// # Errors
///
/// Returns the JSON error when `text` does not describe a program.
pub fn parse_program(text: &str) -> Result<ProgramSource, serde_json::Error> {
    serde_json::from_str(text)
}

/// Loads the program description stored at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] when the file cannot be read and
/// [`LoadError::Parse`] when its contents are not a program description.
pub fn load_program(path: &Path) -> Result<ProgramSource, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = parse_program(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        program = %source.name,
        instructions = source.instructions.len(),
        functions = source.functions.len(),
        "loaded program"
    );
    Ok(source)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{load_program, parse_program, LoadError};

    const SUCCESSOR: &str = r#"{
        "name": "Main",
        "instructions": [
            {
                "name": "QUOTE",
                "type": "synthetic",
                "variable": "y",
                "arguments": [
                    { "name": "functionName", "value": "Succ" },
                    { "name": "functionArguments", "value": "x1" }
                ]
            }
        ],
        "functions": [
            {
                "name": "Succ",
                "user_string": "x1 + 1",
                "instructions": [
                    {
                        "name": "ASSIGNMENT",
                        "type": "synthetic",
                        "variable": "y",
                        "arguments": [{ "name": "assignedVariable", "value": "x1" }]
                    },
                    { "name": "INCREASE", "type": "basic", "variable": "y", "label": "L1" }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_functions_and_optional_fields() {
        let source = parse_program(SUCCESSOR).expect("valid description");
        assert_eq!(source.name, "Main");
        assert_eq!(source.instructions[0].kind, "synthetic");
        assert_eq!(source.functions.len(), 1);
        let body = &source.functions[0].instructions;
        assert_eq!(body[1].label.as_deref(), Some("L1"));
        assert!(body[1].arguments.is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SUCCESSOR.as_bytes()).expect("write");
        let source = load_program(file.path()).expect("loads");
        assert_eq!(source.functions[0].name, "Succ");
    }

    #[test]
    fn reports_missing_files_and_bad_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.json");
        assert!(matches!(load_program(&missing), Err(LoadError::Io { .. })));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ \"name\": 3 }").expect("write");
        let error = load_program(&broken).expect_err("not a program");
        assert!(matches!(error, LoadError::Parse { .. }));
        assert!(error.to_string().contains("broken.json"));
    }
}
