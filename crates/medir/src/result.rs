//! Result and error types for Medir.
//!
//! Two families live here: [`SyntaxError`] for malformed spec or action
//! text, and [`MedirError`] for everything that can abort a read or a run.
//! Failed layout constraints are not errors in this sense; they are
//! reported as [`crate::ValidationError`] values.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for Medir operations
pub type MedirResult<T> = Result<T, MedirError>;

/// Line number used when the offending line is not known
pub const UNKNOWN_LINE: usize = 0;

/// Errors that can occur in Medir
#[derive(Debug, Error)]
pub enum MedirError {
    /// Spec or suite text could not be parsed
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Spec file referenced by a suite does not exist
    #[error("Spec file not found: {}", path.display())]
    SpecNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Browser collaborator failed
    #[error("Browser error: {message}")]
    Browser {
        /// Error message
        message: String,
    },

    /// Executor configuration is invalid
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl MedirError {
    /// Create a browser error
    #[must_use]
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// A parse failure carrying the offending line.
///
/// Parsing never recovers: the first syntax error aborts the file being
/// read. Errors raised by the token readers start out with
/// [`UNKNOWN_LINE`] and get their line stamped by the spec reader.
#[derive(Debug, Error)]
pub struct SyntaxError {
    line: usize,
    message: String,
    file: Option<PathBuf>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SyntaxError {
    /// Create a syntax error for a known line (1-based)
    #[must_use]
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            file: None,
            source: None,
        }
    }

    /// Create a syntax error whose line is not known yet
    #[must_use]
    pub fn unknown_line(message: impl Into<String>) -> Self {
        Self::new(UNKNOWN_LINE, message)
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Stamp the line number unless one is already set
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        if self.line == UNKNOWN_LINE {
            self.line = line;
        }
        self
    }

    /// Stamp the file unless one is already set.
    ///
    /// Errors bubbling out of an imported file keep the imported path.
    #[must_use]
    pub fn in_file(mut self, file: &Path) -> Self {
        if self.file.is_none() {
            self.file = Some(file.to_path_buf());
        }
        self
    }

    /// 1-based line number, or [`UNKNOWN_LINE`]
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Error message without location
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// File the error was found in, if read from disk
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error")?;
        if self.line != UNKNOWN_LINE {
            write!(f, " at line {}", self.line)?;
        }
        if let Some(file) = &self.file {
            write!(f, " in {}", file.display())?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_syntax_error_display_with_line_and_file() {
        let err = SyntaxError::new(12, "Unknown constraint: wdth").in_file(Path::new("home.spec"));
        assert_eq!(
            err.to_string(),
            "Syntax error at line 12 in home.spec: Unknown constraint: wdth"
        );
    }

    #[test]
    fn test_syntax_error_unknown_line_display() {
        let err = SyntaxError::unknown_line("Expected number");
        assert_eq!(err.to_string(), "Syntax error: Expected number");
    }

    #[test]
    fn test_at_line_keeps_first_stamp() {
        let err = SyntaxError::unknown_line("bad").at_line(3).at_line(9);
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_in_file_keeps_innermost_file() {
        let err = SyntaxError::new(1, "bad")
            .in_file(Path::new("imported.spec"))
            .in_file(Path::new("main.spec"));
        assert_eq!(err.file(), Some(Path::new("imported.spec")));
    }

    #[test]
    fn test_syntax_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SyntaxError::new(4, "Cannot import file").with_source(io);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_medir_error_from_syntax_is_transparent() {
        let err: MedirError = SyntaxError::new(2, "oops").into();
        assert_eq!(err.to_string(), "Syntax error at line 2: oops");
    }

    #[test]
    fn test_medir_error_helpers() {
        assert!(MedirError::browser("closed")
            .to_string()
            .contains("Browser error"));
        assert!(MedirError::invalid_config("parallelism")
            .to_string()
            .contains("Invalid configuration"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MedirError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
