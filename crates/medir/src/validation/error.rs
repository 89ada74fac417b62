//! Validation outcomes.

use crate::geometry::Area;
use crate::result::MedirError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A failed constraint: the areas involved and what went wrong.
///
/// Validation errors are data. They are collected into the result of a
/// validation pass and never raised.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationError {
    /// Areas of the checked object and any reference objects
    pub areas: Vec<Area>,
    /// One message per violated side, dimension or condition
    pub messages: Vec<String>,
}

impl ValidationError {
    /// Error with a single message and no areas
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            areas: Vec::new(),
            messages: vec![message.into()],
        }
    }

    /// Error with several messages
    #[must_use]
    pub fn with_messages(messages: Vec<String>) -> Self {
        Self {
            areas: Vec::new(),
            messages,
        }
    }

    /// Attach an area
    #[must_use]
    pub fn with_area(mut self, area: Area) -> Self {
        self.areas.push(area);
        self
    }

    /// Attach several areas
    #[must_use]
    pub fn with_areas(mut self, areas: impl IntoIterator<Item = Area>) -> Self {
        self.areas.extend(areas);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("; "))
    }
}

impl From<&CheckError> for ValidationError {
    fn from(error: &CheckError) -> Self {
        Self::new(error.to_string())
    }
}

/// A condition under which one object cannot be checked at all.
///
/// Aborts the remaining constraints of that object only; the caller turns
/// it into a [`ValidationError`].
#[derive(Debug, Error)]
pub enum CheckError {
    /// Object is neither declared nor a special page object
    #[error("Cannot find locator for \"{object}\" in page spec")]
    MissingLocator {
        /// Object name
        object: String,
    },

    /// Component spec file does not exist
    #[error("Component spec not found: {}", path.display())]
    ComponentNotFound {
        /// Spec path
        path: PathBuf,
    },

    /// Component spec could not be read
    #[error("Cannot read component spec {}: {source}", path.display())]
    ComponentSpec {
        /// Spec path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Box<MedirError>,
    },

    /// The page cannot provide a scoped sub-page
    #[error("Cannot create sub-page for {locator}")]
    SubPageUnavailable {
        /// Locator of the component object
        locator: String,
    },

    /// The page implementation lacks a required capability
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error message
        message: String,
    },

    /// An object name or text pattern is not a valid regex
    #[error("Incorrect pattern \"{pattern}\"")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Regex error
        #[source]
        source: regex::Error,
    },
}

/// Outcome of a failed check
#[derive(Debug)]
pub(crate) enum Failure {
    /// Constraint does not hold
    Invalid(ValidationError),
    /// Object cannot be checked
    Fatal(CheckError),
}

impl From<ValidationError> for Failure {
    fn from(error: ValidationError) -> Self {
        Self::Invalid(error)
    }
}

impl From<CheckError> for Failure {
    fn from(error: CheckError) -> Self {
        Self::Fatal(error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_joins_messages() {
        let error = ValidationError::with_messages(vec![
            "\"a\" is 5px left instead of 10px".into(),
            "\"a\" is 3px top instead of 0px".into(),
        ]);
        assert_eq!(
            error.to_string(),
            "\"a\" is 5px left instead of 10px; \"a\" is 3px top instead of 0px"
        );
    }

    #[test]
    fn test_areas() {
        let error = ValidationError::new("x")
            .with_area(Area::new(0, 0, 1, 1))
            .with_areas([Area::new(1, 1, 1, 1)]);
        assert_eq!(error.areas.len(), 2);
    }

    #[test]
    fn test_check_error_messages() {
        let missing = CheckError::MissingLocator {
            object: "menu".into(),
        };
        assert_eq!(
            missing.to_string(),
            "Cannot find locator for \"menu\" in page spec"
        );
        assert_eq!(ValidationError::from(&missing).messages, vec![missing.to_string()]);
    }

    #[test]
    fn test_component_spec_has_source() {
        let error = CheckError::ComponentSpec {
            path: PathBuf::from("header.spec"),
            source: Box::new(MedirError::invalid_config("bad")),
        };
        assert!(error.source().is_some());
    }
}
