//! Seams to the rendered page and the browser that renders it.
//!
//! The validation engine only ever sees a [`Page`]; suites drive a
//! [`Browser`] created per page test by a shared [`BrowserFactory`].
//! Real bindings live outside this crate. [`mock`] provides in-memory
//! implementations for tests and offline runs.

pub mod mock;

use crate::geometry::{Area, Size};
use crate::locator::Locator;
use crate::result::MedirResult;
use crate::validation::CheckError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// State of one element at check time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Element exists in the document
    pub present: bool,
    /// Element is displayed
    pub visible: bool,
    /// Rendered rectangle
    pub area: Area,
    /// Visible text, when the page can provide it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ElementSnapshot {
    /// Element that does not exist
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Present and visible element
    #[must_use]
    pub fn visible(area: Area) -> Self {
        Self {
            present: true,
            visible: true,
            area,
            text: None,
        }
    }

    /// Present but hidden element
    #[must_use]
    pub fn hidden(area: Area) -> Self {
        Self {
            present: true,
            visible: false,
            area,
            text: None,
        }
    }

    /// Attach element text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Same element in a coordinate space rooted at `origin`
    #[must_use]
    pub fn relative_to(&self, origin: &Area) -> Self {
        Self {
            area: self.area.relative_to(origin),
            ..self.clone()
        }
    }
}

/// A rendered page that can be queried for element geometry
pub trait Page {
    /// Look up one element
    fn resolve(&self, locator: &Locator) -> ElementSnapshot;

    /// Number of elements matching the locator
    fn count_matches(&self, locator: &Locator) -> usize;

    /// Page whose coordinates are relative to the located element
    ///
    /// # Errors
    ///
    /// Returns error if the element cannot be scoped
    fn scoped_sub_page(&self, locator: &Locator) -> Result<Box<dyn Page>, CheckError>;

    /// Objects every page knows without a locator, such as `screen`
    fn special_element(&self, _name: &str) -> Option<ElementSnapshot> {
        None
    }
}

/// Browser automation used by suite actions
pub trait Browser {
    /// Navigate to a URL
    ///
    /// # Errors
    ///
    /// Returns error if navigation fails
    fn open(&mut self, url: &str) -> MedirResult<()>;

    /// Current URL
    fn current_url(&self) -> String;

    /// Current viewport size
    fn viewport_size(&self) -> Size;

    /// Resize the window
    ///
    /// # Errors
    ///
    /// Returns error if the window cannot be resized
    fn resize(&mut self, size: Size) -> MedirResult<()>;

    /// Set cookies, each in `name=value; attributes` form
    ///
    /// # Errors
    ///
    /// Returns error if a cookie is rejected
    fn set_cookies(&mut self, cookies: &[String]) -> MedirResult<()>;

    /// Run a script with optional JSON arguments
    ///
    /// # Errors
    ///
    /// Returns error if the script fails
    fn run_script(
        &mut self,
        code: &str,
        json_args: Option<&serde_json::Value>,
    ) -> MedirResult<serde_json::Value>;

    /// Inject a script into the page
    ///
    /// # Errors
    ///
    /// Returns error if injection fails
    fn inject_script(&mut self, code: &str) -> MedirResult<()>;

    /// Save a screenshot and return its path
    ///
    /// # Errors
    ///
    /// Returns error if capture fails
    fn capture_screenshot(&mut self) -> MedirResult<PathBuf>;

    /// The page currently displayed
    fn page(&self) -> &dyn Page;

    /// Release browser resources
    fn close(&mut self) {}
}

/// Creates one browser per page test. Shared by all workers.
pub trait BrowserFactory: Send + Sync {
    /// Start a new browser
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be started
    fn create(&self) -> MedirResult<Box<dyn Browser>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_constructors() {
        let absent = ElementSnapshot::absent();
        assert!(!absent.present && !absent.visible);

        let area = Area::new(1, 2, 3, 4);
        let visible = ElementSnapshot::visible(area).with_text("Login");
        assert!(visible.present && visible.visible);
        assert_eq!(visible.text.as_deref(), Some("Login"));

        let hidden = ElementSnapshot::hidden(area);
        assert!(hidden.present && !hidden.visible);
    }

    #[test]
    fn test_snapshot_relative_to() {
        let snapshot = ElementSnapshot::visible(Area::new(110, 60, 20, 20));
        let scoped = snapshot.relative_to(&Area::new(100, 50, 300, 300));
        assert_eq!(scoped.area, Area::new(10, 10, 20, 20));
        assert!(scoped.visible);
    }
}
