//! Suites of page tests and their execution.
//!
//! A [`Suite`] holds page tests; a [`PageTest`] opens a URL at a window
//! size and runs a list of [`PageAction`]s against a fresh browser.
//! [`SuiteExecutor`] runs many suites, sequentially or on a bounded
//! worker pool, and aggregates their results.
//!
//! ```yaml
//! suites:
//!   - name: Home page
//!     page_tests:
//!       - title: Home on desktop
//!         url: http://example.com
//!         size: 1024x768
//!         actions:
//!           - check specs/home.spec --include desktop
//! ```

mod action;
mod action_reader;
mod catalog;
mod config;
mod executor;
mod runner;

pub use action::{CheckAction, PageAction};
pub use action_reader::{parse_action, split_arguments};
pub use catalog::SuiteCatalog;
pub use config::{ExecutorConfig, ExecutorConfigBuilder};
pub use executor::{RunSummary, SuiteExecutor};
pub use runner::{PageTestResult, SuiteResult, SuiteRunner};

use crate::geometry::Size;
use serde::{Deserialize, Serialize};

/// Named group of page tests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    /// Suite name, matched by the executor's filter
    pub name: String,
    /// Page tests in execution order
    pub page_tests: Vec<PageTest>,
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page_tests: Vec::new(),
        }
    }

    /// Add a page test
    #[must_use]
    pub fn with_page_test(mut self, test: PageTest) -> Self {
        self.page_tests.push(test);
        self
    }
}

/// One browser session: optional URL and size, then actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTest {
    /// Human-readable title
    pub title: String,
    /// Page opened before the actions run
    pub url: Option<String>,
    /// Window size applied before the page is opened
    pub size: Option<Size>,
    /// Actions in execution order
    pub actions: Vec<PageAction>,
}

impl PageTest {
    /// Create a page test without URL, size or actions
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the window size
    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Add an action
    #[must_use]
    pub fn with_action(mut self, action: PageAction) -> Self {
        self.actions.push(action);
        self
    }
}
