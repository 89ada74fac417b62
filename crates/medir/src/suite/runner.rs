//! Sequential suite runner.

use super::{PageTest, Suite};
use crate::observer::{notify, Observer};
use crate::page::{Browser, BrowserFactory};
use crate::result::{MedirError, MedirResult};
use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Outcome of one page test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTestResult {
    /// Page test title
    pub title: String,
    /// Validation errors from every `check` action
    pub errors: Vec<ValidationError>,
    /// Error that aborted the page test, if any
    pub fatal: Option<String>,
}

impl PageTestResult {
    /// No validation errors and no abort
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.fatal.is_none()
    }
}

/// Outcome of one suite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Suite name
    pub name: String,
    /// Page test outcomes in execution order
    pub page_tests: Vec<PageTestResult>,
}

impl SuiteResult {
    /// Every page test passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.page_tests.iter().all(PageTestResult::passed)
    }

    /// Validation errors across all page tests
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.page_tests.iter().map(|t| t.errors.len()).sum()
    }
}

/// Runs suites one page test at a time, a fresh browser per page test
pub struct SuiteRunner<'a> {
    factory: &'a dyn BrowserFactory,
    observer: &'a dyn Observer,
}

impl std::fmt::Debug for SuiteRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner").finish_non_exhaustive()
    }
}

impl<'a> SuiteRunner<'a> {
    /// Create a runner
    #[must_use]
    pub fn new(factory: &'a dyn BrowserFactory, observer: &'a dyn Observer) -> Self {
        Self { factory, observer }
    }

    /// Run every page test of `suite`. Failing page tests do not stop the
    /// ones after them.
    #[must_use]
    pub fn run_suite(&self, suite: &Suite) -> SuiteResult {
        info!(suite = %suite.name, "Running suite");
        notify("on_suite_started", || self.observer.on_suite_started(suite));

        let result = SuiteResult {
            name: suite.name.clone(),
            page_tests: suite.page_tests.iter().map(|t| self.run_page_test(t)).collect(),
        };

        notify("on_suite_finished", || {
            self.observer.on_suite_finished(suite, &result);
        });
        result
    }

    /// Run one page test
    #[must_use]
    pub fn run_page_test(&self, test: &PageTest) -> PageTestResult {
        notify("on_page_test_started", || self.observer.on_page_test_started(test));

        let mut errors = Vec::new();
        let fatal = match self.factory.create() {
            Ok(mut browser) => {
                let outcome = self.drive(browser.as_mut(), test, &mut errors);
                browser.close();
                outcome.err()
            }
            Err(error) => Some(error),
        };

        let fatal = fatal.map(|error| {
            warn!(title = %test.title, %error, "Page test aborted");
            notify("on_global_error", || self.observer.on_global_error(&error));
            error.to_string()
        });
        let result = PageTestResult {
            title: test.title.clone(),
            errors,
            fatal,
        };
        notify("on_page_test_finished", || {
            self.observer.on_page_test_finished(test, &result);
        });
        result
    }

    fn drive(
        &self,
        browser: &mut dyn Browser,
        test: &PageTest,
        errors: &mut Vec<ValidationError>,
    ) -> MedirResult<()> {
        if let Some(size) = test.size {
            browser.resize(size)?;
        }
        if let Some(url) = &test.url {
            browser.open(url)?;
        }
        for action in &test.actions {
            debug!(%action, "Executing action");
            notify("on_action_started", || self.observer.on_action_started(action));
            let found = action.execute(browser, self.observer)?;
            notify("on_action_finished", || {
                self.observer.on_action_finished(action, &found);
            });
            errors.extend(found);
        }
        Ok(())
    }
}

/// Result for a suite whose run was cut short
pub(super) fn aborted(suite: &Suite, error: &MedirError) -> SuiteResult {
    SuiteResult {
        name: suite.name.clone(),
        page_tests: vec![PageTestResult {
            title: suite.name.clone(),
            errors: Vec::new(),
            fatal: Some(error.to_string()),
        }],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::geometry::{Area, Size};
    use crate::locator::Locator;
    use crate::observer::{ObserverEvent, RecordingObserver};
    use crate::page::mock::{MockBrowser, MockBrowserFactory, MockPage};
    use crate::suite::{CheckAction, PageAction};
    use std::fs;

    fn factory() -> MockBrowserFactory {
        let page = MockPage::new().with_visible(Locator::css("#menu"), Area::new(0, 0, 100, 20));
        MockBrowserFactory::new(
            MockBrowser::new()
                .with_page("http://app/", page)
                .with_failing_url("http://down/"),
        )
    }

    #[test]
    fn test_page_test_order_of_calls() {
        let factory = factory();
        let observer = RecordingObserver::new();
        let runner = SuiteRunner::new(&factory, &observer);
        let test = PageTest::new("home")
            .with_url("http://app/")
            .with_size(Size::new(800, 600))
            .with_action(PageAction::Cookie {
                cookies: vec!["a=1".into()],
            });

        let result = runner.run_page_test(&test);
        assert!(result.passed());
        assert_eq!(
            factory.history(),
            vec!["resize:800x600", "open:http://app/", "cookie:a=1"]
        );
        assert_eq!(factory.created_count(), 1);
    }

    #[test]
    fn test_check_errors_fail_the_suite() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("home.spec");
        fs::write(&spec, "===\nmenu css #menu\n===\nmenu\n    width: 50px\n").unwrap();

        let factory = factory();
        let observer = RecordingObserver::new();
        let runner = SuiteRunner::new(&factory, &observer);
        let suite = Suite::new("Home").with_page_test(
            PageTest::new("desktop")
                .with_url("http://app/")
                .with_action(PageAction::Check(CheckAction::new(vec![spec]))),
        );

        let result = runner.run_suite(&suite);
        assert!(!result.passed());
        assert_eq!(result.error_count(), 1);
        assert!(observer.events().contains(&ObserverEvent::SuiteFinished {
            suite: "Home".into(),
            passed: false
        }));
    }

    #[test]
    fn test_fatal_error_continues_with_next_page_test() {
        let factory = factory();
        let observer = RecordingObserver::new();
        let runner = SuiteRunner::new(&factory, &observer);
        let suite = Suite::new("Mixed")
            .with_page_test(PageTest::new("broken").with_url("http://down/"))
            .with_page_test(PageTest::new("fine").with_url("http://app/"));

        let result = runner.run_suite(&suite);
        assert_eq!(result.page_tests.len(), 2);
        assert_eq!(
            result.page_tests[0].fatal.as_deref(),
            Some("Browser error: Cannot open http://down/")
        );
        assert!(result.page_tests[1].passed());
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, ObserverEvent::GlobalError { .. })));
    }

    #[test]
    fn test_aborted_result() {
        let suite = Suite::new("S");
        let result = aborted(&suite, &MedirError::browser("boom"));
        assert!(!result.passed());
        assert_eq!(result.page_tests[0].fatal.as_deref(), Some("Browser error: boom"));
    }
}
