//! Event sinks for validation and suite execution.
//!
//! Observers receive `&self` and may be invoked concurrently from several
//! suite workers, so implementations that accumulate state must
//! synchronize it. A panicking observer never aborts a run: every callback
//! goes through [`notify`], which catches the panic and logs it.

use crate::result::MedirError;
use crate::spec::{Constraint, PageSection};
use crate::suite::{PageAction, PageTest, PageTestResult, Suite, SuiteResult};
use crate::validation::ValidationError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle hooks. Every hook defaults to doing nothing.
pub trait Observer: Send + Sync {
    /// Suite is about to run
    fn on_suite_started(&self, _suite: &Suite) {}

    /// Suite finished
    fn on_suite_finished(&self, _suite: &Suite, _result: &SuiteResult) {}

    /// Page test is about to run
    fn on_page_test_started(&self, _test: &PageTest) {}

    /// Page test finished
    fn on_page_test_finished(&self, _test: &PageTest, _result: &PageTestResult) {}

    /// Action is about to run
    fn on_action_started(&self, _action: &PageAction) {}

    /// Action finished with the given validation errors
    fn on_action_finished(&self, _action: &PageAction, _errors: &[ValidationError]) {}

    /// Entering a section
    fn on_before_section(&self, _section: &PageSection) {}

    /// Leaving a section
    fn on_after_section(&self, _section: &PageSection) {}

    /// Starting the constraints of one object; `depth` is 0 for the top
    /// level spec and grows by one per nested component
    fn on_object(&self, _object: &str, _depth: usize) {}

    /// Finished the constraints of one object
    fn on_after_object(&self, _object: &str, _depth: usize) {}

    /// Constraint held
    fn on_constraint_success(&self, _object: &str, _constraint: &Constraint) {}

    /// Constraint failed
    fn on_constraint_error(&self, _object: &str, _constraint: &Constraint, _error: &ValidationError) {}

    /// Unrecoverable error in a page test
    fn on_global_error(&self, _error: &MedirError) {}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run one observer callback, logging instead of propagating a panic
pub fn notify(hook: &'static str, callback: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        warn!(hook, error = %panic_message(payload.as_ref()), "Observer failed");
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Fans every event out to several observers
#[derive(Clone, Default)]
pub struct CombinedObserver {
    observers: Vec<Arc<dyn Observer>>,
}

impl std::fmt::Debug for CombinedObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl CombinedObserver {
    /// Create an empty fan-out
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer
    #[must_use]
    pub fn with(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of observers
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    fn each(&self, hook: &'static str, call: impl Fn(&dyn Observer)) {
        for observer in &self.observers {
            notify(hook, || call(observer.as_ref()));
        }
    }
}

impl Observer for CombinedObserver {
    fn on_suite_started(&self, suite: &Suite) {
        self.each("on_suite_started", |o| o.on_suite_started(suite));
    }

    fn on_suite_finished(&self, suite: &Suite, result: &SuiteResult) {
        self.each("on_suite_finished", |o| o.on_suite_finished(suite, result));
    }

    fn on_page_test_started(&self, test: &PageTest) {
        self.each("on_page_test_started", |o| o.on_page_test_started(test));
    }

    fn on_page_test_finished(&self, test: &PageTest, result: &PageTestResult) {
        self.each("on_page_test_finished", |o| o.on_page_test_finished(test, result));
    }

    fn on_action_started(&self, action: &PageAction) {
        self.each("on_action_started", |o| o.on_action_started(action));
    }

    fn on_action_finished(&self, action: &PageAction, errors: &[ValidationError]) {
        self.each("on_action_finished", |o| o.on_action_finished(action, errors));
    }

    fn on_before_section(&self, section: &PageSection) {
        self.each("on_before_section", |o| o.on_before_section(section));
    }

    fn on_after_section(&self, section: &PageSection) {
        self.each("on_after_section", |o| o.on_after_section(section));
    }

    fn on_object(&self, object: &str, depth: usize) {
        self.each("on_object", |o| o.on_object(object, depth));
    }

    fn on_after_object(&self, object: &str, depth: usize) {
        self.each("on_after_object", |o| o.on_after_object(object, depth));
    }

    fn on_constraint_success(&self, object: &str, constraint: &Constraint) {
        self.each("on_constraint_success", |o| {
            o.on_constraint_success(object, constraint);
        });
    }

    fn on_constraint_error(&self, object: &str, constraint: &Constraint, error: &ValidationError) {
        self.each("on_constraint_error", |o| {
            o.on_constraint_error(object, constraint, error);
        });
    }

    fn on_global_error(&self, error: &MedirError) {
        self.each("on_global_error", |o| o.on_global_error(error));
    }
}

/// Counts failures across all workers
#[derive(Debug, Default)]
pub struct FailureObserver {
    constraint_errors: AtomicUsize,
    global_errors: AtomicUsize,
}

impl FailureObserver {
    /// Create a new counter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Failed constraints seen so far
    #[must_use]
    pub fn constraint_errors(&self) -> usize {
        self.constraint_errors.load(Ordering::SeqCst)
    }

    /// Global errors seen so far
    #[must_use]
    pub fn global_errors(&self) -> usize {
        self.global_errors.load(Ordering::SeqCst)
    }

    /// Any failure at all
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.constraint_errors() > 0 || self.global_errors() > 0
    }
}

impl Observer for FailureObserver {
    fn on_constraint_error(&self, _object: &str, _constraint: &Constraint, _error: &ValidationError) {
        self.constraint_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_global_error(&self, _error: &MedirError) {
        self.global_errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// An observed event, as captured by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ObserverEvent {
    /// Suite started
    SuiteStarted {
        /// Suite name
        suite: String,
    },
    /// Suite finished
    SuiteFinished {
        /// Suite name
        suite: String,
        /// Whether every page test passed
        passed: bool,
    },
    /// Page test started
    PageTestStarted {
        /// Page test title
        title: String,
    },
    /// Page test finished
    PageTestFinished {
        /// Page test title
        title: String,
        /// Whether the page test passed
        passed: bool,
    },
    /// Action started
    ActionStarted {
        /// Action text
        action: String,
    },
    /// Action finished
    ActionFinished {
        /// Action text
        action: String,
        /// Number of validation errors
        errors: usize,
    },
    /// Section entered
    BeforeSection {
        /// Section tags
        tags: Vec<String>,
    },
    /// Section left
    AfterSection {
        /// Section tags
        tags: Vec<String>,
    },
    /// Object entered
    Object {
        /// Object name
        object: String,
        /// Component nesting depth
        depth: usize,
    },
    /// Object left
    AfterObject {
        /// Object name
        object: String,
        /// Component nesting depth
        depth: usize,
    },
    /// Constraint held
    ConstraintSuccess {
        /// Object name
        object: String,
        /// Constraint text
        constraint: String,
    },
    /// Constraint failed
    ConstraintError {
        /// Object name
        object: String,
        /// Constraint text
        constraint: String,
        /// Failure message
        message: String,
    },
    /// Global error
    GlobalError {
        /// Error message
        message: String,
    },
}

/// Records every event in arrival order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    #[must_use]
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().clone()
    }

    /// Recorded events serialized as JSON lines
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let events = self.events.lock();
        let mut out = String::new();
        for event in events.iter() {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }

    fn push(&self, event: ObserverEvent) {
        self.events.lock().push(event);
    }
}

impl Observer for RecordingObserver {
    fn on_suite_started(&self, suite: &Suite) {
        self.push(ObserverEvent::SuiteStarted {
            suite: suite.name.clone(),
        });
    }

    fn on_suite_finished(&self, suite: &Suite, result: &SuiteResult) {
        self.push(ObserverEvent::SuiteFinished {
            suite: suite.name.clone(),
            passed: result.passed(),
        });
    }

    fn on_page_test_started(&self, test: &PageTest) {
        self.push(ObserverEvent::PageTestStarted {
            title: test.title.clone(),
        });
    }

    fn on_page_test_finished(&self, test: &PageTest, result: &PageTestResult) {
        self.push(ObserverEvent::PageTestFinished {
            title: test.title.clone(),
            passed: result.passed(),
        });
    }

    fn on_action_started(&self, action: &PageAction) {
        self.push(ObserverEvent::ActionStarted {
            action: action.to_string(),
        });
    }

    fn on_action_finished(&self, action: &PageAction, errors: &[ValidationError]) {
        self.push(ObserverEvent::ActionFinished {
            action: action.to_string(),
            errors: errors.len(),
        });
    }

    fn on_before_section(&self, section: &PageSection) {
        self.push(ObserverEvent::BeforeSection {
            tags: section.tags.clone(),
        });
    }

    fn on_after_section(&self, section: &PageSection) {
        self.push(ObserverEvent::AfterSection {
            tags: section.tags.clone(),
        });
    }

    fn on_object(&self, object: &str, depth: usize) {
        self.push(ObserverEvent::Object {
            object: object.to_string(),
            depth,
        });
    }

    fn on_after_object(&self, object: &str, depth: usize) {
        self.push(ObserverEvent::AfterObject {
            object: object.to_string(),
            depth,
        });
    }

    fn on_constraint_success(&self, object: &str, constraint: &Constraint) {
        self.push(ObserverEvent::ConstraintSuccess {
            object: object.to_string(),
            constraint: constraint.to_string(),
        });
    }

    fn on_constraint_error(&self, object: &str, constraint: &Constraint, error: &ValidationError) {
        self.push(ObserverEvent::ConstraintError {
            object: object.to_string(),
            constraint: constraint.to_string(),
            message: error.to_string(),
        });
    }

    fn on_global_error(&self, error: &MedirError) {
        self.push(ObserverEvent::GlobalError {
            message: error.to_string(),
        });
    }
}

/// Reports progress through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_suite_started(&self, suite: &Suite) {
        info!(suite = %suite.name, page_tests = suite.page_tests.len(), "Suite started");
    }

    fn on_suite_finished(&self, suite: &Suite, result: &SuiteResult) {
        info!(suite = %suite.name, passed = result.passed(), "Suite finished");
    }

    fn on_page_test_started(&self, test: &PageTest) {
        info!(title = %test.title, "Page test started");
    }

    fn on_page_test_finished(&self, test: &PageTest, result: &PageTestResult) {
        info!(
            title = %test.title,
            errors = result.errors.len(),
            passed = result.passed(),
            "Page test finished"
        );
    }

    fn on_action_started(&self, action: &PageAction) {
        debug!(%action, "Action started");
    }

    fn on_before_section(&self, section: &PageSection) {
        debug!(tags = ?section.tags, "Section");
    }

    fn on_object(&self, object: &str, depth: usize) {
        debug!(object, depth, "Checking object");
    }

    fn on_constraint_error(&self, object: &str, constraint: &Constraint, error: &ValidationError) {
        warn!(object, %constraint, %error, "Constraint failed");
    }

    fn on_global_error(&self, error: &MedirError) {
        warn!(%error, "Page test aborted");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct PanickingObserver;

    impl Observer for PanickingObserver {
        fn on_object(&self, _object: &str, _depth: usize) {
            panic!("observer bug");
        }
    }

    #[test]
    fn test_notify_swallows_panics() {
        let mut reached = false;
        notify("test", || panic!("boom"));
        notify("test", || reached = true);
        assert!(reached);
    }

    #[test]
    fn test_combined_isolates_failing_observer() {
        let recorder = Arc::new(RecordingObserver::new());
        let combined = CombinedObserver::new()
            .with(Arc::new(PanickingObserver))
            .with(recorder.clone());
        assert_eq!(combined.len(), 2);

        combined.on_object("menu", 0);
        assert_eq!(
            recorder.events(),
            vec![ObserverEvent::Object {
                object: "menu".into(),
                depth: 0
            }]
        );
    }

    #[test]
    fn test_failure_observer_counts() {
        let observer = FailureObserver::new();
        assert!(!observer.has_failures());
        observer.on_constraint_error("menu", &Constraint::Visible, &ValidationError::new("x"));
        observer.on_global_error(&MedirError::browser("closed"));
        assert_eq!(observer.constraint_errors(), 1);
        assert_eq!(observer.global_errors(), 1);
        assert!(observer.has_failures());
    }

    #[test]
    fn test_recording_json_lines() {
        let recorder = RecordingObserver::new();
        recorder.on_constraint_success("menu", &Constraint::Visible);
        let json = recorder.to_json_lines().unwrap();
        assert_eq!(
            json,
            "{\"event\":\"constraint_success\",\"object\":\"menu\",\"constraint\":\"visible\"}\n"
        );
    }

    #[test]
    fn test_recording_is_shared_across_threads() {
        let recorder = Arc::new(RecordingObserver::new());
        std::thread::scope(|s| {
            for i in 0..4 {
                let recorder = recorder.clone();
                s.spawn(move || recorder.on_object(&format!("item-{i}"), 0));
            }
        });
        assert_eq!(recorder.events().len(), 4);
    }
}
