//! Parallel suite execution.
//!
//! Suites selected by the name filter are queued on a channel and pulled
//! by a fixed number of scoped worker threads. Workers share the browser
//! factory and the observer; results are put back into catalog order
//! once every worker has joined.

use super::runner::{aborted, SuiteResult, SuiteRunner};
use super::{ExecutorConfig, Suite};
use crate::observer::{notify, Observer};
use crate::page::BrowserFactory;
use crate::result::{MedirError, MedirResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Aggregated outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Results of executed suites, in catalog order
    pub results: Vec<SuiteResult>,
    /// Names of suites rejected by the filter
    pub skipped: Vec<String>,
}

impl RunSummary {
    /// Every executed suite passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(SuiteResult::passed)
    }

    /// Number of suites that ran
    #[must_use]
    pub fn executed_count(&self) -> usize {
        self.results.len()
    }

    /// Number of suites that failed
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }
}

/// Runs suites according to an [`ExecutorConfig`]
pub struct SuiteExecutor {
    config: ExecutorConfig,
    factory: Arc<dyn BrowserFactory>,
    observer: Arc<dyn Observer>,
}

impl std::fmt::Debug for SuiteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SuiteExecutor {
    /// Create an executor
    #[must_use]
    pub fn new(
        config: ExecutorConfig,
        factory: Arc<dyn BrowserFactory>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            config,
            factory,
            observer,
        }
    }

    /// Executor configuration
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Check that every spec file referenced by a `check` action exists
    ///
    /// # Errors
    ///
    /// Returns the first missing spec file
    pub fn verify(&self, suites: &[Suite]) -> MedirResult<()> {
        let missing = suites
            .iter()
            .flat_map(|suite| &suite.page_tests)
            .flat_map(|test| &test.actions)
            .flat_map(|action| action.spec_paths())
            .find(|path| !path.is_file());
        match missing {
            Some(path) => Err(MedirError::SpecNotFound { path: path.clone() }),
            None => Ok(()),
        }
    }

    /// Verify, filter and run `suites`.
    ///
    /// Validation failures and page-test errors end up in the summary; only
    /// problems detected before any suite starts are returned as `Err`.
    ///
    /// # Errors
    ///
    /// Returns error if a spec file is missing or the filter is invalid
    pub fn run(&self, suites: &[Suite]) -> MedirResult<RunSummary> {
        let filter = match self.verify(suites).and_then(|()| self.config.filter_pattern()) {
            Ok(filter) => filter,
            Err(error) => {
                notify("on_global_error", || self.observer.on_global_error(&error));
                return Err(error);
            }
        };

        let mut selected = Vec::new();
        let mut skipped = Vec::new();
        for (index, suite) in suites.iter().enumerate() {
            if filter.as_ref().map_or(true, |f| f.is_match(&suite.name)) {
                selected.push((index, suite));
            } else {
                debug!(suite = %suite.name, "Suite skipped by filter");
                skipped.push(suite.name.clone());
            }
        }

        let workers = self.config.effective_parallelism();
        info!(
            selected = selected.len(),
            skipped = skipped.len(),
            workers,
            "Running suites"
        );
        let results = if workers > 1 {
            self.run_parallel(selected, workers)
        } else {
            let runner = self.runner();
            selected
                .into_iter()
                .map(|(_, suite)| run_isolated(&runner, suite))
                .collect()
        };
        Ok(RunSummary { results, skipped })
    }

    fn runner(&self) -> SuiteRunner<'_> {
        SuiteRunner::new(self.factory.as_ref(), self.observer.as_ref())
    }

    fn run_parallel(&self, selected: Vec<(usize, &Suite)>, workers: usize) -> Vec<SuiteResult> {
        let workers = worker_count(workers, selected.len());
        let (sender, receiver) = crossbeam_channel::unbounded();
        for job in selected {
            // the receiver is alive until the scope below ends
            let _ = sender.send(job);
        }
        drop(sender);

        let finished = Mutex::new(Vec::new());
        thread::scope(|scope| {
            for worker in 0..workers {
                let receiver = receiver.clone();
                let finished = &finished;
                scope.spawn(move || {
                    debug!(worker, "Worker started");
                    let runner = self.runner();
                    for (index, suite) in receiver.iter() {
                        let result = run_isolated(&runner, suite);
                        finished.lock().push((index, result));
                    }
                    debug!(worker, "Worker finished");
                });
            }
        });

        let mut finished = finished.into_inner();
        finished.sort_by_key(|(index, _)| *index);
        finished.into_iter().map(|(_, result)| result).collect()
    }
}

/// Threads worth spawning for `jobs` queued suites
fn worker_count(workers: usize, jobs: usize) -> usize {
    workers.min(jobs)
}

/// Run a suite, turning a panic inside it into a failed result
fn run_isolated(runner: &SuiteRunner<'_>, suite: &Suite) -> SuiteResult {
    panic::catch_unwind(AssertUnwindSafe(|| runner.run_suite(suite))).unwrap_or_else(|_| {
        warn!(suite = %suite.name, "Suite panicked");
        aborted(suite, &MedirError::browser("Suite panicked"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::observer::{FailureObserver, NoopObserver};
    use crate::page::mock::{MockBrowser, MockBrowserFactory};
    use crate::page::Browser;
    use crate::suite::{CheckAction, PageAction, PageTest, PageTestResult};

    fn suite(name: &str) -> Suite {
        Suite::new(name).with_page_test(PageTest::new(name).with_url(format!("http://{name}/")))
    }

    fn executor(config: ExecutorConfig, factory: Arc<MockBrowserFactory>) -> SuiteExecutor {
        SuiteExecutor::new(config, factory, Arc::new(NoopObserver))
    }

    mod worker_tests {
        use super::*;

        #[test]
        fn test_worker_count_capped_by_jobs() {
            assert_eq!(worker_count(8, 3), 3);
            assert_eq!(worker_count(2, 5), 2);
            assert_eq!(worker_count(4, 0), 0);
        }
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let summary = RunSummary {
                results: vec![
                    SuiteResult {
                        name: "a".into(),
                        page_tests: vec![],
                    },
                    SuiteResult {
                        name: "b".into(),
                        page_tests: vec![PageTestResult {
                            title: "t".into(),
                            errors: vec![],
                            fatal: Some("boom".into()),
                        }],
                    },
                ],
                skipped: vec!["c".into()],
            };
            assert_eq!(summary.executed_count(), 2);
            assert_eq!(summary.failed_count(), 1);
            assert!(!summary.all_passed());
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_sequential_keeps_order() {
            let factory = Arc::new(MockBrowserFactory::new(MockBrowser::new()));
            let suites = vec![suite("a"), suite("b"), suite("c")];
            let summary = executor(ExecutorConfig::default(), factory.clone())
                .run(&suites)
                .unwrap();
            assert!(summary.all_passed());
            assert_eq!(
                factory.history(),
                vec!["open:http://a/", "open:http://b/", "open:http://c/"]
            );
        }

        #[test]
        fn test_parallel_filtered_in_catalog_order() {
            let factory = Arc::new(MockBrowserFactory::new(MockBrowser::new()));
            let suites: Vec<_> = ["Home 1", "Login", "Home 2", "Search", "Home 3"]
                .into_iter()
                .map(suite)
                .collect();
            let config = ExecutorConfig::builder().parallelism(2).filter("Home*").build();
            let summary = executor(config, factory.clone()).run(&suites).unwrap();

            assert_eq!(summary.executed_count(), 3);
            assert_eq!(summary.skipped, vec!["Login", "Search"]);
            let names: Vec<_> = summary.results.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["Home 1", "Home 2", "Home 3"]);
            assert_eq!(factory.created_count(), 3);
        }

        #[test]
        fn test_more_workers_than_suites() {
            let factory = Arc::new(MockBrowserFactory::new(MockBrowser::new()));
            let suites = vec![suite("only")];
            let config = ExecutorConfig::builder().parallelism(16).build();
            let summary = executor(config, factory.clone()).run(&suites).unwrap();
            assert_eq!(summary.executed_count(), 1);
            assert_eq!(factory.created_count(), 1);

            let empty = executor(ExecutorConfig::builder().parallelism(4).build(), factory)
                .run(&[])
                .unwrap();
            assert_eq!(empty.executed_count(), 0);
        }

        #[test]
        fn test_failing_suite_does_not_stop_siblings() {
            let factory = Arc::new(MockBrowserFactory::new(
                MockBrowser::new().with_failing_url("http://bad/"),
            ));
            let observer = Arc::new(FailureObserver::new());
            let suites = vec![suite("good"), suite("bad"), suite("fine")];
            let config = ExecutorConfig::builder().parallelism(3).build();
            let summary = SuiteExecutor::new(config, factory, observer.clone())
                .run(&suites)
                .unwrap();
            assert_eq!(summary.executed_count(), 3);
            assert_eq!(summary.failed_count(), 1);
            assert!(!summary.results[1].passed());
            assert_eq!(observer.global_errors(), 1);
        }

        #[test]
        fn test_missing_spec_fails_before_running() {
            let factory = Arc::new(MockBrowserFactory::new(MockBrowser::new()));
            let observer = Arc::new(FailureObserver::new());
            let suites = vec![Suite::new("s").with_page_test(
                PageTest::new("t").with_action(PageAction::Check(CheckAction::new(vec![
                    "/no/such/file.spec".into(),
                ]))),
            )];
            let executor = SuiteExecutor::new(ExecutorConfig::default(), factory.clone(), observer.clone());
            let err = executor.run(&suites).unwrap_err();
            assert!(matches!(err, MedirError::SpecNotFound { .. }));
            assert_eq!(factory.created_count(), 0);
            assert_eq!(observer.global_errors(), 1);
        }

        struct PanickingFactory;

        impl BrowserFactory for PanickingFactory {
            fn create(&self) -> MedirResult<Box<dyn Browser>> {
                panic!("driver crashed");
            }
        }

        #[test]
        fn test_panicking_suite_is_isolated() {
            let suites = vec![suite("a"), suite("b")];
            let executor = SuiteExecutor::new(
                ExecutorConfig::builder().parallelism(2).build(),
                Arc::new(PanickingFactory),
                Arc::new(NoopObserver),
            );
            let summary = executor.run(&suites).unwrap();
            assert_eq!(summary.failed_count(), 2);
        }
    }
}
