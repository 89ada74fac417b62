//! Medir: layout assertions for rendered pages
//!
//! Medir (Spanish: "to measure") checks where things are on a page. A
//! plain-text spec declares objects by locator and lists constraints such
//! as `inside: header 10px left` or `above: footer 20 to 40px`; the
//! validation engine measures the live page and reports every violated
//! side or dimension.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ spec text    │───►│ PageSpec     │───►│ validation   │──► Vec<ValidationError>
//! │ (reader)     │    │ (spec)       │    │ (+ Page)     │
//! └──────────────┘    └──────────────┘    └──────┬───────┘
//!                                                │ events
//! ┌──────────────┐    ┌──────────────┐    ┌──────▼───────┐
//! │ Suite        │───►│ SuiteExecutor│───►│ Observer     │
//! │ (catalog)    │    │ (workers)    │    │              │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use medir::prelude::*;
//!
//! let spec = PageSpecReader::new()
//!     .read_str("===\nmenu css #menu\n===\nmenu\n    width: 100 to 200px\n")
//!     .unwrap();
//! let page = MockPage::new().with_visible(Locator::css("#menu"), Area::new(0, 0, 250, 40));
//!
//! let errors = validate(&spec, &page, &SectionFilter::all(), &NoopObserver);
//! assert_eq!(errors[0].messages, vec!["\"menu\" width is 250px instead of 100 to 200px"]);
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod geometry;
pub mod locator;
pub mod observer;
pub mod page;
pub mod reader;
mod result;
pub mod spec;
pub mod suite;
pub mod validation;

pub use geometry::{Area, Point, Size};
pub use locator::{Locator, Strategy};
pub use observer::{
    notify, CombinedObserver, FailureObserver, NoopObserver, Observer, ObserverEvent,
    RecordingObserver, TracingObserver,
};
pub use page::mock::{MockBrowser, MockBrowserFactory, MockPage};
pub use page::{Browser, BrowserFactory, ElementSnapshot, Page};
pub use reader::{parse_constraint, PageSpecReader};
pub use result::{MedirError, MedirResult, SyntaxError, UNKNOWN_LINE};
pub use spec::{
    ConditionalBlock, ConditionalStatement, Constraint, Location, ObjectSpecs, ObjectTable,
    PageSection, PageSpec, Range, SectionFilter, Side,
};
pub use suite::{
    parse_action, CheckAction, ExecutorConfig, PageAction, PageTest, PageTestResult, RunSummary,
    Suite, SuiteCatalog, SuiteExecutor, SuiteResult, SuiteRunner,
};
pub use validation::{validate, validate_silently, CheckError, PageValidation, ValidationError};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::geometry::*;
    pub use super::locator::*;
    pub use super::observer::*;
    pub use super::page::mock::*;
    pub use super::page::*;
    pub use super::reader::PageSpecReader;
    pub use super::result::*;
    pub use super::spec::*;
    pub use super::suite::*;
    pub use super::validation::*;
}
