//! In-memory page and browser.
//!
//! Elements are registered per locator. Calls made on mock browsers are
//! recorded in a history shared by every browser a factory creates, so
//! tests can assert what a suite did after the browsers are gone.

use super::{Browser, BrowserFactory, ElementSnapshot, Page};
use crate::geometry::{Area, Size};
use crate::locator::Locator;
use crate::result::{MedirError, MedirResult};
use crate::validation::CheckError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock page for unit testing
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    elements: HashMap<Locator, ElementSnapshot>,
    counts: HashMap<Locator, usize>,
    specials: HashMap<String, ElementSnapshot>,
    sub_pages: HashMap<Locator, MockPage>,
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Page with `screen` and `viewport` special objects of the given size
    #[must_use]
    pub fn with_screen(size: Size) -> Self {
        let area = Area::new(0, 0, to_px(size.width), to_px(size.height));
        Self::new()
            .with_special("screen", ElementSnapshot::visible(area))
            .with_special("viewport", ElementSnapshot::visible(area))
    }

    /// Register an element
    #[must_use]
    pub fn with_element(mut self, locator: Locator, snapshot: ElementSnapshot) -> Self {
        self.elements.insert(locator, snapshot);
        self
    }

    /// Register a visible element
    #[must_use]
    pub fn with_visible(self, locator: Locator, area: Area) -> Self {
        self.with_element(locator, ElementSnapshot::visible(area))
    }

    /// Override the match count for a locator
    #[must_use]
    pub fn with_count(mut self, locator: Locator, count: usize) -> Self {
        self.counts.insert(locator, count);
        self
    }

    /// Register a special object
    #[must_use]
    pub fn with_special(mut self, name: impl Into<String>, snapshot: ElementSnapshot) -> Self {
        self.specials.insert(name.into(), snapshot);
        self
    }

    /// Register an explicit sub-page for a locator
    #[must_use]
    pub fn with_sub_page(mut self, locator: Locator, page: MockPage) -> Self {
        self.sub_pages.insert(locator, page);
        self
    }

    /// Number of registered elements
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn scoped(&self, origin: &Area) -> MockPage {
        let shift = |map: &HashMap<Locator, ElementSnapshot>| {
            map.iter()
                .map(|(locator, snapshot)| (locator.clone(), snapshot.relative_to(origin)))
                .collect()
        };
        MockPage {
            elements: shift(&self.elements),
            counts: self.counts.clone(),
            specials: self
                .specials
                .iter()
                .map(|(name, snapshot)| (name.clone(), snapshot.relative_to(origin)))
                .collect(),
            sub_pages: HashMap::new(),
        }
    }
}

fn to_px(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl Page for MockPage {
    fn resolve(&self, locator: &Locator) -> ElementSnapshot {
        self.elements
            .get(locator)
            .cloned()
            .unwrap_or_else(ElementSnapshot::absent)
    }

    fn count_matches(&self, locator: &Locator) -> usize {
        self.counts
            .get(locator)
            .copied()
            .unwrap_or_else(|| usize::from(self.elements.contains_key(locator)))
    }

    fn scoped_sub_page(&self, locator: &Locator) -> Result<Box<dyn Page>, CheckError> {
        if let Some(page) = self.sub_pages.get(locator) {
            return Ok(Box::new(page.clone()));
        }
        let element = self.resolve(locator);
        if !element.present {
            return Err(CheckError::SubPageUnavailable {
                locator: locator.to_string(),
            });
        }
        Ok(Box::new(self.scoped(&element.area)))
    }

    fn special_element(&self, name: &str) -> Option<ElementSnapshot> {
        self.specials.get(name).cloned()
    }
}

/// Mock browser serving [`MockPage`]s by URL
#[derive(Debug, Clone)]
pub struct MockBrowser {
    pages: HashMap<String, MockPage>,
    blank: MockPage,
    failing_urls: Vec<String>,
    current_url: String,
    size: Size,
    history: Arc<Mutex<Vec<String>>>,
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
            blank: MockPage::new(),
            failing_urls: Vec::new(),
            current_url: "about:blank".to_string(),
            size: Size::new(1024, 768),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockBrowser {
    /// Create new mock browser
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `page` at `url`
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, page: MockPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Make `open(url)` fail
    #[must_use]
    pub fn with_failing_url(mut self, url: impl Into<String>) -> Self {
        self.failing_urls.push(url.into());
        self
    }

    /// Recorded calls, e.g. `open:http://x`, `resize:800x600`
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history.lock().iter().any(|c| c.starts_with(method))
    }

    fn record(&self, call: String) {
        self.history.lock().push(call);
    }
}

impl Browser for MockBrowser {
    fn open(&mut self, url: &str) -> MedirResult<()> {
        self.record(format!("open:{url}"));
        if self.failing_urls.iter().any(|u| u == url) {
            return Err(MedirError::browser(format!("Cannot open {url}")));
        }
        self.current_url = url.to_string();
        Ok(())
    }

    fn current_url(&self) -> String {
        self.current_url.clone()
    }

    fn viewport_size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) -> MedirResult<()> {
        self.record(format!("resize:{size}"));
        self.size = size;
        Ok(())
    }

    fn set_cookies(&mut self, cookies: &[String]) -> MedirResult<()> {
        for cookie in cookies {
            self.record(format!("cookie:{cookie}"));
        }
        Ok(())
    }

    fn run_script(
        &mut self,
        code: &str,
        json_args: Option<&serde_json::Value>,
    ) -> MedirResult<serde_json::Value> {
        let args = json_args.map_or_else(String::new, ToString::to_string);
        self.record(format!("run:{}:{args}", code.len()));
        Ok(serde_json::Value::Null)
    }

    fn inject_script(&mut self, code: &str) -> MedirResult<()> {
        self.record(format!("inject:{}", code.len()));
        Ok(())
    }

    fn capture_screenshot(&mut self) -> MedirResult<PathBuf> {
        self.record("screenshot".to_string());
        Ok(PathBuf::from("mock-screenshot.png"))
    }

    fn page(&self) -> &dyn Page {
        self.pages.get(&self.current_url).unwrap_or(&self.blank)
    }
}

/// Factory handing out clones of a template [`MockBrowser`]
#[derive(Debug, Default)]
pub struct MockBrowserFactory {
    template: MockBrowser,
    created: AtomicUsize,
}

impl MockBrowserFactory {
    /// Create a factory from a template browser
    #[must_use]
    pub fn new(template: MockBrowser) -> Self {
        Self {
            template,
            created: AtomicUsize::new(0),
        }
    }

    /// Number of browsers created so far
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Calls recorded by every browser created by this factory
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.template.history()
    }
}

impl BrowserFactory for MockBrowserFactory {
    fn create(&self) -> MedirResult<Box<dyn Browser>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.template.clone()))
    }
}
