//! YAML suite catalogs.
//!
//! Actions are written in their text form and parsed with
//! [`parse_action`]; relative script and spec paths are resolved against
//! the catalog's directory.

use super::action_reader::parse_action;
use super::{PageTest, Suite};
use crate::geometry::Size;
use crate::result::{MedirError, MedirResult, SyntaxError};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    suites: Vec<SuiteDocument>,
}

#[derive(Debug, Deserialize)]
struct SuiteDocument {
    name: String,
    #[serde(default)]
    page_tests: Vec<PageTestDocument>,
}

#[derive(Debug, Deserialize)]
struct PageTestDocument {
    title: String,
    url: Option<String>,
    size: Option<String>,
    #[serde(default)]
    actions: Vec<String>,
}

/// Suites loaded from a catalog file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteCatalog {
    /// Suites in file order
    pub suites: Vec<Suite>,
}

impl SuiteCatalog {
    /// Parse a catalog; relative paths in actions join `base_dir`
    ///
    /// # Errors
    ///
    /// Returns error if the YAML is malformed or an action or size does not
    /// parse
    pub fn from_yaml(yaml: &str, base_dir: Option<&Path>) -> MedirResult<Self> {
        let document: CatalogDocument = serde_yaml_ng::from_str(yaml)?;
        let suites = document
            .suites
            .into_iter()
            .map(|suite| suite_from(suite, base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { suites })
    }

    /// Read a catalog file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> MedirResult<Self> {
        debug!(path = %path.display(), "Reading suite catalog");
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml, path.parent()).map_err(|error| match error {
            MedirError::Syntax(syntax) => syntax.in_file(path).into(),
            other => other,
        })
    }

    /// Number of suites
    #[must_use]
    pub fn len(&self) -> usize {
        self.suites.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

fn suite_from(document: SuiteDocument, base_dir: Option<&Path>) -> Result<Suite, SyntaxError> {
    let page_tests = document
        .page_tests
        .into_iter()
        .map(|test| page_test_from(test, base_dir))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            SyntaxError::unknown_line(format!("In suite \"{}\": {}", document.name, e.message()))
                .with_source(e)
        })?;
    Ok(Suite {
        name: document.name,
        page_tests,
    })
}

fn page_test_from(
    document: PageTestDocument,
    base_dir: Option<&Path>,
) -> Result<PageTest, SyntaxError> {
    let size = document.size.as_deref().map(Size::parse).transpose()?;
    let actions = document
        .actions
        .iter()
        .map(|text| parse_action(text, base_dir))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PageTest {
        title: document.title,
        url: document.url,
        size,
        actions,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::suite::PageAction;
    use std::path::PathBuf;

    const CATALOG: &str = r#"
suites:
  - name: Home page
    page_tests:
      - title: Home on desktop
        url: http://example.com
        size: 1024x768
        actions:
          - cookie "lang=en"
          - check home.spec --include desktop
  - name: Empty
"#;

    #[test]
    fn test_from_yaml() {
        let catalog = SuiteCatalog::from_yaml(CATALOG, Some(Path::new("/suites"))).unwrap();
        assert_eq!(catalog.len(), 2);

        let home = &catalog.suites[0];
        assert_eq!(home.name, "Home page");
        let test = &home.page_tests[0];
        assert_eq!(test.size, Some(Size::new(1024, 768)));
        assert_eq!(test.url.as_deref(), Some("http://example.com"));
        assert_eq!(
            test.actions[0],
            PageAction::Cookie {
                cookies: vec!["lang=en".into()]
            }
        );
        assert_eq!(
            test.actions[1].spec_paths(),
            &[PathBuf::from("/suites/home.spec")]
        );
        assert!(catalog.suites[1].page_tests.is_empty());
    }

    #[test]
    fn test_bad_action_names_suite() {
        let yaml = "suites:\n  - name: Broken\n    page_tests:\n      - title: t\n        actions:\n          - fly away\n";
        let err = SuiteCatalog::from_yaml(yaml, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Syntax error: In suite \"Broken\": Unknown action: fly"
        );
    }

    #[test]
    fn test_from_file_stamps_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suites.yaml");
        std::fs::write(&path, "suites:\n  - name: S\n    page_tests:\n      - title: t\n        size: big\n").unwrap();
        let err = SuiteCatalog::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("suites.yaml"));
        assert!(err.to_string().contains("Incorrect size: big"));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(SuiteCatalog::from_yaml("suites: [", None).is_err());
    }
}
