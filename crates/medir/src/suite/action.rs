//! Page actions.

use crate::geometry::Size;
use crate::observer::Observer;
use crate::page::Browser;
use crate::reader::PageSpecReader;
use crate::result::{MedirError, MedirResult};
use crate::spec::SectionFilter;
use crate::validation::{validate, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate the current page against spec files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAction {
    /// Spec files, checked in order
    pub specs: Vec<PathBuf>,
    /// Section tag filter
    pub filter: SectionFilter,
}

impl CheckAction {
    /// Check the given specs with every section enabled
    #[must_use]
    pub fn new(specs: Vec<PathBuf>) -> Self {
        Self {
            specs,
            filter: SectionFilter::all(),
        }
    }

    /// Restrict sections by tags
    #[must_use]
    pub fn with_filter(mut self, filter: SectionFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// One step of a page test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    /// Navigate to a URL
    Open {
        /// Target URL
        url: String,
    },
    /// Resize the browser window
    Resize {
        /// New size
        size: Size,
    },
    /// Set cookies
    Cookie {
        /// Cookies in `name=value; attributes` form
        cookies: Vec<String>,
    },
    /// Inject a script file into the page
    Inject {
        /// Script file
        script_path: PathBuf,
    },
    /// Run a script file with optional JSON arguments
    Run {
        /// Script file
        script_path: PathBuf,
        /// Raw JSON arguments
        json_args: Option<String>,
    },
    /// Validate the page
    Check(CheckAction),
}

impl PageAction {
    /// Spec files this action reads
    #[must_use]
    pub fn spec_paths(&self) -> &[PathBuf] {
        match self {
            Self::Check(check) => &check.specs,
            _ => &[],
        }
    }

    /// Run the action against `browser`.
    ///
    /// Only `check` produces validation errors; every other action either
    /// succeeds with none or fails.
    ///
    /// # Errors
    ///
    /// Returns error if the browser rejects the action, a script or spec
    /// file cannot be read, or script arguments are not valid JSON
    pub fn execute(
        &self,
        browser: &mut dyn Browser,
        observer: &dyn Observer,
    ) -> MedirResult<Vec<ValidationError>> {
        match self {
            Self::Open { url } => browser.open(url)?,
            Self::Resize { size } => browser.resize(*size)?,
            Self::Cookie { cookies } => browser.set_cookies(cookies)?,
            Self::Inject { script_path } => {
                let code = read_script(script_path)?;
                browser.inject_script(&code)?;
            }
            Self::Run {
                script_path,
                json_args,
            } => {
                let code = read_script(script_path)?;
                let args = json_args
                    .as_deref()
                    .map(serde_json::from_str::<serde_json::Value>)
                    .transpose()?;
                let value = browser.run_script(&code, args.as_ref())?;
                debug!(script = %script_path.display(), %value, "Script finished");
            }
            Self::Check(check) => {
                let reader = PageSpecReader::new();
                let mut errors = Vec::new();
                for path in &check.specs {
                    let spec = reader.read_file(path)?;
                    errors.extend(validate(&spec, browser.page(), &check.filter, observer));
                }
                return Ok(errors);
            }
        }
        Ok(Vec::new())
    }
}

fn read_script(path: &Path) -> MedirResult<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MedirError::browser(format!("Script file not found: {}", path.display()))
        } else {
            MedirError::Io(e)
        }
    })
}

/// Quote an argument so [`super::split_arguments`] reads it back whole
fn write_argument(f: &mut fmt::Formatter<'_>, arg: &str) -> fmt::Result {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        return f.write_str(arg);
    }
    f.write_str("\"")?;
    for c in arg.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &Path) -> fmt::Result {
    write_argument(f, &path.display().to_string())
}

impl fmt::Display for PageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { url } => {
                f.write_str("open ")?;
                write_argument(f, url)
            }
            Self::Resize { size } => write!(f, "resize {size}"),
            Self::Cookie { cookies } => {
                f.write_str("cookie")?;
                for cookie in cookies {
                    f.write_str(" ")?;
                    write_argument(f, cookie)?;
                }
                Ok(())
            }
            Self::Inject { script_path } => {
                f.write_str("inject ")?;
                write_path(f, script_path)
            }
            Self::Run {
                script_path,
                json_args,
            } => {
                f.write_str("run ")?;
                write_path(f, script_path)?;
                if let Some(args) = json_args {
                    f.write_str(" ")?;
                    write_argument(f, args)?;
                }
                Ok(())
            }
            Self::Check(check) => {
                f.write_str("check")?;
                for spec in &check.specs {
                    f.write_str(" ")?;
                    write_path(f, spec)?;
                }
                if !check.filter.include.is_empty() {
                    write!(f, " --include {}", check.filter.include.join(","))?;
                }
                if !check.filter.exclude.is_empty() {
                    write!(f, " --exclude {}", check.filter.exclude.join(","))?;
                }
                Ok(())
            }
        }
    }
}
