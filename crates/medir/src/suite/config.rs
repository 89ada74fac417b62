//! Executor configuration.

use crate::result::{MedirError, MedirResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;

/// How suites are scheduled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Worker count; 1 runs sequentially, 0 uses every available core
    pub parallel_suites: usize,
    /// Suite name glob. Unlike object-name patterns, `*` here matches any
    /// run of characters, spaces and punctuation included, as suite filters
    /// always have.
    pub filter: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel_suites: 1,
            filter: None,
        }
    }
}

impl ExecutorConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }

    /// Read from YAML
    ///
    /// # Errors
    ///
    /// Returns error if the YAML is malformed
    pub fn from_yaml(yaml: &str) -> MedirResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read from a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_yaml_file(path: &Path) -> MedirResult<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Worker count with 0 resolved to the machine's parallelism
    #[must_use]
    pub fn effective_parallelism(&self) -> usize {
        match self.parallel_suites {
            0 => thread::available_parallelism().map_or(1, NonZeroUsize::get),
            n => n,
        }
    }

    /// Compiled suite filter; the whole name must match
    ///
    /// # Errors
    ///
    /// Returns error if the filter does not compile
    pub fn filter_pattern(&self) -> MedirResult<Option<Regex>> {
        let Some(filter) = &self.filter else {
            return Ok(None);
        };
        let body = filter
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Regex::new(&format!("^{body}$"))
            .map(Some)
            .map_err(|e| MedirError::invalid_config(format!("Bad suite filter {filter:?}: {e}")))
    }
}

/// Builder for [`ExecutorConfig`]
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set the worker count
    #[must_use]
    pub fn parallelism(mut self, workers: usize) -> Self {
        self.config.parallel_suites = workers;
        self
    }

    /// Only run suites whose name matches `glob`
    #[must_use]
    pub fn filter(mut self, glob: impl Into<String>) -> Self {
        self.config.filter = Some(glob.into());
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}
