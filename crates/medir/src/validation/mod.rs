//! Validation engine.
//!
//! Walks a [`PageSpec`] against a live [`Page`]:
//!
//! 1. sections are filtered by tags and visited in document order;
//! 2. multi-objects are re-resolved into a per-pass object table, leaving
//!    the shared spec untouched;
//! 3. every object group expands its name pattern, and each constraint of
//!    each resolved object is handed to its checker;
//! 4. conditional blocks evaluate their statements silently and then check
//!    either the body or the otherwise branch.
//!
//! Silent passes emit no observer events and never contribute to the
//! returned errors.

mod checks;
mod error;

pub use error::{CheckError, ValidationError};

use crate::locator::Locator;
use crate::observer::{notify, Observer};
use crate::page::{ElementSnapshot, Page};
use crate::spec::{
    is_multi_object, ConditionalBlock, ConditionalStatement, ObjectSpecs, ObjectTable, PageSpec,
    SectionFilter,
};
use error::Failure;
use regex::Regex;
use std::borrow::Cow;
use tracing::debug;

/// Validate `spec` against `page`, reporting events to `observer`
#[must_use]
pub fn validate(
    spec: &PageSpec,
    page: &dyn Page,
    filter: &SectionFilter,
    observer: &dyn Observer,
) -> Vec<ValidationError> {
    PageValidation::new(spec, page, filter, observer).run()
}

/// Like [`validate`] but without events
#[must_use]
pub fn validate_silently(
    spec: &PageSpec,
    page: &dyn Page,
    filter: &SectionFilter,
    observer: &dyn Observer,
) -> Vec<ValidationError> {
    PageValidation::new(spec, page, filter, observer).run_silently()
}

/// One validation pass over one page
pub struct PageValidation<'a> {
    spec: &'a PageSpec,
    objects: Cow<'a, ObjectTable>,
    page: &'a dyn Page,
    filter: &'a SectionFilter,
    observer: &'a dyn Observer,
    depth: usize,
}

impl std::fmt::Debug for PageValidation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageValidation")
            .field("objects", &self.objects.len())
            .field("filter", self.filter)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<'a> PageValidation<'a> {
    /// Prepare a pass, resolving multi-objects against the page
    #[must_use]
    pub fn new(
        spec: &'a PageSpec,
        page: &'a dyn Page,
        filter: &'a SectionFilter,
        observer: &'a dyn Observer,
    ) -> Self {
        Self {
            spec,
            objects: resolve_objects(&spec.objects, page),
            page,
            filter,
            observer,
            depth: 0,
        }
    }

    /// Set the component nesting depth reported to observers
    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Object table used by this pass
    #[must_use]
    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// Run every matching section and collect the reported failures
    #[must_use]
    pub fn run(&self) -> Vec<ValidationError> {
        self.run_sections(false)
    }

    /// Run without observer events
    #[must_use]
    pub fn run_silently(&self) -> Vec<ValidationError> {
        self.run_sections(true)
    }

    fn run_sections(&self, silent: bool) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for section in self
            .spec
            .sections
            .iter()
            .filter(|section| self.filter.accepts(&section.tags))
        {
            debug!(tags = ?section.tags, depth = self.depth, silent, "Validating section");
            if !silent {
                notify("on_before_section", || self.observer.on_before_section(section));
            }

            errors.extend(self.check_groups(&section.objects, silent));
            for block in &section.conditional_blocks {
                errors.extend(self.check_conditional_block(block, silent));
            }

            if !silent {
                notify("on_after_section", || self.observer.on_after_section(section));
            }
        }
        errors
    }

    fn check_conditional_block(&self, block: &ConditionalBlock, silent: bool) -> Vec<ValidationError> {
        if block.statements.iter().any(|s| self.statement_holds(s)) {
            self.check_groups(&block.body, silent)
        } else if let Some(otherwise) = &block.otherwise {
            self.check_groups(otherwise, silent)
        } else {
            Vec::new()
        }
    }

    fn statement_holds(&self, statement: &ConditionalStatement) -> bool {
        let passed = self.check_groups(&statement.objects, true).is_empty();
        passed != statement.inverted
    }

    fn check_groups(&self, groups: &[ObjectSpecs], silent: bool) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for group in groups {
            match self.expand_pattern(&group.object_name) {
                Ok(names) => {
                    for name in names {
                        errors.extend(self.check_object(&name, group, silent));
                    }
                }
                Err(error) => {
                    debug!(pattern = %group.object_name, %error, "Bad object pattern");
                    errors.push(ValidationError::from(&error));
                }
            }
        }
        errors
    }

    fn check_object(&self, name: &str, group: &ObjectSpecs, silent: bool) -> Vec<ValidationError> {
        if !silent {
            notify("on_object", || self.observer.on_object(name, self.depth));
        }

        let mut errors = Vec::new();
        for constraint in &group.constraints {
            let (error, fatal) = match checks::check(self, name, constraint, silent) {
                Ok(()) => {
                    if !silent {
                        notify("on_constraint_success", || {
                            self.observer.on_constraint_success(name, constraint);
                        });
                    }
                    continue;
                }
                Err(Failure::Invalid(error)) => (error, false),
                Err(Failure::Fatal(error)) => (ValidationError::from(&error), true),
            };

            debug!(object = name, %constraint, %error, "Constraint failed");
            if !silent {
                notify("on_constraint_error", || {
                    self.observer.on_constraint_error(name, constraint, &error);
                });
            }
            errors.push(error);
            if fatal {
                break;
            }
        }

        if !silent {
            notify("on_after_object", || self.observer.on_after_object(name, self.depth));
        }
        errors
    }

    /// Expand `menu`, `menu, footer` or `item-*` into object names.
    ///
    /// `*` matches one or more word characters and only matches declared
    /// objects, in declaration order and without duplicates. Literal names
    /// are returned as written.
    ///
    /// # Errors
    ///
    /// Returns error if a glob does not compile
    pub fn expand_pattern(&self, pattern: &str) -> Result<Vec<String>, CheckError> {
        let mut names: Vec<String> = Vec::new();
        for part in pattern.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.contains('*') {
                let regex = glob_regex(part)?;
                for name in self.objects.names() {
                    if regex.is_match(name) && !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
            } else if !names.iter().any(|n| n == part) {
                names.push(part.to_string());
            }
        }
        Ok(names)
    }

    /// Locator of a declared object
    ///
    /// # Errors
    ///
    /// Returns error if the object is not declared
    pub fn locator(&self, name: &str) -> Result<&Locator, CheckError> {
        self.objects
            .get(name)
            .ok_or_else(|| CheckError::MissingLocator {
                object: name.to_string(),
            })
    }

    /// Look up an object by name, falling back to special page objects
    ///
    /// # Errors
    ///
    /// Returns error if the name is neither declared nor special
    pub fn find_object(&self, name: &str) -> Result<ElementSnapshot, CheckError> {
        if let Some(locator) = self.objects.get(name) {
            return Ok(self.page.resolve(locator));
        }
        self.page
            .special_element(name)
            .ok_or_else(|| CheckError::MissingLocator {
                object: name.to_string(),
            })
    }
}

/// Compile an object-name glob; `*` stands for `[A-Za-z0-9_]+`
fn glob_regex(pattern: &str) -> Result<Regex, CheckError> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[A-Za-z0-9_]+");
    Regex::new(&format!("^{body}$")).map_err(|source| CheckError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Per-pass object table with multi-objects expanded to `name-1..=n`
fn resolve_objects<'a>(objects: &'a ObjectTable, page: &dyn Page) -> Cow<'a, ObjectTable> {
    if !objects.has_multi_objects() {
        return Cow::Borrowed(objects);
    }
    let mut resolved = ObjectTable::new();
    for (name, locator) in objects.iter() {
        if is_multi_object(name) {
            let count = page.count_matches(locator);
            debug!(object = name, count, "Resolved multi-object");
            for index in 1..=count {
                resolved.insert(
                    name.replace('*', &index.to_string()),
                    locator.clone().with_index(index),
                );
            }
        } else {
            resolved.insert(name, locator.clone());
        }
    }
    Cow::Owned(resolved)
}
