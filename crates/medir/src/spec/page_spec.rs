//! The parsed specification document.
//!
//! A [`PageSpec`] is built once by the reader and then only read. The
//! `Display` impl writes it back as spec text that parses to an equal
//! document.

use super::constraint::Constraint;
use crate::locator::Locator;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

const OBJECT_BLOCK_MARKER: &str = "==========================================";
const INDENT: &str = "    ";

/// Insertion-ordered object name → locator table.
///
/// Re-inserting an existing name replaces its locator in place, so
/// declaration order stays stable across imports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTable {
    entries: IndexMap<String, Locator>,
}

impl ObjectTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, name: impl Into<String>, locator: Locator) {
        self.entries.insert(name.into(), locator);
    }

    /// Look up a locator by object name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Locator> {
        self.entries.get(name)
    }

    /// Check whether a name is declared
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Object names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Locator)> {
        self.entries.iter().map(|(n, l)| (n.as_str(), l))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry is a multi-object (`name-*`) resolved per pass
    #[must_use]
    pub fn has_multi_objects(&self) -> bool {
        self.entries.keys().any(|n| is_multi_object(n))
    }

    /// Merge another table; its entries replace same-name entries
    pub fn merge(&mut self, other: ObjectTable) {
        for (name, locator) in other.entries {
            self.insert(name, locator);
        }
    }
}

/// Multi-object names contain `*`, replaced by 1..=n at validation time
#[must_use]
pub fn is_multi_object(name: &str) -> bool {
    name.contains('*')
}

/// An object-name pattern and the constraints checked for every match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpecs {
    /// Literal name, comma list, or glob with `*`
    pub object_name: String,
    /// Constraints in declaration order
    pub constraints: Vec<Constraint>,
}

impl ObjectSpecs {
    /// Create a group with no constraints yet
    #[must_use]
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            constraints: Vec::new(),
        }
    }

    /// Add a constraint
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// One `if`/`unless` statement of a conditional block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalStatement {
    /// `unless` statements pass when their checks fail
    pub inverted: bool,
    /// Object groups checked silently
    pub objects: Vec<ObjectSpecs>,
}

/// `if … do … otherwise … end`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalBlock {
    /// Statements, OR-ed together
    pub statements: Vec<ConditionalStatement>,
    /// Checked when any statement holds
    pub body: Vec<ObjectSpecs>,
    /// Checked when no statement holds
    pub otherwise: Option<Vec<ObjectSpecs>>,
}

/// Tag-scoped group of object specs and conditional blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSection {
    /// Tags; empty means always active
    pub tags: Vec<String>,
    /// Object groups in declaration order
    pub objects: Vec<ObjectSpecs>,
    /// Conditional blocks in declaration order
    pub conditional_blocks: Vec<ConditionalBlock>,
}

impl PageSection {
    /// Create an empty section
    #[must_use]
    pub fn new(tags: Vec<String>) -> Self {
        Self {
            tags,
            ..Self::default()
        }
    }

    /// Section has nothing to check
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.conditional_blocks.is_empty()
    }
}

/// Include/exclude tag filter applied to sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFilter {
    /// Sections must carry at least one of these tags (ignored when empty)
    #[serde(default)]
    pub include: Vec<String>,
    /// Sections carrying any of these tags are skipped
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SectionFilter {
    /// Create a filter
    #[must_use]
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Filter accepting every section
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Decide whether a section with `tags` participates. Exclusion wins.
    #[must_use]
    pub fn accepts(&self, tags: &[String]) -> bool {
        let included = self.include.is_empty() || tags.iter().any(|t| self.include.contains(t));
        let excluded = tags.iter().any(|t| self.exclude.contains(t));
        included && !excluded
    }
}

/// A parsed spec: object table plus ordered sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Object name → locator
    pub objects: ObjectTable,
    /// Sections in file order, imports appended
    pub sections: Vec<PageSection>,
}

impl PageSpec {
    /// Create an empty spec
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an imported spec
    pub fn merge(&mut self, other: PageSpec) {
        self.objects.merge(other.objects);
        self.sections.extend(other.sections);
    }

    /// Drop sections with nothing to check
    pub fn prune_empty_sections(&mut self) {
        self.sections.retain(|section| !section.is_empty());
    }

    /// Total number of object groups across all sections, excluding
    /// conditional blocks
    #[must_use]
    pub fn object_group_count(&self) -> usize {
        self.sections.iter().map(|s| s.objects.len()).sum()
    }
}

fn write_groups(f: &mut fmt::Formatter<'_>, groups: &[ObjectSpecs]) -> fmt::Result {
    for group in groups {
        writeln!(f, "{}", group.object_name)?;
        for constraint in &group.constraints {
            writeln!(f, "{INDENT}{constraint}")?;
        }
    }
    Ok(())
}

impl fmt::Display for PageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.objects.is_empty() {
            writeln!(f, "{OBJECT_BLOCK_MARKER}")?;
            for (name, locator) in self.objects.iter() {
                writeln!(f, "{name} {} {}", locator.strategy, locator.value)?;
            }
            writeln!(f, "{OBJECT_BLOCK_MARKER}")?;
        }

        for section in &self.sections {
            writeln!(f)?;
            if section.tags.is_empty() {
                writeln!(f, "@")?;
            } else {
                writeln!(f, "@ {}", section.tags.join(", "))?;
            }
            write_groups(f, &section.objects)?;

            for block in &section.conditional_blocks {
                for (i, statement) in block.statements.iter().enumerate() {
                    let prefix = if i == 0 { "" } else { "or " };
                    let keyword = if statement.inverted { "unless" } else { "if" };
                    writeln!(f, "{prefix}{keyword}")?;
                    write_groups(f, &statement.objects)?;
                }
                writeln!(f, "do")?;
                write_groups(f, &block.body)?;
                if let Some(otherwise) = &block.otherwise {
                    writeln!(f, "otherwise")?;
                    write_groups(f, otherwise)?;
                }
                writeln!(f, "end")?;
            }
        }
        Ok(())
    }
}
