//! Typed layout constraints.
//!
//! Every constraint line in a spec becomes one [`Constraint`]. The
//! `Display` impl writes the canonical spec text for the constraint, which
//! the reader accepts back unchanged.

use super::range::{Location, Range};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default tolerance for `centered` checks
pub const DEFAULT_CENTERED_TOLERANCE: i32 = 2;

/// Default tolerance for `aligned` checks
pub const DEFAULT_ALIGNED_TOLERANCE: i32 = 0;

/// Direction of a relative-position constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `above: other`
    Above,
    /// `below: other`
    Below,
    /// `left of: other`
    LeftOf,
    /// `right of: other`
    RightOf,
}

impl Direction {
    /// Keyword as written in spec text
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
            Self::LeftOf => "left of",
            Self::RightOf => "right of",
        }
    }
}

/// Axis of an alignment constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Compare horizontal rows (top/bottom/center-y)
    Horizontally,
    /// Compare vertical columns (left/right/center-x)
    Vertically,
}

impl Axis {
    /// Keyword as written in spec text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontally => "horizontally",
            Self::Vertically => "vertically",
        }
    }
}

/// Which edges an alignment constraint compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignEdge {
    /// Both edges of the axis
    All,
    /// Top edges (horizontal only)
    Top,
    /// Bottom edges (horizontal only)
    Bottom,
    /// Left edges (vertical only)
    Left,
    /// Right edges (vertical only)
    Right,
    /// Centers
    Centered,
}

impl AlignEdge {
    /// Keyword as written in spec text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Centered => "centered",
        }
    }
}

/// Axes checked by a `centered` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterAxis {
    /// Both axes
    All,
    /// Left/right offsets only
    Horizontally,
    /// Top/bottom offsets only
    Vertically,
}

impl CenterAxis {
    /// Keyword as written in spec text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Horizontally => "horizontally",
            Self::Vertically => "vertically",
        }
    }
}

/// Whether a centered object sits inside or on top of the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterRelation {
    /// Object must also be inside the reference
    Inside,
    /// Object is centered on the reference, no containment required
    On,
}

impl CenterRelation {
    /// Keyword as written in spec text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inside => "inside",
            Self::On => "on",
        }
    }
}

/// Comparison applied by a `text` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOperation {
    /// Exact match
    Is,
    /// Substring
    Contains,
    /// Prefix
    Starts,
    /// Suffix
    Ends,
    /// Whole-text regular expression
    Matches,
}

impl TextOperation {
    /// Keyword as written in spec text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::Contains => "contains",
            Self::Starts => "starts",
            Self::Ends => "ends",
            Self::Matches => "matches",
        }
    }
}

/// One assertion about an object's presence, geometry or content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Object is absent or hidden
    Absent,
    /// Object is present and visible
    Visible,
    /// Width within range
    Width(Range),
    /// Height within range
    Height(Range),
    /// Object lies inside a container
    Inside {
        /// Container object name
        object: String,
        /// Only require an overlap
        partly: bool,
        /// Offsets from the container's edges
        locations: Vec<Location>,
    },
    /// Object is near another object
    Near {
        /// Reference object name
        object: String,
        /// Gaps to the reference object's edges
        locations: Vec<Location>,
    },
    /// Object is above/below/left of/right of another object
    Relative {
        /// Direction from the reference
        direction: Direction,
        /// Reference object name
        object: String,
        /// Accepted gap
        range: Range,
    },
    /// Edges line up with another object's edges
    Aligned {
        /// Axis being compared
        axis: Axis,
        /// Edges being compared
        edge: AlignEdge,
        /// Reference object name
        object: String,
        /// Allowed error in pixels
        tolerance: i32,
    },
    /// Object is centered relative to another object
    Centered {
        /// Axes being checked
        axis: CenterAxis,
        /// Inside or on the reference
        relation: CenterRelation,
        /// Reference object name
        object: String,
        /// Allowed offset difference in pixels
        tolerance: i32,
    },
    /// Object contains the listed objects
    Contains {
        /// Only require an overlap
        partly: bool,
        /// Child object names or patterns
        objects: Vec<String>,
    },
    /// Element text comparison
    Text {
        /// Comparison
        operation: TextOperation,
        /// Expected text or pattern
        expected: String,
    },
    /// Nested spec checked inside the object's area
    Component {
        /// Spec file, already resolved against the declaring spec's directory
        spec_path: PathBuf,
    },
}

impl Constraint {
    /// Short kind name used in logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Visible => "visible",
            Self::Width(_) => "width",
            Self::Height(_) => "height",
            Self::Inside { .. } => "inside",
            Self::Near { .. } => "near",
            Self::Relative { .. } => "relative",
            Self::Aligned { .. } => "aligned",
            Self::Centered { .. } => "centered",
            Self::Contains { .. } => "contains",
            Self::Text { .. } => "text",
            Self::Component { .. } => "component",
        }
    }

    /// Copy with `@` in every referenced object name replaced by `value`.
    ///
    /// Text literals and component paths are left untouched.
    #[must_use]
    pub fn with_parameter(&self, value: &str) -> Self {
        let mut constraint = self.clone();
        match &mut constraint {
            Self::Inside { object, .. }
            | Self::Near { object, .. }
            | Self::Relative { object, .. }
            | Self::Aligned { object, .. }
            | Self::Centered { object, .. } => *object = object.replace('@', value),
            Self::Contains { objects, .. } => {
                for object in objects.iter_mut() {
                    *object = object.replace('@', value);
                }
            }
            Self::Absent
            | Self::Visible
            | Self::Width(_)
            | Self::Height(_)
            | Self::Text { .. }
            | Self::Component { .. } => {}
        }
        constraint
    }
}

fn write_locations(f: &mut fmt::Formatter<'_>, locations: &[Location]) -> fmt::Result {
    for (i, location) in locations.iter().enumerate() {
        let separator = if i == 0 { " " } else { ", " };
        write!(f, "{separator}{location}")?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("absent"),
            Self::Visible => f.write_str("visible"),
            Self::Width(range) => write!(f, "width: {range}"),
            Self::Height(range) => write!(f, "height: {range}"),
            Self::Inside {
                object,
                partly,
                locations,
            } => {
                let partly = if *partly { " partly" } else { "" };
                write!(f, "inside{partly}: {object}")?;
                write_locations(f, locations)
            }
            Self::Near { object, locations } => {
                write!(f, "near: {object}")?;
                write_locations(f, locations)
            }
            Self::Relative {
                direction,
                object,
                range,
            } => write!(f, "{}: {object} {range}", direction.keyword()),
            Self::Aligned {
                axis,
                edge,
                object,
                tolerance,
            } => write!(
                f,
                "aligned {} {}: {object} {tolerance}px",
                axis.as_str(),
                edge.as_str()
            ),
            Self::Centered {
                axis,
                relation,
                object,
                tolerance,
            } => write!(
                f,
                "centered {} {}: {object} {tolerance}px",
                axis.as_str(),
                relation.as_str()
            ),
            Self::Contains { partly, objects } => {
                let partly = if *partly { " partly" } else { "" };
                write!(f, "contains{partly}: {}", objects.join(", "))
            }
            Self::Text {
                operation,
                expected,
            } => {
                write!(f, "text {}: ", operation.as_str())?;
                write_quoted(f, expected)
            }
            Self::Component { spec_path } => write!(f, "component: {}", spec_path.display()),
        }
    }
}
