//! Numeric ranges, sides and locations used by geometric constraints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Accepted pixel values for a measured distance or dimension.
///
/// `Between` is always stored with `min <= max`; use [`Range::between`]
/// rather than building the variant by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Range {
    /// Exactly one value (`10px`)
    Exact(i32),
    /// Inclusive bounds (`10 to 20px`, `15 ± 5px`)
    Between(i32, i32),
    /// Open-ended lower bound (`>= 10px`)
    AtLeast(i32),
}

impl Range {
    /// Exact value
    #[must_use]
    pub const fn exact(value: i32) -> Self {
        Self::Exact(value)
    }

    /// Inclusive range, bounds swapped if given in reverse order
    #[must_use]
    pub fn between(a: i32, b: i32) -> Self {
        Self::Between(a.min(b), a.max(b))
    }

    /// `value ± tolerance`, `None` if a bound leaves the `i32` range
    #[must_use]
    pub fn around(value: i32, tolerance: i32) -> Option<Self> {
        let low = value.checked_sub(tolerance)?;
        let high = value.checked_add(tolerance)?;
        Some(Self::between(low, high))
    }

    /// Open-ended lower bound
    #[must_use]
    pub const fn at_least(value: i32) -> Self {
        Self::AtLeast(value)
    }

    /// Check whether `value` is accepted
    #[must_use]
    pub const fn holds(&self, value: i32) -> bool {
        match *self {
            Self::Exact(expected) => value == expected,
            Self::Between(min, max) => min <= value && value <= max,
            Self::AtLeast(min) => value >= min,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => write!(f, "{value}px"),
            Self::Between(min, max) => write!(f, "{min} to {max}px"),
            Self::AtLeast(min) => write!(f, ">= {min}px"),
        }
    }
}

/// Edge of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Top edge
    Top,
    /// Left edge
    Left,
    /// Right edge
    Right,
    /// Bottom edge
    Bottom,
}

impl Side {
    /// Parse a side keyword
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "top" => Some(Self::Top),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }

    /// Keyword as written in spec text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Left => "left",
            Self::Right => "right",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A range applied to one or more sides, e.g. `10 to 20px top bottom`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Accepted distance
    pub range: Range,
    /// Sides in declaration order
    pub sides: Vec<Side>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(range: Range, sides: Vec<Side>) -> Self {
        Self { range, sides }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range)?;
        for side in &self.sides {
            write!(f, " {side}")?;
        }
        Ok(())
    }
}
