//! Pixel geometry for rendered elements.

use crate::result::SyntaxError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle occupied by an element, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Area {
    /// Left edge
    pub left: i32,
    /// Top edge
    pub top: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl Area {
    /// Create a new area
    #[must_use]
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge (exclusive)
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.left + self.width
    }

    /// Bottom edge (exclusive)
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Get the center point (rounded down)
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(self.left + self.width / 2, self.top + self.height / 2)
    }

    /// Check if `other` lies completely within this area
    #[must_use]
    pub const fn contains(&self, other: &Area) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check if the two areas share at least one pixel
    #[must_use]
    pub const fn intersects(&self, other: &Area) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    /// Translate into the coordinate space whose origin is `origin`'s corner
    #[must_use]
    pub const fn relative_to(&self, origin: &Area) -> Area {
        Area::new(
            self.left - origin.left,
            self.top - origin.top,
            self.width,
            self.height,
        )
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.left, self.top, self.width, self.height
        )
    }
}

/// Browser window size, written `1024x768` in suites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Size {
    /// Create a new size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse `WIDTHxHEIGHT`
    ///
    /// # Errors
    ///
    /// Returns error if format is invalid
    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        let invalid = || SyntaxError::unknown_line(format!("Incorrect size: {text}"));
        let (width, height) = text.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = height.trim().parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod area_tests {
        use super::*;

        #[test]
        fn test_edges() {
            let area = Area::new(10, 20, 100, 50);
            assert_eq!(area.right(), 110);
            assert_eq!(area.bottom(), 70);
            assert_eq!(area.center(), Point::new(60, 45));
        }

        #[test]
        fn test_contains() {
            let outer = Area::new(0, 0, 100, 100);
            assert!(outer.contains(&Area::new(10, 10, 20, 20)));
            assert!(outer.contains(&outer));
            assert!(!outer.contains(&Area::new(90, 10, 20, 20)));
        }

        #[test]
        fn test_intersects() {
            let a = Area::new(0, 0, 50, 50);
            assert!(a.intersects(&Area::new(40, 40, 50, 50)));
            assert!(!a.intersects(&Area::new(50, 0, 10, 10)));
        }

        #[test]
        fn test_relative_to() {
            let area = Area::new(110, 220, 30, 40);
            let origin = Area::new(100, 200, 500, 500);
            assert_eq!(area.relative_to(&origin), Area::new(10, 20, 30, 40));
        }

        #[test]
        fn test_display() {
            assert_eq!(Area::new(1, 2, 3, 4).to_string(), "[1, 2, 3, 4]");
        }
    }

    mod size_tests {
        use super::*;

        #[test]
        fn test_parse() {
            assert_eq!(Size::parse("1024x768").unwrap(), Size::new(1024, 768));
            assert_eq!(Size::parse(" 320 X 480 ").unwrap(), Size::new(320, 480));
        }

        #[test]
        fn test_parse_invalid() {
            assert!(Size::parse("1024").is_err());
            assert!(Size::parse("axb").is_err());
        }

        #[test]
        fn test_display_roundtrip() {
            let size = Size::new(800, 600);
            assert_eq!(Size::parse(&size.to_string()).unwrap(), size);
        }
    }
}
