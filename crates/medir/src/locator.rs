//! Element locators declared in a spec's object-definition block.
//!
//! A locator is a `(strategy, value)` pair such as `css #search` or
//! `xpath //input[@name='q']`. Multi-objects expanded at validation time
//! carry an extra 1-based index selecting one of several matches.

use crate::result::SyntaxError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an element is looked up on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// CSS selector (e.g., "button.primary")
    Css,
    /// XPath expression
    XPath,
    /// Element id attribute
    Id,
    /// Tag name
    Tag,
    /// Any other strategy understood by the page implementation
    Custom(String),
}

impl Strategy {
    /// Parse a strategy keyword. Unknown words are kept as [`Strategy::Custom`].
    #[must_use]
    pub fn parse(word: &str) -> Self {
        match word {
            "css" => Self::Css,
            "xpath" => Self::XPath,
            "id" => Self::Id,
            "tag" => Self::Tag,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Keyword as written in spec text
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Id => "id",
            Self::Tag => "tag",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of how to find one element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Lookup strategy
    pub strategy: Strategy,
    /// Strategy-specific query
    pub value: String,
    /// 1-based match index, set for expanded multi-objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl Locator {
    /// Create a new locator
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
            index: None,
        }
    }

    /// Create a CSS locator
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Create an id locator
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    /// Select the n-th (1-based) match
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Parse `<strategy> <value...>`; the value keeps its inner whitespace.
    ///
    /// # Errors
    ///
    /// Returns error if the strategy or the value is missing
    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        let text = text.trim();
        let (strategy, value) = text
            .split_once(char::is_whitespace)
            .ok_or_else(|| SyntaxError::unknown_line(format!("Missing locator: {text}")))?;
        let value = value.trim();
        if strategy.is_empty() || value.is_empty() {
            return Err(SyntaxError::unknown_line(format!(
                "Missing locator: {text}"
            )));
        }
        Ok(Self::new(Strategy::parse(strategy), value))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.value)?;
        if let Some(index) = self.index {
            write!(f, " [{index}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css() {
        let locator = Locator::parse("css  #menu li a").unwrap();
        assert_eq!(locator.strategy, Strategy::Css);
        assert_eq!(locator.value, "#menu li a");
        assert_eq!(locator.index, None);
    }

    #[test]
    fn test_parse_xpath_keeps_spaces() {
        let locator = Locator::parse("xpath //input[@name = 'submit']").unwrap();
        assert_eq!(locator, Locator::xpath("//input[@name = 'submit']"));
    }

    #[test]
    fn test_parse_custom_strategy() {
        let locator = Locator::parse("accessibility Submit button").unwrap();
        assert_eq!(locator.strategy, Strategy::Custom("accessibility".into()));
    }

    #[test]
    fn test_parse_missing_value() {
        let err = Locator::parse("css").unwrap_err();
        assert!(err.message().contains("Missing locator"));
        assert!(Locator::parse("css    ").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Locator::id("search").to_string(), "id: search");
        assert_eq!(
            Locator::css("#menu li").with_index(2).to_string(),
            "css: #menu li [2]"
        );
    }

    #[test]
    fn test_strategy_keyword_roundtrip() {
        for word in ["css", "xpath", "id", "tag", "android"] {
            assert_eq!(Strategy::parse(word).as_str(), word);
        }
    }
}
