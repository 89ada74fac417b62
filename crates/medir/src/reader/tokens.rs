//! Token readers for constraint lines.
//!
//! All readers work on a [`CharReader`] cursor and consume left to right,
//! so several of them can be chained over the same line. A reader never
//! consumes anything it does not recognize.

use crate::result::SyntaxError;
use crate::spec::{Location, Range, Side};

/// Cursor over the remaining text of one line
#[derive(Debug, Clone)]
pub struct CharReader {
    chars: Vec<char>,
    pos: usize,
}

impl CharReader {
    /// Create a reader positioned at the start of `text`
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    /// Whether anything is left to read
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.pos < self.chars.len()
    }

    /// Whether only whitespace is left
    #[must_use]
    pub fn has_more_non_whitespace(&self) -> bool {
        self.chars[self.pos..].iter().any(|c| !c.is_whitespace())
    }

    /// Next character without consuming it
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Consume one character
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip spaces and tabs
    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Consume `keyword` if it comes next and is not followed by a letter
    pub fn consume_keyword(&mut self, keyword: &str) -> bool {
        let len = keyword.chars().count();
        let end = self.pos + len;
        if end > self.chars.len() {
            return false;
        }
        let matches = self.chars[self.pos..end].iter().copied().eq(keyword.chars());
        let boundary = self.chars.get(end).map_or(true, |c| !c.is_alphabetic());
        if matches && boundary {
            self.pos = end;
            true
        } else {
            false
        }
    }

    /// Consume `symbol` if it comes next
    pub fn consume_symbol(&mut self, symbol: &str) -> bool {
        let len = symbol.chars().count();
        let end = self.pos + len;
        if end <= self.chars.len() && self.chars[self.pos..end].iter().copied().eq(symbol.chars()) {
            self.pos = end;
            true
        } else {
            false
        }
    }

    /// Everything not consumed yet
    #[must_use]
    pub fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    /// Consume and return everything left
    pub fn take_rest(&mut self) -> String {
        let rest = self.rest();
        self.pos = self.chars.len();
        rest
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&predicate) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

/// Read one whitespace-delimited word
///
/// # Errors
///
/// Returns error if only whitespace is left
pub fn read_word(reader: &mut CharReader) -> Result<String, SyntaxError> {
    reader.skip_whitespace();
    let word = reader.take_while(|c| !c.is_whitespace());
    if word.is_empty() {
        return Err(SyntaxError::unknown_line("Expected a word"));
    }
    Ok(word)
}

fn read_number(reader: &mut CharReader) -> Result<i32, SyntaxError> {
    reader.skip_whitespace();
    let negative = reader.consume_symbol("-");
    reader.skip_whitespace();
    let digits = reader.take_while(|c| c.is_ascii_digit());
    if digits.is_empty() {
        return Err(SyntaxError::unknown_line(format!(
            "Expected a number but got: \"{}\"",
            reader.rest().trim()
        )));
    }
    let literal = if negative { format!("-{digits}") } else { digits };
    literal.parse().map_err(|e| {
        SyntaxError::unknown_line(format!("Number out of range: {literal}")).with_source(e)
    })
}

/// Read a pixel range.
///
/// Accepted forms: `10px`, `10 to 20px`, `15 ± 5px`, `15 +- 5px`,
/// `>= 10px`, `> 10px`. Whitespace inside the expression and the `px`
/// suffix are optional.
///
/// # Errors
///
/// Returns error if the leading number is missing or malformed
pub fn read_range(reader: &mut CharReader) -> Result<Range, SyntaxError> {
    reader.skip_whitespace();
    let range = if reader.consume_symbol(">=") {
        Range::at_least(read_number(reader)?)
    } else if reader.consume_symbol(">") {
        Range::at_least(read_number(reader)?.saturating_add(1))
    } else {
        let first = read_number(reader)?;
        reader.skip_whitespace();
        if reader.consume_keyword("to") {
            Range::between(first, read_number(reader)?)
        } else if reader.consume_symbol("±") || reader.consume_symbol("+-") {
            let tolerance = read_number(reader)?;
            Range::around(first, tolerance).ok_or_else(|| {
                SyntaxError::unknown_line(format!("Number out of range: {first} ± {tolerance}"))
            })?
        } else {
            Range::exact(first)
        }
    };
    reader.skip_whitespace();
    reader.consume_keyword("px");
    Ok(range)
}

/// Read consecutive side keywords, stopping at the first other token.
///
/// # Errors
///
/// Returns error if no side keyword comes next
pub fn read_sides(reader: &mut CharReader) -> Result<Vec<Side>, SyntaxError> {
    let mut sides = Vec::new();
    loop {
        let checkpoint = reader.pos;
        reader.skip_whitespace();
        let word = reader.take_while(char::is_alphabetic);
        match Side::parse(&word) {
            Some(side) => sides.push(side),
            None => {
                reader.pos = checkpoint;
                break;
            }
        }
    }
    if sides.is_empty() {
        return Err(SyntaxError::unknown_line(format!(
            "Expected side (top, left, right, bottom) but got: \"{}\"",
            reader.rest().trim()
        )));
    }
    Ok(sides)
}

/// Read the rest of the line as comma-separated `<range> <sides>` entries.
///
/// An empty remainder yields an empty list.
///
/// # Errors
///
/// Returns error if any entry is malformed
pub fn read_locations(reader: &mut CharReader) -> Result<Vec<Location>, SyntaxError> {
    let text = reader.take_rest();
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|entry| {
            let mut entry_reader = CharReader::new(entry.trim());
            let range = read_range(&mut entry_reader)?;
            let sides = read_sides(&mut entry_reader)?;
            if entry_reader.has_more_non_whitespace() {
                return Err(SyntaxError::unknown_line(format!(
                    "Unexpected text in location: \"{}\"",
                    entry_reader.rest().trim()
                )));
            }
            Ok(Location::new(range, sides))
        })
        .collect()
}

/// Read a double-quoted string with `\"` and `\\` escapes
///
/// # Errors
///
/// Returns error if the string is not quoted or not terminated
pub fn read_quoted(reader: &mut CharReader) -> Result<String, SyntaxError> {
    reader.skip_whitespace();
    if !reader.consume_symbol("\"") {
        return Err(SyntaxError::unknown_line(format!(
            "Expected a double-quoted text but got: {}",
            reader.rest().trim()
        )));
    }
    let mut text = String::new();
    loop {
        match reader.next_char() {
            Some('"') => return Ok(text),
            Some('\\') => match reader.next_char() {
                Some(c) => text.push(c),
                None => break,
            },
            Some(c) => text.push(c),
            None => break,
        }
    }
    Err(SyntaxError::unknown_line("Missing closing quote"))
}
