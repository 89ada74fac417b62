//! Constraint line parser.
//!
//! A constraint line is `<keyword words>[: <parameters>]`. The keyword
//! words select the constraint kind from a flat table; the parameters are
//! read with the token readers.

use super::tokens::{read_locations, read_quoted, read_range, read_word, CharReader};
use crate::result::SyntaxError;
use crate::spec::{
    AlignEdge, Axis, CenterAxis, CenterRelation, Constraint, Direction, Range, TextOperation,
    DEFAULT_ALIGNED_TOLERANCE, DEFAULT_CENTERED_TOLERANCE,
};
use std::path::Path;

/// Parse one constraint line.
///
/// Relative component paths are resolved against `base_dir` when given.
///
/// # Errors
///
/// Returns error for an unknown keyword or malformed parameters. The line
/// number is left unknown for the caller to stamp.
pub fn parse_constraint(text: &str, base_dir: Option<&Path>) -> Result<Constraint, SyntaxError> {
    let text = text.trim();
    let (head, params) = text.split_once(':').unwrap_or((text, ""));
    let words: Vec<&str> = head.split_whitespace().collect();
    let mut reader = CharReader::new(params);

    let constraint = match words.as_slice() {
        ["absent"] => Constraint::Absent,
        ["visible"] => Constraint::Visible,
        ["width"] => Constraint::Width(read_range(&mut reader)?),
        ["height"] => Constraint::Height(read_range(&mut reader)?),
        ["inside"] => inside(&mut reader, false)?,
        ["inside", "partly"] => inside(&mut reader, true)?,
        ["near"] => near(&mut reader)?,
        ["above"] => relative(&mut reader, Direction::Above)?,
        ["below"] => relative(&mut reader, Direction::Below)?,
        ["left", "of"] => relative(&mut reader, Direction::LeftOf)?,
        ["right", "of"] => relative(&mut reader, Direction::RightOf)?,
        ["aligned", axis] => aligned(&mut reader, axis, "all")?,
        ["aligned", axis, edge] => aligned(&mut reader, axis, edge)?,
        ["centered", relation] => centered(&mut reader, "all", relation)?,
        ["centered", axis, relation] => centered(&mut reader, axis, relation)?,
        ["contains"] => contains(&mut reader, false)?,
        ["contains", "partly"] => contains(&mut reader, true)?,
        ["text", operation] => text_constraint(&mut reader, operation)?,
        ["component"] => component(&mut reader, base_dir)?,
        _ => {
            return Err(SyntaxError::unknown_line(format!(
                "Unknown constraint: {text}"
            )))
        }
    };

    expect_end(&reader, text)?;
    Ok(constraint)
}

fn expect_end(reader: &CharReader, text: &str) -> Result<(), SyntaxError> {
    if reader.has_more_non_whitespace() {
        return Err(SyntaxError::unknown_line(format!(
            "Unexpected \"{}\" in constraint: {text}",
            reader.rest().trim()
        )));
    }
    Ok(())
}

fn object_name(reader: &mut CharReader) -> Result<String, SyntaxError> {
    read_word(reader).map_err(|_| SyntaxError::unknown_line("Missing object name"))
}

fn inside(reader: &mut CharReader, partly: bool) -> Result<Constraint, SyntaxError> {
    Ok(Constraint::Inside {
        object: object_name(reader)?,
        partly,
        locations: read_locations(reader)?,
    })
}

fn near(reader: &mut CharReader) -> Result<Constraint, SyntaxError> {
    let object = object_name(reader)?;
    let locations = read_locations(reader)?;
    if locations.is_empty() {
        return Err(SyntaxError::unknown_line(format!(
            "Missing location for \"near: {object}\""
        )));
    }
    Ok(Constraint::Near { object, locations })
}

fn relative(reader: &mut CharReader, direction: Direction) -> Result<Constraint, SyntaxError> {
    let object = object_name(reader)?;
    let range = if reader.has_more_non_whitespace() {
        read_range(reader)?
    } else {
        Range::at_least(0)
    };
    Ok(Constraint::Relative {
        direction,
        object,
        range,
    })
}

fn tolerance(reader: &mut CharReader, default: i32) -> Result<i32, SyntaxError> {
    if !reader.has_more_non_whitespace() {
        return Ok(default);
    }
    match read_range(reader)? {
        Range::Exact(value) if value >= 0 => Ok(value),
        other => Err(SyntaxError::unknown_line(format!(
            "Tolerance must be a single non-negative value, got {other}"
        ))),
    }
}

fn aligned(reader: &mut CharReader, axis: &str, edge: &str) -> Result<Constraint, SyntaxError> {
    let axis = match axis {
        "horizontally" => Axis::Horizontally,
        "vertically" => Axis::Vertically,
        other => {
            return Err(SyntaxError::unknown_line(format!(
                "Unknown alignment: {other}"
            )))
        }
    };
    let edge = match (axis, edge) {
        (_, "all") => AlignEdge::All,
        (_, "centered") => AlignEdge::Centered,
        (Axis::Horizontally, "top") => AlignEdge::Top,
        (Axis::Horizontally, "bottom") => AlignEdge::Bottom,
        (Axis::Vertically, "left") => AlignEdge::Left,
        (Axis::Vertically, "right") => AlignEdge::Right,
        (axis, other) => {
            return Err(SyntaxError::unknown_line(format!(
                "Cannot align {} by \"{other}\"",
                axis.as_str()
            )))
        }
    };
    Ok(Constraint::Aligned {
        axis,
        edge,
        object: object_name(reader)?,
        tolerance: tolerance(reader, DEFAULT_ALIGNED_TOLERANCE)?,
    })
}

fn centered(
    reader: &mut CharReader,
    axis: &str,
    relation: &str,
) -> Result<Constraint, SyntaxError> {
    let axis = match axis {
        "all" => CenterAxis::All,
        "horizontally" => CenterAxis::Horizontally,
        "vertically" => CenterAxis::Vertically,
        other => {
            return Err(SyntaxError::unknown_line(format!(
                "Unknown centering: {other}"
            )))
        }
    };
    let relation = match relation {
        "inside" => CenterRelation::Inside,
        "on" => CenterRelation::On,
        other => {
            return Err(SyntaxError::unknown_line(format!(
                "Expected \"inside\" or \"on\" but got \"{other}\""
            )))
        }
    };
    Ok(Constraint::Centered {
        axis,
        relation,
        object: object_name(reader)?,
        tolerance: tolerance(reader, DEFAULT_CENTERED_TOLERANCE)?,
    })
}

fn contains(reader: &mut CharReader, partly: bool) -> Result<Constraint, SyntaxError> {
    let objects: Vec<String> = reader
        .take_rest()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();
    if objects.is_empty() {
        return Err(SyntaxError::unknown_line("Missing object names"));
    }
    Ok(Constraint::Contains { partly, objects })
}

fn text_constraint(reader: &mut CharReader, operation: &str) -> Result<Constraint, SyntaxError> {
    let operation = match operation {
        "is" => TextOperation::Is,
        "contains" => TextOperation::Contains,
        "starts" => TextOperation::Starts,
        "ends" => TextOperation::Ends,
        "matches" => TextOperation::Matches,
        other => {
            return Err(SyntaxError::unknown_line(format!(
                "Unknown text operation: {other}"
            )))
        }
    };
    let expected = read_quoted(reader)?;
    if operation == TextOperation::Matches {
        regex::Regex::new(&expected).map_err(|e| {
            SyntaxError::unknown_line(format!("Incorrect text pattern: {expected}")).with_source(e)
        })?;
    }
    Ok(Constraint::Text {
        operation,
        expected,
    })
}

fn component(reader: &mut CharReader, base_dir: Option<&Path>) -> Result<Constraint, SyntaxError> {
    let path = reader.take_rest();
    let path = Path::new(path.trim());
    if path.as_os_str().is_empty() {
        return Err(SyntaxError::unknown_line("Missing component spec path"));
    }
    let spec_path = match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    };
    Ok(Constraint::Component { spec_path })
}
