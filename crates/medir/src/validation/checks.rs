//! Per-kind constraint checkers.
//!
//! Each checker resolves the objects it needs through the current
//! [`PageValidation`] and either passes or reports one [`ValidationError`]
//! carrying every violated side or dimension. Undeclared objects and
//! unusable component specs are fatal for the checked object.

use super::error::{CheckError, Failure, ValidationError};
use super::PageValidation;
use crate::geometry::Area;
use crate::page::ElementSnapshot;
use crate::reader::PageSpecReader;
use crate::spec::{
    AlignEdge, Axis, CenterAxis, CenterRelation, Constraint, Direction, Location, Range, Side,
    TextOperation,
};
use regex::Regex;
use std::path::Path;

type CheckResult = Result<(), Failure>;

pub(super) fn check(
    ctx: &PageValidation<'_>,
    name: &str,
    constraint: &Constraint,
    silent: bool,
) -> CheckResult {
    match constraint {
        Constraint::Absent => check_absent(ctx, name),
        Constraint::Visible => visible_element(ctx, name).map(|_| ()),
        Constraint::Width(range) => {
            let element = visible_element(ctx, name)?;
            check_dimension(name, "width", element.area.width, range, element.area)
        }
        Constraint::Height(range) => {
            let element = visible_element(ctx, name)?;
            check_dimension(name, "height", element.area.height, range, element.area)
        }
        Constraint::Inside {
            object,
            partly,
            locations,
        } => check_inside(ctx, name, object, *partly, locations),
        Constraint::Near { object, locations } => check_near(ctx, name, object, locations),
        Constraint::Relative {
            direction,
            object,
            range,
        } => check_relative(ctx, name, *direction, object, range),
        Constraint::Aligned {
            axis,
            edge,
            object,
            tolerance,
        } => check_aligned(ctx, name, *axis, *edge, object, *tolerance),
        Constraint::Centered {
            axis,
            relation,
            object,
            tolerance,
        } => check_centered(ctx, name, *axis, *relation, object, *tolerance),
        Constraint::Contains { partly, objects } => check_contains(ctx, name, *partly, objects),
        Constraint::Text {
            operation,
            expected,
        } => check_text(ctx, name, *operation, expected),
        Constraint::Component { spec_path } => check_component(ctx, name, spec_path, silent),
    }
}

fn fail_unless(messages: Vec<String>, areas: impl IntoIterator<Item = Area>) -> CheckResult {
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::with_messages(messages).with_areas(areas).into())
    }
}

/// Declared object that must be present and displayed
fn visible_element(ctx: &PageValidation<'_>, name: &str) -> Result<ElementSnapshot, Failure> {
    let element = ctx.find_object(name)?;
    if !element.present {
        return Err(ValidationError::new(format!("Object \"{name}\" is absent on page")).into());
    }
    if !element.visible {
        return Err(
            ValidationError::new(format!("Object \"{name}\" is not visible on page"))
                .with_area(element.area)
                .into(),
        );
    }
    Ok(element)
}

fn check_absent(ctx: &PageValidation<'_>, name: &str) -> CheckResult {
    let element = ctx.find_object(name)?;
    if element.present && element.visible {
        return Err(
            ValidationError::new(format!("Object \"{name}\" is not absent on page"))
                .with_area(element.area)
                .into(),
        );
    }
    Ok(())
}

fn check_dimension(name: &str, dimension: &str, actual: i32, range: &Range, area: Area) -> CheckResult {
    if range.holds(actual) {
        return Ok(());
    }
    Err(
        ValidationError::new(format!("\"{name}\" {dimension} is {actual}px instead of {range}"))
            .with_area(area)
            .into(),
    )
}

/// One message per side whose measured offset falls outside its range
fn location_messages(
    name: &str,
    locations: &[Location],
    offset: impl Fn(Side) -> i32,
) -> Vec<String> {
    let mut messages = Vec::new();
    for location in locations {
        for &side in &location.sides {
            let actual = offset(side);
            if !location.range.holds(actual) {
                messages.push(format!(
                    "\"{name}\" is {actual}px {} instead of {}",
                    side.as_str(),
                    location.range
                ));
            }
        }
    }
    messages
}

fn check_inside(
    ctx: &PageValidation<'_>,
    name: &str,
    object: &str,
    partly: bool,
    locations: &[Location],
) -> CheckResult {
    let element = visible_element(ctx, name)?.area;
    let container = visible_element(ctx, object)?.area;

    let mut messages = Vec::new();
    if partly {
        if !container.intersects(&element) {
            messages.push(format!("\"{name}\" is not inside \"{object}\""));
        }
    } else if !container.contains(&element) {
        messages.push(format!("\"{name}\" is not completely inside \"{object}\""));
    }
    messages.extend(location_messages(name, locations, |side| match side {
        Side::Left => element.left - container.left,
        Side::Right => container.right() - element.right(),
        Side::Top => element.top - container.top,
        Side::Bottom => container.bottom() - element.bottom(),
    }));
    fail_unless(messages, [element, container])
}

fn check_near(
    ctx: &PageValidation<'_>,
    name: &str,
    object: &str,
    locations: &[Location],
) -> CheckResult {
    let element = visible_element(ctx, name)?.area;
    let other = visible_element(ctx, object)?.area;

    let messages = location_messages(name, locations, |side| match side {
        Side::Left => other.left - element.right(),
        Side::Right => element.left - other.right(),
        Side::Top => other.top - element.bottom(),
        Side::Bottom => element.top - other.bottom(),
    });
    fail_unless(messages, [element, other])
}

fn check_relative(
    ctx: &PageValidation<'_>,
    name: &str,
    direction: Direction,
    object: &str,
    range: &Range,
) -> CheckResult {
    let element = visible_element(ctx, name)?.area;
    let other = visible_element(ctx, object)?.area;

    let gap = match direction {
        Direction::Above => other.top - element.bottom(),
        Direction::Below => element.top - other.bottom(),
        Direction::LeftOf => other.left - element.right(),
        Direction::RightOf => element.left - other.right(),
    };
    if range.holds(gap) {
        return Ok(());
    }
    fail_unless(
        vec![format!(
            "\"{name}\" is {gap}px {} \"{object}\" instead of {range}",
            direction.keyword()
        )],
        [element, other],
    )
}

fn check_aligned(
    ctx: &PageValidation<'_>,
    name: &str,
    axis: Axis,
    edge: AlignEdge,
    object: &str,
    tolerance: i32,
) -> CheckResult {
    let element = visible_element(ctx, name)?.area;
    let other = visible_element(ctx, object)?.area;

    let offsets = match (axis, edge) {
        (_, AlignEdge::Top) => vec![element.top - other.top],
        (_, AlignEdge::Bottom) => vec![element.bottom() - other.bottom()],
        (_, AlignEdge::Left) => vec![element.left - other.left],
        (_, AlignEdge::Right) => vec![element.right() - other.right()],
        (Axis::Horizontally, AlignEdge::Centered) => vec![element.center().y - other.center().y],
        (Axis::Vertically, AlignEdge::Centered) => vec![element.center().x - other.center().x],
        (Axis::Horizontally, AlignEdge::All) => {
            vec![element.top - other.top, element.bottom() - other.bottom()]
        }
        (Axis::Vertically, AlignEdge::All) => {
            vec![element.left - other.left, element.right() - other.right()]
        }
    };

    let worst = offsets.iter().map(|offset| offset.abs()).max().unwrap_or(0);
    if worst <= tolerance {
        return Ok(());
    }
    fail_unless(
        vec![format!(
            "\"{name}\" is not aligned {} {} with \"{object}\". Offset is {worst}px",
            axis.as_str(),
            edge.as_str()
        )],
        [element, other],
    )
}

fn check_centered(
    ctx: &PageValidation<'_>,
    name: &str,
    axis: CenterAxis,
    relation: CenterRelation,
    object: &str,
    tolerance: i32,
) -> CheckResult {
    let element = visible_element(ctx, name)?.area;
    let other = visible_element(ctx, object)?.area;

    let mut messages = Vec::new();
    if relation == CenterRelation::Inside && !other.contains(&element) {
        messages.push(format!("\"{name}\" is not completely inside \"{object}\""));
    }

    let horizontal = (element.left - other.left) - (other.right() - element.right());
    let vertical = (element.top - other.top) - (other.bottom() - element.bottom());
    let checked = match axis {
        CenterAxis::All => vec![("horizontally", horizontal), ("vertically", vertical)],
        CenterAxis::Horizontally => vec![("horizontally", horizontal)],
        CenterAxis::Vertically => vec![("vertically", vertical)],
    };
    for (label, difference) in checked {
        if difference.abs() > tolerance {
            messages.push(format!(
                "\"{name}\" is not centered {label} {} \"{object}\". Offset is {}px",
                relation.as_str(),
                difference.abs()
            ));
        }
    }
    fail_unless(messages, [element, other])
}

fn check_contains(
    ctx: &PageValidation<'_>,
    name: &str,
    partly: bool,
    patterns: &[String],
) -> CheckResult {
    let container = visible_element(ctx, name)?.area;

    let mut messages = Vec::new();
    let mut areas = vec![container];
    for pattern in patterns {
        let children = ctx.expand_pattern(pattern)?;
        if children.is_empty() {
            messages.push(format!("There are no objects matching: {pattern}"));
            continue;
        }
        for child in children {
            let element = ctx.find_object(&child)?;
            if !element.present || !element.visible {
                messages.push(format!("\"{child}\" is absent on page"));
                continue;
            }
            let inside = if partly {
                container.intersects(&element.area)
            } else {
                container.contains(&element.area)
            };
            if !inside {
                messages.push(format!("\"{child}\" is outside \"{name}\""));
                areas.push(element.area);
            }
        }
    }
    fail_unless(messages, areas)
}

fn check_text(
    ctx: &PageValidation<'_>,
    name: &str,
    operation: TextOperation,
    expected: &str,
) -> CheckResult {
    let element = visible_element(ctx, name)?;
    let Some(actual) = element.text.as_deref() else {
        return Err(CheckError::Unsupported {
            message: format!("Page cannot provide text of \"{name}\""),
        }
        .into());
    };

    let (holds, should) = match operation {
        TextOperation::Is => (actual == expected, "be"),
        TextOperation::Contains => (actual.contains(expected), "contain"),
        TextOperation::Starts => (actual.starts_with(expected), "start with"),
        TextOperation::Ends => (actual.ends_with(expected), "end with"),
        TextOperation::Matches => {
            let regex = Regex::new(&format!("^(?:{expected})$")).map_err(|source| {
                CheckError::InvalidPattern {
                    pattern: expected.to_string(),
                    source,
                }
            })?;
            (regex.is_match(actual), "match")
        }
    };
    if holds {
        return Ok(());
    }
    fail_unless(
        vec![format!(
            "\"{name}\" text is \"{actual}\" but should {should} \"{expected}\""
        )],
        [element.area],
    )
}

fn check_component(
    ctx: &PageValidation<'_>,
    name: &str,
    spec_path: &Path,
    silent: bool,
) -> CheckResult {
    let locator = ctx.locator(name)?;
    if !spec_path.is_file() {
        return Err(CheckError::ComponentNotFound {
            path: spec_path.to_path_buf(),
        }
        .into());
    }
    let spec = PageSpecReader::new()
        .read_file(spec_path)
        .map_err(|source| CheckError::ComponentSpec {
            path: spec_path.to_path_buf(),
            source: Box::new(source),
        })?;

    let sub_page = ctx.page.scoped_sub_page(locator)?;
    let child = PageValidation::new(&spec, sub_page.as_ref(), ctx.filter, ctx.observer)
        .with_depth(ctx.depth + 1);
    let errors = if silent {
        child.run_silently()
    } else {
        child.run()
    };
    if errors.is_empty() {
        return Ok(());
    }
    fail_unless(
        vec![format!(
            "Child component spec contains {} errors",
            errors.len()
        )],
        [ctx.page.resolve(locator).area],
    )
}
