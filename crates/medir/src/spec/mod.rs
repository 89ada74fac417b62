//! Specification model.
//!
//! The structures here are produced by [`crate::reader`] and consumed by
//! [`crate::validation`]. They hold no page state.

mod constraint;
mod page_spec;
mod range;

pub use constraint::{
    AlignEdge, Axis, CenterAxis, CenterRelation, Constraint, Direction, TextOperation,
    DEFAULT_ALIGNED_TOLERANCE, DEFAULT_CENTERED_TOLERANCE,
};
pub use page_spec::{
    is_multi_object, ConditionalBlock, ConditionalStatement, ObjectSpecs, ObjectTable,
    PageSection, PageSpec, SectionFilter,
};
pub use range::{Location, Range, Side};
