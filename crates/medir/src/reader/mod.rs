//! Spec text reader.
//!
//! # Format
//!
//! ```text
//! # comment
//! @@ import common.spec
//!
//! ==========================================
//! menu        css     #menu
//! button      xpath   //button[@id='go']
//! item-*      css     #menu li
//! ==========================================
//!
//! @ desktop, tablet
//! ------------------------------------------
//! menu
//!     inside: screen 0px top left
//!     width: 900 to 1000px
//!
//! [1-3]
//! item-@
//!     height: 40px
//! ```
//!
//! Conditional blocks (`if`, `unless`, `or if`, `or unless`, `do`,
//! `otherwise`, `end`) select which object groups get reported.

mod conditional;
mod constraint;
mod page_spec;
mod tokens;

pub use constraint::parse_constraint;
pub use page_spec::PageSpecReader;
pub use tokens::{read_locations, read_quoted, read_range, read_sides, read_word, CharReader};
