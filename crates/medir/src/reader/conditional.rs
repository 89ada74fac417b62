//! Conditional block sub-state of the spec reader.
//!
//! ```text
//! if
//! menu
//!     visible
//! or unless
//! burger
//!     visible
//! do
//! nav
//!     inside: header
//! otherwise
//! nav
//!     absent
//! end
//! ```
//!
//! Keywords must start at the beginning of the line. `do` switches from
//! statements to the body, `otherwise` is only valid after the body.

use super::page_spec::{LineState, ParseContext};
use crate::result::SyntaxError;
use crate::spec::{ConditionalBlock, ConditionalStatement};

/// Conditional block keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ConditionalKeyword {
    /// `if` or `or if` (`chained`), `unless` or `or unless` (`inverted`)
    Statement {
        /// `or` prefix
        chained: bool,
        /// `unless` rather than `if`
        inverted: bool,
    },
    Do,
    Otherwise,
    End,
}

impl ConditionalKeyword {
    pub(super) fn parse(raw: &str) -> Option<Self> {
        if raw.starts_with([' ', '\t']) {
            return None;
        }
        let words: Vec<&str> = raw.split_whitespace().collect();
        let keyword = match words.as_slice() {
            ["if"] => Self::Statement {
                chained: false,
                inverted: false,
            },
            ["unless"] => Self::Statement {
                chained: false,
                inverted: true,
            },
            ["or", "if"] => Self::Statement {
                chained: true,
                inverted: false,
            },
            ["or", "unless"] => Self::Statement {
                chained: true,
                inverted: true,
            },
            ["do"] => Self::Do,
            ["otherwise"] => Self::Otherwise,
            ["end"] => Self::End,
            _ => return None,
        };
        Some(keyword)
    }

    /// Whether a bare line holding only `name` reads as a keyword
    pub(super) fn is_reserved(name: &str) -> bool {
        Self::parse(name).is_some()
    }
}

impl ParseContext<'_> {
    pub(super) fn apply_conditional(&mut self, keyword: ConditionalKeyword) -> Result<(), SyntaxError> {
        let line = self.line;
        let wrong_place = move || SyntaxError::new(line, "Wrong place for this statement");
        let next = match (keyword, self.state) {
            (ConditionalKeyword::Statement { chained: false, .. }, state) if state.in_conditional() => {
                return Err(self.error("Nested conditional blocks are not supported"));
            }
            (ConditionalKeyword::Statement { chained: false, inverted }, _) => {
                self.block = Some(ConditionalBlock {
                    statements: vec![ConditionalStatement {
                        inverted,
                        objects: Vec::new(),
                    }],
                    ..ConditionalBlock::default()
                });
                LineState::ConditionalStatement
            }
            (ConditionalKeyword::Statement { chained: true, inverted }, LineState::ConditionalStatement) => {
                let block = self.block.as_mut().ok_or_else(wrong_place)?;
                block.statements.push(ConditionalStatement {
                    inverted,
                    objects: Vec::new(),
                });
                LineState::ConditionalStatement
            }
            (ConditionalKeyword::Do, LineState::ConditionalStatement) => LineState::ConditionalBody,
            (ConditionalKeyword::Otherwise, LineState::ConditionalBody) => {
                let block = self.block.as_mut().ok_or_else(wrong_place)?;
                block.otherwise = Some(Vec::new());
                LineState::ConditionalOtherwise
            }
            (ConditionalKeyword::End, LineState::ConditionalStatement) => {
                return Err(self.error("There is no body defined for this conditional block"));
            }
            (ConditionalKeyword::End, LineState::ConditionalBody | LineState::ConditionalOtherwise) => {
                let block = self.block.take().ok_or_else(wrong_place)?;
                self.spec.sections[self.section].conditional_blocks.push(block);
                LineState::SectionBody
            }
            _ => return Err(wrong_place()),
        };
        self.state = next;
        self.open = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::reader::PageSpecReader;
    use crate::spec::Constraint;

    fn read(text: &str) -> Result<crate::spec::PageSpec, SyntaxError> {
        PageSpecReader::new().read_str(text)
    }

    #[test]
    fn test_keyword_parse() {
        assert_eq!(ConditionalKeyword::parse("do"), Some(ConditionalKeyword::Do));
        assert_eq!(
            ConditionalKeyword::parse("or   unless"),
            Some(ConditionalKeyword::Statement {
                chained: true,
                inverted: true
            })
        );
        assert_eq!(ConditionalKeyword::parse("    end"), None);
        assert_eq!(ConditionalKeyword::parse("ending"), None);
    }

    #[test]
    fn test_reserved_names() {
        assert!(ConditionalKeyword::is_reserved("otherwise"));
        assert!(ConditionalKeyword::is_reserved("unless"));
        assert!(!ConditionalKeyword::is_reserved("or"));
        assert!(!ConditionalKeyword::is_reserved("do-it"));
    }

    #[test]
    fn test_full_block() {
        let spec = read(
            "@ desktop\nheader\n    visible\nif\nmenu\n    visible\nor unless\nburger\n    visible\ndo\nnav\n    absent\notherwise\nnav\n    visible\nend\nfooter\n    visible\n",
        )
        .unwrap();
        let section = &spec.sections[0];
        assert_eq!(section.objects.len(), 2);
        assert_eq!(section.objects[1].object_name, "footer");

        let block = &section.conditional_blocks[0];
        assert_eq!(block.statements.len(), 2);
        assert!(!block.statements[0].inverted);
        assert!(block.statements[1].inverted);
        assert_eq!(block.statements[1].objects[0].object_name, "burger");
        assert_eq!(block.body[0].constraints, vec![Constraint::Absent]);
        assert_eq!(block.otherwise.as_ref().unwrap()[0].constraints, vec![Constraint::Visible]);
    }

    #[test]
    fn test_section_with_only_a_block_is_kept() {
        let spec = read("@ a\nunless\nmenu\n    visible\ndo\nbutton\n    visible\nend\n").unwrap();
        assert_eq!(spec.sections.len(), 1);
        assert!(spec.sections[0].objects.is_empty());
        assert_eq!(spec.sections[0].conditional_blocks.len(), 1);
    }

    #[test]
    fn test_block_without_body_fails() {
        let err = read("if\nmenu\n    visible\nend\n").unwrap_err();
        assert_eq!(err.line(), 4);
        assert!(err.message().contains("no body"));
    }

    #[test]
    fn test_otherwise_before_body_fails() {
        let err = read("if\nmenu\n    visible\notherwise\n").unwrap_err();
        assert_eq!(err.line(), 4);
    }

    #[test]
    fn test_statement_after_body_fails() {
        let err = read("if\nmenu\n    visible\ndo\nmenu\n    visible\nor if\n").unwrap_err();
        assert_eq!(err.line(), 7);
        assert!(err.message().contains("Wrong place"));
    }

    #[test]
    fn test_unterminated_block_fails() {
        let err = read("if\nmenu\n    visible\ndo\nmenu\n    absent\n").unwrap_err();
        assert!(err.message().contains("not closed"));
    }

    #[test]
    fn test_section_inside_block_fails() {
        assert!(read("if\nmenu\n    visible\n@ mobile\n").is_err());
    }

    #[test]
    fn test_end_outside_block_fails() {
        assert!(read("end\n").is_err());
    }
}
