//! Line-driven spec reader.
//!
//! The reader is a state machine over [`LineState`]. All mutable parse
//! state lives in a [`ParseContext`] that is created per file and threaded
//! through the line handlers, so one [`PageSpecReader`] can be shared
//! freely.

use super::conditional::ConditionalKeyword;
use super::constraint::parse_constraint;
use crate::locator::Locator;
use crate::result::{MedirError, MedirResult, SyntaxError};
use crate::spec::{ConditionalBlock, ObjectSpecs, PageSection, PageSpec};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parser state between lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LineState {
    /// In a section, no object group opened yet
    Idle,
    /// Between `===` lines
    ObjectDefinition,
    /// In a section with an open object group
    SectionBody,
    /// After `if`/`unless`/`or if`/`or unless`
    ConditionalStatement,
    /// After `do`
    ConditionalBody,
    /// After `otherwise`
    ConditionalOtherwise,
}

impl LineState {
    pub(super) const fn in_conditional(self) -> bool {
        matches!(
            self,
            Self::ConditionalStatement | Self::ConditionalBody | Self::ConditionalOtherwise
        )
    }
}

/// Object groups opened by the latest name line.
///
/// A parameterized name line opens one group per value; each constraint
/// line is parsed once and copied per value with `@` substituted in the
/// object names it references.
#[derive(Debug, Clone)]
pub(super) struct OpenGroup {
    first: usize,
    values: Vec<String>,
}

pub(super) struct ParseContext<'a> {
    pub(super) spec: PageSpec,
    pub(super) state: LineState,
    pub(super) section: usize,
    pub(super) block: Option<ConditionalBlock>,
    pub(super) open: Option<OpenGroup>,
    pending_parameters: Option<Vec<String>>,
    pub(super) line: usize,
    base_dir: Option<&'a Path>,
    import_chain: &'a [PathBuf],
}

impl<'a> ParseContext<'a> {
    fn new(base_dir: Option<&'a Path>, import_chain: &'a [PathBuf]) -> Self {
        let mut spec = PageSpec::new();
        spec.sections.push(PageSection::default());
        Self {
            spec,
            state: LineState::Idle,
            section: 0,
            block: None,
            open: None,
            pending_parameters: None,
            line: 0,
            base_dir,
            import_chain,
        }
    }

    pub(super) fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line, message)
    }

    fn process_line(&mut self, raw: &str) -> Result<(), SyntaxError> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        if let Some(directive) = line.strip_prefix("@@") {
            self.directive(directive.trim())
        } else if is_object_block_marker(line) {
            self.toggle_object_definition()
        } else if self.state == LineState::ObjectDefinition {
            self.object_definition(line)
        } else if let Some(tags) = line.strip_prefix('@') {
            self.start_section(tags)
        } else if is_separator(line) {
            Ok(())
        } else if line.starts_with('[') {
            self.pending_parameters = Some(parse_parameters(line).map_err(|e| e.at_line(self.line))?);
            Ok(())
        } else if let Some(keyword) = ConditionalKeyword::parse(raw) {
            self.apply_conditional(keyword)
        } else if raw.starts_with([' ', '\t']) {
            self.constraint_line(line)
        } else {
            self.object_group(line)
        }
    }

    fn directive(&mut self, directive: &str) -> Result<(), SyntaxError> {
        let (word, argument) = directive
            .split_once(char::is_whitespace)
            .unwrap_or((directive, ""));
        match word {
            "import" if !argument.trim().is_empty() => self.import(argument.trim()),
            "import" => Err(self.error("Missing path for import")),
            other => Err(self.error(format!("Unknown instruction: {other}"))),
        }
    }

    fn import(&mut self, path: &str) -> Result<(), SyntaxError> {
        let path = resolve_path(self.base_dir, Path::new(path));
        let key = chain_key(&path);
        if self.import_chain.contains(&key) {
            return Err(self.error(format!("Cyclic import of {}", path.display())));
        }
        debug!(path = %path.display(), line = self.line, "Importing spec");

        let text = fs::read_to_string(&path).map_err(|e| {
            self.error(format!("Cannot import file: {}", path.display()))
                .with_source(e)
        })?;
        let mut chain = self.import_chain.to_vec();
        chain.push(key);
        let imported = parse_text(&text, path.parent(), &chain).map_err(|e| e.in_file(&path))?;
        self.spec.merge(imported);
        Ok(())
    }

    fn toggle_object_definition(&mut self) -> Result<(), SyntaxError> {
        if self.state.in_conditional() {
            return Err(self.error("Object definitions are not allowed inside a conditional block"));
        }
        if self.state == LineState::ObjectDefinition {
            self.start_section("")
        } else {
            self.open = None;
            self.state = LineState::ObjectDefinition;
            Ok(())
        }
    }

    fn object_definition(&mut self, line: &str) -> Result<(), SyntaxError> {
        let (name, locator) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| self.error(format!("Missing locator for object \"{line}\"")))?;
        if ConditionalKeyword::is_reserved(name) {
            return Err(self.error(format!(
                "\"{name}\" is a reserved keyword and cannot be used as an object name"
            )));
        }
        let locator = Locator::parse(locator).map_err(|e| e.at_line(self.line))?;
        self.spec.objects.insert(name, locator);
        Ok(())
    }

    fn start_section(&mut self, tags: &str) -> Result<(), SyntaxError> {
        if self.state.in_conditional() {
            return Err(self.error("Cannot start a section inside a conditional block"));
        }
        self.check_no_pending_parameters()?;
        let tags = tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect();
        self.spec.sections.push(PageSection::new(tags));
        self.section = self.spec.sections.len() - 1;
        self.state = LineState::Idle;
        self.open = None;
        Ok(())
    }

    fn check_no_pending_parameters(&self) -> Result<(), SyntaxError> {
        if self.pending_parameters.is_some() {
            return Err(self.error("Parameterization is not followed by an object"));
        }
        Ok(())
    }

    /// Groups receiving new object groups in the current state
    pub(super) fn target_groups(&mut self) -> Result<&mut Vec<ObjectSpecs>, SyntaxError> {
        let line = self.line;
        let missing_block = || SyntaxError::new(line, "Conditional block is missing");
        match self.state {
            LineState::Idle | LineState::SectionBody => Ok(&mut self.spec.sections[self.section].objects),
            LineState::ConditionalStatement => self
                .block
                .as_mut()
                .and_then(|block| block.statements.last_mut())
                .map(|statement| &mut statement.objects)
                .ok_or_else(missing_block),
            LineState::ConditionalBody => self
                .block
                .as_mut()
                .map(|block| &mut block.body)
                .ok_or_else(missing_block),
            LineState::ConditionalOtherwise => self
                .block
                .as_mut()
                .and_then(|block| block.otherwise.as_mut())
                .ok_or_else(missing_block),
            LineState::ObjectDefinition => Err(missing_block()),
        }
    }

    fn object_group(&mut self, line: &str) -> Result<(), SyntaxError> {
        let name = line.strip_suffix(':').unwrap_or(line).trim().to_string();
        if name.is_empty() {
            return Err(self.error("Missing object name"));
        }
        let values = self.pending_parameters.take().unwrap_or_default();

        let groups = self.target_groups()?;
        let first = groups.len();
        if values.is_empty() {
            groups.push(ObjectSpecs::new(name));
        } else {
            groups.extend(values.iter().map(|v| ObjectSpecs::new(name.replace('@', v))));
        }

        self.open = Some(OpenGroup { first, values });
        if self.state == LineState::Idle {
            self.state = LineState::SectionBody;
        }
        Ok(())
    }

    fn constraint_line(&mut self, line: &str) -> Result<(), SyntaxError> {
        let Some(open) = self.open.clone() else {
            return Err(self.error(format!(
                "Constraint is declared before any object: {line}"
            )));
        };
        let constraint = parse_constraint(line, self.base_dir).map_err(|e| e.at_line(self.line))?;
        let constraints = if open.values.is_empty() {
            vec![constraint]
        } else {
            open.values
                .iter()
                .map(|value| constraint.with_parameter(value))
                .collect()
        };

        let groups = self.target_groups()?;
        for (offset, constraint) in constraints.into_iter().enumerate() {
            if let Some(group) = groups.get_mut(open.first + offset) {
                group.constraints.push(constraint);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<PageSpec, SyntaxError> {
        if self.state.in_conditional() {
            return Err(self.error("Conditional block is not closed with \"end\""));
        }
        self.check_no_pending_parameters()?;
        self.spec.prune_empty_sections();
        Ok(self.spec)
    }
}

fn is_object_block_marker(line: &str) -> bool {
    line.len() > 1 && line.chars().all(|c| c == '=')
}

fn is_separator(line: &str) -> bool {
    line.len() >= 4 && line.chars().all(|c| c == '-')
}

/// Parse `[1-3, a, b]` into `["1", "2", "3", "a", "b"]`
fn parse_parameters(line: &str) -> Result<Vec<String>, SyntaxError> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = || SyntaxError::unknown_line(format!("Incorrect parameterization syntax: {line}"));
    let inner = compact
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(invalid)?;

    let mut values = Vec::new();
    for item in inner.split(',') {
        if item.is_empty() || item.contains(['[', ']']) {
            return Err(invalid());
        }
        match item.split_once('-') {
            Some((a, b))
                if !a.is_empty()
                    && !b.is_empty()
                    && a.chars().all(|c| c.is_ascii_digit())
                    && b.chars().all(|c| c.is_ascii_digit()) =>
            {
                let a: i64 = a.parse().map_err(|_| invalid())?;
                let b: i64 = b.parse().map_err(|_| invalid())?;
                values.extend((a.min(b)..=a.max(b)).map(|n| n.to_string()));
            }
            _ => values.push(item.to_string()),
        }
    }
    Ok(values)
}

fn resolve_path(base_dir: Option<&Path>, path: &Path) -> PathBuf {
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

fn chain_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn parse_text(
    text: &str,
    base_dir: Option<&Path>,
    import_chain: &[PathBuf],
) -> Result<PageSpec, SyntaxError> {
    let mut context = ParseContext::new(base_dir, import_chain);
    for (index, line) in text.lines().enumerate() {
        context.line = index + 1;
        context.process_line(line)?;
    }
    context.finish()
}

/// Reads spec text into a [`PageSpec`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PageSpecReader;

impl PageSpecReader {
    /// Create a reader
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse spec text. Imports and component paths resolve against the
    /// current directory.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error
    pub fn read_str(&self, text: &str) -> Result<PageSpec, SyntaxError> {
        parse_text(text, None, &[])
    }

    /// Parse spec text whose relative paths resolve against `base_dir`
    ///
    /// # Errors
    ///
    /// Returns the first syntax error
    pub fn read_str_in(&self, text: &str, base_dir: &Path) -> Result<PageSpec, SyntaxError> {
        parse_text(text, Some(base_dir), &[])
    }

    /// Read a spec file and everything it imports
    ///
    /// # Errors
    ///
    /// Returns [`MedirError::SpecNotFound`] for a missing file, otherwise
    /// the first syntax or I/O error
    pub fn read_file(&self, path: &Path) -> MedirResult<PageSpec> {
        debug!(path = %path.display(), "Reading spec");
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MedirError::SpecNotFound {
                path: path.to_path_buf(),
            },
            _ => MedirError::Io(e),
        })?;
        let chain = [chain_key(path)];
        let spec = parse_text(&text, path.parent(), &chain).map_err(|e| e.in_file(path))?;
        Ok(spec)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::spec::{Constraint, Direction, Location, Range, Side, TextOperation};

    const SPEC: &str = "
# Objects of the home page
==============================================
submit          xpath //input[@name = 'submit']
search-field    css #search
menu            id menu
big-box         tag body
button          css .button
==============================================

@
menu
    inside: button 10px left
    width: 70px

@ tablet, desktop
--------------------------------
submit
    inside: big-box 10 to 30px right, 20 to 40px top
    near: menu 20px left
search-field:
    inside: big-box 30px right

@
big-box
    width: 900px

@mobile
submit
    absent
";

    fn read(text: &str) -> PageSpec {
        PageSpecReader::new().read_str(text).unwrap()
    }

    fn read_err(text: &str) -> SyntaxError {
        PageSpecReader::new().read_str(text).unwrap_err()
    }

    mod document_tests {
        use super::*;

        #[test]
        fn test_reads_objects() {
            let spec = read(SPEC);
            assert_eq!(spec.objects.len(), 5);
            assert_eq!(
                spec.objects.get("submit"),
                Some(&Locator::xpath("//input[@name = 'submit']"))
            );
            assert_eq!(spec.objects.get("menu"), Some(&Locator::id("menu")));
            assert_eq!(
                spec.objects.names().collect::<Vec<_>>(),
                vec!["submit", "search-field", "menu", "big-box", "button"]
            );
        }

        #[test]
        fn test_reads_sections_with_tags_in_order() {
            let spec = read(SPEC);
            assert_eq!(spec.sections.len(), 4);
            assert!(spec.sections[0].tags.is_empty());
            assert_eq!(spec.sections[1].tags, vec!["tablet", "desktop"]);
            assert!(spec.sections[2].tags.is_empty());
            assert_eq!(spec.sections[3].tags, vec!["mobile"]);
        }

        #[test]
        fn test_reads_constraints() {
            let spec = read(SPEC);
            let first = &spec.sections[0].objects[0];
            assert_eq!(first.object_name, "menu");
            assert_eq!(
                first.constraints,
                vec![
                    Constraint::Inside {
                        object: "button".into(),
                        partly: false,
                        locations: vec![Location::new(Range::exact(10), vec![Side::Left])],
                    },
                    Constraint::Width(Range::exact(70)),
                ]
            );

            let second = &spec.sections[1].objects;
            assert_eq!(second.len(), 2);
            assert_eq!(second[1].object_name, "search-field");
            assert_eq!(spec.sections[3].objects[0].constraints, vec![Constraint::Absent]);
        }

        #[test]
        fn test_round_trip() {
            let spec = read(SPEC);
            let reparsed = read(&spec.to_string());
            assert_eq!(reparsed.objects, spec.objects);
            assert_eq!(reparsed.sections, spec.sections);
        }

        #[test]
        fn test_empty_sections_are_pruned() {
            let spec = read("@ a\n@ b\nmenu\n    visible\n@ c\n");
            assert_eq!(spec.sections.len(), 1);
            assert_eq!(spec.sections[0].tags, vec!["b"]);
        }

        #[test]
        fn test_unterminated_object_block_closes_at_end() {
            let spec = read("===\nmenu css #menu\n");
            assert!(spec.objects.contains("menu"));
            assert!(spec.sections.is_empty());
        }
    }

    mod parameterization_tests {
        use super::*;

        #[test]
        fn test_parse_parameters() {
            assert_eq!(
                parse_parameters("[ 1-3, a,\tb ]").unwrap(),
                vec!["1", "2", "3", "a", "b"]
            );
            assert_eq!(parse_parameters("[3-1]").unwrap(), vec!["1", "2", "3"]);
            assert!(parse_parameters("[1,,2]").is_err());
            assert!(parse_parameters("[1-3").is_err());
        }

        #[test]
        fn test_several_segments() {
            assert_eq!(
                parse_parameters("[1-2, 7-5, x, 10]").unwrap(),
                vec!["1", "2", "5", "6", "7", "x", "10"]
            );
            assert!(parse_parameters("[1-2][4-5]").is_err());
            assert!(parse_parameters("[1-2, [3]]").is_err());

            let spec = read("[1-2, 4]
row-@
    visible
");
            let names: Vec<_> = spec.sections[0]
                .objects
                .iter()
                .map(|group| group.object_name.as_str())
                .collect();
            assert_eq!(names, vec!["row-1", "row-2", "row-4"]);

            let err = read_err("menu
    visible
[1-2][3]
row-@
    visible
");
            assert_eq!(err.line(), 3);
            assert!(err.message().contains("Incorrect parameterization"));
        }

        #[test]
        fn test_text_literals_keep_at_sign() {
            let spec = read(
                "[1-2]\nitem-@\n    text is: \"mail@example.com\"\n    below: header-@ 5px\n",
            );
            let groups = &spec.sections[0].objects;
            assert_eq!(groups.len(), 2);
            for (group, n) in groups.iter().zip(["1", "2"]) {
                assert_eq!(group.object_name, format!("item-{n}"));
                assert_eq!(
                    group.constraints,
                    vec![
                        Constraint::Text {
                            operation: TextOperation::Is,
                            expected: "mail@example.com".into(),
                        },
                        Constraint::Relative {
                            direction: Direction::Below,
                            object: format!("header-{n}"),
                            range: Range::exact(5),
                        },
                    ]
                );
            }
        }

        #[test]
        fn test_replicates_next_group() {
            let spec = read("[1-3]\nitem-@\n    near: item-@ 0px left\nfooter\n    visible\n");
            let groups = &spec.sections[0].objects;
            assert_eq!(groups.len(), 4);
            assert_eq!(groups[0].object_name, "item-1");
            assert_eq!(groups[2].object_name, "item-3");
            assert_eq!(
                groups[1].constraints,
                vec![Constraint::Near {
                    object: "item-2".into(),
                    locations: vec![Location::new(Range::exact(0), vec![Side::Left])],
                }]
            );
            assert_eq!(groups[3].object_name, "footer");
        }

        #[test]
        fn test_dangling_parameterization() {
            let err = read_err("[1, 2]\n");
            assert!(err.message().contains("not followed by an object"));
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_unknown_constraint_reports_line() {
            let err = read_err("menu\n    visible\n    wdth: 10px\n");
            assert_eq!(err.line(), 3);
            assert!(err.message().contains("wdth"));
        }

        #[test]
        fn test_constraint_without_object() {
            let err = read_err("@ mobile\n    visible\n");
            assert_eq!(err.line(), 2);
        }

        #[test]
        fn test_missing_locator() {
            let err = read_err("===\nmenu css\n===\n");
            assert_eq!(err.line(), 2);
        }

        #[test]
        fn test_keyword_object_name_rejected() {
            for name in ["do", "end", "if", "unless", "otherwise"] {
                let err = read_err(&format!("===\n{name} css #{name}\n===\n"));
                assert_eq!(err.line(), 2);
                assert!(err.message().contains("reserved keyword"), "{name}");
            }
            let spec = read("===\ndone css #done\n===\ndone\n    visible\n");
            assert_eq!(spec.sections[0].objects[0].object_name, "done");
        }

        #[test]
        fn test_unknown_instruction() {
            let err = read_err("@@ include other.spec\n");
            assert!(err.message().contains("Unknown instruction"));
        }

        #[test]
        fn test_missing_import() {
            let err = read_err("@@ import /nonexistent/dir/missing.spec\n");
            assert_eq!(err.line(), 1);
            assert!(std::error::Error::source(&err).is_some());
        }
    }

    mod import_tests {
        use super::*;
        use std::io::Write as _;

        fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
            let path = dir.join(name);
            let mut file = fs::File::create(&path).unwrap();
            file.write_all(text.as_bytes()).unwrap();
            path
        }

        #[test]
        fn test_import_merges_objects_and_appends_sections() {
            let dir = tempfile::tempdir().unwrap();
            write(
                dir.path(),
                "common.spec",
                "===\nheader css header\nmenu css #common-menu\n===\n@ common\nheader\n    visible\n",
            );
            let main = write(
                dir.path(),
                "main.spec",
                "===\nmenu css #menu\n===\n@ main\nmenu\n    visible\n@@ import common.spec\nfooter\n    absent\n",
            );

            let spec = PageSpecReader::new().read_file(&main).unwrap();
            assert_eq!(spec.objects.get("menu"), Some(&Locator::css("#common-menu")));
            assert!(spec.objects.contains("header"));
            let tags: Vec<_> = spec.sections.iter().map(|s| s.tags.clone()).collect();
            assert_eq!(tags, vec![vec!["main".to_string()], vec!["common".to_string()]]);
            // groups after the import keep landing in the importing section
            assert_eq!(spec.sections[0].objects.len(), 2);
        }

        #[test]
        fn test_nested_import_error_names_inner_file() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "inner.spec", "menu\n    bogus\n");
            write(dir.path(), "middle.spec", "@@ import inner.spec\n");
            let main = write(dir.path(), "main.spec", "\n@@ import middle.spec\n");

            let err = match PageSpecReader::new().read_file(&main).unwrap_err() {
                MedirError::Syntax(err) => err,
                other => panic!("unexpected error: {other}"),
            };
            assert_eq!(err.line(), 2);
            assert!(err.file().unwrap().ends_with("inner.spec"));
        }

        #[test]
        fn test_import_cycle() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "a.spec", "@@ import b.spec\n");
            write(dir.path(), "b.spec", "@@ import a.spec\n");

            let err = PageSpecReader::new()
                .read_file(&dir.path().join("a.spec"))
                .unwrap_err();
            assert!(err.to_string().contains("Cyclic import"));
        }

        #[test]
        fn test_import_cycle_names_inner_file() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "a.spec", "@@ import b.spec\n");
            write(dir.path(), "b.spec", "@@ import c.spec\n");
            write(dir.path(), "c.spec", "\n\n@@ import a.spec\n");

            let err = match PageSpecReader::new()
                .read_file(&dir.path().join("a.spec"))
                .unwrap_err()
            {
                MedirError::Syntax(err) => err,
                other => panic!("unexpected error: {other}"),
            };
            assert_eq!(err.line(), 3);
            assert!(err.message().contains("Cyclic import"));
            assert!(err.message().contains("a.spec"));
            assert!(err.file().unwrap().ends_with("c.spec"));
        }

        #[test]
        fn test_diamond_import_is_not_a_cycle() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "base.spec", "===\nlogo css #logo\n===\n");
            write(dir.path(), "left.spec", "@@ import base.spec\n");
            write(dir.path(), "right.spec", "@@ import base.spec\n");
            let main = write(
                dir.path(),
                "main.spec",
                "@@ import left.spec\n@@ import right.spec\n",
            );
            let spec = PageSpecReader::new().read_file(&main).unwrap();
            assert!(spec.objects.contains("logo"));
        }

        #[test]
        fn test_missing_file() {
            let err = PageSpecReader::new()
                .read_file(Path::new("/nonexistent/home.spec"))
                .unwrap_err();
            assert!(matches!(err, MedirError::SpecNotFound { .. }));
        }
    }
}
