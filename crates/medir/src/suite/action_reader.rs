//! Text form of page actions.
//!
//! ```text
//! open http://example.com
//! resize 1024x768
//! cookie "lang=en; path=/" "theme=dark"
//! inject scripts/setup.js
//! run scripts/login.js '{"user": "bob"}'
//! check specs/home.spec specs/menu.spec --include desktop,all --exclude wip
//! ```

use super::action::{CheckAction, PageAction};
use crate::geometry::Size;
use crate::result::SyntaxError;
use crate::spec::SectionFilter;
use std::path::{Path, PathBuf};

/// Split a command line into arguments.
///
/// Single and double quotes group whitespace. Inside double quotes `\"`
/// and `\\` are escapes; single quotes are literal.
///
/// # Errors
///
/// Returns error if a quote is not closed
pub fn split_arguments(text: &str) -> Result<Vec<String>, SyntaxError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            '"' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(unterminated(text)),
                        },
                        Some(other) => current.push(other),
                        None => return Err(unterminated(text)),
                    }
                }
            }
            '\'' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(other) => current.push(other),
                        None => return Err(unterminated(text)),
                    }
                }
            }
            c => {
                in_arg = true;
                current.push(c);
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

fn unterminated(text: &str) -> SyntaxError {
    SyntaxError::unknown_line(format!("Unterminated quote in: {text}"))
}

/// Parse one action line. Relative file paths are joined to `base_dir`.
///
/// # Errors
///
/// Returns error on an unknown action or malformed arguments
pub fn parse_action(text: &str, base_dir: Option<&Path>) -> Result<PageAction, SyntaxError> {
    let args = split_arguments(text)?;
    if args.len() < 2 {
        return Err(SyntaxError::unknown_line(format!("Cannot parse: {text}")));
    }
    let resolve = |arg: &str| -> PathBuf {
        let path = PathBuf::from(arg);
        match base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    };

    let action = match args[0].as_str() {
        "open" => PageAction::Open {
            url: args[1].clone(),
        },
        "resize" => PageAction::Resize {
            size: Size::parse(&args[1])?,
        },
        "cookie" => PageAction::Cookie {
            cookies: args[1..].to_vec(),
        },
        "inject" => PageAction::Inject {
            script_path: resolve(&args[1]),
        },
        "run" => {
            let json_args = args.get(2).cloned();
            if let Some(json) = &json_args {
                serde_json::from_str::<serde_json::Value>(json).map_err(|e| {
                    SyntaxError::unknown_line(format!("Invalid script arguments: {json}"))
                        .with_source(e)
                })?;
            }
            PageAction::Run {
                script_path: resolve(&args[1]),
                json_args,
            }
        }
        "check" => PageAction::Check(check_action(text, &args[1..], resolve)?),
        other => {
            return Err(SyntaxError::unknown_line(format!("Unknown action: {other}")));
        }
    };
    Ok(action)
}

fn check_action(
    text: &str,
    args: &[String],
    resolve: impl Fn(&str) -> PathBuf,
) -> Result<CheckAction, SyntaxError> {
    let mut specs = Vec::new();
    let mut include = Vec::new();
    let mut exclude = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let (option, inline) = match arg.split_once('=') {
            Some((option, value)) if option.starts_with('-') => (option, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let target = match option {
            "--include" | "-i" => &mut include,
            "--exclude" | "-e" => &mut exclude,
            _ if option.starts_with('-') => {
                return Err(SyntaxError::unknown_line(format!(
                    "Unknown option {option} in: {text}"
                )));
            }
            _ => {
                specs.push(resolve(arg));
                continue;
            }
        };
        let value = match inline {
            Some(value) => value,
            None => iter.next().cloned().ok_or_else(|| {
                SyntaxError::unknown_line(format!("Missing value for {option} in: {text}"))
            })?,
        };
        target.extend(read_tags(&value));
    }

    if specs.is_empty() {
        return Err(SyntaxError::unknown_line(format!(
            "There are no page specs: {text}"
        )));
    }
    Ok(CheckAction::new(specs).with_filter(SectionFilter::new(include, exclude)))
}

fn read_tags(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
}
