//! Reader for Nagios-style object definition files
//!
//! ```text
//! # a comment
//! define host {
//!     host_name   web01        ; trailing comments are allowed
//!     parents     router,switch
//!     _SNMP_COMM  pub\;lic     ; an escaped semicolon is kept
//! }
//! ```
//!
//! Each block becomes a [`RawObject`]: the kind keyword as written, and every
//! `key value` line with repeated keys kept in order. Values are not converted
//! here; that is the object model's job. The position of each block is recorded
//! as its `imported_from` property unless the block sets one itself.
//!
//! Text that cannot be split into blocks (a stray line, a block that never
//! closes) is a [`MonconfError::DefinitionParseError`]. Unknown kinds are not:
//! they are reported later as warnings.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::trace;

use crate::core::MonconfError;
use crate::item::RawParams;

/// One `define` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    /// Kind keyword, such as `host`
    pub kind: String,
    pub params: RawParams,
    /// `file:line` of the `define` keyword
    pub source: String,
}

/// Remove comments from a line, keeping `\;` as a literal `;`.
fn strip_comment(line: &str) -> String {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return String::new();
    }

    let mut kept = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&';') => {
                kept.push(';');
                chars.next();
            }
            ';' => break,
            other => kept.push(other),
        }
    }
    kept
}

/// Split definition text into blocks. `origin` names the text in positions and
/// errors.
pub fn parse_definitions(text: &str, origin: &str) -> Result<Vec<RawObject>, MonconfError> {
    let error = |line: usize, reason: String| MonconfError::DefinitionParseError {
        file: origin.to_string(),
        line,
        reason,
    };

    let mut objects = Vec::new();
    let mut current: Option<RawObject> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let number = index + 1;
        let line = strip_comment(raw_line);
        let mut line = line.trim();
        if line.is_empty() {
            continue;
        }

        if current.is_none() {
            let Some(rest) = line.strip_prefix("define") else {
                return Err(error(number, format!("expected 'define <kind> {{', found '{line}'")));
            };
            let header = rest.trim();
            let Some(kind) = header.strip_suffix('{').map(str::trim).filter(|k| !k.is_empty())
            else {
                return Err(error(number, format!("malformed block header 'define{rest}'")));
            };
            if kind.contains(char::is_whitespace) {
                return Err(error(number, format!("malformed block header 'define{rest}'")));
            }
            current = Some(RawObject {
                kind: kind.to_string(),
                params: RawParams::new(),
                source: format!("{origin}:{number}"),
            });
            continue;
        }

        // A brace glued to a value, as in `echo {x}`, belongs to the value.
        let closes = line
            .strip_suffix('}')
            .is_some_and(|rest| rest.is_empty() || rest.ends_with(char::is_whitespace));
        if closes {
            line = line[..line.len() - 1].trim_end();
        }
        if !line.is_empty()
            && let Some(object) = current.as_mut()
        {
            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (line, ""),
            };
            object.params.entry(key.to_string()).or_default().push(value.to_string());
        }
        if closes && let Some(mut object) = current.take() {
            object
                .params
                .entry("imported_from".to_string())
                .or_insert_with(|| vec![object.source.clone()]);
            trace!(kind = %object.kind, source = %object.source, "parsed block");
            objects.push(object);
        }
    }

    if let Some(open) = current {
        return Err(error(
            text.lines().count(),
            format!("the {} block opened at {} is never closed", open.kind, open.source),
        ));
    }
    Ok(objects)
}

/// Read and parse one definition file.
pub fn read_definitions(path: &Path) -> Result<Vec<RawObject>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read definition file: {}", path.display()))?;
    let objects = parse_definitions(&text, &path.display().to_string())?;
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_and_comments() {
        let text = "\
# hosts
define host {
    host_name   web01   ; the web server
    parents     a,b
    parents     c
    _COMMUNITY  pub\\;lic
    notes
}
; another
define service{
    service_description HTTP }
";
        let objects = parse_definitions(text, "hosts.cfg").unwrap();
        assert_eq!(objects.len(), 2);

        let host = &objects[0];
        assert_eq!(host.kind, "host");
        assert_eq!(host.source, "hosts.cfg:2");
        assert_eq!(host.params["host_name"], vec!["web01"]);
        assert_eq!(host.params["parents"], vec!["a,b", "c"]);
        assert_eq!(host.params["_COMMUNITY"], vec!["pub;lic"]);
        assert_eq!(host.params["notes"], vec![""]);
        assert_eq!(host.params["imported_from"], vec!["hosts.cfg:2"]);

        assert_eq!(objects[1].kind, "service");
        assert_eq!(objects[1].params["service_description"], vec!["HTTP"]);
    }

    #[test]
    fn test_value_ending_with_brace_does_not_close_the_block() {
        let text = "\
define command {
    command_name    print_set
    command_line    echo {x}
}
define command {
    command_name    other
    command_line    echo ${HOME} }
";
        let objects = parse_definitions(text, "commands.cfg").unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].params["command_line"], vec!["echo {x}"]);
        assert_eq!(objects[1].params["command_line"], vec!["echo ${HOME}"]);
        assert_eq!(objects[1].source, "commands.cfg:5");
    }

    #[test]
    fn test_explicit_imported_from_is_kept() {
        let text = "define command {\n imported_from generated\n}\n";
        let objects = parse_definitions(text, "x.cfg").unwrap();
        assert_eq!(objects[0].params["imported_from"], vec!["generated"]);
    }

    #[test]
    fn test_stray_line_is_an_error() {
        let error = parse_definitions("host_name web01\n", "bad.cfg").unwrap_err();
        assert!(matches!(error, MonconfError::DefinitionParseError { line: 1, .. }));
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let error = parse_definitions("define host {\n host_name a\n", "bad.cfg").unwrap_err();
        assert!(error.to_string().contains("never closed"));
    }

    #[test]
    fn test_header_without_brace_is_an_error() {
        assert!(parse_definitions("define host\n", "bad.cfg").is_err());
        assert!(parse_definitions("define {\n}\n", "bad.cfg").is_err());
    }
}
