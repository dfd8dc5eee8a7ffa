//! Key/value sequences driving service generation
//!
//! A host custom variable referenced by a service's `duplicate_foreach` lists the
//! keys to generate services for:
//!
//! ```text
//! _disks   sda,sdb$(/data)$,sd[1-3]$(scratch!50%)$
//! ```
//!
//! - entries are separated by commas outside of `$( ... )$`
//! - `key$(value)$` attaches a value; without one, the generator's default value
//!   (if any) is used
//! - a value may carry several arguments separated by `!`, exposed as `$VALUE1$`,
//!   `$VALUE2$`, ...
//! - `prefix[a-b]suffix` expands to one key per number in the range; a zero-padded
//!   start (`[01-10]`) pads every generated number to the same width

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Characters replaced by `_` when a key is used inside an object name.
pub const ILLEGAL_KEY_CHARS: &str = "`~!$%^&*\"|'<>?,()=";

/// Why a sequence could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("invalid generator syntax: {0}")]
    Syntax(String),
}

/// One generated key with its optional value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl KeyValue {
    /// Arguments of the value, split on `!`.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        self.value.as_deref().map(|v| v.split('!').collect()).unwrap_or_default()
    }

    /// The key with characters illegal in object names replaced by `_`.
    #[must_use]
    pub fn safe_key(&self) -> String {
        self.key
            .chars()
            .map(|c| if ILLEGAL_KEY_CHARS.contains(c) { '_' } else { c })
            .collect()
    }

    /// Replace `$KEY$`, `$VALUE$` and `$VALUEn$` in `text`.
    #[must_use]
    pub fn substitute(&self, text: &str) -> String {
        self.substitute_with_key(text, &self.key)
    }

    /// Like [`substitute`](Self::substitute), using the name-safe key.
    #[must_use]
    pub fn substitute_name(&self, text: &str) -> String {
        self.substitute_with_key(text, &self.safe_key())
    }

    fn substitute_with_key(&self, text: &str, key: &str) -> String {
        let mut result = text.replace("$KEY$", key);
        let values = self.values();
        for (i, value) in values.iter().enumerate().rev() {
            result = result.replace(&format!("$VALUE{}$", i + 1), value);
        }
        result.replace("$VALUE$", self.value.as_deref().unwrap_or_default())
    }
}

/// Parse a generator sequence.
///
/// An empty sequence yields no keys.
pub fn parse_key_value_sequence(
    entry: &str,
    default: Option<&str>,
) -> Result<Vec<KeyValue>, GeneratorError> {
    let mut result = Vec::new();
    for part in split_entries(entry)? {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (key, value) = match part.find("$(") {
            Some(start) => {
                let Some(rest) = part[start + 2..].strip_suffix(")$") else {
                    return Err(GeneratorError::Syntax(format!(
                        "'{part}' has text after its value"
                    )));
                };
                (part[..start].trim(), Some(rest.to_string()))
            }
            None => (part, default.map(String::from)),
        };

        if key.is_empty() {
            return Err(GeneratorError::Syntax(format!("'{part}' has no key")));
        }
        if key.contains('$') {
            return Err(GeneratorError::Syntax(format!("'{key}' is not a valid key")));
        }

        for key in expand_range(key)? {
            result.push(KeyValue {
                key,
                value: value.clone(),
            });
        }
    }
    Ok(result)
}

/// Split on commas that are not inside `$( ... )$`.
fn split_entries(entry: &str) -> Result<Vec<&str>, GeneratorError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_value = false;
    let bytes = entry.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if !in_value && bytes[i..].starts_with(b"$(") {
            in_value = true;
            i += 2;
            continue;
        }
        if in_value && bytes[i..].starts_with(b")$") {
            in_value = false;
            i += 2;
            continue;
        }
        if !in_value && bytes[i] == b',' {
            parts.push(&entry[start..i]);
            start = i + 1;
        }
        i += 1;
    }

    if in_value {
        return Err(GeneratorError::Syntax(format!("unterminated value in '{entry}'")));
    }
    parts.push(&entry[start..]);
    Ok(parts)
}

/// `prefix[start-end]suffix`
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>[^\[\]]*)\[(?P<start>\d+)-(?P<end>\d+)\](?P<suffix>[^\[\]]*)$").unwrap()
});

fn expand_range(key: &str) -> Result<Vec<String>, GeneratorError> {
    if !key.contains('[') && !key.contains(']') {
        return Ok(vec![key.to_string()]);
    }
    let Some(captures) = RANGE_RE.captures(key) else {
        return Err(GeneratorError::Syntax(format!("'{key}' has an invalid range")));
    };

    let start_text = &captures["start"];
    let parse = |text: &str| {
        text.parse::<u64>()
            .map_err(|_| GeneratorError::Syntax(format!("'{text}' is not a range bound")))
    };
    let (start, end) = (parse(start_text)?, parse(&captures["end"])?);
    if start > end {
        return Err(GeneratorError::Syntax(format!("'{key}' has a decreasing range")));
    }

    let width = if start_text.len() > 1 && start_text.starts_with('0') { start_text.len() } else { 0 };
    Ok((start..=end)
        .map(|n| format!("{}{n:0width$}{}", &captures["prefix"], &captures["suffix"]))
        .collect())
}
