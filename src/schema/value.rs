//! Typed property values.

use serde::Serialize;
use std::fmt;

/// A converted property value.
///
/// Lists come in two flavours. [`Value::List`] is a finished value. [`Value::Open`]
/// only ever lives on templates: it is an additive chain (`+a,b`) that still expects
/// whatever the inheriting object's other templates contribute, so a descendant
/// keeps walking its template list after receiving one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag (`1/0`, `yes/no`, ...)
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Plain string
    Str(String),
    /// Finished comma-separated list
    List(Vec<String>),
    /// Additive list still open for composition
    Open(Vec<String>),
}

impl Value {
    /// Build a finished list from string slices.
    pub fn list<S: AsRef<str>>(items: &[S]) -> Self {
        Value::List(items.iter().map(|s| s.as_ref().to_string()).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Items of a list value, open or not.
    #[must_use]
    pub fn items(&self) -> Option<&[String]> {
        match self {
            Value::List(items) | Value::Open(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Value::Open(_))
    }

    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::List(_) | Value::Open(_))
    }

    /// A list with no items. Scalars, even empty strings, are never "empty".
    #[must_use]
    pub fn is_empty_list(&self) -> bool {
        self.items().is_some_and(<[String]>::is_empty)
    }

    /// The explicit `null` marker that cancels an inherited value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Value::Str(s) => s == "null",
            Value::List(items) | Value::Open(items) => items.len() == 1 && items[0] == "null",
            _ => false,
        }
    }

    /// Turn an open chain into a finished list; other values are unchanged.
    #[must_use]
    pub fn close(self) -> Self {
        match self {
            Value::Open(items) => Value::List(items),
            other => other,
        }
    }

    /// Consume the value as list items. Strings are split on commas.
    #[must_use]
    pub fn into_items(self) -> Vec<String> {
        match self {
            Value::List(items) | Value::Open(items) => items,
            other => other.to_names(),
        }
    }

    /// Comma-separated names held by the value, trimmed and without empties.
    #[must_use]
    pub fn to_names(&self) -> Vec<String> {
        match self {
            Value::List(items) | Value::Open(items) => items
                .iter()
                .flat_map(|item| item.split(','))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            Value::Str(s) => {
                s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
            }
            other => vec![other.to_string()],
        }
    }

    /// Apply `f` to the text of a string or of every list item.
    #[must_use]
    pub fn map_text(&self, f: impl Fn(&str) -> String) -> Self {
        match self {
            Value::Str(s) => Value::Str(f(s)),
            Value::List(items) => Value::List(items.iter().map(|i| f(i)).collect()),
            Value::Open(items) => Value::Open(items.iter().map(|i| f(i)).collect()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", if *b { "1" } else { "0" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => f.write_str(&items.join(",")),
            Value::Open(items) => write!(f, "+{}", items.join(",")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_names_splits_strings_and_list_items() {
        assert_eq!(Value::from(" a, b,,c ").to_names(), vec!["a", "b", "c"]);
        assert_eq!(Value::list(&["a,b", "c"]).to_names(), vec!["a", "b", "c"]);
        assert_eq!(Value::Int(3).to_names(), vec!["3"]);
    }

    #[test]
    fn test_null_marker_detection() {
        assert!(Value::from("null").is_null());
        assert!(Value::list(&["null"]).is_null());
        assert!(!Value::list(&["null", "x"]).is_null());
        assert!(!Value::from("nullable").is_null());
    }

    #[test]
    fn test_empty_list_is_not_empty_string() {
        assert!(Value::List(vec![]).is_empty_list());
        assert!(Value::Open(vec![]).is_empty_list());
        assert!(!Value::from("").is_empty_list());
    }

    #[test]
    fn test_close_only_touches_open_chains() {
        assert_eq!(Value::Open(vec!["a".into()]).close(), Value::list(&["a"]));
        assert_eq!(Value::from("a").close(), Value::from("a"));
    }

    #[test]
    fn test_map_text_leaves_numbers_alone() {
        let upper = |s: &str| s.to_uppercase();
        assert_eq!(Value::list(&["a", "b"]).map_text(upper), Value::list(&["A", "B"]));
        assert_eq!(Value::Int(4).map_text(upper), Value::Int(4));
    }

    #[test]
    fn test_display_marks_open_chains() {
        assert_eq!(Value::list(&["a", "b"]).to_string(), "a,b");
        assert_eq!(Value::Open(vec!["a".into()]).to_string(), "+a");
        assert_eq!(Value::Bool(false).to_string(), "0");
    }
}
