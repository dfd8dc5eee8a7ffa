//! Property descriptors and raw value conversion.

use super::Value;

/// How a raw value is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Bool,
    Int,
    Float,
    Str,
    /// One character, such as a state letter
    Char,
    List,
    /// Not declared by the schema: one raw value becomes a string, several a list
    Guess,
}

/// How values gathered from several sources (group membership back-fill, contact
/// group expansion) are combined into one list property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Merging {
    /// Append only values not already present
    #[default]
    Uniq,
    /// Append everything, keeping duplicates (pair-encoded lists)
    Join,
}

/// Declarative metadata for one property of a kind.
#[derive(Debug, Clone)]
pub struct Property {
    pub kind: PropKind,
    pub default: Option<Value>,
    /// Absence after inheritance and defaults is a configuration error
    pub required: bool,
    /// A leading `+` may compose this property with inherited values
    pub additive: bool,
    /// Raw values are split on commas (lists only)
    pub split_on_comma: bool,
    pub merging: Merging,
}

/// The property kind used for keys a schema does not declare.
pub(crate) static GUESSED: Property = Property::new(PropKind::Guess);

impl Property {
    #[must_use]
    pub const fn new(kind: PropKind) -> Self {
        Self {
            kind,
            default: None,
            required: false,
            additive: matches!(kind, PropKind::List),
            split_on_comma: true,
            merging: Merging::Uniq,
        }
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(PropKind::Bool)
    }

    #[must_use]
    pub const fn integer() -> Self {
        Self::new(PropKind::Int)
    }

    #[must_use]
    pub const fn float() -> Self {
        Self::new(PropKind::Float)
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::new(PropKind::Str)
    }

    #[must_use]
    pub const fn character() -> Self {
        Self::new(PropKind::Char)
    }

    #[must_use]
    pub const fn list() -> Self {
        Self::new(PropKind::List)
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn no_additive(mut self) -> Self {
        self.additive = false;
        self
    }

    /// Keep each raw line as one list item.
    #[must_use]
    pub const fn no_split(mut self) -> Self {
        self.split_on_comma = false;
        self
    }

    #[must_use]
    pub const fn merging(mut self, merging: Merging) -> Self {
        self.merging = merging;
        self
    }

    #[must_use]
    pub fn default_bool(mut self, value: bool) -> Self {
        self.default = Some(Value::Bool(value));
        self
    }

    #[must_use]
    pub fn default_int(mut self, value: i64) -> Self {
        self.default = Some(Value::Int(value));
        self
    }

    #[must_use]
    pub fn default_str(mut self, value: &str) -> Self {
        self.default = Some(Value::Str(value.to_string()));
        self
    }

    #[must_use]
    pub fn default_list(mut self, items: &[&str]) -> Self {
        self.default = Some(Value::list(items));
        self
    }

    /// Convert raw configuration strings into a typed value.
    ///
    /// Scalar kinds keep the last raw value when a key was given several times.
    pub fn pythonize(&self, raw: &[String]) -> Result<Value, String> {
        let last = raw.last().map(|s| s.trim()).unwrap_or_default();
        match self.kind {
            PropKind::Bool => parse_bool(last).map(Value::Bool),
            PropKind::Int => last
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("'{last}' is not an integer")),
            PropKind::Float => last
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("'{last}' is not a number")),
            PropKind::Str => Ok(Value::Str(last.to_string())),
            PropKind::Char => match last.chars().next() {
                Some(c) => Ok(Value::Str(c.to_string())),
                None => Err("an empty value is not a character".to_string()),
            },
            PropKind::List => {
                let items: Vec<String> = if self.split_on_comma {
                    raw.iter()
                        .flat_map(|r| r.split(','))
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                } else {
                    raw.iter().map(|r| r.trim()).filter(|s| !s.is_empty()).map(String::from).collect()
                };
                Ok(Value::List(items))
            }
            PropKind::Guess => match raw {
                [single] => Ok(Value::Str(single.trim().to_string())),
                many => Ok(Value::List(many.iter().map(|s| s.trim().to_string()).collect())),
            },
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("'{raw}' is not a boolean")),
    }
}
