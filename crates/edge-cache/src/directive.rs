//! Cache-Control directives and ordered directive tables.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CachePolicyError, CachePolicyResult};

/// Directive names accepted unless the host configures otherwise.
pub const DEFAULT_ALLOWED_DIRECTIVES: [&str; 9] = [
    "public",
    "private",
    "no-cache",
    "max-age",
    "s-maxage",
    "must-revalidate",
    "proxy-revalidate",
    "no-store",
    "no-transform",
];

/// Value attached to a directive.
///
/// `Flag(true)` renders as the bare directive name. `Flag(false)` means the
/// directive is absent; when written it removes the directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirectiveValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl DirectiveValue {
    /// Whether this value removes the directive.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Flag(false))
    }

    /// Numeric value, if any.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Render the directive token for a header value.
    ///
    /// Returns `None` for absent directives.
    pub fn render(&self, name: &str) -> Option<String> {
        match self {
            Self::Flag(true) => Some(name.to_string()),
            Self::Flag(false) => None,
            Self::Number(n) => Some(format!("{}={}", name, n)),
            Self::Text(s) => Some(format!("{}={}", name, s)),
        }
    }

    pub(crate) fn validate(&self, name: &str) -> CachePolicyResult<()> {
        match self {
            Self::Text(s) if s.chars().any(char::is_control) => {
                Err(CachePolicyError::InvalidValue(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Convert a configuration value, naming `directive` in any error.
    ///
    /// JSON `null` is the unset sentinel and is rejected, as are arrays and
    /// objects. Non-integer numbers are kept as text.
    pub fn from_json(directive: &str, value: serde_json::Value) -> CachePolicyResult<Self> {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Ok(Self::Flag(b)),
            Value::Number(n) => Ok(n.as_i64().map(Self::Number).unwrap_or_else(|| Self::Text(n.to_string()))),
            Value::String(s) => Ok(Self::Text(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                Err(CachePolicyError::InvalidValue(directive.to_string()))
            }
        }
    }
}

impl fmt::Display for DirectiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for DirectiveValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DirectiveValue {
                fn from(n: $t) -> Self {
                    Self::Number(i64::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for DirectiveValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DirectiveValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl TryFrom<serde_json::Value> for DirectiveValue {
    type Error = CachePolicyError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_json("<unnamed>", value)
    }
}

/// Directives for one state, kept in insertion order.
///
/// Overwriting a directive keeps its position; removing and re-adding it
/// moves it to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveTable {
    entries: Vec<(String, DirectiveValue)>,
}

impl DirectiveTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given flags set, in order.
    pub fn with_flags(names: &[&str]) -> Self {
        let mut table = Self::new();
        for name in names {
            table.insert(name, DirectiveValue::Flag(true));
        }
        table
    }

    /// Set or overwrite a directive. Names are expected lowercase.
    pub fn insert(&mut self, name: &str, value: DirectiveValue) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Remove a directive, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<DirectiveValue> {
        let pos = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Look up a directive.
    pub fn get(&self, name: &str) -> Option<&DirectiveValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Whether the directive is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate directives in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectiveValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of directives.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the table as a Cache-Control header value.
    pub fn header_value(&self) -> String {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.render(name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
