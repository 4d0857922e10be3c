//! Parsed `terraform output -json` values.

use std::collections::BTreeMap;

use serde_json::Value;

/// A named output value as exposed by an applied configuration.
///
/// Terraform outputs are arbitrary JSON; the two shapes the harness cares
/// about are scalar strings and ordered string sequences, but the full tree
/// is preserved so map-typed outputs stay inspectable.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    Null,
    Bool(bool),
    /// Kept as [`serde_json::Number`] rather than `f64` so large integers
    /// survive unchanged and equality stays well-defined (no NaN).
    Number(serde_json::Number),
    Str(String),
    List(Vec<OutputValue>),
    Map(BTreeMap<String, OutputValue>),
}

impl OutputValue {
    /// Scalar string accessor.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Sequence accessor.
    #[must_use]
    pub fn as_list(&self) -> Option<&[OutputValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Sequence-of-strings accessor. `None` if this is not a list or any
    /// element is not a string.
    #[must_use]
    pub fn as_str_list(&self) -> Option<Vec<&str>> {
        self.as_list()?.iter().map(Self::as_str).collect()
    }

    /// Map accessor.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, OutputValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Human-readable shape name, used in type-mismatch errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<Value> for OutputValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}
