//! Core definition of the configuration tree.

use indexmap::IndexMap;
use std::fmt;

/// An ordered mapping from string keys to configuration values.
pub type ConfigMap = IndexMap<String, ConfigValue>;

/// A node of a configuration tree.
///
/// Mirrors the value model shared by YAML, JSON and TOML: scalars, sequences
/// and string-keyed mappings. Mapping keys keep their insertion order so that
/// output is reproducible, but order carries no meaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigValue {
    /// Absent value (`null`, `~`, `None`).
    #[default]
    Null,

    Bool(bool),

    Integer(i64),

    Float(f64),

    String(String),

    /// Ordered list. Replaced atomically unless addressed by index.
    Sequence(Vec<ConfigValue>),

    /// String-keyed mapping. Merged key by key.
    Mapping(ConfigMap),
}

impl ConfigValue {
    /// Create an empty mapping.
    pub fn mapping() -> Self {
        ConfigValue::Mapping(ConfigMap::new())
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Sequence(_) => "sequence",
            ConfigValue::Mapping(_) => "mapping",
        }
    }

    /// Check if this is a scalar (anything other than a sequence or mapping).
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ConfigValue::Sequence(_) | ConfigValue::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ConfigValue::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, ConfigValue::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Consume the value, returning the mapping if it is one.
    pub fn into_mapping(self) -> Option<ConfigMap> {
        match self {
            ConfigValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Follow a path of mapping keys and sequence indices.
    ///
    /// Sequence elements are addressed by their decimal index (`"0"`, `"1"`, ...).
    pub fn pointer(&self, path: &[&str]) -> Option<&ConfigValue> {
        let mut current = self;
        for segment in path {
            current = match current {
                ConfigValue::Mapping(entries) => entries.get(*segment)?,
                ConfigValue::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Count the string leaves of the tree.
    pub fn string_leaf_count(&self) -> usize {
        match self {
            ConfigValue::String(_) => 1,
            ConfigValue::Sequence(items) => items.iter().map(Self::string_leaf_count).sum(),
            ConfigValue::Mapping(entries) => entries.values().map(Self::string_leaf_count).sum(),
            _ => 0,
        }
    }
}

/// Renders the value the way it appears when spliced into a larger string.
///
/// Strings are written verbatim (no quotes), other scalars use their YAML/JSON
/// literal spelling, and containers are written as compact JSON. This is not
/// Python's `str()`: `false`, `null` and `[1,2]` are written where Python
/// would write `False`, `None` and `[1, 2]`.
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => f.write_str("null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            // Debug keeps the fractional part ("1.0" rather than "1")
            ConfigValue::Float(x) => write!(f, "{:?}", x),
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::Sequence(_) | ConfigValue::Mapping(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(items: Vec<T>) -> Self {
        ConfigValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(entries: ConfigMap) -> Self {
        ConfigValue::Mapping(entries)
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ConfigValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_predicates() {
        assert!(ConfigValue::Null.is_scalar());
        assert!(ConfigValue::from("x").is_scalar());
        assert!(!ConfigValue::from(vec![1, 2]).is_scalar());
        assert!(ConfigValue::mapping().is_mapping());
        assert!(ConfigValue::from(vec![1]).is_sequence());
    }

    #[test]
    fn test_pointer_through_mapping_and_sequence() {
        let tree = ConfigValue::from(json!({
            "objects": [ { "name": "foo" }, { "name": "bar" } ]
        }));

        assert_eq!(
            tree.pointer(&["objects", "1", "name"]),
            Some(&ConfigValue::from("bar"))
        );
        assert_eq!(tree.pointer(&["objects", "2"]), None);
        assert_eq!(tree.pointer(&["objects", "x"]), None);
        assert_eq!(tree.pointer(&[]), Some(&tree));
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(ConfigValue::Null.to_string(), "null");
        assert_eq!(ConfigValue::Bool(false).to_string(), "false");
        assert_eq!(ConfigValue::Integer(-3).to_string(), "-3");
        assert_eq!(ConfigValue::Float(2.0).to_string(), "2.0");
        assert_eq!(ConfigValue::Float(2.5).to_string(), "2.5");
        assert_eq!(ConfigValue::from("plain text").to_string(), "plain text");
    }

    #[test]
    fn test_display_containers_as_json() {
        let tree = ConfigValue::from(json!({ "a": [1, "b"] }));
        assert_eq!(tree.to_string(), r#"{"a":[1,"b"]}"#);
    }

    #[test]
    fn test_string_leaf_count() {
        let tree = ConfigValue::from(json!({
            "a": "x",
            "b": ["y", 1, { "c": "z" }],
            "d": null
        }));
        assert_eq!(tree.string_leaf_count(), 3);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(ConfigValue::from(None::<i64>), ConfigValue::Null);
        assert_eq!(ConfigValue::from(Some(4)), ConfigValue::Integer(4));
    }
}
