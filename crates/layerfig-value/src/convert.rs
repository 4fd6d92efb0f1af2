//! Conversion between `ConfigValue` and the value types of the file-format crates.

use crate::value::{ConfigMap, ConfigValue};
use thiserror::Error;

/// Errors raised when a foreign value cannot be represented as a tree.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueError {
    /// Mapping key that is neither a string nor a scalar that can be stringified.
    #[error("Unsupported mapping key of type {kind}: keys must be strings, numbers or booleans")]
    UnsupportedKey { kind: &'static str },
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(b) => ConfigValue::Bool(b),
            serde_json::Value::Number(n) => number_from_json(&n),
            serde_json::Value::String(s) => ConfigValue::String(s),
            serde_json::Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(entries) => ConfigValue::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, ConfigValue::from(value)))
                    .collect(),
            ),
        }
    }
}

fn number_from_json(n: &serde_json::Number) -> ConfigValue {
    if let Some(i) = n.as_i64() {
        ConfigValue::Integer(i)
    } else {
        // u64 beyond i64::MAX and real floats both land here
        ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Non-finite floats have no JSON spelling and become `null`.
impl From<ConfigValue> for serde_json::Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => serde_json::Value::Null,
            ConfigValue::Bool(b) => serde_json::Value::Bool(b),
            ConfigValue::Integer(i) => serde_json::Value::Number(i.into()),
            ConfigValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ConfigValue::String(s) => serde_json::Value::String(s),
            ConfigValue::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            ConfigValue::Mapping(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}

/// YAML allows non-string keys; scalar keys are stringified so that
/// `0: 100` addresses index `"0"` in an override.
impl TryFrom<serde_yaml::Value> for ConfigValue {
    type Error = ValueError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            serde_yaml::Value::Null => ConfigValue::Null,
            serde_yaml::Value::Bool(b) => ConfigValue::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Integer(i)
                } else {
                    ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => ConfigValue::String(s),
            serde_yaml::Value::Sequence(items) => ConfigValue::Sequence(
                items
                    .into_iter()
                    .map(ConfigValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_yaml::Value::Mapping(entries) => {
                let mut map = ConfigMap::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(yaml_key(key)?, ConfigValue::try_from(value)?);
                }
                ConfigValue::Mapping(map)
            }
            serde_yaml::Value::Tagged(tagged) => ConfigValue::try_from(tagged.value)?,
        })
    }
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, ValueError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Sequence(_) => Err(ValueError::UnsupportedKey { kind: "sequence" }),
        serde_yaml::Value::Mapping(_) => Err(ValueError::UnsupportedKey { kind: "mapping" }),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
    }
}

/// TOML datetimes have no tree counterpart and are kept in their RFC 3339 spelling.
impl From<toml::Value> for ConfigValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => ConfigValue::String(s),
            toml::Value::Integer(i) => ConfigValue::Integer(i),
            toml::Value::Float(f) => ConfigValue::Float(f),
            toml::Value::Boolean(b) => ConfigValue::Bool(b),
            toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
            toml::Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            toml::Value::Table(entries) => ConfigValue::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, ConfigValue::from(value)))
                    .collect(),
            ),
        }
    }
}
