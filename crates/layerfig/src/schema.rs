/*
 * schema.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The boundary between configuration trees and typed configuration.
//!
//! A schema supplies the base tree (its defaults) and builds itself from the
//! fully resolved tree. Any `serde` type with a `Default` implementation is a
//! schema.

use crate::error::ValidationError;
use layerfig_value::{ConfigMap, ConfigPath, ConfigValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A typed configuration that can be loaded from layered overrides.
pub trait Schema: Sized {
    /// The default tree that overrides are applied to.
    ///
    /// Its keys are the only keys overrides may set.
    fn defaults() -> Result<ConfigMap, ValidationError>;

    /// Build the configuration from a resolved tree.
    ///
    /// When `strict` is set, keys the schema does not declare are an error
    /// instead of being ignored.
    fn construct(tree: ConfigMap, strict: bool) -> Result<Self, ValidationError>;
}

impl<T> Schema for T
where
    T: Default + Serialize + DeserializeOwned,
{
    fn defaults() -> Result<ConfigMap, ValidationError> {
        let json = serde_json::to_value(T::default()).map_err(|e| ValidationError::Defaults {
            message: e.to_string(),
        })?;

        let value = ConfigValue::from(json);
        let kind = value.type_name();
        value
            .into_mapping()
            .ok_or(ValidationError::DefaultsNotAMapping { kind })
    }

    fn construct(tree: ConfigMap, strict: bool) -> Result<Self, ValidationError> {
        let tree = ConfigValue::Mapping(tree);
        if let Some(path) = find_non_finite(&tree, &ConfigPath::root()) {
            return Err(ValidationError::NonFiniteFloat { path });
        }
        let input = JsonValue::from(tree);

        let config: T =
            serde_json::from_value(input.clone()).map_err(|e| ValidationError::Deserialize {
                message: e.to_string(),
            })?;

        if strict {
            let echo = serde_json::to_value(&config).map_err(|e| ValidationError::Deserialize {
                message: e.to_string(),
            })?;
            if let Some(path) = find_unused(&input, &echo, &ConfigPath::root()) {
                return Err(ValidationError::UnusedKey { path });
            }
        }

        Ok(config)
    }
}

/// Find the first NaN or infinite float. JSON has no spelling for them.
fn find_non_finite(value: &ConfigValue, path: &ConfigPath) -> Option<ConfigPath> {
    match value {
        ConfigValue::Float(f) if !f.is_finite() => Some(path.clone()),
        ConfigValue::Sequence(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_non_finite(item, &path.index(i))),
        ConfigValue::Mapping(entries) => entries
            .iter()
            .find_map(|(key, value)| find_non_finite(value, &path.key(key))),
        _ => None,
    }
}

/// Find the first key in `input` that did not survive a deserialize/serialize
/// round trip through the schema.
///
/// Fields the schema never serializes (`skip_serializing`) are reported as
/// unused.
fn find_unused(input: &JsonValue, echo: &JsonValue, path: &ConfigPath) -> Option<ConfigPath> {
    match (input, echo) {
        (JsonValue::Object(input), JsonValue::Object(echo)) => {
            input.iter().find_map(|(key, value)| {
                let path = path.key(key);
                match echo.get(key) {
                    None => Some(path),
                    Some(echoed) => find_unused(value, echoed, &path),
                }
            })
        }
        (JsonValue::Array(input), JsonValue::Array(echo)) => input
            .iter()
            .zip(echo)
            .enumerate()
            .find_map(|(i, (value, echoed))| find_unused(value, echoed, &path.index(i))),
        _ => None,
    }
}
