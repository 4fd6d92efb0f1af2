/*
 * overrides.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Override unification and application.
//!
//! Overrides are partial configuration trees. They are combined in two steps:
//!
//! 1. [`unify`] folds any number of overrides (highest priority first) into a
//!    single override, so that higher-priority layers win key by key.
//! 2. [`apply`] writes the unified override onto the base tree produced by the
//!    schema's defaults, checking that every key it touches exists.
//!
//! Both steps share the same merge rules:
//!
//! - mapping onto mapping merges recursively, at the lowest level possible
//! - mapping onto sequence is an *index-override set*: each key is a signed
//!   integer index (`"0"`, `"-1"`) and replaces that element in place
//! - anything else replaces the previous value atomically, so sequences are
//!   never merged element-wise unless addressed by index
//!
//! An index override whose target element is itself a mapping merges into it
//! (with the same key checks), and one whose target element is a sequence is
//! interpreted as a nested index-override set when the override value is a
//! mapping. Every other combination replaces the element.

use crate::error::{ConfigError, Result};
use layerfig_value::{ConfigMap, ConfigPath, ConfigValue};

/// Options for [`apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Insert override keys that are missing from the base tree instead of
    /// failing with [`ConfigError::UnknownKey`].
    pub allow_unknown_keys: bool,
}

/// What to do with a key that exists in the override but not the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnknownKeys {
    /// Fail with `UnknownKey`.
    Reject,
    /// Insert it, reporting a warning.
    Insert,
    /// Insert it silently (unification builds the tree from nothing).
    Accumulate,
}

/// Unify overrides given in descending order of priority.
///
/// Overrides are folded from lowest to highest priority, so a full-sequence
/// replacement in a high-priority layer always beats index edits from lower
/// layers, while index edits in a higher layer land on a sequence supplied by
/// a lower one.
///
/// # Errors
///
/// Fails when an index-override key is not an integer or is out of bounds for
/// the sequence accumulated so far.
pub fn unify(overrides: &[ConfigMap]) -> Result<ConfigMap> {
    let mut unified = ConfigMap::new();

    for layer in overrides.iter().rev() {
        merge_map(&mut unified, layer, &ConfigPath::root(), UnknownKeys::Accumulate)?;
    }

    tracing::debug!(
        layers = overrides.len(),
        keys = unified.len(),
        "Unified configuration overrides"
    );
    Ok(unified)
}

/// Apply a (unified) override onto `base` in place.
///
/// # Errors
///
/// - [`ConfigError::UnknownKey`] when the override names a key that `base` does
///   not have and `options.allow_unknown_keys` is false; the error carries the
///   dotted path (`root.server`) of the mapping that lacked the key
/// - [`ConfigError::IndexParse`] / [`ConfigError::IndexOutOfBounds`] for bad
///   list-element overrides
pub fn apply(base: &mut ConfigMap, overrides: &ConfigMap, options: ApplyOptions) -> Result<()> {
    let unknown = if options.allow_unknown_keys {
        UnknownKeys::Insert
    } else {
        UnknownKeys::Reject
    };

    merge_map(base, overrides, &ConfigPath::root(), unknown)
}

fn merge_map(
    base: &mut ConfigMap,
    overrides: &ConfigMap,
    trace: &ConfigPath,
    unknown: UnknownKeys,
) -> Result<()> {
    for (key, value) in overrides {
        match base.get_mut(key) {
            None => match unknown {
                UnknownKeys::Reject => {
                    return Err(ConfigError::UnknownKey {
                        key: key.clone(),
                        trace: trace.clone(),
                    });
                }
                UnknownKeys::Insert => {
                    tracing::warn!(key = %key, trace = %trace, "Inserting unknown override key");
                    base.insert(key.clone(), value.clone());
                }
                UnknownKeys::Accumulate => {
                    base.insert(key.clone(), value.clone());
                }
            },
            Some(existing) => merge_value(existing, value, &trace.key(key), unknown)?,
        }
    }

    Ok(())
}

fn merge_value(
    existing: &mut ConfigValue,
    value: &ConfigValue,
    trace: &ConfigPath,
    unknown: UnknownKeys,
) -> Result<()> {
    match (existing, value) {
        (ConfigValue::Mapping(base), ConfigValue::Mapping(overrides)) => {
            merge_map(base, overrides, trace, unknown)
        }
        (ConfigValue::Sequence(items), ConfigValue::Mapping(edits)) => {
            merge_indices(items, edits, trace, unknown)
        }
        (existing, value) => {
            *existing = value.clone();
            Ok(())
        }
    }
}

/// Apply an index-override set onto a sequence.
fn merge_indices(
    items: &mut [ConfigValue],
    edits: &ConfigMap,
    trace: &ConfigPath,
    unknown: UnknownKeys,
) -> Result<()> {
    for (index, value) in edits {
        let position = resolve_index(index, items.len(), trace)?;
        merge_value(&mut items[position], value, &trace.index(position), unknown)?;
    }

    Ok(())
}

/// Resolve a (possibly negative) index key against a sequence length.
///
/// Valid indices lie in `[-len, len - 1]`; negative indices count from the end.
pub fn resolve_index(index: &str, len: usize, trace: &ConfigPath) -> Result<usize> {
    let parsed: i64 = index.parse().map_err(|_| ConfigError::IndexParse {
        index: index.to_string(),
        trace: trace.clone(),
    })?;

    let out_of_bounds = || ConfigError::IndexOutOfBounds {
        index: parsed,
        len,
        trace: trace.clone(),
    };

    let signed_len = i64::try_from(len).map_err(|_| out_of_bounds())?;
    let resolved = if parsed < 0 { parsed + signed_len } else { parsed };

    if (0..signed_len).contains(&resolved) {
        usize::try_from(resolved).map_err(|_| out_of_bounds())
    } else {
        Err(out_of_bounds())
    }
}
