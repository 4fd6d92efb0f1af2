/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for configuration resolution.

use crate::evaluators::EvaluatorError;
use layerfig_value::ConfigPath;
use thiserror::Error;

/// Errors that can occur while resolving a configuration.
///
/// Every variant is fatal to the enclosing load: there is no partial result.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An override names a key that the base tree does not have.
    #[error("Unknown key '{key}' in override ({trace})")]
    UnknownKey { key: String, trace: ConfigPath },

    /// A list-element override key is not an integer.
    #[error("Invalid list index '{index}' in override ({trace}): index must be an integer")]
    IndexParse { index: String, trace: ConfigPath },

    /// A list-element override index falls outside the target sequence.
    #[error("List index {index} out of bounds for sequence of length {len} ({trace})")]
    IndexOutOfBounds {
        index: i64,
        len: usize,
        trace: ConfigPath,
    },

    /// No evaluator is registered under the placeholder's name.
    #[error("No evaluator found for name: '{name}'")]
    UnknownEvaluator { name: String },

    /// More than one evaluator is registered under the placeholder's name.
    #[error("Multiple evaluators found for name: '{name}' ({count} candidates)")]
    AmbiguousEvaluator { name: String, count: usize },

    /// An evaluator failed to resolve its argument.
    #[error("Failed to evaluate '{argument}' with evaluator '{evaluator}': {source}")]
    Evaluation {
        evaluator: String,
        argument: String,
        #[source]
        source: EvaluatorError,
    },

    /// The resolved tree does not fit the target schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors raised at the schema boundary.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The schema's default instance could not be turned into a tree.
    #[error("Failed to produce default configuration: {message}")]
    Defaults { message: String },

    /// The schema's defaults are not a mapping (e.g. the schema is a tuple or a scalar).
    #[error("Default configuration must be a mapping, found {kind}")]
    DefaultsNotAMapping { kind: &'static str },

    /// The tree could not be deserialized into the schema type.
    #[error("Configuration does not match schema: {message}")]
    Deserialize { message: String },

    /// A key in the tree is not declared by the schema.
    #[error("Unused configuration key at {path}")]
    UnusedKey { path: ConfigPath },

    /// A float in the tree is NaN or infinite, which the schema cannot receive.
    #[error("Non-finite float at {path}")]
    NonFiniteFloat { path: ConfigPath },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
