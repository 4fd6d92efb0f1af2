/*
 * evaluators/mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template evaluators.
//!
//! An evaluator resolves the placeholders that carry its name: for
//! `${{env.HOME}}` the evaluator named `env` is called with the argument
//! `HOME`. Evaluators are always supplied explicitly by the caller; there is
//! no global registry.
//!
//! Built-in evaluators:
//!
//! | Name | Type | Argument |
//! |------|------|----------|
//! | `var` | [`VariableEvaluator`] | a variable name |
//! | `env` | [`EnvironmentEvaluator`] | an environment variable name |
//! | `cat` | [`CatEvaluator`] | `path[:encoding]` |
//! | `pyeval` | [`ExpressionEvaluator`] | an arithmetic/literal expression |

mod cat;
mod environment;
mod expression;
mod variable;

pub use cat::CatEvaluator;
pub use environment::EnvironmentEvaluator;
pub use expression::ExpressionEvaluator;
pub use variable::VariableEvaluator;

use crate::expr::ExprError;
use layerfig_value::ConfigValue;
use std::path::PathBuf;
use thiserror::Error;

/// A named strategy that turns a placeholder argument into a value.
///
/// Implement this trait to add new kinds of deferred values.
///
/// # Example
///
/// ```
/// use layerfig::{ConfigValue, Evaluator, EvaluatorError};
///
/// struct Upper;
///
/// impl Evaluator for Upper {
///     fn name(&self) -> &str {
///         "upper"
///     }
///
///     fn evaluate(&self, argument: &str) -> Result<ConfigValue, EvaluatorError> {
///         Ok(ConfigValue::from(argument.to_uppercase()))
///     }
/// }
/// ```
pub trait Evaluator: Send + Sync {
    /// The placeholder name this evaluator answers to.
    fn name(&self) -> &str;

    /// Resolve `argument` (the text after the `.`; empty if there is none).
    ///
    /// The returned value may itself contain placeholders; they are resolved
    /// on a later sweep.
    fn evaluate(&self, argument: &str) -> Result<ConfigValue, EvaluatorError>;
}

/// Reasons an evaluator can fail.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("Environment variable '{name}' is not set")]
    MissingEnvironmentVariable { name: String },

    #[error("Environment variable '{name}' is not valid unicode")]
    NonUnicodeEnvironmentVariable { name: String },

    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown encoding '{label}'")]
    UnknownEncoding { label: String },

    #[error("'{}' cannot be decoded as {encoding}", path.display())]
    Decode { path: PathBuf, encoding: String },

    #[error(transparent)]
    Expression(#[from] ExprError),

    /// Failure reported by an application-defined evaluator.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl EvaluatorError {
    /// Wrap an arbitrary error (or message) from a custom evaluator.
    pub fn custom(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        EvaluatorError::Custom(error.into())
    }
}
