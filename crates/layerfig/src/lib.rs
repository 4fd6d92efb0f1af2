//! Layered, templated configuration loading.
//!
//! A configuration is described by a typed schema whose defaults form the base
//! tree. Any number of partial overrides, ordered by priority, are merged onto
//! it, and string values may carry placeholders that are resolved at load time
//! by pluggable evaluators.
//!
//! # Key Features
//!
//! - **Priority merging**: higher-priority overrides win key by key, at the deepest level possible
//! - **Index overrides**: a mapping such as `{"0": 5, "-1": 9}` edits single sequence elements
//! - **Strict keys**: overrides may only set keys the schema declares
//! - **Templates**: `${{name.argument}}` placeholders, resolved to a fixed point
//!
//! # Architecture
//!
//! - [`unify`] and [`apply`]: the merge stages
//! - [`evaluate`](evaluate()): the template stage, driven by [`Evaluator`]s
//! - [`Schema`]: the typed boundary (defaults in, configuration out)
//! - [`Loader`] / [`load_configuration`]: the whole pipeline
//!
//! # Example
//!
//! ```rust
//! use layerfig::{ConfigValue, EnvironmentEvaluator, Loader, VariableEvaluator};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct Config {
//!     replicas: Vec<u32>,
//!     debug: bool,
//! }
//!
//! let layer = ConfigValue::from(serde_json::json!({
//!     "replicas": [1, 2, 3],
//!     "debug": "${{var.debug}}",
//! }));
//! let fix = ConfigValue::from(serde_json::json!({ "replicas": { "-1": 30 } }));
//!
//! let config: Config = Loader::new()
//!     .with_override(fix.into_mapping().unwrap())
//!     .with_override(layer.into_mapping().unwrap())
//!     .with_evaluator(VariableEvaluator::default().with("debug", true))
//!     .with_evaluator(EnvironmentEvaluator)
//!     .load()
//!     .unwrap();
//!
//! assert_eq!(config.replicas, vec![1, 2, 30]);
//! assert!(config.debug);
//! ```

mod error;
mod evaluate;
pub mod evaluators;
pub mod expr;
mod loader;
mod overrides;
mod schema;
pub mod template;

pub use error::{ConfigError, Result, ValidationError};

pub use evaluate::{evaluate, evaluate_map, evaluate_string, find_evaluator};

pub use evaluators::{
    CatEvaluator,
    EnvironmentEvaluator,
    Evaluator,
    EvaluatorError,
    ExpressionEvaluator,
    VariableEvaluator,
};

pub use loader::{LoadOptions, Loader, load_configuration, resolve_tree};

pub use overrides::{ApplyOptions, apply, resolve_index, unify};

pub use schema::Schema;

pub use layerfig_value::{ConfigMap, ConfigPath, ConfigValue};
