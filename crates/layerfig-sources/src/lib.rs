//! Configuration files and meta-configuration for layerfig.
//!
//! - [`load_file`] reads a YAML, JSON, TOML or INI file into an override layer
//! - [`Metaconf`] describes which files, evaluators and inline overrides make up
//!   an application's configuration, and loads it
//! - [`EvaluatorRegistry`] turns the evaluator identifiers named in a
//!   meta-configuration into evaluators
//!
//! # Example
//!
//! ```rust,no_run
//! use layerfig_sources::{EvaluatorRegistry, Metaconf};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct Config {
//!     port: u16,
//! }
//!
//! let registry = EvaluatorRegistry::with_builtins();
//! let metaconf = Metaconf::from_path("metaconf.yaml", &registry)?;
//! let config: Config = metaconf.load_config()?;
//! # Ok::<(), layerfig_sources::MetaconfError>(())
//! ```

mod error;
mod metaconf;
mod registry;
mod source;

pub use error::{MetaconfError, Result, SourceError};
pub use metaconf::Metaconf;
pub use registry::{EvaluatorFactory, EvaluatorRegistry, FactoryError};
pub use source::{Format, load_file, parse};
