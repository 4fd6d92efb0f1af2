/*
 * metaconf.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Meta-configuration: a file that says how the application's configuration
//! is loaded.
//!
//! ```yaml
//! configs:                 # descending priority
//!   - local.toml
//!   - /etc/app/config.json
//! evaluators:
//!   layerfig.VariableEvaluator:
//!     region: eu-west-1
//!   layerfig.EnvironmentEvaluator: {}
//! overrides:               # highest priority of all
//!   debug: true
//! allow_unused: false
//! ```

use crate::error::{MetaconfError, Result};
use crate::registry::EvaluatorRegistry;
use crate::source::load_file;
use indexmap::IndexMap;
use layerfig::{Evaluator, LoadOptions, Schema, load_configuration};
use layerfig_value::{ConfigMap, ConfigValue};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The on-disk shape of a meta-configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MetaconfFile {
    configs: Vec<PathBuf>,
    evaluators: IndexMap<String, Option<ConfigMap>>,
    overrides: ConfigMap,
    allow_unused: bool,
    allow_unknown_keys: bool,
}

/// Everything needed to load an application's configuration.
#[derive(Default)]
pub struct Metaconf {
    configs: Vec<PathBuf>,
    evaluators: Vec<Box<dyn Evaluator>>,
    overrides: ConfigMap,
    options: LoadOptions,
}

impl Metaconf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a meta-configuration file.
    ///
    /// Relative `configs` paths are resolved against the file's directory.
    /// Evaluators are built through `registry`.
    pub fn from_path(path: impl AsRef<Path>, registry: &EvaluatorRegistry) -> Result<Self> {
        let path = path.as_ref();
        let map = load_file(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        Self::from_map(map, base, path, registry)
    }

    /// Build a meta-configuration from an already loaded tree.
    ///
    /// `origin` names the tree's source in error messages.
    pub fn from_map(
        map: ConfigMap,
        base_dir: &Path,
        origin: &Path,
        registry: &EvaluatorRegistry,
    ) -> Result<Self> {
        let json = serde_json::Value::from(ConfigValue::Mapping(map));
        let file: MetaconfFile =
            serde_json::from_value(json).map_err(|e| MetaconfError::Invalid {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;

        let configs = file
            .configs
            .into_iter()
            .map(|config| {
                if config.is_relative() {
                    base_dir.join(config)
                } else {
                    config
                }
            })
            .collect();

        let evaluators = file
            .evaluators
            .iter()
            .map(|(identifier, params)| {
                registry.construct(identifier, params.as_ref().unwrap_or(&ConfigMap::new()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            configs,
            evaluators,
            overrides: file.overrides,
            options: LoadOptions {
                allow_unused: file.allow_unused,
                allow_unknown_keys: file.allow_unknown_keys,
            },
        })
    }

    /// Add a config file with lower priority than those already listed.
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.configs.push(path.into());
        self
    }

    pub fn with_evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluators.push(Box::new(evaluator));
        self
    }

    pub fn with_overrides(mut self, overrides: ConfigMap) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn configs(&self) -> &[PathBuf] {
        &self.configs
    }

    pub fn evaluators(&self) -> &[Box<dyn Evaluator>] {
        &self.evaluators
    }

    pub fn overrides(&self) -> &ConfigMap {
        &self.overrides
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Read every config file and return the override layers, highest
    /// priority first (the inline overrides lead).
    pub fn layers(&self) -> Result<Vec<ConfigMap>> {
        let mut layers = Vec::with_capacity(self.configs.len() + 1);
        layers.push(self.overrides.clone());
        for config in &self.configs {
            layers.push(load_file(config)?);
        }
        Ok(layers)
    }

    /// Load the application's configuration.
    pub fn load_config<T: Schema>(&self) -> Result<T> {
        let layers = self.layers()?;
        tracing::debug!(
            files = self.configs.len(),
            evaluators = self.evaluators.len(),
            "Loading configuration from meta-configuration"
        );
        Ok(load_configuration(&layers, &self.evaluators, self.options)?)
    }
}

impl std::fmt::Debug for Metaconf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metaconf")
            .field("configs", &self.configs)
            .field(
                "evaluators",
                &self.evaluators.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .field("overrides", &self.overrides)
            .field("options", &self.options)
            .finish()
    }
}
