/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The load pipeline.
//!
//! ```text
//! overrides -> unify -> apply onto defaults -> evaluate (to a fixed point) -> construct
//! ```
//!
//! The schema's defaults form the base tree. The overrides (highest priority
//! first) are unified into one, applied to the base, and the result has its
//! placeholders resolved before being handed to the schema.

use crate::error::Result;
use crate::evaluate;
use crate::evaluators::Evaluator;
use crate::overrides::{self, ApplyOptions};
use crate::schema::Schema;
use layerfig_value::ConfigMap;

/// Options controlling how strictly a configuration is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Let the schema ignore keys it does not declare instead of failing
    /// with [`ValidationError::UnusedKey`](crate::ValidationError::UnusedKey).
    pub allow_unused: bool,

    /// Let overrides introduce keys that the defaults do not have.
    pub allow_unknown_keys: bool,
}

impl LoadOptions {
    fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            allow_unknown_keys: self.allow_unknown_keys,
        }
    }
}

/// Load a configuration of type `T`.
///
/// `overrides` are given in descending order of priority. Evaluators are
/// looked up by name for every placeholder in the merged tree.
pub fn load_configuration<T: Schema>(
    overrides: &[ConfigMap],
    evaluators: &[Box<dyn Evaluator>],
    options: LoadOptions,
) -> Result<T> {
    let tree = resolve_tree::<T>(overrides, evaluators, options)?;

    let config = T::construct(tree, !options.allow_unused)?;
    tracing::debug!(strict = !options.allow_unused, "Constructed configuration");
    Ok(config)
}

/// Run the pipeline up to, but not including, construction.
///
/// Useful for inspecting or serializing the resolved tree.
pub fn resolve_tree<T: Schema>(
    overrides: &[ConfigMap],
    evaluators: &[Box<dyn Evaluator>],
    options: LoadOptions,
) -> Result<ConfigMap> {
    let mut tree = T::defaults()?;
    tracing::debug!(keys = tree.len(), "Built default tree");

    let unified = overrides::unify(overrides)?;
    overrides::apply(&mut tree, &unified, options.apply_options())?;
    tracing::debug!(layers = overrides.len(), "Applied overrides");

    evaluate::evaluate_map(&mut tree, evaluators)?;
    Ok(tree)
}

/// Builder over [`load_configuration`].
///
/// # Example
///
/// ```
/// use layerfig::{ConfigMap, ConfigValue, Loader, VariableEvaluator};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct Db {
///     user: String,
///     port: u16,
/// }
///
/// let mut high = ConfigMap::new();
/// high.insert("user".to_string(), ConfigValue::from("${{var.user}}"));
///
/// let mut low = ConfigMap::new();
/// low.insert("user".to_string(), ConfigValue::from("nobody"));
/// low.insert("port".to_string(), ConfigValue::from(5432));
///
/// let db: Db = Loader::new()
///     .with_override(high)
///     .with_override(low)
///     .with_evaluator(VariableEvaluator::default().with("user", "admin"))
///     .load()
///     .unwrap();
///
/// assert_eq!(db.user, "admin");
/// assert_eq!(db.port, 5432);
/// ```
#[derive(Default)]
pub struct Loader {
    overrides: Vec<ConfigMap>,
    evaluators: Vec<Box<dyn Evaluator>>,
    options: LoadOptions,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override with lower priority than those already added.
    pub fn with_override(mut self, layer: ConfigMap) -> Self {
        self.overrides.push(layer);
        self
    }

    /// Add overrides, highest priority first, below those already added.
    pub fn with_overrides(mut self, layers: impl IntoIterator<Item = ConfigMap>) -> Self {
        self.overrides.extend(layers);
        self
    }

    pub fn with_evaluator(self, evaluator: impl Evaluator + 'static) -> Self {
        self.with_boxed_evaluator(Box::new(evaluator))
    }

    pub fn with_boxed_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    pub fn allow_unused(mut self, allow: bool) -> Self {
        self.options.allow_unused = allow;
        self
    }

    pub fn allow_unknown_keys(mut self, allow: bool) -> Self {
        self.options.allow_unknown_keys = allow;
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn overrides(&self) -> &[ConfigMap] {
        &self.overrides
    }

    pub fn evaluators(&self) -> &[Box<dyn Evaluator>] {
        &self.evaluators
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Resolve the tree without constructing `T`.
    pub fn resolve_tree<T: Schema>(&self) -> Result<ConfigMap> {
        resolve_tree::<T>(&self.overrides, &self.evaluators, self.options)
    }

    pub fn load<T: Schema>(&self) -> Result<T> {
        load_configuration(&self.overrides, &self.evaluators, self.options)
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("overrides", &self.overrides)
            .field(
                "evaluators",
                &self.evaluators.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use layerfig_value::ConfigValue;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Simple {
        a: i64,
        b: String,
    }

    fn layer(value: serde_json::Value) -> ConfigMap {
        ConfigValue::from(value).into_mapping().unwrap()
    }

    #[test]
    fn test_no_overrides_gives_defaults() {
        let config: Simple = Loader::new().load().unwrap();
        assert_eq!(config.a, 0);
        assert_eq!(config.b, "");
    }

    #[test]
    fn test_unknown_key_rejected_by_default() {
        let err = Loader::new()
            .with_override(layer(json!({"c": 1})))
            .load::<Simple>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { ref key, .. } if key == "c"));
    }

    #[test]
    fn test_unknown_key_needs_allow_unused_too() {
        let loader = Loader::new()
            .with_override(layer(json!({"c": 1})))
            .allow_unknown_keys(true);

        let err = loader.load::<Simple>().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let config: Simple = loader.allow_unused(true).load().unwrap();
        assert_eq!(config.a, 0);
    }

    #[test]
    fn test_resolve_tree() {
        let tree = Loader::new()
            .with_override(layer(json!({"a": 5})))
            .resolve_tree::<Simple>()
            .unwrap();
        assert_eq!(tree, layer(json!({"a": 5, "b": ""})));
    }

    #[test]
    fn test_debug_lists_evaluator_names() {
        let loader = Loader::new().with_evaluator(crate::evaluators::EnvironmentEvaluator);
        assert!(format!("{:?}", loader).contains("\"env\""));
    }
}
