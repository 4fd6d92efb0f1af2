/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Constructing evaluators from their identifiers.
//!
//! A meta-configuration names its evaluators by identifier
//! (`layerfig.VariableEvaluator`, or a name the application chose) together
//! with a mapping of parameters. The registry maps each identifier to a
//! factory that builds the evaluator from those parameters.

use crate::error::{MetaconfError, Result};
use indexmap::IndexMap;
use layerfig::{
    CatEvaluator, EnvironmentEvaluator, Evaluator, ExpressionEvaluator, VariableEvaluator,
};
use layerfig_value::ConfigMap;

/// Error type returned by evaluator factories.
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// Builds an evaluator from its parameters.
pub type EvaluatorFactory =
    Box<dyn Fn(&ConfigMap) -> std::result::Result<Box<dyn Evaluator>, FactoryError> + Send + Sync>;

/// Identifier-to-factory table.
#[derive(Default)]
pub struct EvaluatorRegistry {
    factories: IndexMap<String, EvaluatorFactory>,
}

impl EvaluatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in evaluators, under both their qualified
    /// identifiers and their placeholder names:
    ///
    /// | Identifier | Alias | Parameters |
    /// |------------|-------|------------|
    /// | `layerfig.VariableEvaluator` | `var` | the variables |
    /// | `layerfig.EnvironmentEvaluator` | `env` | none |
    /// | `layerfig.CatEvaluator` | `cat` | none |
    /// | `layerfig.ExpressionEvaluator` | `pyeval` | none |
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        for identifier in ["layerfig.VariableEvaluator", "var"] {
            registry.register(identifier, |params| {
                Ok(Box::new(VariableEvaluator::new(params.clone())))
            });
        }
        for identifier in ["layerfig.EnvironmentEvaluator", "env"] {
            registry.register(identifier, |params| {
                no_params(params)?;
                Ok(Box::new(EnvironmentEvaluator))
            });
        }
        for identifier in ["layerfig.CatEvaluator", "cat"] {
            registry.register(identifier, |params| {
                no_params(params)?;
                Ok(Box::new(CatEvaluator))
            });
        }
        for identifier in ["layerfig.ExpressionEvaluator", "pyeval"] {
            registry.register(identifier, |params| {
                no_params(params)?;
                Ok(Box::new(ExpressionEvaluator))
            });
        }

        registry
    }

    /// Register (or replace) the factory for `identifier`.
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ConfigMap) -> std::result::Result<Box<dyn Evaluator>, FactoryError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(identifier.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Registered identifiers, in registration order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the evaluator registered as `identifier`.
    pub fn construct(&self, identifier: &str, params: &ConfigMap) -> Result<Box<dyn Evaluator>> {
        let factory =
            self.factories
                .get(identifier)
                .ok_or_else(|| MetaconfError::UnknownEvaluator {
                    identifier: identifier.to_string(),
                })?;

        let evaluator = factory(params).map_err(|source| MetaconfError::EvaluatorParams {
            identifier: identifier.to_string(),
            source,
        })?;

        tracing::debug!(identifier, name = evaluator.name(), "Constructed evaluator");
        Ok(evaluator)
    }
}

impl std::fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorRegistry")
            .field("identifiers", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn no_params(params: &ConfigMap) -> std::result::Result<(), FactoryError> {
    match params.keys().next() {
        None => Ok(()),
        Some(key) => Err(format!("unexpected parameter '{}'", key).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerfig::{ConfigValue, EvaluatorError};

    #[test]
    fn test_builtins_are_registered_with_aliases() {
        let registry = EvaluatorRegistry::with_builtins();

        for (identifier, name) in [
            ("layerfig.VariableEvaluator", "var"),
            ("var", "var"),
            ("layerfig.EnvironmentEvaluator", "env"),
            ("layerfig.CatEvaluator", "cat"),
            ("layerfig.ExpressionEvaluator", "pyeval"),
            ("pyeval", "pyeval"),
        ] {
            let evaluator = registry.construct(identifier, &ConfigMap::new()).unwrap();
            assert_eq!(evaluator.name(), name);
        }
    }

    #[test]
    fn test_variable_parameters_are_the_variables() {
        let registry = EvaluatorRegistry::with_builtins();
        let mut params = ConfigMap::new();
        params.insert("foo".to_string(), ConfigValue::from("bar"));

        let evaluator = registry.construct("var", &params).unwrap();
        assert_eq!(evaluator.evaluate("foo").unwrap(), ConfigValue::from("bar"));
    }

    #[test]
    fn test_unexpected_parameters_rejected() {
        let registry = EvaluatorRegistry::with_builtins();
        let mut params = ConfigMap::new();
        params.insert("prefix".to_string(), ConfigValue::from("APP_"));

        let Err(err) = registry.construct("env", &params) else {
            panic!("env accepted a parameter");
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameters for evaluator 'env': unexpected parameter 'prefix'"
        );
    }

    #[test]
    fn test_unknown_identifier() {
        let Err(err) = EvaluatorRegistry::new().construct("my_module.Missing", &ConfigMap::new())
        else {
            panic!("empty registry constructed an evaluator");
        };
        assert!(matches!(err, MetaconfError::UnknownEvaluator { ref identifier } if identifier == "my_module.Missing"));
    }

    struct Constant(ConfigValue);

    impl Evaluator for Constant {
        fn name(&self) -> &str {
            "const"
        }

        fn evaluate(&self, _argument: &str) -> std::result::Result<ConfigValue, EvaluatorError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_custom_factory() {
        let mut registry = EvaluatorRegistry::new();
        registry.register("app.Constant", |params| {
            let value = params.get("value").cloned().ok_or("missing 'value'")?;
            Ok(Box::new(Constant(value)))
        });

        assert!(registry.contains("app.Constant"));
        assert_eq!(registry.identifiers().collect::<Vec<_>>(), vec!["app.Constant"]);

        let mut params = ConfigMap::new();
        params.insert("value".to_string(), ConfigValue::Integer(42));
        let evaluator = registry.construct("app.Constant", &params).unwrap();
        assert_eq!(evaluator.evaluate("").unwrap(), ConfigValue::Integer(42));

        let result = registry.construct("app.Constant", &ConfigMap::new());
        assert!(matches!(result, Err(MetaconfError::EvaluatorParams { .. })));
    }
}
