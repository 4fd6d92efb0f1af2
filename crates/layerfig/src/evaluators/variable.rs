/*
 * evaluators/variable.rs
 * Copyright (c) 2025 Posit, PBC
 */

use super::{Evaluator, EvaluatorError};
use layerfig_value::{ConfigMap, ConfigValue};

/// Interpolates values known when the evaluator is constructed.
///
/// Syntax: `${{var.known_variable}}`. Values keep their type, so a placeholder
/// that makes up a whole string can produce a number, boolean or list.
#[derive(Debug, Clone, Default)]
pub struct VariableEvaluator {
    variables: ConfigMap,
}

impl VariableEvaluator {
    pub fn new(variables: ConfigMap) -> Self {
        Self { variables }
    }

    /// Add (or replace) a variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn variables(&self) -> &ConfigMap {
        &self.variables
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for VariableEvaluator {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl Evaluator for VariableEvaluator {
    fn name(&self) -> &str {
        "var"
    }

    fn evaluate(&self, argument: &str) -> Result<ConfigValue, EvaluatorError> {
        self.variables
            .get(argument)
            .cloned()
            .ok_or_else(|| EvaluatorError::UndefinedVariable {
                name: argument.to_string(),
            })
    }
}
