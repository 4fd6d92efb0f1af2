/*
 * evaluators/environment.rs
 * Copyright (c) 2025 Posit, PBC
 */

use super::{Evaluator, EvaluatorError};
use layerfig_value::ConfigValue;
use std::env::VarError;

/// Substitutes the value of a process environment variable.
///
/// Syntax: `${{env.VARIABLE_NAME}}`. The result is always a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentEvaluator;

impl EnvironmentEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for EnvironmentEvaluator {
    fn name(&self) -> &str {
        "env"
    }

    fn evaluate(&self, argument: &str) -> Result<ConfigValue, EvaluatorError> {
        match std::env::var(argument) {
            Ok(value) => Ok(ConfigValue::String(value)),
            Err(VarError::NotPresent) => Err(EvaluatorError::MissingEnvironmentVariable {
                name: argument.to_string(),
            }),
            Err(VarError::NotUnicode(_)) => Err(EvaluatorError::NonUnicodeEnvironmentVariable {
                name: argument.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variable_fails() {
        let err = EnvironmentEvaluator
            .evaluate("LAYERFIG_THIS_ENVIRONMENT_VARIABLE_SHOULD_NOT_EXIST")
            .unwrap_err();
        assert!(matches!(err, EvaluatorError::MissingEnvironmentVariable { .. }));
    }

    #[test]
    fn test_set_variable_is_returned() {
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var("LAYERFIG_ENV_EVALUATOR_TEST", "test-value") };

        assert_eq!(
            EnvironmentEvaluator.evaluate("LAYERFIG_ENV_EVALUATOR_TEST").unwrap(),
            ConfigValue::from("test-value")
        );
    }
}
