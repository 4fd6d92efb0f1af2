/*
 * evaluators/expression.rs
 * Copyright (c) 2025 Posit, PBC
 */

use super::{Evaluator, EvaluatorError};
use crate::expr;
use layerfig_value::ConfigValue;

/// Computes a value from a literal expression.
///
/// Syntax: `${{pyeval.2 ** 10}}`. Mostly useful together with nested
/// placeholders, which are resolved first:
/// `${{pyeval.${{var.workers}} * 2}}`.
///
/// Expressions cannot reference names or call functions; see
/// [`crate::expr`] for the supported grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for ExpressionEvaluator {
    fn name(&self) -> &str {
        "pyeval"
    }

    fn evaluate(&self, argument: &str) -> Result<ConfigValue, EvaluatorError> {
        Ok(expr::evaluate(argument)?)
    }
}
