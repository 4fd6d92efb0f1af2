/*
 * evaluate.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template evaluation.
//!
//! Every string leaf of the tree is scanned for placeholders (see
//! [`crate::template`]), and each placeholder is replaced by the result of the
//! evaluator registered under its name:
//!
//! - a string that is exactly one placeholder becomes the evaluator's value,
//!   whatever its type
//! - otherwise each placeholder is replaced by the display form of its value
//!   and the leaf stays a string
//!
//! Sweeps over the whole tree repeat until one changes nothing. Values produced
//! by an evaluator may contain placeholders of their own, and nested
//! placeholders resolve from the inside out, one level per sweep.

use crate::error::{ConfigError, Result};
use crate::evaluators::Evaluator;
use crate::template::{self, Placeholder};
use layerfig_value::{ConfigMap, ConfigValue};

/// Resolve every placeholder in `tree`.
///
/// A placeholder that names no evaluator, or more than one, is an error, as is
/// any evaluator failure. Escaped placeholders (`\${{...}}`) are left in place
/// with the backslash removed.
pub fn evaluate(tree: &mut ConfigValue, evaluators: &[Box<dyn Evaluator>]) -> Result<()> {
    run(evaluators, tree.string_leaf_count(), |evaluators| {
        sweep_value(tree, evaluators)
    })?;
    unescape_value(tree);
    Ok(())
}

/// Resolve every placeholder in the values of `tree`.
pub fn evaluate_map(tree: &mut ConfigMap, evaluators: &[Box<dyn Evaluator>]) -> Result<()> {
    let leaves: usize = tree.values().map(ConfigValue::string_leaf_count).sum();
    run(evaluators, leaves, |evaluators| sweep_map(tree, evaluators))?;
    for value in tree.values_mut() {
        unescape_value(value);
    }
    Ok(())
}

/// Resolve the placeholders in a single string.
///
/// Returns `None` when the string contains no placeholder.
pub fn evaluate_string(text: &str, evaluators: &[Box<dyn Evaluator>]) -> Result<Option<ConfigValue>> {
    if let Some(placeholder) = template::full_match(text) {
        return call(&placeholder, evaluators).map(Some);
    }

    let found = template::placeholders(text);
    if found.is_empty() {
        return Ok(None);
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for placeholder in &found {
        let value = call(placeholder, evaluators)?;
        out.push_str(&text[last..placeholder.start]);
        out.push_str(&value.to_string());
        last = placeholder.end;
    }
    out.push_str(&text[last..]);

    Ok(Some(ConfigValue::String(out)))
}

/// Look up the single evaluator registered under `name`.
pub fn find_evaluator<'a>(
    name: &str,
    evaluators: &'a [Box<dyn Evaluator>],
) -> Result<&'a dyn Evaluator> {
    let mut matching = evaluators.iter().filter(|e| e.name() == name);

    match (matching.next(), matching.count()) {
        (Some(evaluator), 0) => Ok(evaluator.as_ref()),
        (Some(_), others) => Err(ConfigError::AmbiguousEvaluator {
            name: name.to_string(),
            count: others + 1,
        }),
        (None, _) => Err(ConfigError::UnknownEvaluator {
            name: name.to_string(),
        }),
    }
}

fn run<F>(evaluators: &[Box<dyn Evaluator>], leaves: usize, mut sweep: F) -> Result<()>
where
    F: FnMut(&[Box<dyn Evaluator>]) -> Result<usize>,
{
    let mut sweeps = 0usize;
    let mut total = 0usize;

    loop {
        sweeps += 1;
        let changes = sweep(evaluators)?;
        tracing::trace!(sweep = sweeps, changes, "Template sweep finished");
        if changes == 0 {
            break;
        }
        total += changes;
    }

    tracing::debug!(
        sweeps,
        substitutions = total,
        string_leaves = leaves,
        evaluators = evaluators.len(),
        "Evaluated templates"
    );
    Ok(())
}

fn sweep_value(value: &mut ConfigValue, evaluators: &[Box<dyn Evaluator>]) -> Result<usize> {
    match value {
        ConfigValue::String(text) => match evaluate_string(text, evaluators)? {
            Some(new) if new != *value => {
                *value = new;
                Ok(1)
            }
            _ => Ok(0),
        },
        ConfigValue::Sequence(items) => {
            let mut changes = 0;
            for item in items {
                changes += sweep_value(item, evaluators)?;
            }
            Ok(changes)
        }
        ConfigValue::Mapping(entries) => sweep_map(entries, evaluators),
        _ => Ok(0),
    }
}

fn sweep_map(map: &mut ConfigMap, evaluators: &[Box<dyn Evaluator>]) -> Result<usize> {
    let mut changes = 0;
    for value in map.values_mut() {
        changes += sweep_value(value, evaluators)?;
    }
    Ok(changes)
}

fn call(placeholder: &Placeholder<'_>, evaluators: &[Box<dyn Evaluator>]) -> Result<ConfigValue> {
    let evaluator = find_evaluator(placeholder.name, evaluators)?;
    let argument = placeholder.argument_or_empty();

    let value = evaluator
        .evaluate(argument)
        .map_err(|source| ConfigError::Evaluation {
            evaluator: placeholder.name.to_string(),
            argument: argument.to_string(),
            source,
        })?;

    tracing::trace!(
        evaluator = placeholder.name,
        argument,
        kind = value.type_name(),
        "Resolved placeholder"
    );
    Ok(value)
}

fn unescape_value(value: &mut ConfigValue) {
    match value {
        ConfigValue::String(text) => {
            if let std::borrow::Cow::Owned(unescaped) = template::unescape(text) {
                *text = unescaped;
            }
        }
        ConfigValue::Sequence(items) => items.iter_mut().for_each(unescape_value),
        ConfigValue::Mapping(entries) => entries.values_mut().for_each(unescape_value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::{EvaluatorError, ExpressionEvaluator, VariableEvaluator};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> ConfigValue {
        ConfigValue::from(value)
    }

    fn vars(pairs: &[(&str, ConfigValue)]) -> Vec<Box<dyn Evaluator>> {
        let evaluator: VariableEvaluator = pairs.iter().cloned().collect();
        vec![Box::new(evaluator)]
    }

    struct Fixed(&'static str, &'static str);

    impl Evaluator for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn evaluate(&self, _argument: &str) -> std::result::Result<ConfigValue, EvaluatorError> {
            Ok(ConfigValue::from(self.1))
        }
    }

    #[test]
    fn test_full_match_keeps_type() {
        let evaluators = vars(&[("flag", ConfigValue::Bool(false)), ("n", ConfigValue::Integer(3))]);
        let mut value = tree(json!({"flag": "${{var.flag}}", "n": "${{var.n}}"}));

        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, tree(json!({"flag": false, "n": 3})));
    }

    #[test]
    fn test_partial_match_is_string() {
        let evaluators = vars(&[("host", "localhost".into()), ("port", ConfigValue::Integer(5432))]);
        let mut value = tree(json!({"url": "postgres://${{var.host}}:${{var.port}}/db"}));

        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, tree(json!({"url": "postgres://localhost:5432/db"})));
    }

    #[test]
    fn test_strings_in_sequences_are_evaluated() {
        let evaluators = vars(&[("a", "x".into())]);
        let mut value = tree(json!({"list": ["${{var.a}}", {"inner": "${{var.a}}-y"}, 1]}));

        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, tree(json!({"list": ["x", {"inner": "x-y"}, 1]})));
    }

    #[test]
    fn test_values_from_evaluators_are_evaluated_again() {
        let evaluators = vars(&[
            ("outer", "${{var.middle}}".into()),
            ("middle", "${{var.inner}}".into()),
            ("inner", ConfigValue::Integer(7)),
        ]);
        let mut value = tree(json!({"x": "${{var.outer}}"}));

        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, tree(json!({"x": 7})));
    }

    #[test]
    fn test_nested_placeholders_resolve_inside_out() {
        let mut evaluators = vars(&[("workers", ConfigValue::Integer(4))]);
        evaluators.push(Box::new(ExpressionEvaluator));
        let mut value = tree(json!({"threads": "${{pyeval.${{var.workers}} * 2}}"}));

        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, tree(json!({"threads": 8})));
    }

    #[test]
    fn test_escaped_placeholder_is_left_alone() {
        let evaluators = vars(&[("a", "x".into())]);
        let mut value = tree(json!({"s": "\\${{var.a}} and ${{var.a}}"}));

        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, tree(json!({"s": "${{var.a}} and x"})));
    }

    #[test]
    fn test_self_reference_reaches_fixed_point() {
        let evaluators = vars(&[("loop", "${{var.loop}}".into())]);
        let mut value = tree(json!({"s": "${{var.loop}}"}));

        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, tree(json!({"s": "${{var.loop}}"})));
    }

    #[test]
    fn test_evaluating_twice_changes_nothing() {
        let evaluators = vars(&[("a", ConfigValue::Integer(1))]);
        let mut value = tree(json!({"a": "${{var.a}}", "b": "plain"}));

        evaluate(&mut value, &evaluators).unwrap();
        let once = value.clone();
        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, once);
    }

    #[test]
    fn test_unknown_evaluator() {
        let mut value = tree(json!({"s": "${{nope.x}}"}));
        let err = evaluate(&mut value, &[]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEvaluator { ref name } if name == "nope"));
    }

    #[test]
    fn test_ambiguous_evaluator() {
        let evaluators: Vec<Box<dyn Evaluator>> =
            vec![Box::new(Fixed("mock", "a")), Box::new(Fixed("mock", "b"))];
        let mut value = tree(json!({"s": "${{mock}}"}));

        let err = evaluate(&mut value, &evaluators).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::AmbiguousEvaluator { ref name, count: 2 } if name == "mock"
        ));
    }

    #[test]
    fn test_evaluator_failure_is_wrapped() {
        let evaluators = vars(&[]);
        let mut value = tree(json!({"s": "${{var.missing}}"}));

        let err = evaluate(&mut value, &evaluators).unwrap_err();
        match err {
            ConfigError::Evaluation {
                evaluator,
                argument,
                source,
            } => {
                assert_eq!(evaluator, "var");
                assert_eq!(argument, "missing");
                assert!(matches!(source, EvaluatorError::UndefinedVariable { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_placeholder_without_argument() {
        let evaluators: Vec<Box<dyn Evaluator>> = vec![Box::new(Fixed("now", "noon"))];
        let mut map = ConfigMap::new();
        map.insert("at".to_string(), "${{now}}".into());

        evaluate_map(&mut map, &evaluators).unwrap();
        assert_eq!(map["at"], ConfigValue::from("noon"));
    }

    #[test]
    fn test_keys_are_not_evaluated() {
        let evaluators = vars(&[("a", "x".into())]);
        let mut value = tree(json!({"${{var.a}}": 1}));

        evaluate(&mut value, &evaluators).unwrap();
        assert_eq!(value, tree(json!({"${{var.a}}": 1})));
    }

    #[test]
    fn test_evaluate_string_without_placeholder() {
        assert_eq!(evaluate_string("plain", &[]).unwrap(), None);
    }

    #[test]
    fn test_partial_substitution_formats_values() {
        let evaluators = vars(&[
            ("f", ConfigValue::Float(2.0)),
            ("b", ConfigValue::Bool(true)),
            ("l", ConfigValue::from(vec![1, 2])),
        ]);

        let result = evaluate_string("${{var.f}} ${{var.b}} ${{var.l}}", &evaluators).unwrap();
        assert_eq!(result, Some(ConfigValue::from("2.0 true [1,2]")));
    }
}
