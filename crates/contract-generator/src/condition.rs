//! Visibility rules for conditional blocks

use contract_model::{Condition, ConditionOperator};
use serde_json::{Map, Value};

/// Merge-field data a condition is evaluated against
pub type EvalContext = Map<String, Value>;

/// Decide whether a conditional block is visible.
///
/// An unconfigured condition (empty field) always passes, as does any
/// operator this evaluator does not know. Missing context values compare
/// as the empty string.
pub fn evaluate(condition: &Condition, context: &EvalContext) -> bool {
    if !condition.is_configured() {
        return true;
    }

    let actual = context
        .get(&condition.field)
        .map(field_text)
        .unwrap_or_default();
    let expected = condition.value.as_str();

    match &condition.operator {
        ConditionOperator::Equals => actual == expected,
        ConditionOperator::NotEquals => actual != expected,
        ConditionOperator::Contains => actual.contains(expected),
        // NaN on either side compares false
        ConditionOperator::GreaterThan => to_number(&actual) > to_number(expected),
        ConditionOperator::Other(_) => true,
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(field_text)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Numeric coercion for `greater_than`: blank is zero, unsigned `0x`, `0b`
/// and `0o` literals are read in their radix, anything else that is not a
/// plain decimal literal is NaN.
fn to_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(value) = radix_literal(trimmed) {
        return value;
    }
    let literal = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !literal {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// `Some` for anything with a radix prefix; NaN when its digits are invalid
fn radix_literal(text: &str) -> Option<f64> {
    let prefix = text.get(..2)?.to_ascii_lowercase();
    let radix = match prefix.as_str() {
        "0x" => 16,
        "0b" => 2,
        "0o" => 8,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let value = digits.chars().try_fold(0.0, |acc: f64, c| {
        c.to_digit(radix)
            .map(|d| acc * f64::from(radix) + f64::from(d))
    });
    Some(value.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> EvalContext {
        match value {
            Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    fn rule(field: &str, op: &str, value: &str) -> Condition {
        Condition::new(field, ConditionOperator::from(op.to_string()), value)
    }

    #[test]
    fn test_equals() {
        let c = rule("status", "equals", "Active");
        assert!(evaluate(&c, &ctx(json!({"status": "Active"}))));
        assert!(!evaluate(&c, &ctx(json!({"status": "Draft"}))));
    }

    #[test]
    fn test_unconfigured_condition_passes() {
        let c = rule("", "equals", "anything");
        assert!(evaluate(&c, &EvalContext::new()));
    }

    #[test]
    fn test_missing_field_compares_as_empty() {
        assert!(evaluate(&rule("status", "equals", ""), &EvalContext::new()));
        assert!(!evaluate(
            &rule("status", "equals", "Active"),
            &EvalContext::new()
        ));
        assert!(evaluate(
            &rule("status", "not_equals", "Active"),
            &EvalContext::new()
        ));
        assert!(evaluate(
            &rule("status", "equals", ""),
            &ctx(json!({"status": null}))
        ));
    }

    #[test]
    fn test_contains() {
        let c = rule("notes", "contains", "renew");
        assert!(evaluate(&c, &ctx(json!({"notes": "auto-renewal applies"}))));
        assert!(!evaluate(&c, &ctx(json!({"notes": "fixed term"}))));
        assert!(evaluate(
            &rule("notes", "contains", ""),
            &ctx(json!({"notes": "x"}))
        ));
    }

    #[test]
    fn test_greater_than_numeric() {
        let c = rule("amount", "greater_than", "1000");
        assert!(evaluate(&c, &ctx(json!({"amount": "1500"}))));
        assert!(evaluate(&c, &ctx(json!({"amount": 1500}))));
        assert!(!evaluate(&c, &ctx(json!({"amount": "999.99"}))));
        assert!(!evaluate(&c, &ctx(json!({"amount": "1000"}))));
    }

    #[test]
    fn test_greater_than_non_numeric_is_false() {
        let c = rule("x", "greater_than", "abc");
        assert!(!evaluate(&c, &ctx(json!({"x": "5"}))));
        assert!(!evaluate(
            &rule("x", "greater_than", "1"),
            &ctx(json!({"x": "inf"}))
        ));
    }

    #[test]
    fn test_greater_than_radix_literals() {
        let c = rule("limit", "greater_than", "0x10");
        assert!(evaluate(&c, &ctx(json!({"limit": "17"}))));
        assert!(!evaluate(&c, &ctx(json!({"limit": "16"}))));
        assert!(evaluate(
            &rule("flags", "greater_than", "4"),
            &ctx(json!({"flags": "0b101"}))
        ));
        assert!(evaluate(
            &rule("mode", "greater_than", "0O7"),
            &ctx(json!({"mode": "0o10"}))
        ));
    }

    #[test]
    fn test_malformed_radix_literals_are_nan() {
        assert_eq!(to_number("0xFF"), 255.0);
        assert_eq!(to_number(" 0B11 "), 3.0);
        assert!(to_number("0x").is_nan());
        assert!(to_number("0b102").is_nan());
        assert!(to_number("-0x10").is_nan());
        assert!(to_number("0x1.8").is_nan());
    }

    #[test]
    fn test_greater_than_blank_is_zero() {
        assert!(evaluate(
            &rule("x", "greater_than", ""),
            &ctx(json!({"x": "3"}))
        ));
        assert!(!evaluate(&rule("x", "greater_than", "0"), &EvalContext::new()));
    }

    #[test]
    fn test_unknown_operator_fails_open() {
        let c = rule("status", "matches_regex", "^A");
        assert!(evaluate(&c, &ctx(json!({"status": "Draft"}))));
    }

    #[test]
    fn test_non_string_values_coerced() {
        assert!(evaluate(
            &rule("active", "equals", "true"),
            &ctx(json!({"active": true}))
        ));
        assert!(evaluate(
            &rule("count", "equals", "3"),
            &ctx(json!({"count": 3}))
        ));
        assert!(evaluate(
            &rule("tags", "contains", "b"),
            &ctx(json!({"tags": ["a", "b"]}))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn operator() -> impl Strategy<Value = ConditionOperator> {
        prop_oneof![
            Just(ConditionOperator::Equals),
            Just(ConditionOperator::NotEquals),
            Just(ConditionOperator::Contains),
            Just(ConditionOperator::GreaterThan),
            "[a-z_]{1,12}".prop_map(ConditionOperator::from),
        ]
    }

    proptest! {
        #[test]
        fn evaluation_is_idempotent(
            field in "[a-z]{0,6}",
            op in operator(),
            target in ".{0,10}",
            actual in ".{0,10}",
        ) {
            let condition = Condition::new(field.clone(), op, target);
            let mut context = EvalContext::new();
            context.insert(field, Value::String(actual));

            let first = evaluate(&condition, &context);
            let second = evaluate(&condition, &context);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn equals_and_not_equals_are_complementary(
            target in ".{0,10}",
            actual in ".{0,10}",
        ) {
            let mut context = EvalContext::new();
            context.insert("f".to_string(), Value::String(actual));
            let eq = Condition::new("f", ConditionOperator::Equals, target.clone());
            let ne = Condition::new("f", ConditionOperator::NotEquals, target);
            prop_assert_ne!(evaluate(&eq, &context), evaluate(&ne, &context));
        }

        #[test]
        fn radix_literals_match_decimal(n in any::<u32>()) {
            let decimal = f64::from(n);
            prop_assert_eq!(to_number(&format!("0x{:x}", n)), decimal);
            prop_assert_eq!(to_number(&format!("0X{:X}", n)), decimal);
            prop_assert_eq!(to_number(&format!("0o{:o}", n)), decimal);
            prop_assert_eq!(to_number(&format!("0b{:b}", n)), decimal);
        }
    }
}
