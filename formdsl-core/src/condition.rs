//! Condition grammar and evaluator.
//!
//! A condition is one line of the form `field <op> value`, e.g.
//! `interestLevel == "High"` or `budget >= 1000`. Operators are matched
//! longest-first so `>` never swallows the head of `>=`. The value stays an
//! untyped string in the AST; numeric/string coercion happens here at
//! evaluation time against live instance data.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::multispace0,
    combinator::value,
    IResult,
};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::ast::{Condition, ConditionOperator};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConditionParseError {
    #[error("condition is empty")]
    Empty,
    #[error("expected 'field operator value', got '{0}'")]
    Malformed(String),
    #[error("missing comparison value in '{0}'")]
    MissingValue(String),
}

// ─── Parsing ──────────────────────────────────────────────────

fn field_name(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '=' | '!'))(input)
}

/// Longest-first: two-char operators and keywords before `>` / `<`.
fn operator(input: &str) -> IResult<&str, ConditionOperator> {
    alt((
        value(ConditionOperator::Ge, tag(">=")),
        value(ConditionOperator::Le, tag("<=")),
        value(ConditionOperator::Eq, tag("==")),
        value(ConditionOperator::Ne, tag("!=")),
        value(ConditionOperator::Contains, tag("contains")),
        value(ConditionOperator::In, tag("in")),
        value(ConditionOperator::Gt, tag(">")),
        value(ConditionOperator::Lt, tag("<")),
    ))(input)
}

/// Parse one condition line. Surrounding whitespace and value quoting are
/// both tolerated.
pub fn parse(input: &str) -> Result<Condition, ConditionParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ConditionParseError::Empty);
    }

    let (rest, field) =
        field_name(trimmed).map_err(|_: nom::Err<nom::error::Error<&str>>| {
            ConditionParseError::Malformed(trimmed.to_string())
        })?;
    let (rest, _) = multispace0::<_, nom::error::Error<&str>>(rest)
        .map_err(|_| ConditionParseError::Malformed(trimmed.to_string()))?;
    let (rest, op) = operator(rest)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| {
            ConditionParseError::Malformed(trimmed.to_string())
        })?;

    let raw_value = rest.trim();
    if raw_value.is_empty() {
        return Err(ConditionParseError::MissingValue(trimmed.to_string()));
    }

    // `in` values are a comma-separated list; each element is unquoted
    // at evaluation time, so stripping quotes across the whole list here
    // would corrupt it.
    let value = if op == ConditionOperator::In {
        raw_value.to_string()
    } else {
        unquote(raw_value).to_string()
    };

    Ok(Condition {
        field: field.to_string(),
        operator: op,
        value,
    })
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if (bytes[0] == b'"' && bytes[s.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'')
        {
            return &s[1..s.len() - 1];
        }
    }
    s
}

// ─── Evaluation ───────────────────────────────────────────────

/// Render a submitted JSON value the way an end user typed it, for loose
/// string comparison.
fn coerce_string(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        Json::Bool(b) => b.to_string(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn coerce_number(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Evaluate one condition against flat instance data. A missing field is
/// treated as null, which fails every comparison except `!=`.
pub fn evaluate(condition: &Condition, data: &BTreeMap<String, Json>) -> bool {
    let actual = data.get(&condition.field).cloned().unwrap_or(Json::Null);

    match condition.operator {
        ConditionOperator::Eq => loosely_equal(&actual, &condition.value),
        ConditionOperator::Ne => !loosely_equal(&actual, &condition.value),
        ConditionOperator::Gt => numeric_cmp(&actual, &condition.value, |a, b| a > b),
        ConditionOperator::Lt => numeric_cmp(&actual, &condition.value, |a, b| a < b),
        ConditionOperator::Ge => numeric_cmp(&actual, &condition.value, |a, b| a >= b),
        ConditionOperator::Le => numeric_cmp(&actual, &condition.value, |a, b| a <= b),
        ConditionOperator::In => {
            let actual = coerce_string(&actual);
            condition
                .value
                .split(',')
                .map(|v| unquote(v.trim()))
                .any(|v| v == actual)
        }
        ConditionOperator::Contains => match &actual {
            Json::Array(items) => items
                .iter()
                .any(|item| coerce_string(item) == condition.value),
            other => coerce_string(other).contains(&condition.value),
        },
    }
}

fn loosely_equal(actual: &Json, expected: &str) -> bool {
    if let (Some(a), Ok(b)) = (coerce_number(actual), expected.trim().parse::<f64>()) {
        return a == b;
    }
    coerce_string(actual) == expected
}

fn numeric_cmp(actual: &Json, expected: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (coerce_number(actual), expected.trim().parse::<f64>()) {
        (Some(a), Ok(b)) => cmp(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(pairs: &[(&str, Json)]) -> BTreeMap<String, Json> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn parses_quoted_equality() {
        let cond = parse(r#"interestLevel == "High""#).unwrap();
        assert_eq!(cond.field, "interestLevel");
        assert_eq!(cond.operator, ConditionOperator::Eq);
        assert_eq!(cond.value, "High");
    }

    #[test]
    fn longest_operator_wins() {
        let cond = parse("budget >= 1000").unwrap();
        assert_eq!(cond.operator, ConditionOperator::Ge);
        assert_eq!(cond.value, "1000");

        let cond = parse("budget > 1000").unwrap();
        assert_eq!(cond.operator, ConditionOperator::Gt);
    }

    #[test]
    fn parses_without_spaces() {
        let cond = parse("age>=18").unwrap();
        assert_eq!(cond.field, "age");
        assert_eq!(cond.operator, ConditionOperator::Ge);
        assert_eq!(cond.value, "18");
    }

    #[test]
    fn parses_word_operators() {
        let cond = parse("status in pending, active").unwrap();
        assert_eq!(cond.operator, ConditionOperator::In);
        assert_eq!(cond.value, "pending, active");

        let cond = parse("tags contains vip").unwrap();
        assert_eq!(cond.operator, ConditionOperator::Contains);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("   "), Err(ConditionParseError::Empty));
        assert!(matches!(
            parse("fieldonly"),
            Err(ConditionParseError::Malformed(_))
        ));
        assert!(matches!(
            parse("x =="),
            Err(ConditionParseError::MissingValue(_))
        ));
    }

    #[test]
    fn equality_is_loose_over_numbers() {
        let cond = parse("count == 5").unwrap();
        assert!(evaluate(&cond, &data(&[("count", json!(5))])));
        assert!(evaluate(&cond, &data(&[("count", json!("5"))])));
        assert!(evaluate(&cond, &data(&[("count", json!("5.0"))])));
        assert!(!evaluate(&cond, &data(&[("count", json!(6))])));
    }

    #[test]
    fn missing_field_fails_comparisons_but_passes_ne() {
        let eq = parse(r#"x == "y""#).unwrap();
        let ne = parse(r#"x != "y""#).unwrap();
        let empty = data(&[]);
        assert!(!evaluate(&eq, &empty));
        assert!(evaluate(&ne, &empty));
    }

    #[test]
    fn ordering_requires_numbers() {
        let cond = parse("budget > 100").unwrap();
        assert!(evaluate(&cond, &data(&[("budget", json!(101))])));
        assert!(!evaluate(&cond, &data(&[("budget", json!("lots"))])));
    }

    #[test]
    fn in_and_contains() {
        let cond = parse(r#"state in "NSW", "VIC""#).unwrap();
        // The list survives parsing element-for-element; quotes come off
        // per element at evaluation, never across the whole value.
        assert_eq!(cond.value, r#""NSW", "VIC""#);
        assert!(evaluate(&cond, &data(&[("state", json!("NSW"))])));
        assert!(evaluate(&cond, &data(&[("state", json!("VIC"))])));
        assert!(!evaluate(&cond, &data(&[("state", json!("QLD"))])));

        let cond = parse("extras contains pool").unwrap();
        assert!(evaluate(
            &cond,
            &data(&[("extras", json!(["spa", "pool"]))])
        ));
        assert!(evaluate(&cond, &data(&[("extras", json!("pool fence"))])));
        assert!(!evaluate(&cond, &data(&[("extras", json!(["spa"]))])));
    }
}
