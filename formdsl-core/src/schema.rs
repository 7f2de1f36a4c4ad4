//! Submission schema generator.
//!
//! Derives one validation rule per leaf field from a compiled AST and checks
//! flat submission data against them. Conditionals and dividers contribute no
//! rule of their own, but fields nested inside conditionals do. Visibility is
//! a client concern at this layer, so a required field is rejected when
//! absent whether or not its conditional branch was shown. All violations are
//! returned at once rather than fail-fast.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;
use std::collections::BTreeMap;

use crate::ast::{FieldType, FormAst};

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// One rule per leaf field, keyed by field id.
#[derive(Clone, Debug)]
pub struct SubmissionSchema {
    rules: BTreeMap<String, FieldRule>,
}

#[derive(Clone, Debug)]
struct FieldRule {
    label: String,
    field_type: FieldType,
    required: bool,
    min_length: Option<u32>,
    max_length: Option<u32>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<String>,
    option_values: Vec<String>,
}

/// A single violation, keyed by field path.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Outcome of validating one submission.
#[derive(Clone, Debug)]
pub struct SubmissionReport {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    /// Coerced values for every field that passed its rule.
    pub normalized_data: BTreeMap<String, Json>,
}

impl SubmissionSchema {
    pub fn for_form(ast: &FormAst) -> Self {
        let mut rules = BTreeMap::new();
        ast.for_each_field(|field| {
            rules.insert(
                field.id.clone(),
                FieldRule {
                    label: field.label.clone(),
                    field_type: field.field_type,
                    // Signatures are collected through the signing ceremony,
                    // not the data submission, so their rule only checks
                    // shape when a value does arrive.
                    required: field.required && field.field_type != FieldType::Signature,
                    min_length: field.min_length,
                    max_length: field.max_length,
                    min: field.min,
                    max: field.max,
                    pattern: field.pattern.clone(),
                    option_values: field.options.iter().map(|o| o.value.clone()).collect(),
                },
            );
        });
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Validate flat submission data. Unknown keys are ignored.
    pub fn validate(&self, data: &BTreeMap<String, Json>) -> SubmissionReport {
        let mut errors = Vec::new();
        let mut normalized = BTreeMap::new();

        for (id, rule) in &self.rules {
            let value = match data.get(id) {
                Some(v) if !is_empty(v) => v,
                _ => {
                    if rule.required {
                        errors.push(FieldError {
                            field: id.clone(),
                            message: format!("{} is required", rule.label),
                        });
                    }
                    continue;
                }
            };

            match rule.check(value) {
                Ok(coerced) => {
                    normalized.insert(id.clone(), coerced);
                }
                Err(message) => errors.push(FieldError {
                    field: id.clone(),
                    message,
                }),
            }
        }

        SubmissionReport {
            is_valid: errors.is_empty(),
            errors,
            normalized_data: normalized,
        }
    }
}

fn is_empty(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::String(s) => s.trim().is_empty(),
        Json::Array(items) => items.is_empty(),
        _ => false,
    }
}

impl FieldRule {
    fn check(&self, value: &Json) -> Result<Json, String> {
        match self.field_type {
            FieldType::Text | FieldType::Textarea | FieldType::Email => self.check_text(value),
            FieldType::Number | FieldType::Currency => self.check_number(value),
            FieldType::Date | FieldType::Time | FieldType::DateTime => self.check_temporal(value),
            FieldType::Select | FieldType::Radio => self.check_choice(value),
            FieldType::Checkbox => self.check_multi_choice(value),
            FieldType::Signature => self.check_signature(value),
        }
    }

    fn check_text(&self, value: &Json) -> Result<Json, String> {
        let Json::String(s) = value else {
            return Err(format!("{} must be text", self.label));
        };
        let len = s.chars().count() as u32;
        if let Some(min) = self.min_length {
            if len < min {
                return Err(format!("{} must be at least {min} characters", self.label));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(format!("{} must be at most {max} characters", self.label));
            }
        }
        if self.field_type == FieldType::Email && !EMAIL.is_match(s.trim()) {
            return Err(format!("{} must be a valid email address", self.label));
        }
        if let Some(pattern) = &self.pattern {
            // An invalid author pattern never blocks submitters.
            if let Ok(re) = Regex::new(pattern) {
                if !re.is_match(s) {
                    return Err(format!("{} does not match the expected format", self.label));
                }
            }
        }
        Ok(Json::String(s.clone()))
    }

    fn check_number(&self, value: &Json) -> Result<Json, String> {
        let n = match value {
            Json::Number(n) => n.as_f64(),
            Json::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("{} must be a number", self.label))?;

        if let Some(min) = self.min {
            if n < min {
                return Err(format!("{} must be at least {min}", self.label));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(format!("{} must be at most {max}", self.label));
            }
        }
        Ok(serde_json::Number::from_f64(n)
            .map(Json::Number)
            .unwrap_or_else(|| value.clone()))
    }

    fn check_temporal(&self, value: &Json) -> Result<Json, String> {
        let Json::String(s) = value else {
            return Err(format!("{} must be an ISO-8601 string", self.label));
        };
        let s_trim = s.trim();
        let ok = match self.field_type {
            FieldType::Date => NaiveDate::parse_from_str(s_trim, "%Y-%m-%d").is_ok(),
            FieldType::Time => {
                NaiveTime::parse_from_str(s_trim, "%H:%M").is_ok()
                    || NaiveTime::parse_from_str(s_trim, "%H:%M:%S").is_ok()
            }
            _ => {
                DateTime::parse_from_rfc3339(s_trim).is_ok()
                    || NaiveDateTime::parse_from_str(s_trim, "%Y-%m-%dT%H:%M:%S").is_ok()
                    || NaiveDateTime::parse_from_str(s_trim, "%Y-%m-%dT%H:%M").is_ok()
            }
        };
        if !ok {
            return Err(format!("{} must be a valid ISO-8601 value", self.label));
        }
        Ok(Json::String(s_trim.to_string()))
    }

    fn check_choice(&self, value: &Json) -> Result<Json, String> {
        let Json::String(s) = value else {
            return Err(format!("{} must be one of the listed options", self.label));
        };
        if !self.option_values.iter().any(|v| v == s) {
            return Err(format!("{} must be one of the listed options", self.label));
        }
        Ok(Json::String(s.clone()))
    }

    fn check_multi_choice(&self, value: &Json) -> Result<Json, String> {
        let Json::Array(items) = value else {
            return Err(format!("{} must be a list of selected options", self.label));
        };
        for item in items {
            let Json::String(s) = item else {
                return Err(format!("{} contains an invalid selection", self.label));
            };
            if !self.option_values.iter().any(|v| v == s) {
                return Err(format!("{} contains an unknown option '{s}'", self.label));
            }
        }
        Ok(value.clone())
    }

    fn check_signature(&self, value: &Json) -> Result<Json, String> {
        let Json::Object(map) = value else {
            return Err(format!("{} must be a signature object", self.label));
        };
        match map.get("type").and_then(Json::as_str) {
            Some("canvas") | Some("typed") => {}
            _ => {
                return Err(format!(
                    "{} signature type must be 'canvas' or 'typed'",
                    self.label
                ))
            }
        }
        match map.get("data").and_then(Json::as_str) {
            Some(data) if !data.trim().is_empty() => {}
            _ => return Err(format!("{} signature data is empty", self.label)),
        }
        if map.get("timestamp").and_then(Json::as_str).is_none() {
            return Err(format!("{} signature is missing a timestamp", self.label));
        }
        // signatory / signingDate / formattedTimestamp are optional
        // pass-through keys.
        Ok(value.clone())
    }
}
