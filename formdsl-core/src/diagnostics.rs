//! Unified diagnostics for the template compiler.
//!
//! One diagnostic type shared by the line scanner and the structural
//! validator, so callers can treat "problems with this template" as a single
//! list regardless of which pass produced them. Parse problems never abort
//! compilation; they accumulate here next to a best-effort AST.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    // Parse
    InvalidCondition,
    OrphanProperty,
    MisplacedTitle,
    UnknownProperty,
    UnknownFieldType,
    InvalidPropertyValue,
    DuplicateFieldId,
    UnterminatedConfig,

    // Structural validation
    MissingTitle,
    MissingSections,
    EmptyFieldLabel,
    MissingFieldId,
    MissingOptions,
    OptionalSignature,
    EmptyConditionField,
}

/// A single problem found in a template, with a best-effort 1-based source
/// line. Line numbers are advisory; structural checks over a stored AST may
/// not have one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            line: None,
        }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

/// True if any diagnostic in the list blocks publishing the compiled artifact.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detection() {
        let warn = Diagnostic::warning(DiagnosticCode::UnknownProperty, "ignored 'foo'");
        let err = Diagnostic::error(DiagnosticCode::MissingTitle, "form is missing a title")
            .at_line(1);
        assert!(!warn.is_error());
        assert!(err.is_error());
        assert_eq!(err.line, Some(1));
        assert!(!has_errors(&[warn.clone()]));
        assert!(has_errors(&[warn, err]));
    }
}
