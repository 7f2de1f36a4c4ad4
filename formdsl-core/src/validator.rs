//! Structural validator: pure checks over a compiled AST.
//!
//! Independent of the parser, so it can re-run over any stored tree. A
//! non-empty error list should block publishing the compiled artifact; the
//! raw template text may still be saved.

use crate::ast::{FieldContainer, FormAst};
use crate::diagnostics::{Diagnostic, DiagnosticCode};

/// Validate a compiled form. Returns every problem found, never fail-fast.
pub fn validate(ast: &FormAst) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if ast.title.trim().is_empty() {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::MissingTitle,
            "form is missing a title ('# Title' on the first line)",
        ));
    }

    let section_count: usize = ast.pages.iter().map(|p| p.sections.len()).sum();
    if section_count == 0 {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::MissingSections,
            "form has no sections",
        ));
    }

    for page in &ast.pages {
        for section in &page.sections {
            check_containers(&section.fields, &mut diagnostics);
        }
    }

    diagnostics
}

fn check_containers(containers: &[FieldContainer], diagnostics: &mut Vec<Diagnostic>) {
    for container in containers {
        match container {
            FieldContainer::Divider => {}
            FieldContainer::Conditional(block) => {
                if block.condition.field.trim().is_empty() {
                    let mut diag = Diagnostic::error(
                        DiagnosticCode::EmptyConditionField,
                        "conditional block does not reference a field",
                    );
                    if block.line > 0 {
                        diag = diag.at_line(block.line);
                    }
                    diagnostics.push(diag);
                }
                check_containers(&block.children, diagnostics);
            }
            FieldContainer::Field(field) => {
                let at = |d: Diagnostic| {
                    if field.line > 0 {
                        d.at_line(field.line)
                    } else {
                        d
                    }
                };
                if field.label.trim().is_empty() {
                    diagnostics.push(at(Diagnostic::error(
                        DiagnosticCode::EmptyFieldLabel,
                        "field has an empty label",
                    )));
                }
                if field.id.trim().is_empty() {
                    diagnostics.push(at(Diagnostic::error(
                        DiagnosticCode::MissingFieldId,
                        format!("field '{}' has no id", field.label),
                    )));
                }
                if field.field_type.has_options() && field.options.is_empty() {
                    diagnostics.push(at(Diagnostic::error(
                        DiagnosticCode::MissingOptions,
                        format!(
                            "{} field '{}' needs at least one option",
                            field.field_type.as_str(),
                            field.label
                        ),
                    )));
                }
                if field.field_type == crate::ast::FieldType::Signature && !field.required {
                    diagnostics.push(at(Diagnostic::error(
                        DiagnosticCode::OptionalSignature,
                        format!("signature field '{}' must be marked required", field.label),
                    )));
                }
            }
        }
    }
}
