//! formdsl-core: the form template compiler.
//!
//! Pure logic with no persistence dependencies:
//! - AST types (FormAst, Page, Section, FieldContainer, Field, Condition)
//! - Line scanner producing a best-effort AST plus diagnostics
//! - Structural validator (re-runnable over any stored tree)
//! - HTML renderer (pure projection, escaped)
//! - Chip injector (prefill against a runtime context)
//! - Submission schema generator and validator
//!
//! The signing workflow (instances, signatories, locking) lives in
//! `formflow-core` and consumes these types.

pub mod ast;
pub mod condition;
pub mod diagnostics;
pub mod inject;
pub mod parser;
pub mod render;
pub mod schema;
pub mod validator;

pub use ast::{
    ChipResolution, Condition, ConditionOperator, ConditionalBlock, Field, FieldContainer,
    FieldOption, FieldType, FormAst, FormConfig, FormMetadata, Page, Section,
};
pub use diagnostics::{has_errors, Diagnostic, DiagnosticCode, Severity};
pub use inject::{inject, ChipContext, ResolvedForm};
pub use parser::{compile, slugify, CompileOutput};
pub use render::render;
pub use schema::{FieldError, SubmissionReport, SubmissionSchema};
pub use validator::validate;
