//! AST types for compiled form templates.
//!
//! A template compiles to `FormAst → Page → Section → FieldContainer`, where
//! `FieldContainer` is the recursive tagged union (field / conditional block /
//! divider) that every downstream pass (validator, renderer, chip injector,
//! submission schema) traverses through the helpers at the bottom of this
//! module rather than re-implementing the recursion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Form root ────────────────────────────────────────────────

/// The compiled representation of one form template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormAst {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pages: Vec<Page>,
    pub metadata: FormMetadata,
}

/// Compiler-gathered metadata, persisted alongside the tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormMetadata {
    /// Every distinct chip path referenced by the template, in source order.
    pub chip_references: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_config: Option<FormConfig>,
}

/// Form-level configuration from the optional leading `---` front-matter block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Submit the instance automatically once the signature quorum is met.
    #[serde(default)]
    pub auto_submit_on_signature: bool,
    /// Unrecognised front-matter keys, preserved for forward compatibility.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

// ─── Structure ────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub sections: Vec<Section>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldContainer>,
}

/// The recursive content union inside a section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldContainer {
    Field(Field),
    Conditional(ConditionalBlock),
    Divider,
}

/// A group of containers shown only while `condition` holds against live
/// instance data. Visibility of any descendant is the AND of all ancestor
/// conditions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionalBlock {
    pub condition: Condition,
    pub children: Vec<FieldContainer>,
    #[serde(default)]
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    /// Untyped source text; coercion happens at evaluation time.
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    In,
    Contains,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Eq => "==",
            ConditionOperator::Ne => "!=",
            ConditionOperator::Gt => ">",
            ConditionOperator::Lt => "<",
            ConditionOperator::Ge => ">=",
            ConditionOperator::Le => "<=",
            ConditionOperator::In => "in",
            ConditionOperator::Contains => "contains",
        }
    }
}

// ─── Fields ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Number,
    Currency,
    Date,
    Time,
    DateTime,
    Select,
    Radio,
    Checkbox,
    Signature,
}

impl FieldType {
    /// Map a `type:` property value onto a field type. Case-insensitive.
    pub fn from_keyword(s: &str) -> Option<FieldType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(FieldType::Text),
            "textarea" => Some(FieldType::Textarea),
            "email" => Some(FieldType::Email),
            "number" => Some(FieldType::Number),
            "currency" => Some(FieldType::Currency),
            "date" => Some(FieldType::Date),
            "time" => Some(FieldType::Time),
            "datetime" | "datetime-local" => Some(FieldType::DateTime),
            "select" | "dropdown" => Some(FieldType::Select),
            "radio" => Some(FieldType::Radio),
            "checkbox" => Some(FieldType::Checkbox),
            "signature" => Some(FieldType::Signature),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DateTime => "datetime",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Signature => "signature",
        }
    }

    /// Types whose value is constrained to a listed option set.
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Radio | FieldType::Checkbox
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    /// Slug of the label; this is the submitted value.
    pub value: String,
}

/// Outcome of resolving a field's chip path against a runtime context.
/// Absent until the injector has run over a cloned tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChipResolution {
    Resolved { value: serde_json::Value },
    Unresolved,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Unique within the form; the submission-data key.
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Dotted prefill path, e.g. `vendor.name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub multiple: bool,
    /// Signature-only: which signing party this widget belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signatory: Option<String>,
    #[serde(default)]
    pub capture_timestamp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_format: Option<String>,
    #[serde(default)]
    pub embed_timestamp: bool,
    /// Set by the chip injector on an annotated clone; never by the parser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_chip: Option<ChipResolution>,
    /// Best-effort source line, for diagnostics.
    #[serde(default)]
    pub line: u32,
}

impl Field {
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            required: false,
            placeholder: None,
            chip: None,
            description: None,
            help_text: None,
            options: Vec::new(),
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            step: None,
            pattern: None,
            multiple: false,
            signatory: None,
            capture_timestamp: false,
            timestamp_format: None,
            embed_timestamp: false,
            resolved_chip: None,
            line: 0,
        }
    }
}

// ─── Traversal ────────────────────────────────────────────────

fn walk_containers<'a, F>(containers: &'a [FieldContainer], f: &mut F)
where
    F: FnMut(&'a Field),
{
    for container in containers {
        match container {
            FieldContainer::Field(field) => f(field),
            FieldContainer::Conditional(block) => walk_containers(&block.children, f),
            FieldContainer::Divider => {}
        }
    }
}

fn walk_containers_mut<F>(containers: &mut [FieldContainer], f: &mut F)
where
    F: FnMut(&mut Field),
{
    for container in containers {
        match container {
            FieldContainer::Field(field) => f(field),
            FieldContainer::Conditional(block) => walk_containers_mut(&mut block.children, f),
            FieldContainer::Divider => {}
        }
    }
}

fn walk_visible<'a, F>(
    containers: &'a [FieldContainer],
    data: &BTreeMap<String, serde_json::Value>,
    f: &mut F,
) where
    F: FnMut(&'a Field),
{
    for container in containers {
        match container {
            FieldContainer::Field(field) => f(field),
            FieldContainer::Conditional(block) => {
                if crate::condition::evaluate(&block.condition, data) {
                    walk_visible(&block.children, data, f);
                }
            }
            FieldContainer::Divider => {}
        }
    }
}

impl FormAst {
    /// Visit every leaf field, including fields nested inside conditionals.
    pub fn for_each_field<'a, F: FnMut(&'a Field)>(&'a self, mut f: F) {
        for page in &self.pages {
            for section in &page.sections {
                walk_containers(&section.fields, &mut f);
            }
        }
    }

    pub fn for_each_field_mut<F: FnMut(&mut Field)>(&mut self, mut f: F) {
        for page in &mut self.pages {
            for section in &mut page.sections {
                walk_containers_mut(&mut section.fields, &mut f);
            }
        }
    }

    /// Visit only the fields whose ancestor conditions all hold against `data`.
    pub fn for_each_visible_field<'a, F: FnMut(&'a Field)>(
        &'a self,
        data: &BTreeMap<String, serde_json::Value>,
        mut f: F,
    ) {
        for page in &self.pages {
            for section in &page.sections {
                walk_visible(&section.fields, data, &mut f);
            }
        }
    }

    pub fn find_field(&self, id: &str) -> Option<&Field> {
        let mut found = None;
        self.for_each_field(|field| {
            if found.is_none() && field.id == id {
                found = Some(field);
            }
        });
        found
    }

    pub fn field_count(&self) -> usize {
        let mut n = 0;
        self.for_each_field(|_| n += 1);
        n
    }
}
