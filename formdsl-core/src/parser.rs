//! Line scanner for the form template DSL.
//!
//! The grammar is line-prefix based:
//!
//! ```text
//! ---                      optional leading front-matter block (form config)
//! autoSubmitOnSignature: true
//! ---
//! # Title                  first line of the body only
//! ## Section heading
//! ### Field heading
//! - key: value             field property (or form/section property)
//! - if: field == "value"   conditional block; children indented two spaces
//!   ### Nested Field             (headings +2, their properties +4)
//!     - required: true
//! ---                      divider
//! ---page-break---         page boundary
//! ```
//!
//! `compile` never fails: malformed input produces a best-effort AST plus a
//! list of diagnostics. Unknown property keys are ignored (forward
//! compatible) and surfaced as warnings.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::ast::*;
use crate::condition;
use crate::diagnostics::{Diagnostic, DiagnosticCode};

/// Result of compiling template text: always an AST, plus every structural
/// problem found along the way.
#[derive(Clone, Debug)]
pub struct CompileOutput {
    pub ast: FormAst,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile raw template text into an AST. Never errors on malformed input.
pub fn compile(text: &str) -> CompileOutput {
    let lines: Vec<&str> = text.lines().collect();
    let mut scanner = LineScanner::default();

    let body_start = scanner.consume_front_matter(&lines);
    for (idx, line) in lines.iter().enumerate().skip(body_start) {
        scanner.process_line(idx as u32 + 1, line);
    }

    let output = scanner.finish();
    tracing::debug!(
        fields = output.ast.field_count(),
        pages = output.ast.pages.len(),
        diagnostics = output.diagnostics.len(),
        "compiled form template"
    );
    output
}

// ─── Slugification ────────────────────────────────────────────

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Derive a stable field id from a label: lowercase, strip non-word
/// characters, collapse whitespace and hyphen runs to single hyphens.
/// Idempotent: `slugify(slugify(x)) == slugify(x)`.
pub fn slugify(label: &str) -> String {
    let lower = label.to_lowercase();
    let stripped = NON_WORD.replace_all(&lower, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    HYPHEN_RUNS
        .replace_all(&hyphenated, "-")
        .trim_matches('-')
        .to_string()
}

// ─── Scanner state ────────────────────────────────────────────

struct OpenField {
    field: Field,
    explicit_id: bool,
}

struct OpenBlock {
    condition: Condition,
    children: Vec<FieldContainer>,
    /// Minimum indent for lines belonging to this block.
    child_indent: usize,
    line: u32,
}

#[derive(Default)]
struct LineScanner {
    title: String,
    form_description: Vec<String>,
    config: Option<FormConfig>,
    chip_references: Vec<String>,
    diagnostics: Vec<Diagnostic>,

    pages: Vec<Page>,
    sections: Vec<Section>,
    section: Option<Section>,
    field: Option<OpenField>,
    blocks: Vec<OpenBlock>,
    section_seq: usize,
    /// Structural content seen; gates title acceptance.
    seen_body: bool,
}

impl LineScanner {
    /// Parse the optional leading `---`…`---` config block. Returns the index
    /// of the first body line.
    fn consume_front_matter(&mut self, lines: &[&str]) -> usize {
        let first = match lines.iter().position(|l| !l.trim().is_empty()) {
            Some(i) => i,
            None => return 0,
        };
        if lines[first].trim() != "---" {
            return 0;
        }
        let close = lines[first + 1..]
            .iter()
            .position(|l| l.trim() == "---")
            .map(|off| first + 1 + off);
        let close = match close {
            Some(i) => i,
            None => {
                // No closing fence: not front matter, treat the `---` as body.
                self.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::UnterminatedConfig,
                        "leading '---' has no closing fence; treated as a divider",
                    )
                    .at_line(first as u32 + 1),
                );
                return 0;
            }
        };

        let mut config = FormConfig::default();
        for (idx, line) in lines[first + 1..close].iter().enumerate() {
            let line = line.trim().trim_start_matches("- ").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                self.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::OrphanProperty,
                        format!("ignoring malformed config line '{line}'"),
                    )
                    .at_line((first + 2 + idx) as u32),
                );
                continue;
            };
            let value = value.trim();
            match normalize_key(key).as_str() {
                "autosubmitonsignature" => config.auto_submit_on_signature = parse_bool(value),
                _ => {
                    config
                        .extra
                        .insert(key.trim().to_string(), value.to_string());
                }
            }
        }
        self.config = Some(config);
        close + 1
    }

    fn process_line(&mut self, line_no: u32, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        let indent = raw.len() - raw.trim_start_matches(' ').len();

        // A dedent below the current block's child indent terminates it.
        while let Some(top) = self.blocks.last() {
            if indent < top.child_indent {
                self.close_block();
            } else {
                break;
            }
        }

        let content = raw.trim();
        if content == "---page-break---" {
            self.seen_body = true;
            self.finish_page();
        } else if content == "---" {
            self.seen_body = true;
            self.finish_field();
            self.push_container(FieldContainer::Divider);
        } else if let Some(rest) = content.strip_prefix("# ") {
            self.handle_title(line_no, rest.trim());
        } else if let Some(rest) = content.strip_prefix("## ") {
            self.start_section(Some(rest.trim()));
        } else if content == "##" {
            self.start_section(None);
        } else if let Some(rest) = content.strip_prefix("### ") {
            self.start_field(line_no, rest.trim());
        } else if let Some(rest) = content.strip_prefix("- ") {
            self.handle_property(line_no, indent, rest);
        } else {
            self.seen_body = true;
            self.handle_text(content);
        }
    }

    fn handle_title(&mut self, line_no: u32, text: &str) {
        if !self.title.is_empty() || self.seen_body {
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::MisplacedTitle,
                    "'# ' title is only recognised at the top of the document",
                )
                .at_line(line_no),
            );
            return;
        }
        self.title = text.to_string();
    }

    fn handle_property(&mut self, line_no: u32, indent: usize, rest: &str) {
        self.seen_body = true;
        let Some((key, value)) = rest.split_once(':') else {
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::OrphanProperty,
                    format!("ignoring list item without 'key: value' shape: '- {rest}'"),
                )
                .at_line(line_no),
            );
            return;
        };
        let value = value.trim();

        if normalize_key(key) == "if" {
            self.finish_field();
            let cond = match condition::parse(value) {
                Ok(cond) => cond,
                Err(err) => {
                    self.diagnostics.push(
                        Diagnostic::error(DiagnosticCode::InvalidCondition, err.to_string())
                            .at_line(line_no),
                    );
                    // Keep the block so its children stay grouped.
                    Condition {
                        field: String::new(),
                        operator: ConditionOperator::Eq,
                        value: String::new(),
                    }
                }
            };
            self.blocks.push(OpenBlock {
                condition: cond,
                children: Vec::new(),
                child_indent: indent + 2,
                line: line_no,
            });
            return;
        }

        if self.field.is_some() {
            self.apply_field_property(line_no, key, value);
        } else if normalize_key(key) == "description" {
            if let Some(section) = self.section.as_mut() {
                section.description = Some(value.to_string());
            } else {
                self.form_description.push(value.to_string());
            }
        } else {
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::OrphanProperty,
                    format!("property '{}' outside a field; ignored", key.trim()),
                )
                .at_line(line_no),
            );
        }
    }

    fn apply_field_property(&mut self, line_no: u32, key: &str, value: &str) {
        let Some(open) = self.field.as_mut() else {
            return;
        };
        let field = &mut open.field;
        match normalize_key(key).as_str() {
            "label" => {
                field.label = value.to_string();
                if !open.explicit_id {
                    field.id = slugify(value);
                }
            }
            "field" => {
                field.id = value.to_string();
                open.explicit_id = true;
            }
            "type" => match FieldType::from_keyword(value) {
                Some(ty) => field.field_type = ty,
                None => self.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::UnknownFieldType,
                        format!("unknown field type '{value}'; keeping '{}'", field.field_type.as_str()),
                    )
                    .at_line(line_no),
                ),
            },
            "required" => field.required = parse_bool(value),
            "placeholder" => field.placeholder = non_empty(value),
            "chip" => {
                field.chip = non_empty(value);
                if let Some(chip) = &field.chip {
                    if !self.chip_references.contains(chip) {
                        self.chip_references.push(chip.clone());
                    }
                }
            }
            "description" => field.description = non_empty(value),
            "helptext" => field.help_text = non_empty(value),
            "options" => {
                field.options = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|label| FieldOption {
                        label: label.to_string(),
                        value: slugify(label),
                    })
                    .collect();
            }
            "minlength" => self.set_number(line_no, key, value, |f, n| f.min_length = Some(n)),
            "maxlength" => self.set_number(line_no, key, value, |f, n| f.max_length = Some(n)),
            "min" => self.set_float(line_no, key, value, |f, n| f.min = Some(n)),
            "max" => self.set_float(line_no, key, value, |f, n| f.max = Some(n)),
            "step" => self.set_float(line_no, key, value, |f, n| f.step = Some(n)),
            "pattern" => field.pattern = non_empty(value),
            "multiple" => field.multiple = parse_bool(value),
            "signatory" => field.signatory = non_empty(value),
            "capturetimestamp" => field.capture_timestamp = parse_bool(value),
            "timestampformat" => field.timestamp_format = non_empty(value),
            "embedtimestamp" => field.embed_timestamp = parse_bool(value),
            _ => self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::UnknownProperty,
                    format!("unknown field property '{}'; ignored", key.trim()),
                )
                .at_line(line_no),
            ),
        }
    }

    fn set_number(&mut self, line_no: u32, key: &str, value: &str, set: impl Fn(&mut Field, u32)) {
        match value.trim().parse::<u32>() {
            Ok(n) => {
                if let Some(open) = self.field.as_mut() {
                    set(&mut open.field, n);
                }
            }
            Err(_) => self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::InvalidPropertyValue,
                    format!("'{}' expects a whole number, got '{value}'", key.trim()),
                )
                .at_line(line_no),
            ),
        }
    }

    fn set_float(&mut self, line_no: u32, key: &str, value: &str, set: impl Fn(&mut Field, f64)) {
        match value.trim().parse::<f64>() {
            Ok(n) => {
                if let Some(open) = self.field.as_mut() {
                    set(&mut open.field, n);
                }
            }
            Err(_) => self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::InvalidPropertyValue,
                    format!("'{}' expects a number, got '{value}'", key.trim()),
                )
                .at_line(line_no),
            ),
        }
    }

    fn handle_text(&mut self, text: &str) {
        if let Some(open) = self.field.as_mut() {
            append_line(&mut open.field.description, text);
        } else if let Some(section) = self.section.as_mut() {
            append_line(&mut section.description, text);
        } else {
            self.form_description.push(text.to_string());
        }
    }

    // ── Structure management ──

    fn start_section(&mut self, title: Option<&str>) {
        self.seen_body = true;
        self.finish_section();
        self.section_seq += 1;
        self.section = Some(Section {
            id: format!("section-{}", self.section_seq),
            title: title.filter(|t| !t.is_empty()).map(str::to_string),
            description: None,
            fields: Vec::new(),
        });
    }

    fn ensure_section(&mut self) {
        if self.section.is_none() {
            self.section_seq += 1;
            self.section = Some(Section {
                id: format!("section-{}", self.section_seq),
                title: None,
                description: None,
                fields: Vec::new(),
            });
        }
    }

    fn start_field(&mut self, line_no: u32, label: &str) {
        self.seen_body = true;
        self.finish_field();
        let mut field = Field::new(slugify(label), label, FieldType::Text);
        field.line = line_no;
        self.field = Some(OpenField {
            field,
            explicit_id: false,
        });
    }

    fn push_container(&mut self, container: FieldContainer) {
        if let Some(top) = self.blocks.last_mut() {
            top.children.push(container);
            return;
        }
        self.ensure_section();
        if let Some(section) = self.section.as_mut() {
            section.fields.push(container);
        }
    }

    fn finish_field(&mut self) {
        if let Some(open) = self.field.take() {
            self.push_container(FieldContainer::Field(open.field));
        }
    }

    fn close_block(&mut self) {
        self.finish_field();
        if let Some(block) = self.blocks.pop() {
            self.push_container(FieldContainer::Conditional(ConditionalBlock {
                condition: block.condition,
                children: block.children,
                line: block.line,
            }));
        }
    }

    fn finish_section(&mut self) {
        self.finish_field();
        while !self.blocks.is_empty() {
            self.close_block();
        }
        if let Some(section) = self.section.take() {
            self.sections.push(section);
        }
    }

    fn finish_page(&mut self) {
        self.finish_section();
        let mut sections = std::mem::take(&mut self.sections);
        if sections.is_empty() {
            // Every page carries at least one section.
            self.section_seq += 1;
            sections.push(Section {
                id: format!("section-{}", self.section_seq),
                title: None,
                description: None,
                fields: Vec::new(),
            });
        }
        self.pages.push(Page {
            id: format!("page-{}", self.pages.len() + 1),
            sections,
        });
    }

    fn finish(mut self) -> CompileOutput {
        self.finish_page();

        let mut ast = FormAst {
            title: self.title,
            description: if self.form_description.is_empty() {
                None
            } else {
                Some(self.form_description.join("\n"))
            },
            pages: self.pages,
            metadata: FormMetadata {
                chip_references: self.chip_references,
                form_config: self.config,
            },
        };

        // Field ids are the submission-data keys; collisions get a numeric
        // suffix and a warning.
        let mut seen: HashSet<String> = HashSet::new();
        let mut renames: Vec<(String, u32)> = Vec::new();
        ast.for_each_field_mut(|field| {
            if !seen.insert(field.id.clone()) {
                let base = field.id.clone();
                let mut n = 2;
                while !seen.insert(format!("{base}-{n}")) {
                    n += 1;
                }
                field.id = format!("{base}-{n}");
                renames.push((base, field.line));
            }
        });
        for (base, line) in renames {
            let mut diag = Diagnostic::warning(
                DiagnosticCode::DuplicateFieldId,
                format!("duplicate field id '{base}'; renamed to keep ids unique"),
            );
            if line > 0 {
                diag = diag.at_line(line);
            }
            self.diagnostics.push(diag);
        }

        CompileOutput {
            ast,
            diagnostics: self.diagnostics,
        }
    }
}

// ─── Small helpers ────────────────────────────────────────────

/// Property keys tolerate camelCase, snake_case and kebab-case.
fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn append_line(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn first_section(ast: &FormAst) -> &Section {
        &ast.pages[0].sections[0]
    }

    #[test]
    fn end_to_end_minimal_template() {
        let out = compile("# T\n## S\n### Name\n- field: name\n- required: true");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.ast.title, "T");
        assert_eq!(out.ast.pages.len(), 1);
        let section = first_section(&out.ast);
        assert_eq!(section.title.as_deref(), Some("S"));
        assert_eq!(section.fields.len(), 1);
        match &section.fields[0] {
            FieldContainer::Field(f) => {
                assert_eq!(f.id, "name");
                assert_eq!(f.field_type, FieldType::Text);
                assert!(f.required);
            }
            other => panic!("expected field, got {other:?}"),
        }
    }

    #[test]
    fn compile_is_deterministic() {
        let text = "# Form\n## A\n### X\n- type: number\n---\n### Y\n---page-break---\n## B\n### Z";
        let a = compile(text);
        let b = compile(text);
        assert_eq!(a.ast, b.ast);
    }

    #[test]
    fn slugify_rules() {
        assert_eq!(slugify("Full Name"), "full-name");
        assert_eq!(slugify("  What's your   budget?  "), "whats-your-budget");
        assert_eq!(slugify("a --- b"), "a-b");
        // Idempotent
        assert_eq!(slugify("full-name"), "full-name");
        assert_eq!(slugify(&slugify("Vendor (primary)")), slugify("Vendor (primary)"));
    }

    #[test]
    fn default_id_derives_from_label() {
        let out = compile("# T\n### Contact Email\n- type: email");
        let field = out.ast.find_field("contact-email").expect("slug id");
        assert_eq!(field.field_type, FieldType::Email);
    }

    #[test]
    fn label_property_reslug_unless_explicit() {
        let out = compile("# T\n### Old\n- label: New Label");
        assert!(out.ast.find_field("new-label").is_some());

        let out = compile("# T\n### Old\n- field: fixed\n- label: New Label");
        let field = out.ast.find_field("fixed").expect("explicit id kept");
        assert_eq!(field.label, "New Label");
    }

    #[test]
    fn sections_synthesized_when_absent() {
        let out = compile("# T\n### Orphan Field");
        let section = first_section(&out.ast);
        assert_eq!(section.id, "section-1");
        assert!(section.title.is_none());
        assert_eq!(out.ast.field_count(), 1);
    }

    #[test]
    fn page_breaks_partition_sections() {
        let out = compile("# T\n## One\n### A\n---page-break---\n## Two\n### B");
        assert_eq!(out.ast.pages.len(), 2);
        assert_eq!(out.ast.pages[0].id, "page-1");
        assert_eq!(out.ast.pages[1].id, "page-2");
        assert_eq!(out.ast.pages[1].sections[0].title.as_deref(), Some("Two"));
    }

    #[test]
    fn empty_page_gets_section() {
        let out = compile("# T\n## One\n### A\n---page-break---");
        assert_eq!(out.ast.pages.len(), 2);
        assert_eq!(out.ast.pages[1].sections.len(), 1);
        assert!(out.ast.pages[1].sections[0].fields.is_empty());
    }

    #[test]
    fn divider_is_not_a_page_break() {
        let out = compile("# T\n## S\n### A\n---\n### B");
        assert_eq!(out.ast.pages.len(), 1);
        let fields = &first_section(&out.ast).fields;
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], FieldContainer::Divider);
    }

    #[test]
    fn conditional_block_with_indented_children() {
        let text = "\
# T
## S
### Interest Level
- field: interestLevel
- type: select
- options: High, Medium, Low
- if: interestLevel == \"High\"
  ### Callback Phone
    - field: phone
    - required: true
### After
";
        let out = compile(text);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let fields = &first_section(&out.ast).fields;
        assert_eq!(fields.len(), 3);
        match &fields[1] {
            FieldContainer::Conditional(block) => {
                assert_eq!(block.condition.field, "interestLevel");
                assert_eq!(block.condition.value, "High");
                assert_eq!(block.children.len(), 1);
                match &block.children[0] {
                    FieldContainer::Field(f) => {
                        assert_eq!(f.id, "phone");
                        assert!(f.required);
                    }
                    other => panic!("expected nested field, got {other:?}"),
                }
            }
            other => panic!("expected conditional, got {other:?}"),
        }
        // The unindented line after the block closed it.
        assert!(matches!(&fields[2], FieldContainer::Field(f) if f.id == "after"));
    }

    #[test]
    fn nested_conditionals() {
        let text = "\
# T
### Level
- field: level
- if: level == \"High\"
  ### Phone
  - if: budget >= 1000
    ### Premium Notes
";
        let out = compile(text);
        let fields = &first_section(&out.ast).fields;
        let outer = match &fields[1] {
            FieldContainer::Conditional(b) => b,
            other => panic!("expected conditional, got {other:?}"),
        };
        assert_eq!(outer.children.len(), 2);
        match &outer.children[1] {
            FieldContainer::Conditional(inner) => {
                assert_eq!(inner.condition.field, "budget");
                assert_eq!(inner.children.len(), 1);
            }
            other => panic!("expected nested conditional, got {other:?}"),
        }
    }

    #[test]
    fn bad_condition_reports_error_but_keeps_children() {
        let out = compile("# T\n- if: ???\n  ### Inside");
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::InvalidCondition && d.is_error()));
        assert_eq!(out.ast.field_count(), 1);
    }

    #[test]
    fn options_values_are_slugs() {
        let out = compile("# T\n### Choice\n- type: select\n- options: First Pick, Second Pick");
        let field = out.ast.find_field("choice").unwrap();
        assert_eq!(field.options.len(), 2);
        assert_eq!(field.options[0].label, "First Pick");
        assert_eq!(field.options[0].value, "first-pick");
    }

    #[test]
    fn front_matter_config() {
        let out = compile("---\nautoSubmitOnSignature: true\ncustomFlag: x\n---\n# T\n### A");
        let config = out.ast.metadata.form_config.as_ref().expect("config");
        assert!(config.auto_submit_on_signature);
        assert_eq!(config.extra.get("customFlag").map(String::as_str), Some("x"));
        assert_eq!(out.ast.title, "T");
    }

    #[test]
    fn chip_references_collected_in_order() {
        let out = compile(
            "# T\n### A\n- chip: vendor.name\n### B\n- chip: campaign.address\n### C\n- chip: vendor.name",
        );
        assert_eq!(
            out.ast.metadata.chip_references,
            vec!["vendor.name", "campaign.address"]
        );
    }

    #[test]
    fn unknown_keys_warn_but_do_not_error() {
        let out = compile("# T\n### A\n- frobnicate: yes");
        assert!(!crate::diagnostics::has_errors(&out.diagnostics));
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::UnknownProperty));
    }

    #[test]
    fn duplicate_ids_are_renamed_with_warning() {
        let out = compile("# T\n### Name\n### Name");
        let ids: Vec<String> = {
            let mut ids = Vec::new();
            out.ast.for_each_field(|f| ids.push(f.id.clone()));
            ids
        };
        assert_eq!(ids, vec!["name", "name-2"]);
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::DuplicateFieldId));
    }

    #[test]
    fn late_title_is_ignored_with_warning() {
        let out = compile("## S\n# Too Late\n### A");
        assert_eq!(out.ast.title, "");
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::MisplacedTitle));
    }

    #[test]
    fn signature_properties() {
        let text = "\
# T
### Vendor Signature
- type: signature
- required: true
- signatory: vendor
- captureTimestamp: true
- timestampFormat: DD/MM/YYYY
- embedTimestamp: true
";
        let out = compile(text);
        let field = out.ast.find_field("vendor-signature").unwrap();
        assert_eq!(field.field_type, FieldType::Signature);
        assert_eq!(field.signatory.as_deref(), Some("vendor"));
        assert!(field.capture_timestamp);
        assert!(field.embed_timestamp);
        assert_eq!(field.timestamp_format.as_deref(), Some("DD/MM/YYYY"));
    }

    #[test]
    fn empty_input_still_yields_one_page_one_section() {
        let out = compile("");
        assert_eq!(out.ast.pages.len(), 1);
        assert_eq!(out.ast.pages[0].sections.len(), 1);
        assert_eq!(out.ast.title, "");
    }
}
