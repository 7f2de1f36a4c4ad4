//! Structural renderer: a pure projection of the AST to HTML markup.
//!
//! Reads nothing but the tree: no chip values, no instance data. Every
//! author-supplied string is escaped before it reaches the output. Conditional
//! blocks render hidden with a machine-readable `data-condition` descriptor;
//! the client evaluates it against live data, not this module.

use crate::ast::*;

/// Render the full form as markup.
pub fn render(ast: &FormAst) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("<form class=\"df-form\">\n");
    if !ast.title.is_empty() {
        out.push_str(&format!("<h1>{}</h1>\n", escape(&ast.title)));
    }
    if let Some(description) = &ast.description {
        out.push_str(&format!(
            "<p class=\"df-description\">{}</p>\n",
            escape(description)
        ));
    }
    for page in &ast.pages {
        out.push_str(&format!(
            "<div class=\"df-page\" data-page=\"{}\">\n",
            escape(&page.id)
        ));
        for section in &page.sections {
            render_section(&mut out, section);
        }
        out.push_str("</div>\n");
    }
    out.push_str("</form>\n");
    out
}

fn render_section(out: &mut String, section: &Section) {
    out.push_str(&format!(
        "<section class=\"df-section\" id=\"{}\">\n",
        escape(&section.id)
    ));
    if let Some(title) = &section.title {
        out.push_str(&format!("<h2>{}</h2>\n", escape(title)));
    }
    if let Some(description) = &section.description {
        out.push_str(&format!(
            "<p class=\"df-section-description\">{}</p>\n",
            escape(description)
        ));
    }
    render_containers(out, &section.fields);
    out.push_str("</section>\n");
}

fn render_containers(out: &mut String, containers: &[FieldContainer]) {
    for container in containers {
        match container {
            FieldContainer::Field(field) => render_field(out, field),
            FieldContainer::Divider => out.push_str("<hr class=\"df-divider\">\n"),
            FieldContainer::Conditional(block) => {
                // Hidden by default; descriptor is JSON for the client-side
                // evaluator.
                let descriptor =
                    serde_json::to_string(&block.condition).unwrap_or_else(|_| "{}".to_string());
                out.push_str(&format!(
                    "<div class=\"df-conditional\" hidden data-condition=\"{}\">\n",
                    escape(&descriptor)
                ));
                render_containers(out, &block.children);
                out.push_str("</div>\n");
            }
        }
    }
}

fn render_field(out: &mut String, field: &Field) {
    out.push_str(&format!(
        "<div class=\"df-field df-field-{}\" data-field=\"{}\">\n",
        field.field_type.as_str(),
        escape(&field.id)
    ));
    out.push_str(&format!(
        "<label for=\"{}\">{}{}</label>\n",
        escape(&field.id),
        escape(&field.label),
        if field.required {
            "<span class=\"df-required\">*</span>"
        } else {
            ""
        }
    ));
    if let Some(description) = &field.description {
        out.push_str(&format!(
            "<p class=\"df-field-description\">{}</p>\n",
            escape(description)
        ));
    }

    match field.field_type {
        FieldType::Textarea => {
            out.push_str(&format!(
                "<textarea id=\"{}\" name=\"{}\"{}></textarea>\n",
                escape(&field.id),
                escape(&field.id),
                input_attrs(field)
            ));
        }
        FieldType::Select => {
            out.push_str(&format!(
                "<select id=\"{}\" name=\"{}\"{}{}>\n",
                escape(&field.id),
                escape(&field.id),
                if field.required { " required" } else { "" },
                if field.multiple { " multiple" } else { "" }
            ));
            if let Some(placeholder) = &field.placeholder {
                out.push_str(&format!(
                    "<option value=\"\" disabled selected>{}</option>\n",
                    escape(placeholder)
                ));
            }
            for option in &field.options {
                out.push_str(&format!(
                    "<option value=\"{}\">{}</option>\n",
                    escape(&option.value),
                    escape(&option.label)
                ));
            }
            out.push_str("</select>\n");
        }
        FieldType::Radio | FieldType::Checkbox => {
            let input_type = if field.field_type == FieldType::Radio {
                "radio"
            } else {
                "checkbox"
            };
            out.push_str(&format!(
                "<div class=\"df-{}-group\" role=\"group\">\n",
                input_type
            ));
            for option in &field.options {
                out.push_str(&format!(
                    "<label><input type=\"{}\" name=\"{}\" value=\"{}\"> {}</label>\n",
                    input_type,
                    escape(&field.id),
                    escape(&option.value),
                    escape(&option.label)
                ));
            }
            out.push_str("</div>\n");
        }
        FieldType::Signature => {
            // Composite widget placeholder; the signing client mounts the
            // actual capture surface here.
            out.push_str(&format!(
                "<div class=\"df-signature\" data-field=\"{}\"{}{}></div>\n",
                escape(&field.id),
                field
                    .signatory
                    .as_ref()
                    .map(|s| format!(" data-signatory=\"{}\"", escape(s)))
                    .unwrap_or_default(),
                if field.capture_timestamp {
                    " data-capture-timestamp=\"true\""
                } else {
                    ""
                }
            ));
        }
        _ => {
            out.push_str(&format!(
                "<input type=\"{}\" id=\"{}\" name=\"{}\"{}>\n",
                html_input_type(field.field_type),
                escape(&field.id),
                escape(&field.id),
                input_attrs(field)
            ));
        }
    }

    if let Some(help) = &field.help_text {
        out.push_str(&format!("<p class=\"df-help\">{}</p>\n", escape(help)));
    }
    out.push_str("</div>\n");
}

fn html_input_type(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Email => "email",
        FieldType::Number | FieldType::Currency => "number",
        FieldType::Date => "date",
        FieldType::Time => "time",
        FieldType::DateTime => "datetime-local",
        _ => "text",
    }
}

fn input_attrs(field: &Field) -> String {
    let mut attrs = String::new();
    if field.required {
        attrs.push_str(" required");
    }
    if let Some(placeholder) = &field.placeholder {
        attrs.push_str(&format!(" placeholder=\"{}\"", escape(placeholder)));
    }
    if let Some(n) = field.min_length {
        attrs.push_str(&format!(" minlength=\"{n}\""));
    }
    if let Some(n) = field.max_length {
        attrs.push_str(&format!(" maxlength=\"{n}\""));
    }
    if let Some(n) = field.min {
        attrs.push_str(&format!(" min=\"{n}\""));
    }
    if let Some(n) = field.max {
        attrs.push_str(&format!(" max=\"{n}\""));
    }
    if let Some(n) = field.step {
        attrs.push_str(&format!(" step=\"{n}\""));
    } else if field.field_type == FieldType::Currency {
        attrs.push_str(" step=\"0.01\"");
    }
    if let Some(pattern) = &field.pattern {
        attrs.push_str(&format!(" pattern=\"{}\"", escape(pattern)));
    }
    attrs
}

/// Escape author-supplied text for both element and attribute positions.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
