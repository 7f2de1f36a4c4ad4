//! Chip injector: resolves dotted placeholder paths against a runtime
//! context and produces an annotated clone of the AST plus a prefill map.
//!
//! A chip is `<namespace>.<a>.<b>...` where the namespace is one of the
//! context slots (vendor / campaign / listing). Missing namespaces or
//! intermediate keys resolve to `Unresolved` silently; prefill is
//! best-effort and never an error. The input AST is cloned, never mutated.

use serde_json::Value as Json;
use std::collections::BTreeMap;

use crate::ast::{ChipResolution, FormAst};

/// Runtime context the chips resolve against. Each slot is an arbitrary
/// nested JSON document.
#[derive(Clone, Debug, Default)]
pub struct ChipContext {
    pub vendor: Option<Json>,
    pub campaign: Option<Json>,
    pub listing: Option<Json>,
}

impl ChipContext {
    fn namespace(&self, name: &str) -> Option<&Json> {
        match name {
            "vendor" => self.vendor.as_ref(),
            "campaign" => self.campaign.as_ref(),
            "listing" => self.listing.as_ref(),
            _ => None,
        }
    }
}

/// An annotated AST clone plus the per-field prefill values.
#[derive(Clone, Debug)]
pub struct ResolvedForm {
    pub ast: FormAst,
    pub prefill: BTreeMap<String, Json>,
}

/// Resolve every chip in the form against `context`.
pub fn inject(ast: &FormAst, context: &ChipContext) -> ResolvedForm {
    let mut annotated = ast.clone();
    let mut prefill = BTreeMap::new();

    annotated.for_each_field_mut(|field| {
        let Some(chip) = &field.chip else {
            return;
        };
        match resolve_chip(chip, context) {
            Some(value) => {
                prefill.insert(field.id.clone(), value.clone());
                field.resolved_chip = Some(ChipResolution::Resolved { value });
            }
            None => {
                field.resolved_chip = Some(ChipResolution::Unresolved);
            }
        }
    });

    tracing::debug!(
        chips = annotated.metadata.chip_references.len(),
        resolved = prefill.len(),
        "resolved chips for signing context"
    );
    ResolvedForm {
        ast: annotated,
        prefill,
    }
}

fn resolve_chip(chip: &str, context: &ChipContext) -> Option<Json> {
    let mut segments = chip.split('.');
    let root = context.namespace(segments.next()?)?;
    let value = segments.try_fold(root, |current, segment| walk(current, segment))?;
    if value.is_null() {
        return None;
    }
    Some(value.clone())
}

fn walk<'a>(value: &'a Json, segment: &str) -> Option<&'a Json> {
    match value {
        Json::Object(map) => map.get(segment),
        // Numeric segments index into arrays, e.g. `listing.agents.0`.
        Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
