use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use uuid::Uuid;

use formdsl_core::FormAst;

/// Flat submission data: field id → submitted value.
pub type FieldData = BTreeMap<String, Json>;

// ─── Status & signing mode ────────────────────────────────────

/// Stored lifecycle status of a form instance.
///
/// `ReadyToSign` is derived, never written: an instance is stored as `Draft`
/// until it locks, and the engine reports `ReadyToSign` when every required
/// non-signature field currently visible has a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Draft,
    ReadyToSign,
    Locked,
    Completed,
    Voided,
}

impl InstanceStatus {
    /// Voided is terminal; no transition of any kind leaves it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceStatus::Voided)
    }

    /// States in which shared field data may still be edited.
    pub fn allows_data_edit(&self) -> bool {
        matches!(self, InstanceStatus::Draft | InstanceStatus::ReadyToSign)
    }
}

/// Quorum rule for completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMode {
    /// Every signatory must sign.
    All,
    /// One signature completes the instance.
    Any,
}

// ─── Form instance ────────────────────────────────────────────

/// The shared, lockable data-and-signature state for a form sent to one
/// campaign. Created once at send time, never deleted, only transitioned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormInstance {
    pub instance_id: Uuid,
    pub form_id: Uuid,
    pub campaign_id: Uuid,
    /// Shared field data, last-write-wins across signatories.
    pub data: FieldData,
    pub status: InstanceStatus,
    pub signing_mode: SigningMode,
    /// Monotonic CAS token; every persisted transition bumps it.
    pub version: u64,
    pub locked_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub voided_at: Option<DateTime<Utc>>,
    pub voided_by: Option<String>,
    pub void_reason: Option<String>,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub unlocked_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FormInstance {
    pub fn new(form_id: Uuid, campaign_id: Uuid, signing_mode: SigningMode) -> Self {
        Self {
            instance_id: Uuid::now_v7(),
            form_id,
            campaign_id,
            data: FieldData::new(),
            status: InstanceStatus::Draft,
            signing_mode,
            version: 0,
            locked_at: None,
            completed_at: None,
            voided_at: None,
            voided_by: None,
            void_reason: None,
            unlocked_at: None,
            unlocked_by: None,
            created_at: Utc::now(),
        }
    }

    /// Derive the reported status: stored `Draft` upgrades to `ReadyToSign`
    /// once every required non-signature field that is currently visible has
    /// a non-empty value.
    pub fn derived_status(&self, ast: &FormAst) -> InstanceStatus {
        if self.status != InstanceStatus::Draft {
            return self.status;
        }
        let mut ready = true;
        ast.for_each_visible_field(&self.data, |field| {
            if field.required
                && field.field_type != formdsl_core::FieldType::Signature
                && !has_value(self.data.get(&field.id))
            {
                ready = false;
            }
        });
        if ready {
            InstanceStatus::ReadyToSign
        } else {
            InstanceStatus::Draft
        }
    }
}

fn has_value(value: Option<&Json>) -> bool {
    match value {
        None | Some(Json::Null) => false,
        Some(Json::String(s)) => !s.trim().is_empty(),
        Some(Json::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

// ─── Signatory ────────────────────────────────────────────────

/// One signing party on one instance, bound to exactly one access link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signatory {
    pub signatory_id: Uuid,
    pub instance_id: Uuid,
    pub link_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub signature_data: Option<Json>,
}

impl Signatory {
    pub fn new(instance_id: Uuid, link_id: Uuid, name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            signatory_id: Uuid::now_v7(),
            instance_id,
            link_id,
            name: name.into(),
            email,
            signed_at: None,
            signature_data: None,
        }
    }

    pub fn has_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

// ─── Access link ──────────────────────────────────────────────

/// Vendor-facing access token. Read-only to the workflow core apart from the
/// `used_at` stamp; expiry is a wall-clock comparison at resolution time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessLink {
    pub token: String,
    pub vendor_id: Uuid,
    pub campaign_id: Uuid,
    pub form_id: Uuid,
    pub instance_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl AccessLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// ─── Template ─────────────────────────────────────────────────

/// Stored template: raw text plus cached compile artifacts. The cache is
/// replaced (or cleared, when compilation reports errors) every time the raw
/// text is re-saved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Template {
    pub template_id: Uuid,
    pub raw_text: String,
    /// Present only when the last save compiled without errors.
    pub compiled: Option<FormAst>,
    /// Rendered preview of `compiled`, cached alongside it.
    pub preview: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdsl_core::compile;
    use serde_json::json;

    #[test]
    fn ready_to_sign_derivation() {
        let ast = compile("# T\n### Name\n- required: true\n### Sign\n- type: signature\n- required: true").ast;
        let mut instance = FormInstance::new(Uuid::now_v7(), Uuid::now_v7(), SigningMode::All);

        // Required text field empty: still draft.
        assert_eq!(instance.derived_status(&ast), InstanceStatus::Draft);

        // Signature fields never gate readiness.
        instance.data.insert("name".into(), json!("Jane"));
        assert_eq!(instance.derived_status(&ast), InstanceStatus::ReadyToSign);

        // Whitespace is not a value.
        instance.data.insert("name".into(), json!("   "));
        assert_eq!(instance.derived_status(&ast), InstanceStatus::Draft);
    }

    #[test]
    fn derivation_only_upgrades_draft() {
        let ast = compile("# T\n### Name\n- required: true").ast;
        let mut instance = FormInstance::new(Uuid::now_v7(), Uuid::now_v7(), SigningMode::Any);
        instance.data.insert("name".into(), json!("Jane"));
        instance.status = InstanceStatus::Locked;
        assert_eq!(instance.derived_status(&ast), InstanceStatus::Locked);
    }

    #[test]
    fn hidden_required_fields_do_not_gate_readiness() {
        let ast = compile(
            "# T\n### L\n- field: level\n- required: true\n- if: level == \"High\"\n  ### Phone\n  - required: true",
        )
        .ast;
        let mut instance = FormInstance::new(Uuid::now_v7(), Uuid::now_v7(), SigningMode::All);
        instance.data.insert("level".into(), json!("Low"));
        // Phone is hidden while level != High, so it does not block.
        assert_eq!(instance.derived_status(&ast), InstanceStatus::ReadyToSign);

        instance.data.insert("level".into(), json!("High"));
        assert_eq!(instance.derived_status(&ast), InstanceStatus::Draft);
    }

    #[test]
    fn link_expiry_is_wall_clock() {
        let link = AccessLink {
            token: "t".into(),
            vendor_id: Uuid::now_v7(),
            campaign_id: Uuid::now_v7(),
            form_id: Uuid::now_v7(),
            instance_id: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
            used_at: None,
        };
        assert!(!link.is_expired(Utc::now()));
        assert!(link.is_expired(Utc::now() + chrono::Duration::hours(2)));
    }
}
