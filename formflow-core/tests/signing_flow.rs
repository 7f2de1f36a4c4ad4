//! End-to-end signing flow: author a template, resolve a vendor link,
//! submit data, collect signatures to completion, then unlock and void.

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use formdsl_core::ChipContext;
use formflow_core::{
    AccessLink, FieldData, FlowEngine, FlowError, InstanceStatus, MemoryStore, SigningMode,
};

const AGREEMENT: &str = "\
---
autoSubmitOnSignature: true
---
# Exclusive Agency Agreement

## Vendor Details
### Full Name
- field: vendorName
- chip: vendor.name
- required: true
### Email
- field: vendorEmail
- type: email
- chip: vendor.email
- required: true

## Terms
### Asking Price
- field: askingPrice
- type: currency
- min: 1
- required: true
### Marketing Opt-In
- field: marketingOptIn
- type: checkbox
- options: Print, Online, Signboard

## Execution
### Vendor Signature
- field: vendorSignature
- type: signature
- required: true
- signatory: vendor
### Agent Signature
- field: agentSignature
- type: signature
- required: true
- signatory: agent
";

fn engine() -> FlowEngine {
    FlowEngine::new(Arc::new(MemoryStore::new()))
}

fn signature(name: &str) -> serde_json::Value {
    json!({"type": "typed", "data": name, "timestamp": "2026-08-31T09:30:00Z"})
}

#[tokio::test]
async fn full_agreement_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let engine = FlowEngine::new(store.clone());
    let form_id = Uuid::now_v7();
    let diagnostics = engine.save_template(form_id, AGREEMENT).await.unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let instance = engine
        .create_instance(form_id, Uuid::now_v7(), SigningMode::All)
        .await
        .unwrap();
    assert_eq!(instance.status, InstanceStatus::Draft);
    assert_eq!(instance.version, 0);

    // The vendor opens their access link and sees the prefilled form.
    let link = AccessLink {
        token: "caf3-token".into(),
        vendor_id: Uuid::now_v7(),
        campaign_id: instance.campaign_id,
        form_id,
        instance_id: Some(instance.instance_id),
        expires_at: Utc::now() + Duration::days(14),
        used_at: None,
    };
    formflow_core::FlowStore::save_link(store.as_ref(), &link)
        .await
        .unwrap();

    let context = ChipContext {
        vendor: Some(json!({"name": "Jane Citizen", "email": "jane@example.com"})),
        ..ChipContext::default()
    };
    let resolved = engine.resolve_link("caf3-token", &context).await.unwrap();
    assert_eq!(resolved.form.prefill["vendorName"], json!("Jane Citizen"));
    assert_eq!(
        resolved.form.prefill["vendorEmail"],
        json!("jane@example.com")
    );
    assert!(resolved.instance.is_some());

    // Submitting incomplete data reports violations and stores nothing.
    let mut partial = FieldData::new();
    partial.insert("vendorName".into(), json!("Jane Citizen"));
    let report = engine.submit(instance.instance_id, partial).await.unwrap();
    assert!(!report.is_valid);
    assert_eq!(engine.status(instance.instance_id).await.unwrap(), InstanceStatus::Draft);

    // A full submission moves the instance to ready_to_sign.
    let mut data = FieldData::new();
    data.insert("vendorName".into(), json!("Jane Citizen"));
    data.insert("vendorEmail".into(), json!("jane@example.com"));
    data.insert("askingPrice".into(), json!("925000"));
    data.insert("marketingOptIn".into(), json!(["print", "online"]));
    let report = engine
        .submit(instance.instance_id, data)
        .await
        .unwrap();
    assert!(report.is_valid, "{:?}", report.errors);
    assert_eq!(report.normalized_data["askingPrice"], json!(925000.0));
    assert_eq!(
        engine.status(instance.instance_id).await.unwrap(),
        InstanceStatus::ReadyToSign
    );

    // Both parties sign; the first signature locks, the second completes.
    let vendor = engine
        .add_signatory(instance.instance_id, Uuid::now_v7(), "Jane Citizen", None)
        .await
        .unwrap();
    let agent = engine
        .add_signatory(
            instance.instance_id,
            Uuid::now_v7(),
            "Alex Agent",
            Some("alex@agency.example".into()),
        )
        .await
        .unwrap();

    let after_vendor = engine
        .record_signature(vendor.signatory_id, signature("Jane Citizen"))
        .await
        .unwrap();
    assert_eq!(after_vendor.status, InstanceStatus::Locked);

    let locked_edit = engine
        .update_data(instance.instance_id, FieldData::new())
        .await
        .unwrap_err();
    assert!(matches!(locked_edit, FlowError::InstanceLocked(_)));

    let after_agent = engine
        .record_signature(agent.signatory_id, signature("Alex Agent"))
        .await
        .unwrap();
    assert_eq!(after_agent.status, InstanceStatus::Completed);
    assert!(after_agent.completed_at.is_some());

    // Unlock performs a full reset back to the editable draft.
    let unlocked = engine
        .unlock_instance(instance.instance_id, "compliance")
        .await
        .unwrap();
    assert_eq!(unlocked.status, InstanceStatus::Draft);
    assert!(unlocked.completed_at.is_none());
    // Data survives the unlock, so readiness is still derived.
    assert_eq!(
        engine.status(instance.instance_id).await.unwrap(),
        InstanceStatus::ReadyToSign
    );

    // The previously signed parties must sign again from scratch.
    let relocked = engine
        .record_signature(vendor.signatory_id, signature("Jane Citizen"))
        .await
        .unwrap();
    assert_eq!(relocked.status, InstanceStatus::Locked);

    // Void ends the story for good.
    let voided = engine
        .void_instance(instance.instance_id, "compliance", "agreement superseded")
        .await
        .unwrap();
    assert_eq!(voided.status, InstanceStatus::Voided);
    let err = engine
        .record_signature(agent.signatory_id, signature("Alex Agent"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::InstanceVoided(_)));
}

#[tokio::test]
async fn any_mode_single_signature_completes() {
    let engine = engine();
    let form_id = Uuid::now_v7();
    engine.save_template(form_id, AGREEMENT).await.unwrap();

    let instance = engine
        .create_instance(form_id, Uuid::now_v7(), SigningMode::Any)
        .await
        .unwrap();
    let vendor = engine
        .add_signatory(instance.instance_id, Uuid::now_v7(), "Jane Citizen", None)
        .await
        .unwrap();
    engine
        .add_signatory(instance.instance_id, Uuid::now_v7(), "Alex Agent", None)
        .await
        .unwrap();

    let after = engine
        .record_signature(vendor.signatory_id, signature("Jane Citizen"))
        .await
        .unwrap();
    assert_eq!(after.status, InstanceStatus::Completed);
    assert!(after.locked_at.is_some());
}
