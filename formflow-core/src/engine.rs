//! The signing workflow engine.
//!
//! Drives every instance transition against a `FlowStore`. Each transition
//! (lock-on-first-signature, completion check, void, unlock) executes as one
//! bounded compare-and-swap loop over the persisted instance version, so two
//! signatories racing under `any` mode cannot both observe "not yet complete"
//! and both fire completion side effects.
//!
//! Status rules:
//! - `ready_to_sign` is derived at query time, never stored.
//! - The first recorded signature locks the instance.
//! - The quorum (`all` = every signatory, `any` = at least one) completes it.
//! - `unlock` fully resets every signatory and returns to draft.
//! - `voided` is terminal.

use chrono::Utc;
use serde_json::Value as Json;
use std::sync::Arc;
use uuid::Uuid;

use formdsl_core::{
    compile, has_errors, inject, render, validate, ChipContext, Diagnostic, ResolvedForm,
    SubmissionReport, SubmissionSchema,
};

use crate::error::FlowError;
use crate::events::FlowEvent;
use crate::store::FlowStore;
use crate::types::{
    AccessLink, FieldData, FormInstance, InstanceStatus, Signatory, SigningMode, Template,
};

/// Bounded retries for the CAS loops. Contention on one instance is a
/// handful of signing parties at most.
const CAS_ATTEMPTS: usize = 4;

/// What a vendor-facing access token resolves to.
#[derive(Clone, Debug)]
pub struct ResolvedSigning {
    pub form: ResolvedForm,
    pub instance: Option<FormInstance>,
}

pub struct FlowEngine {
    store: Arc<dyn FlowStore>,
}

impl FlowEngine {
    pub fn new(store: Arc<dyn FlowStore>) -> Self {
        Self { store }
    }

    // ── Templates ──

    /// Compile and store template text. The compiled AST and rendered
    /// preview are cached only when no diagnostic is an error; the raw text
    /// is stored either way, and any previously cached artifact is replaced.
    pub async fn save_template(
        &self,
        template_id: Uuid,
        raw_text: &str,
    ) -> Result<Vec<Diagnostic>, FlowError> {
        let output = compile(raw_text);
        let mut diagnostics = output.diagnostics;
        diagnostics.extend(validate(&output.ast));

        let publishable = !has_errors(&diagnostics);
        let template = Template {
            template_id,
            raw_text: raw_text.to_string(),
            compiled: publishable.then(|| output.ast.clone()),
            preview: publishable.then(|| render(&output.ast)),
            updated_at: Utc::now(),
        };
        self.store.save_template(&template).await?;
        tracing::info!(
            %template_id,
            publishable,
            diagnostics = diagnostics.len(),
            "saved form template"
        );
        Ok(diagnostics)
    }

    // ── Instance lifecycle ──

    pub async fn create_instance(
        &self,
        form_id: Uuid,
        campaign_id: Uuid,
        signing_mode: SigningMode,
    ) -> Result<FormInstance, FlowError> {
        let instance = FormInstance::new(form_id, campaign_id, signing_mode);
        self.store.insert_instance(&instance).await?;
        self.store
            .append_event(
                instance.instance_id,
                &FlowEvent::InstanceCreated {
                    instance_id: instance.instance_id,
                    form_id,
                    campaign_id,
                    signing_mode,
                },
            )
            .await?;
        tracing::info!(instance_id = %instance.instance_id, "created form instance");
        Ok(instance)
    }

    /// Merge submitted field data into the shared instance data,
    /// last-write-wins per field. Allowed only while the instance is
    /// editable; the error distinguishes locked from voided.
    pub async fn update_data(
        &self,
        instance_id: Uuid,
        patch: FieldData,
    ) -> Result<FormInstance, FlowError> {
        for _ in 0..CAS_ATTEMPTS {
            let instance = self.load(instance_id).await?;
            match instance.status {
                InstanceStatus::Voided => return Err(FlowError::InstanceVoided(instance_id)),
                s if !s.allows_data_edit() => return Err(FlowError::InstanceLocked(instance_id)),
                _ => {}
            }

            let expected = instance.version;
            let mut next = instance;
            let fields: Vec<String> = patch.keys().cloned().collect();
            next.data.extend(patch.clone());

            if self.store.update_instance(&next, expected).await? {
                next.version = expected + 1;
                self.store
                    .append_event(instance_id, &FlowEvent::DataMerged { fields })
                    .await?;
                return Ok(next);
            }
        }
        Err(FlowError::VersionConflict(instance_id))
    }

    /// Validate a submission against the instance's form and merge the
    /// normalized data when it passes. Violations are returned in the
    /// report, not as an error.
    pub async fn submit(
        &self,
        instance_id: Uuid,
        data: FieldData,
    ) -> Result<SubmissionReport, FlowError> {
        let instance = self.load(instance_id).await?;
        let ast = self.compiled_form(instance.form_id).await?;
        let report = SubmissionSchema::for_form(&ast).validate(&data);
        if report.is_valid {
            self.update_data(instance_id, report.normalized_data.clone())
                .await?;
        } else {
            tracing::debug!(%instance_id, violations = report.errors.len(), "submission rejected");
        }
        Ok(report)
    }

    /// Report the instance status, deriving `ready_to_sign` from the form
    /// definition when the stored status is draft.
    pub async fn status(&self, instance_id: Uuid) -> Result<InstanceStatus, FlowError> {
        let instance = self.load(instance_id).await?;
        if instance.status != InstanceStatus::Draft {
            return Ok(instance.status);
        }
        let template = self
            .store
            .load_template(instance.form_id)
            .await?
            .ok_or(FlowError::TemplateNotFound(instance.form_id))?;
        // Without a published form there is nothing to derive readiness from.
        let Some(ast) = template.compiled else {
            return Ok(InstanceStatus::Draft);
        };
        Ok(instance.derived_status(&ast))
    }

    pub async fn void_instance(
        &self,
        instance_id: Uuid,
        by: &str,
        reason: &str,
    ) -> Result<FormInstance, FlowError> {
        for _ in 0..CAS_ATTEMPTS {
            let instance = self.load(instance_id).await?;
            if instance.status == InstanceStatus::Voided {
                return Err(FlowError::InstanceVoided(instance_id));
            }

            let expected = instance.version;
            let now = Utc::now();
            let mut next = instance;
            next.status = InstanceStatus::Voided;
            next.voided_at = Some(now);
            next.voided_by = Some(by.to_string());
            next.void_reason = Some(reason.to_string());

            if self.store.update_instance(&next, expected).await? {
                next.version = expected + 1;
                self.store
                    .append_event(
                        instance_id,
                        &FlowEvent::Voided {
                            by: by.to_string(),
                            reason: reason.to_string(),
                            at: now,
                        },
                    )
                    .await?;
                tracing::warn!(%instance_id, by, "voided form instance");
                return Ok(next);
            }
        }
        Err(FlowError::VersionConflict(instance_id))
    }

    /// Return a locked or completed instance to draft. Every signatory's
    /// signature is cleared: a full reset, never partial.
    pub async fn unlock_instance(
        &self,
        instance_id: Uuid,
        by: &str,
    ) -> Result<FormInstance, FlowError> {
        for _ in 0..CAS_ATTEMPTS {
            let instance = self.load(instance_id).await?;
            match instance.status {
                InstanceStatus::Voided => return Err(FlowError::InstanceVoided(instance_id)),
                InstanceStatus::Locked | InstanceStatus::Completed => {}
                _ => return Err(FlowError::NotLocked(instance_id)),
            }

            let expected = instance.version;
            let now = Utc::now();
            let mut next = instance;
            next.status = InstanceStatus::Draft;
            next.locked_at = None;
            next.completed_at = None;
            next.unlocked_at = Some(now);
            next.unlocked_by = Some(by.to_string());

            if let Some(cleared) = self.store.commit_unlock(&next, expected).await? {
                next.version = expected + 1;
                self.store
                    .append_event(
                        instance_id,
                        &FlowEvent::Unlocked {
                            by: by.to_string(),
                            at: now,
                            signatures_cleared: cleared,
                        },
                    )
                    .await?;
                tracing::info!(%instance_id, by, cleared, "unlocked form instance");
                return Ok(next);
            }
        }
        Err(FlowError::VersionConflict(instance_id))
    }

    // ── Signatory ledger ──

    pub async fn add_signatory(
        &self,
        instance_id: Uuid,
        link_id: Uuid,
        name: &str,
        email: Option<String>,
    ) -> Result<Signatory, FlowError> {
        let instance = self.load(instance_id).await?;
        if instance.status == InstanceStatus::Voided {
            return Err(FlowError::InstanceVoided(instance_id));
        }
        let signatory = Signatory::new(instance_id, link_id, name, email);
        self.store.insert_signatory(&signatory).await?;
        self.store
            .append_event(
                instance_id,
                &FlowEvent::SignatoryAdded {
                    signatory_id: signatory.signatory_id,
                    name: name.to_string(),
                },
            )
            .await?;
        Ok(signatory)
    }

    /// Record one party's signature. The first signature locks the instance;
    /// meeting the signing-mode quorum completes it, all inside a single
    /// atomic commit. Rejected only when the instance is voided or the
    /// signatory already signed; an instance locked by someone else's
    /// earlier signature still accepts the remaining parties.
    pub async fn record_signature(
        &self,
        signatory_id: Uuid,
        signature_data: Json,
    ) -> Result<FormInstance, FlowError> {
        let instance_id = self
            .store
            .load_signatory(signatory_id)
            .await?
            .ok_or(FlowError::SignatoryNotFound(signatory_id))?
            .instance_id;

        for _ in 0..CAS_ATTEMPTS {
            // Re-read the row every attempt: a concurrent sign by the same
            // party may have won a commit since the previous load, and the
            // CAS conflict that sends us back here is how we find out.
            let signatory = self
                .store
                .load_signatory(signatory_id)
                .await?
                .ok_or(FlowError::SignatoryNotFound(signatory_id))?;
            if signatory.has_signed() {
                return Err(FlowError::AlreadySigned(signatory_id));
            }

            let instance = self.load(instance_id).await?;
            if instance.status == InstanceStatus::Voided {
                return Err(FlowError::InstanceVoided(instance_id));
            }

            let expected = instance.version;
            let now = Utc::now();
            let mut next = instance;
            let mut pending = vec![FlowEvent::SignatureRecorded {
                signatory_id,
                at: now,
            }];

            if next.locked_at.is_none() {
                next.status = InstanceStatus::Locked;
                next.locked_at = Some(now);
                pending.push(FlowEvent::Locked { at: now });
            }

            let signatories = self.store.load_signatories(instance_id).await?;
            let signed = signatories
                .iter()
                .filter(|s| s.has_signed() || s.signatory_id == signatory_id)
                .count();
            let quorum_met = match next.signing_mode {
                SigningMode::Any => signed >= 1,
                SigningMode::All => !signatories.is_empty() && signed == signatories.len(),
            };
            if quorum_met && next.status != InstanceStatus::Completed {
                next.status = InstanceStatus::Completed;
                next.completed_at = Some(now);
                pending.push(FlowEvent::Completed { at: now });
            }

            let mut signed_row = signatory.clone();
            signed_row.signed_at = Some(now);
            signed_row.signature_data = Some(signature_data.clone());

            if self
                .store
                .commit_signature(&next, expected, &signed_row)
                .await?
            {
                next.version = expected + 1;
                for event in &pending {
                    self.store.append_event(instance_id, event).await?;
                }
                tracing::info!(
                    %instance_id,
                    %signatory_id,
                    status = ?next.status,
                    "recorded signature"
                );
                return Ok(next);
            }
        }
        Err(FlowError::VersionConflict(instance_id))
    }

    // ── Access links ──

    /// Resolve a vendor-facing token: check expiry, stamp first use, inject
    /// chips and return the prefilled form plus the live instance, if one is
    /// bound. Links stay valid until expiry; `used_at` is informational.
    pub async fn resolve_link(
        &self,
        token: &str,
        context: &ChipContext,
    ) -> Result<ResolvedSigning, FlowError> {
        let mut link: AccessLink = self
            .store
            .load_link(token)
            .await?
            .ok_or(FlowError::LinkNotFound)?;
        let now = Utc::now();
        if link.is_expired(now) {
            return Err(FlowError::LinkExpired(link.expires_at));
        }
        if link.used_at.is_none() {
            link.used_at = Some(now);
            self.store.save_link(&link).await?;
        }

        let ast = self.compiled_form(link.form_id).await?;
        let form = inject(&ast, context);
        let instance = match link.instance_id {
            Some(id) => self.store.load_instance(id).await?,
            None => None,
        };
        Ok(ResolvedSigning { form, instance })
    }

    // ── Internals ──

    async fn load(&self, instance_id: Uuid) -> Result<FormInstance, FlowError> {
        self.store
            .load_instance(instance_id)
            .await?
            .ok_or(FlowError::InstanceNotFound(instance_id))
    }

    async fn compiled_form(&self, form_id: Uuid) -> Result<formdsl_core::FormAst, FlowError> {
        let template = self
            .store
            .load_template(form_id)
            .await?
            .ok_or(FlowError::TemplateNotFound(form_id))?;
        template
            .compiled
            .ok_or(FlowError::TemplateNotCompiled(form_id))
    }
}
