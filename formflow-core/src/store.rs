//! Persistence trait for the signing workflow.
//!
//! The engine operates exclusively through this trait, enabling pluggable
//! backends (MemoryStore for tests, a SQL store in production). Plain
//! reads and writes are straightforward rows; the two `commit_*` methods are
//! the atomic read-modify-write seams of the state machine. A SQL backend
//! implements each as one transaction guarded by the instance version.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::events::FlowEvent;
use crate::types::{AccessLink, FormInstance, Signatory, Template};

#[async_trait]
pub trait FlowStore: Send + Sync {
    // ── Templates ──

    async fn save_template(&self, template: &Template) -> Result<()>;
    async fn load_template(&self, template_id: Uuid) -> Result<Option<Template>>;

    // ── Instances ──

    async fn insert_instance(&self, instance: &FormInstance) -> Result<()>;
    async fn load_instance(&self, instance_id: Uuid) -> Result<Option<FormInstance>>;

    /// Compare-and-swap write: persists `instance` (with its version bumped
    /// to `expected_version + 1`) only if the stored version still equals
    /// `expected_version`. Returns false when the instance moved underneath
    /// the caller.
    async fn update_instance(&self, instance: &FormInstance, expected_version: u64)
        -> Result<bool>;

    /// CAS write of the instance together with the signed signatory row, as
    /// one atomic commit. Same version semantics as `update_instance`.
    async fn commit_signature(
        &self,
        instance: &FormInstance,
        expected_version: u64,
        signatory: &Signatory,
    ) -> Result<bool>;

    /// CAS write of the instance together with a bulk reset of every
    /// signatory's `signed_at`/`signature_data`. Returns the number of
    /// signatures cleared, or None when the version check failed.
    async fn commit_unlock(
        &self,
        instance: &FormInstance,
        expected_version: u64,
    ) -> Result<Option<usize>>;

    // ── Signatories ──

    async fn insert_signatory(&self, signatory: &Signatory) -> Result<()>;
    async fn load_signatory(&self, signatory_id: Uuid) -> Result<Option<Signatory>>;
    async fn load_signatories(&self, instance_id: Uuid) -> Result<Vec<Signatory>>;

    // ── Access links ──

    async fn save_link(&self, link: &AccessLink) -> Result<()>;
    async fn load_link(&self, token: &str) -> Result<Option<AccessLink>>;

    // ── Event log (append-only) ──

    /// Append an event and return its sequence number.
    async fn append_event(&self, instance_id: Uuid, event: &FlowEvent) -> Result<u64>;
    async fn read_events(&self, instance_id: Uuid) -> Result<Vec<(u64, FlowEvent)>>;
}
