//! Domain errors for the signing workflow.
//!
//! Locked and voided are distinct variants on purpose: callers map them to
//! different user-facing messages ("the form is locked for signing" vs "this
//! form has been voided"). Unexpected store failures pass through as
//! `Store(anyhow::Error)` untouched; the engine performs no retries beyond
//! its bounded CAS loop.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("form instance {0} is locked for signing")]
    InstanceLocked(Uuid),

    #[error("form instance {0} has been voided")]
    InstanceVoided(Uuid),

    #[error("form instance {0} is not locked")]
    NotLocked(Uuid),

    #[error("form instance {0} not found")]
    InstanceNotFound(Uuid),

    #[error("signatory {0} not found")]
    SignatoryNotFound(Uuid),

    #[error("signatory {0} has already signed")]
    AlreadySigned(Uuid),

    #[error("template {0} not found")]
    TemplateNotFound(Uuid),

    #[error("template {0} has no published compiled form")]
    TemplateNotCompiled(Uuid),

    #[error("access link not found")]
    LinkNotFound,

    #[error("access link expired at {0}")]
    LinkExpired(chrono::DateTime<chrono::Utc>),

    #[error("form instance {0} was modified concurrently and retries were exhausted")]
    VersionConflict(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl FlowError {
    /// True for violations of the state machine itself, as opposed to lookup
    /// or infrastructure failures.
    pub fn is_state_violation(&self) -> bool {
        matches!(
            self,
            FlowError::InstanceLocked(_)
                | FlowError::InstanceVoided(_)
                | FlowError::NotLocked(_)
                | FlowError::AlreadySigned(_)
        )
    }
}
