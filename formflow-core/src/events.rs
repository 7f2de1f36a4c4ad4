//! Append-only audit events for form instances.
//!
//! Every lifecycle transition and every signature writes one event; the log
//! is the durable trail a dispute reads back. Sequence numbers are assigned
//! by the store at append time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::SigningMode;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FlowEvent {
    InstanceCreated {
        instance_id: Uuid,
        form_id: Uuid,
        campaign_id: Uuid,
        signing_mode: SigningMode,
    },
    DataMerged {
        fields: Vec<String>,
    },
    SignatoryAdded {
        signatory_id: Uuid,
        name: String,
    },
    SignatureRecorded {
        signatory_id: Uuid,
        at: DateTime<Utc>,
    },
    Locked {
        at: DateTime<Utc>,
    },
    Completed {
        at: DateTime<Utc>,
    },
    Voided {
        by: String,
        reason: String,
        at: DateTime<Utc>,
    },
    Unlocked {
        by: String,
        at: DateTime<Utc>,
        signatures_cleared: usize,
    },
}
