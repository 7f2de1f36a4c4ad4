//! formflow-core: the form signing workflow.
//!
//! Stateful counterpart to `formdsl-core`:
//! - Instance types (FormInstance, Signatory, AccessLink, Template)
//! - The `FlowStore` persistence trait and an in-memory implementation
//! - `FlowEngine`, which drives the lock/complete/void/unlock state machine
//!   over compare-and-swap instance versions
//! - An append-only event log per instance
//!
//! Compilation, rendering, chip injection and submission validation are all
//! delegated to `formdsl-core`; this crate owns everything that mutates.

pub mod engine;
pub mod error;
pub mod events;
pub mod store;
pub mod store_memory;
pub mod types;

pub use engine::{FlowEngine, ResolvedSigning};
pub use error::FlowError;
pub use events::FlowEvent;
pub use store::FlowStore;
pub use store_memory::MemoryStore;
pub use types::{
    AccessLink, FieldData, FormInstance, InstanceStatus, Signatory, SigningMode, Template,
};
