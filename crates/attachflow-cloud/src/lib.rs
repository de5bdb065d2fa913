//! AttachFlow Cloud
//!
//! Lifecycle management for asynchronously provisioned network attachments.
//! The remote service keeps working after a create or delete call returns, so every
//! mutating operation is followed by a wait that polls the attachment until it settles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  attach CLI                      │
//! │         (create / delete / await / tag)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               attachflow-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │         AttachmentLifecycle               │   │
//! │  └──────────────┬───────────────────────────┘   │
//! │  ┌──────────────▼───────┐  ┌──────────────┐    │
//! │  │ wait_for_state       │◀─│ StatusProbe  │    │
//! │  └──────────────────────┘  └──────┬───────┘    │
//! │  ┌────────────────────────────────▼─────────┐  │
//! │  │   trait AttachmentClient { ... }          │  │
//! │  └──────────────────────────────────────────┘  │
//! └───────────────────────┬─────────────────────────┘
//!                         │
//!                 ┌───────▼───────┐
//!                 │ network       │
//!                 │ manager (aws) │
//!                 └───────────────┘
//! ```

pub mod arn;
pub mod error;
pub mod lifecycle;
pub mod operation;
pub mod probe;
pub mod provider;
pub mod state;
pub mod tags;
pub mod waiter;

#[cfg(test)]
mod testing;

// Re-exports
pub use arn::{Arn, partition_for_region};
pub use error::{ClientError, CloudError, Result};
pub use lifecycle::{
    AttachmentLifecycle, available_wait_spec, create_wait_spec, delete_wait_spec,
};
pub use operation::{Operation, Timeouts};
pub use probe::{AttachmentProbe, Observation, StatusProbe};
pub use provider::{AttachmentClient, CreateAttachmentRequest, PollConfig};
pub use state::{AttachmentRecord, AttachmentState};
pub use tags::{TagChanges, Tags};
pub use waiter::{WaitFailure, WaitOutcome, WaitSpec, wait_for_state};
pub use tokio_util::sync::CancellationToken;
