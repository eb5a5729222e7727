//! # Tandem Engine
//!
//! Client-side synchronization for Tandem documents.
//!
//! This crate provides:
//! - `ClientSyncSession`: acknowledged version, reconciled content and the
//!   buffer of unacknowledged local deltas for one open document
//! - `ConflictResolutionWorkflow`: the keep-local / accept-remote / merge
//!   prompt shown when automatic reconciliation gives up
//! - `DocumentClient`: drives a session against a server (submit, catch up,
//!   resync) with a small state machine and statistics
//! - Transport abstraction with a mock and a CBOR request channel
//!
//! ## Model
//!
//! Local edits apply immediately and queue as pending deltas. Remote deltas
//! are transformed past the pending ones before they are applied, so the
//! content a user sees always equals the server content with their own
//! pending edits on top.
//!
//! ## Key Invariants
//!
//! - The server log is authoritative
//! - Remote deltas apply in version order; a gap forces a full resync
//! - Deltas the server sequenced earlier win insert ties
//! - A submit is never blindly retried: its outcome may be unknown

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Library code propagates errors.
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod client;
mod config;
mod error;
mod remote;
mod session;
mod transport;
mod workflow;

pub use client::{ClientState, ClientStats, DocumentClient, FlushOutcome};
pub use config::{RetryConfig, SessionConfig};
pub use error::{SyncError, SyncResult};
pub use remote::{LoopbackChannel, RemoteTransport, RequestChannel};
pub use session::{ClientSyncSession, RemoteOutcome};
pub use transport::{CollabTransport, MockTransport};
pub use workflow::{ConflictResolutionWorkflow, WorkflowState};
