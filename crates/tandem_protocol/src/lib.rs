//! # Tandem Protocol
//!
//! Delta operations, operational transform and wire messages for Tandem.
//!
//! This crate provides:
//! - `Operation` and `Delta`, the edit representation
//! - `create_delta`, `Delta::apply` and `compose` (the delta codec)
//! - `transform` for concurrent deltas
//! - `VersionedDelta`, `VersionConflict` and `ConflictResolution`
//! - Protocol messages (Submit, Snapshot, History, Event) with CBOR encoding
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Lengths
//!
//! Every length in a delta counts Unicode scalar values (`char`s), never bytes.
//!
//! ## Example
//!
//! ```rust
//! use tandem_protocol::{create_delta, transform};
//!
//! let base = "ab";
//! let a = create_delta(base, "axb");
//! let b = create_delta(base, "ayb");
//! let (a_prime, b_prime) = transform(&a, &b);
//!
//! let left = b_prime.apply(&a.apply(base));
//! let right = a_prime.apply(&b.apply(base));
//! assert_eq!(left, right);
//! assert_eq!(left, "axyb");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compose;
mod conflict;
mod cursor;
mod delta;
mod diff;
mod error;
mod messages;
mod operation;
mod transform;
mod versioned;

pub use compose::compose;
pub use conflict::{ConflictResolution, VersionConflict};
pub use delta::{ChangeSummary, Delta};
pub use diff::create_delta;
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    DocumentEvent, DocumentSnapshot, ErrorKind, ErrorResponse, HistoryRequest, HistoryResponse,
    SnapshotRequest, SubmitRequest, SubmitResponse, SyncMessage,
};
pub use operation::Operation;
pub use transform::transform;
pub use versioned::{DocumentId, VersionedDelta};

/// Applies a delta to content. See [`Delta::apply`].
pub fn apply_delta(content: &str, delta: &Delta) -> String {
    delta.apply(content)
}
