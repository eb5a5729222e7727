//! # Tandem Server
//!
//! Authoritative document version log and collaboration hub for Tandem.
//!
//! This crate provides:
//! - `ServerVersionLog`, the per-document append-only log with optimistic
//!   version checks
//! - `CollabServer`, which serializes submissions per document and
//!   broadcasts accepted deltas to subscribers
//! - `DocumentStore`, the persistence boundary, with an in-memory store
//! - `RequestHandler`, which dispatches protocol messages and raw CBOR frames
//!
//! # Protocol
//!
//! A client submits a delta together with the version it was built against:
//! 1. If that version equals the document's current version, the delta is
//!    persisted, appended as the next version and broadcast as a
//!    `document-delta` event
//! 2. Otherwise the submission is rejected with a `VersionConflict` carrying
//!    the current version and content, and nothing changes
//!
//! The server never transforms a stale submission itself. Reconciling is
//! the client's job.
//!
//! ```rust
//! use tandem_server::{CollabServer, ServerConfig};
//! use tandem_protocol::{create_delta, SubmitRequest};
//!
//! let server = CollabServer::new(ServerConfig::default());
//! let doc = server.create_document("Notes", "alice", "ab").unwrap();
//!
//! let request = SubmitRequest::new(&doc.document_id, create_delta("ab", "axb"), 0, "alice");
//! let response = server.submit(request).unwrap();
//! assert!(response.is_accepted());
//! assert_eq!(server.current_content(&doc.document_id, "alice").unwrap(), "axb");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod document;
mod error;
mod handler;
mod log;
mod server;
mod store;

pub use config::ServerConfig;
pub use document::DocumentState;
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use log::ServerVersionLog;
pub use server::CollabServer;
pub use store::{DocumentStore, MemoryDocumentStore};
