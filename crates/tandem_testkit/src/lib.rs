//! # Tandem Testkit
//!
//! Test utilities for Tandem.
//!
//! This crate provides:
//! - Property-based test generators for texts, edits and client scripts
//! - In-process fixtures: a server with its store plus connected clients
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tandem_testkit::prelude::*;
//!
//! #[test]
//! fn two_editors() {
//!     let fixture = TestServer::new();
//!     let id = fixture.create_document("alice", "ab", &["bob"]);
//!     let mut alice = fixture.client(&id, "alice");
//!     let mut bob = fixture.client(&id, "bob");
//!     // ... edit, flush, drain
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
