//! Version conflicts and their resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection of a submission built against a stale version.
///
/// Carries the authoritative state so the client can reconcile without an
/// extra round trip.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("version conflict: document is at version {current_version}")]
pub struct VersionConflict {
    /// The document's current version.
    pub current_version: u64,
    /// The document's current content.
    pub current_content: String,
    /// Author of the most recent accepted delta, if any.
    pub last_edited_by: Option<String>,
}

impl VersionConflict {
    /// Creates a new conflict.
    pub fn new(
        current_version: u64,
        current_content: impl Into<String>,
        last_edited_by: Option<String>,
    ) -> Self {
        Self {
            current_version,
            current_content: current_content.into(),
            last_edited_by,
        }
    }
}

/// How a user settles a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictResolution {
    /// Keep the local content and submit it over the server version.
    KeepLocal,
    /// Drop local edits and adopt the server content.
    AcceptRemote,
    /// Submit hand-merged text.
    Merged(String),
}

impl ConflictResolution {
    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictResolution::KeepLocal => "keep-local",
            ConflictResolution::AcceptRemote => "accept-remote",
            ConflictResolution::Merged(_) => "merged",
        }
    }

    /// Returns true if the resolution produces an outgoing edit.
    pub fn submits(&self) -> bool {
        !matches!(self, ConflictResolution::AcceptRemote)
    }
}
