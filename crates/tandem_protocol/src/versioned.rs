//! Log entries.

use crate::delta::{ChangeSummary, Delta};
use serde::{Deserialize, Serialize};

/// Identifier of a shared document.
pub type DocumentId = String;

/// A delta accepted into a document's version log.
///
/// `version` is the log position the delta produced: applying entries
/// `1..=version` in order to the base content yields the content at that
/// version. Entries are immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedDelta {
    /// The operations.
    pub operations: Delta,
    /// Who submitted the delta.
    pub author: String,
    /// Acceptance time (Unix milliseconds).
    pub timestamp: u64,
    /// Version produced by this delta (1-based).
    pub version: u64,
}

impl VersionedDelta {
    /// Creates a new log entry.
    pub fn new(operations: Delta, author: impl Into<String>, timestamp: u64, version: u64) -> Self {
        Self {
            operations,
            author: author.into(),
            timestamp,
            version,
        }
    }

    /// The version this delta was applied on top of.
    pub fn base_version(&self) -> u64 {
        self.version.saturating_sub(1)
    }

    /// Character counts of the change.
    pub fn summary(&self) -> ChangeSummary {
        self.operations.summary()
    }
}
