//! Per-document version log.

use crate::document::DocumentState;
use crate::error::{ServerError, ServerResult};
use std::time::SystemTime;
use tandem_protocol::{Delta, VersionConflict, VersionedDelta};
use tracing::warn;

/// Authoritative, strictly ordered log of one document.
///
/// Admission is optimistic: a delta is accepted only if it was built
/// against the current version. The log is not synchronized; callers
/// serialize access (see `CollabServer`).
#[derive(Debug, Clone)]
pub struct ServerVersionLog {
    state: DocumentState,
}

impl ServerVersionLog {
    /// Wraps a document state after checking its versions.
    pub fn from_state(state: DocumentState) -> ServerResult<Self> {
        state.verify()?;
        Ok(Self { state })
    }

    /// The underlying state.
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Number of accepted deltas.
    pub fn current_version(&self) -> u64 {
        self.state.current_version()
    }

    /// Current content, recomputed from the base content and the log.
    pub fn current_content(&self) -> String {
        self.state.current_content()
    }

    /// Content as of `version`.
    pub fn content_at(&self, version: u64) -> Option<String> {
        self.state.content_at(version)
    }

    /// The whole log.
    pub fn history(&self) -> &[VersionedDelta] {
        &self.state.deltas
    }

    /// Entries with a version strictly greater than `version`.
    pub fn history_since(&self, version: u64) -> &[VersionedDelta] {
        let start = usize::try_from(version)
            .unwrap_or(usize::MAX)
            .min(self.state.deltas.len());
        &self.state.deltas[start..]
    }

    /// Builds the rejection for a stale submission.
    pub fn conflict(&self) -> VersionConflict {
        VersionConflict::new(
            self.current_version(),
            self.current_content(),
            self.state.last_edited_by().map(str::to_owned),
        )
    }

    /// Validates a submission without changing the log.
    ///
    /// On success returns the entry that [`append`](Self::append) would add.
    /// Spans that run past the current content are clamped.
    pub fn prepare(
        &self,
        delta: &Delta,
        expected_version: u64,
        author: &str,
    ) -> Result<VersionedDelta, VersionConflict> {
        if expected_version != self.current_version() {
            return Err(self.conflict());
        }

        let content_len = self.current_content().chars().count();
        let (operations, clamped) = delta.clamp_to(content_len);
        if clamped {
            warn!(
                document = %self.state.id,
                author,
                consumed = delta.base_len(),
                content_len,
                "clamped delta overrunning document"
            );
        }

        Ok(VersionedDelta::new(
            operations,
            author,
            now_millis(),
            self.current_version() + 1,
        ))
    }

    /// Appends a prepared entry.
    ///
    /// Fails if the entry is not exactly the next version.
    pub fn append(&mut self, entry: VersionedDelta) -> ServerResult<()> {
        let next = self.current_version() + 1;
        if entry.version != next {
            return Err(ServerError::Internal(format!(
                "append out of order: got version {}, expected {}",
                entry.version, next
            )));
        }
        self.state.deltas.push(entry);
        Ok(())
    }

    /// Adds a collaborator. Returns false if already present.
    pub fn add_collaborator(&mut self, user: impl Into<String>) -> bool {
        self.state.collaborators.insert(user.into())
    }
}

/// Current time in Unix milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
