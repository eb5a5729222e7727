//! Stored document state.

use crate::error::{ServerError, ServerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tandem_protocol::{DocumentId, DocumentSnapshot, VersionedDelta};

/// Everything persisted for one document.
///
/// The current content is never stored: it is `base_content` with every
/// delta in `deltas` applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
    /// Document ID.
    pub id: DocumentId,
    /// Title.
    pub title: String,
    /// Owner (always a collaborator).
    pub owner: String,
    /// Content at version 0.
    pub base_content: String,
    /// Accepted deltas; entry `i` has version `i + 1`.
    pub deltas: Vec<VersionedDelta>,
    /// Users allowed to read and edit.
    pub collaborators: BTreeSet<String>,
}

impl DocumentState {
    /// Creates an empty document owned by `owner`.
    pub fn new(id: impl Into<DocumentId>, title: impl Into<String>, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        Self {
            id: id.into(),
            title: title.into(),
            collaborators: BTreeSet::from([owner.clone()]),
            owner,
            base_content: String::new(),
            deltas: Vec::new(),
        }
    }

    /// Sets the content at version 0.
    pub fn with_base_content(mut self, content: impl Into<String>) -> Self {
        self.base_content = content.into();
        self
    }

    /// Number of accepted deltas.
    pub fn current_version(&self) -> u64 {
        self.deltas.len() as u64
    }

    /// Replays the log up to `version`. Returns `None` past the end.
    pub fn content_at(&self, version: u64) -> Option<String> {
        let count = usize::try_from(version).ok()?;
        let entries = self.deltas.get(..count)?;
        Some(
            entries
                .iter()
                .fold(self.base_content.clone(), |content, entry| {
                    entry.operations.apply(&content)
                }),
        )
    }

    /// Replays the whole log.
    pub fn current_content(&self) -> String {
        self.deltas
            .iter()
            .fold(self.base_content.clone(), |content, entry| {
                entry.operations.apply(&content)
            })
    }

    /// Author of the latest accepted delta.
    pub fn last_edited_by(&self) -> Option<&str> {
        self.deltas.last().map(|entry| entry.author.as_str())
    }

    /// Returns true if `user` may read and edit the document.
    pub fn has_access(&self, user: &str) -> bool {
        self.collaborators.contains(user)
    }

    /// Checks that versions run 1, 2, 3, ... without gaps or repeats and
    /// that the owner is a collaborator.
    pub fn verify(&self) -> ServerResult<()> {
        for (index, entry) in self.deltas.iter().enumerate() {
            let expected = index as u64 + 1;
            if entry.version != expected {
                return Err(ServerError::Corrupted(format!(
                    "document {}: entry {} has version {}, expected {}",
                    self.id, index, entry.version, expected
                )));
            }
        }
        if !self.collaborators.contains(&self.owner) {
            return Err(ServerError::Corrupted(format!(
                "document {}: owner {} is not a collaborator",
                self.id, self.owner
            )));
        }
        Ok(())
    }

    /// Builds a snapshot of the current state.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            document_id: self.id.clone(),
            title: self.title.clone(),
            owner: self.owner.clone(),
            content: self.current_content(),
            version: self.current_version(),
            collaborators: self.collaborators.iter().cloned().collect(),
            last_edited_by: self.last_edited_by().map(str::to_owned),
        }
    }
}
