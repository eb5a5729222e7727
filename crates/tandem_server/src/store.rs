//! Persistence boundary.

use crate::document::DocumentState;
use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_protocol::{DocumentId, VersionedDelta};

/// Durable storage for documents and their logs.
///
/// `append_delta` is called before the entry becomes visible in memory;
/// when it fails the submission fails and the log is left unchanged.
pub trait DocumentStore: Send + Sync {
    /// Loads a document, or `None` if it does not exist.
    fn load_document(&self, id: &str) -> ServerResult<Option<DocumentState>>;

    /// Stores a newly created document.
    fn create_document(&self, state: &DocumentState) -> ServerResult<()>;

    /// Appends an accepted delta to a document's log.
    fn append_delta(&self, id: &str, entry: &VersionedDelta) -> ServerResult<()>;

    /// Replaces a document's collaborator set.
    fn update_collaborators(&self, id: &str, collaborators: &BTreeSet<String>) -> ServerResult<()>;

    /// Lists every stored document ID.
    fn list_documents(&self) -> ServerResult<Vec<DocumentId>>;
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, DocumentState>>,
    fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail (for exercising error paths).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of a stored document.
    pub fn get(&self, id: &str) -> Option<DocumentState> {
        self.documents.read().get(id).cloned()
    }

    fn check_writable(&self) -> ServerResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ServerError::Storage("store is not writable".into()));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load_document(&self, id: &str) -> ServerResult<Option<DocumentState>> {
        Ok(self.get(id))
    }

    fn create_document(&self, state: &DocumentState) -> ServerResult<()> {
        self.check_writable()?;
        let mut documents = self.documents.write();
        if documents.contains_key(&state.id) {
            return Err(ServerError::InvalidRequest(format!(
                "document {} already exists",
                state.id
            )));
        }
        documents.insert(state.id.clone(), state.clone());
        Ok(())
    }

    fn append_delta(&self, id: &str, entry: &VersionedDelta) -> ServerResult<()> {
        self.check_writable()?;
        let mut documents = self.documents.write();
        let state = documents
            .get_mut(id)
            .ok_or_else(|| ServerError::UnknownDocument(id.to_string()))?;
        if entry.version != state.current_version() + 1 {
            return Err(ServerError::Storage(format!(
                "document {id}: stored log is at version {}, cannot append {}",
                state.current_version(),
                entry.version
            )));
        }
        state.deltas.push(entry.clone());
        Ok(())
    }

    fn update_collaborators(&self, id: &str, collaborators: &BTreeSet<String>) -> ServerResult<()> {
        self.check_writable()?;
        let mut documents = self.documents.write();
        let state = documents
            .get_mut(id)
            .ok_or_else(|| ServerError::UnknownDocument(id.to_string()))?;
        state.collaborators = collaborators.clone();
        Ok(())
    }

    fn list_documents(&self) -> ServerResult<Vec<DocumentId>> {
        let mut ids: Vec<_> = self.documents.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_protocol::Delta;

    #[test]
    fn create_and_load() {
        let store = MemoryDocumentStore::new();
        let state = DocumentState::new("doc", "Title", "alice");
        store.create_document(&state).unwrap();
        assert_eq!(store.load_document("doc").unwrap(), Some(state.clone()));
        assert!(store.load_document("missing").unwrap().is_none());
        assert!(store.create_document(&state).is_err());
    }

    #[test]
    fn append_must_be_next_version() {
        let store = MemoryDocumentStore::new();
        store
            .create_document(&DocumentState::new("doc", "Title", "alice"))
            .unwrap();
        let entry = VersionedDelta::new(Delta::new().insert("a"), "alice", 0, 1);
        store.append_delta("doc", &entry).unwrap();
        assert!(store.append_delta("doc", &entry).is_err());
        assert_eq!(store.get("doc").unwrap().current_version(), 1);
    }

    #[test]
    fn failing_writes() {
        let store = MemoryDocumentStore::new();
        store.set_fail_writes(true);
        let err = store
            .create_document(&DocumentState::new("doc", "Title", "alice"))
            .unwrap_err();
        assert!(err.is_server_error());
    }

    #[test]
    fn list_is_sorted() {
        let store = MemoryDocumentStore::new();
        for id in ["b", "a", "c"] {
            store
                .create_document(&DocumentState::new(id, "T", "alice"))
                .unwrap();
        }
        assert_eq!(store.list_documents().unwrap(), vec!["a", "b", "c"]);
    }
}
