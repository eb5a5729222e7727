//! The collaboration server.

use crate::config::ServerConfig;
use crate::document::DocumentState;
use crate::error::{ServerError, ServerResult};
use crate::log::ServerVersionLog;
use crate::store::{DocumentStore, MemoryDocumentStore};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tandem_protocol::{
    create_delta, Delta, DocumentEvent, DocumentId, DocumentSnapshot, HistoryRequest,
    HistoryResponse, Operation, SnapshotRequest, SubmitRequest, SubmitResponse,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info};
use uuid::Uuid;

/// A loaded document: its log and its event channel.
struct DocumentHandle {
    log: Mutex<ServerVersionLog>,
    events: broadcast::Sender<DocumentEvent>,
}

/// The collaboration server.
///
/// Holds one [`ServerVersionLog`] per document. Submissions to the same
/// document are serialized by that document's lock; different documents
/// proceed in parallel. Accepted deltas are broadcast while the lock is
/// still held, so subscribers see events in log order.
///
/// # Example
///
/// ```
/// use tandem_server::{CollabServer, ServerConfig};
///
/// let server = CollabServer::new(ServerConfig::default());
/// let doc = server.create_document("Plan", "alice", "").unwrap();
/// let mut events = server.subscribe(&doc.document_id, "alice").unwrap();
/// assert!(events.try_recv().is_err());
/// ```
pub struct CollabServer {
    config: ServerConfig,
    store: Arc<dyn DocumentStore>,
    documents: RwLock<HashMap<DocumentId, Arc<DocumentHandle>>>,
}

impl CollabServer {
    /// Creates a server backed by an in-memory store.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryDocumentStore::new()))
    }

    /// Creates a server backed by the given store.
    pub fn with_store(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            store,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates a document owned by `owner` with the given content at version 0.
    pub fn create_document(
        &self,
        title: impl Into<String>,
        owner: impl Into<String>,
        initial_content: impl Into<String>,
    ) -> ServerResult<DocumentSnapshot> {
        let id = Uuid::new_v4().to_string();
        let state = DocumentState::new(id.clone(), title, owner).with_base_content(initial_content);
        self.store.create_document(&state)?;

        let snapshot = state.snapshot();
        let handle = self.make_handle(ServerVersionLog::from_state(state)?);
        self.documents.write().insert(id.clone(), handle);

        info!(document = %id, owner = %snapshot.owner, "created document");
        Ok(snapshot)
    }

    /// Submits a delta built against `request.expected_version`.
    ///
    /// Returns `Accepted` with the new log entry, `Conflict` if the expected
    /// version is stale, or `Unchanged` for a current delta that changes
    /// nothing. A stale delta conflicts even if it changes nothing.
    /// A conflict never modifies the log.
    pub fn submit(&self, request: SubmitRequest) -> ServerResult<SubmitResponse> {
        self.validate_delta(&request.delta)?;
        let handle = self.handle(&request.document_id)?;

        let mut log = handle.log.lock();
        check_access(log.state(), &request.author)?;

        let entry = match log.prepare(&request.delta, request.expected_version, &request.author) {
            Ok(entry) => entry,
            Err(conflict) => {
                debug!(
                    document = %request.document_id,
                    author = %request.author,
                    expected = request.expected_version,
                    current = conflict.current_version,
                    "rejected stale delta"
                );
                return Ok(SubmitResponse::Conflict(conflict));
            }
        };

        if entry.operations.is_identity() {
            debug!(document = %request.document_id, author = %request.author, "ignored no-op delta");
            return Ok(SubmitResponse::Unchanged {
                version: log.current_version(),
            });
        }

        if let Err(e) = self.store.append_delta(&request.document_id, &entry) {
            error!(document = %request.document_id, error = %e, "failed to persist delta");
            return Err(e);
        }
        log.append(entry.clone())?;

        debug!(
            document = %request.document_id,
            author = %entry.author,
            version = entry.version,
            "accepted delta"
        );

        // No subscribers is not an error.
        let _ = handle.events.send(DocumentEvent::DeltaApplied {
            document_id: request.document_id.clone(),
            delta: entry.clone(),
        });

        Ok(SubmitResponse::Accepted(entry))
    }

    /// Returns the current state of a document.
    pub fn snapshot(&self, request: &SnapshotRequest) -> ServerResult<DocumentSnapshot> {
        let handle = self.handle(&request.document_id)?;
        let log = handle.log.lock();
        check_access(log.state(), &request.requester)?;
        Ok(log.state().snapshot())
    }

    /// Returns the current content of a document.
    pub fn current_content(&self, document_id: &str, requester: &str) -> ServerResult<String> {
        let handle = self.handle(document_id)?;
        let log = handle.log.lock();
        check_access(log.state(), requester)?;
        Ok(log.current_content())
    }

    /// Returns log entries after `request.since`, at most
    /// `min(request.limit, max_history_batch)` of them.
    pub fn history(&self, request: &HistoryRequest) -> ServerResult<HistoryResponse> {
        let handle = self.handle(&request.document_id)?;
        let log = handle.log.lock();
        check_access(log.state(), &request.requester)?;

        let limit = request.limit.min(self.config.max_history_batch).max(1) as usize;
        let since = log.history_since(request.since);
        let deltas = since.iter().take(limit).cloned().collect();
        Ok(HistoryResponse::new(
            deltas,
            log.current_version(),
            since.len() > limit,
        ))
    }

    /// Returns the content of a document as of `version`.
    pub fn content_at(&self, document_id: &str, requester: &str, version: u64) -> ServerResult<String> {
        let handle = self.handle(document_id)?;
        let log = handle.log.lock();
        check_access(log.state(), requester)?;
        log.content_at(version).ok_or_else(|| {
            ServerError::InvalidRequest(format!(
                "version {version} does not exist (current is {})",
                log.current_version()
            ))
        })
    }

    /// Makes the content of `version` current again.
    ///
    /// Submits a regular delta against the current version, so the log
    /// only ever grows.
    pub fn restore_version(
        &self,
        document_id: &str,
        author: &str,
        version: u64,
    ) -> ServerResult<SubmitResponse> {
        let (target, current, current_version) = {
            let handle = self.handle(document_id)?;
            let log = handle.log.lock();
            check_access(log.state(), author)?;
            let target = log.content_at(version).ok_or_else(|| {
                ServerError::InvalidRequest(format!("version {version} does not exist"))
            })?;
            (target, log.current_content(), log.current_version())
        };

        info!(document = %document_id, author, version, "restoring version");
        self.submit(SubmitRequest::new(
            document_id,
            create_delta(&current, &target),
            current_version,
            author,
        ))
    }

    /// Adds a collaborator. Only the owner may do this.
    pub fn add_collaborator(
        &self,
        document_id: &str,
        requester: &str,
        collaborator: &str,
    ) -> ServerResult<DocumentSnapshot> {
        let handle = self.handle(document_id)?;
        let mut log = handle.log.lock();
        if log.state().owner != requester {
            return Err(ServerError::NotAuthorized(format!(
                "only the owner can add collaborators to {document_id}"
            )));
        }

        let mut collaborators = log.state().collaborators.clone();
        if collaborators.insert(collaborator.to_string()) {
            self.store.update_collaborators(document_id, &collaborators)?;
            log.add_collaborator(collaborator);
            info!(document = %document_id, collaborator, "added collaborator");
        }
        Ok(log.state().snapshot())
    }

    /// Subscribes to `document-delta` events of a document.
    pub fn subscribe(
        &self,
        document_id: &str,
        requester: &str,
    ) -> ServerResult<broadcast::Receiver<DocumentEvent>> {
        let handle = self.handle(document_id)?;
        let log = handle.log.lock();
        check_access(log.state(), requester)?;
        Ok(handle.events.subscribe())
    }

    /// Number of live subscriptions to a document.
    pub fn subscriber_count(&self, document_id: &str) -> usize {
        self.documents
            .read()
            .get(document_id)
            .map_or(0, |handle| handle.events.receiver_count())
    }

    /// Lists the documents `user` can access.
    pub fn documents_for(&self, user: &str) -> ServerResult<Vec<DocumentSnapshot>> {
        let mut snapshots = Vec::new();
        for id in self.store.list_documents()? {
            let handle = self.handle(&id)?;
            let log = handle.log.lock();
            if log.state().has_access(user) {
                snapshots.push(log.state().snapshot());
            }
        }
        Ok(snapshots)
    }

    fn validate_delta(&self, delta: &Delta) -> ServerResult<()> {
        if delta.len() > self.config.max_delta_ops {
            return Err(ServerError::InvalidRequest(format!(
                "delta has {} operations (limit {})",
                delta.len(),
                self.config.max_delta_ops
            )));
        }
        let inserted: usize = delta
            .ops()
            .iter()
            .filter(|op| matches!(op, Operation::Insert(_)))
            .map(Operation::len)
            .sum();
        if inserted > self.config.max_insert_chars {
            return Err(ServerError::InvalidRequest(format!(
                "delta inserts {inserted} characters (limit {})",
                self.config.max_insert_chars
            )));
        }
        Ok(())
    }

    /// Returns the loaded document, loading it from the store on first use.
    fn handle(&self, document_id: &str) -> ServerResult<Arc<DocumentHandle>> {
        if let Some(handle) = self.documents.read().get(document_id) {
            return Ok(Arc::clone(handle));
        }

        let state = self
            .store
            .load_document(document_id)?
            .ok_or_else(|| ServerError::UnknownDocument(document_id.to_string()))?;
        let log = ServerVersionLog::from_state(state)?;

        let mut documents = self.documents.write();
        // Another caller may have loaded it in the meantime.
        let handle = documents
            .entry(document_id.to_string())
            .or_insert_with(|| self.make_handle(log));
        Ok(Arc::clone(handle))
    }

    fn make_handle(&self, log: ServerVersionLog) -> Arc<DocumentHandle> {
        let (events, _) = broadcast::channel(self.config.broadcast_capacity);
        Arc::new(DocumentHandle {
            log: Mutex::new(log),
            events,
        })
    }
}

fn check_access(state: &DocumentState, user: &str) -> ServerResult<()> {
    if state.has_access(user) {
        Ok(())
    } else {
        Err(ServerError::NotAuthorized(format!(
            "{user} is not a collaborator on {}",
            state.id
        )))
    }
}
