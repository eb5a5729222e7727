//! In-process server and client fixtures.

use std::sync::Arc;
use tandem_engine::{
    CollabTransport, DocumentClient, FlushOutcome, RetryConfig, SessionConfig, SyncError,
    SyncResult,
};
use tandem_protocol::{
    DocumentSnapshot, HistoryRequest, HistoryResponse, SnapshotRequest, SubmitRequest,
    SubmitResponse,
};
use tandem_server::{CollabServer, DocumentStore, MemoryDocumentStore, ServerConfig, ServerError};

/// A transport that calls a server in the same process.
pub struct DirectTransport {
    server: Arc<CollabServer>,
}

impl DirectTransport {
    /// Creates a transport for the given server.
    pub fn new(server: Arc<CollabServer>) -> Self {
        Self { server }
    }
}

fn map_err(e: ServerError) -> SyncError {
    SyncError::from_response(e.to_response())
}

impl CollabTransport for DirectTransport {
    fn submit(&self, request: &SubmitRequest) -> SyncResult<SubmitResponse> {
        self.server.submit(request.clone()).map_err(map_err)
    }

    fn snapshot(&self, request: &SnapshotRequest) -> SyncResult<DocumentSnapshot> {
        self.server.snapshot(request).map_err(map_err)
    }

    fn history(&self, request: &HistoryRequest) -> SyncResult<HistoryResponse> {
        self.server.history(request).map_err(map_err)
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn reconnect(&self) -> SyncResult<()> {
        Ok(())
    }

    fn close(&self) -> SyncResult<()> {
        Ok(())
    }
}

/// A client connected to a [`TestServer`].
pub type TestClient = DocumentClient<DirectTransport>;

/// A server with an inspectable in-memory store.
pub struct TestServer {
    /// The server.
    pub server: Arc<CollabServer>,
    /// Its store.
    pub store: Arc<MemoryDocumentStore>,
}

impl TestServer {
    /// Creates a server with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Creates a server with the given configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let shared: Arc<dyn DocumentStore> = store.clone();
        let server = Arc::new(CollabServer::with_store(config, shared));
        Self { server, store }
    }

    /// Creates a document and shares it with `collaborators`.
    pub fn create_document(&self, owner: &str, content: &str, collaborators: &[&str]) -> String {
        let id = self
            .server
            .create_document("Test document", owner, content)
            .expect("Failed to create document")
            .document_id;
        for collaborator in collaborators {
            self.server
                .add_collaborator(&id, owner, collaborator)
                .expect("Failed to add collaborator");
        }
        id
    }

    /// Opens a client subscribed to the document's events.
    pub fn client(&self, document_id: &str, author: &str) -> TestClient {
        let config = SessionConfig::new(document_id, author).with_retry(RetryConfig::no_retry());
        let transport = Arc::new(DirectTransport::new(Arc::clone(&self.server)));
        let mut client = DocumentClient::open(config, transport).expect("Failed to open client");
        client.attach_events(
            self.server
                .subscribe(document_id, author)
                .expect("Failed to subscribe"),
        );
        client
    }

    /// Current content of a document, as its owner sees it.
    pub fn content(&self, document_id: &str) -> String {
        let owner = self
            .store
            .get(document_id)
            .expect("Unknown document")
            .owner;
        self.server
            .current_content(document_id, &owner)
            .expect("Failed to read content")
    }

    /// Exports the stored document as JSON.
    pub fn export(&self, document_id: &str) -> String {
        let state = self.store.get(document_id).expect("Unknown document");
        serde_json::to_string_pretty(&state).expect("Failed to serialize document")
    }
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Flushes and drains every client until all pending edits are accepted
/// and every client has seen every event.
///
/// Panics if the clients do not settle within `max_rounds`.
pub fn settle(clients: &mut [TestClient], max_rounds: usize) {
    for _ in 0..max_rounds {
        let mut busy = false;
        for client in clients.iter_mut() {
            client.drain_events().expect("Failed to drain events");
            if client.session().has_pending() {
                busy = true;
                match client.flush().expect("Failed to flush") {
                    FlushOutcome::NeedsResolution => panic!("Unexpected conflict prompt"),
                    FlushOutcome::Accepted { .. } | FlushOutcome::Unchanged | FlushOutcome::Idle => {}
                }
            }
        }
        for client in clients.iter_mut() {
            client.drain_events().expect("Failed to drain events");
        }
        if !busy {
            return;
        }
    }
    panic!("Clients did not settle in {max_rounds} rounds");
}
