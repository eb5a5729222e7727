//! Transport layer abstraction for document sync.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_protocol::{
    DocumentSnapshot, HistoryRequest, HistoryResponse, SnapshotRequest, SubmitRequest,
    SubmitResponse,
};

/// A transport carries requests from a client to the collaboration server.
///
/// Implementations decide how bytes move (in process, over a socket, through
/// a mock); the client only sees typed requests and responses.
pub trait CollabTransport: Send + Sync {
    /// Submits a delta.
    fn submit(&self, request: &SubmitRequest) -> SyncResult<SubmitResponse>;

    /// Fetches the current document snapshot.
    fn snapshot(&self, request: &SnapshotRequest) -> SyncResult<DocumentSnapshot>;

    /// Fetches log entries after a version.
    fn history(&self, request: &HistoryRequest) -> SyncResult<HistoryResponse>;

    /// Checks if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Re-establishes the connection.
    fn reconnect(&self) -> SyncResult<()>;

    /// Closes the transport connection.
    fn close(&self) -> SyncResult<()>;
}

/// A scripted transport for testing.
///
/// Submit responses are served in the order they were queued. Snapshot and
/// history responses are served until replaced.
#[derive(Debug, Default)]
pub struct MockTransport {
    connected: AtomicBool,
    fail_next_submit: AtomicBool,
    submit_responses: Mutex<VecDeque<SubmitResponse>>,
    snapshot_response: Mutex<Option<DocumentSnapshot>>,
    history_response: Mutex<Option<HistoryResponse>>,
    submitted: Mutex<Vec<SubmitRequest>>,
}

impl MockTransport {
    /// Creates a new connected mock transport.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            ..Self::default()
        }
    }

    /// Queues a submit response.
    pub fn push_submit_response(&self, response: SubmitResponse) {
        self.submit_responses.lock().push_back(response);
    }

    /// Makes the next submit fail with a transport error after it was recorded.
    pub fn fail_next_submit(&self) {
        self.fail_next_submit.store(true, Ordering::SeqCst);
    }

    /// Sets the snapshot response.
    pub fn set_snapshot_response(&self, snapshot: DocumentSnapshot) {
        *self.snapshot_response.lock() = Some(snapshot);
    }

    /// Sets the history response.
    pub fn set_history_response(&self, history: HistoryResponse) {
        *self.history_response.lock() = Some(history);
    }

    /// Every submit request seen so far.
    pub fn submitted(&self) -> Vec<SubmitRequest> {
        self.submitted.lock().clone()
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl CollabTransport for MockTransport {
    fn submit(&self, request: &SubmitRequest) -> SyncResult<SubmitResponse> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        self.submitted.lock().push(request.clone());
        if self.fail_next_submit.swap(false, Ordering::SeqCst) {
            return Err(SyncError::transport_retryable("connection reset"));
        }
        self.submit_responses
            .lock()
            .pop_front()
            .ok_or_else(|| SyncError::Protocol("no mock submit response queued".into()))
    }

    fn snapshot(&self, _request: &SnapshotRequest) -> SyncResult<DocumentSnapshot> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        self.snapshot_response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::Protocol("no mock snapshot response set".into()))
    }

    fn history(&self, _request: &HistoryRequest) -> SyncResult<HistoryResponse> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        self.history_response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::Protocol("no mock history response set".into()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn reconnect(&self) -> SyncResult<()> {
        self.set_connected(true);
        Ok(())
    }

    fn close(&self) -> SyncResult<()> {
        self.set_connected(false);
        Ok(())
    }
}
