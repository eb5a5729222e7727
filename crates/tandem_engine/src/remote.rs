//! Message-framed transport.
//!
//! Requests are encoded as CBOR [`SyncMessage`] frames and handed to a
//! [`RequestChannel`], which moves bytes to the server and back. The channel
//! is a trait so that sockets, HTTP clients or an in-process server can all
//! sit underneath the same transport.

use crate::error::{SyncError, SyncResult};
use crate::transport::CollabTransport;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_protocol::{
    DocumentSnapshot, HistoryRequest, HistoryResponse, SnapshotRequest, SubmitRequest,
    SubmitResponse, SyncMessage,
};

/// Byte-level request/response channel.
pub trait RequestChannel: Send + Sync {
    /// Sends one encoded request and returns the encoded response.
    fn request(&self, body: Vec<u8>) -> Result<Vec<u8>, String>;

    /// Checks if the channel is healthy.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Transport that speaks CBOR-encoded [`SyncMessage`]s over a channel.
pub struct RemoteTransport<C: RequestChannel> {
    channel: C,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: RequestChannel> RemoteTransport<C> {
    /// Creates a transport over the given channel.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// The underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Returns the last channel error.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn roundtrip(&self, message: SyncMessage) -> SyncResult<SyncMessage> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }

        let body = message
            .encode()
            .map_err(|e| SyncError::Protocol(format!("failed to encode request: {e}")))?;

        let response = self.channel.request(body).map_err(|e| {
            *self.last_error.write() = Some(e.clone());
            self.connected.store(false, Ordering::SeqCst);
            SyncError::transport_retryable(e)
        })?;

        *self.last_error.write() = None;

        match SyncMessage::decode(&response)? {
            SyncMessage::Error(error) => Err(SyncError::from_response(error)),
            other => Ok(other),
        }
    }
}

fn unexpected(expected: &str, got: &SyncMessage) -> SyncError {
    SyncError::Protocol(format!(
        "expected {expected}, got message type {}",
        got.type_code()
    ))
}

impl<C: RequestChannel> CollabTransport for RemoteTransport<C> {
    fn submit(&self, request: &SubmitRequest) -> SyncResult<SubmitResponse> {
        match self.roundtrip(SyncMessage::SubmitRequest(request.clone()))? {
            SyncMessage::SubmitResponse(response) => Ok(response),
            other => Err(unexpected("submit response", &other)),
        }
    }

    fn snapshot(&self, request: &SnapshotRequest) -> SyncResult<DocumentSnapshot> {
        match self.roundtrip(SyncMessage::SnapshotRequest(request.clone()))? {
            SyncMessage::Snapshot(snapshot) => Ok(snapshot),
            other => Err(unexpected("snapshot", &other)),
        }
    }

    fn history(&self, request: &HistoryRequest) -> SyncResult<HistoryResponse> {
        match self.roundtrip(SyncMessage::HistoryRequest(request.clone()))? {
            SyncMessage::HistoryResponse(history) => Ok(history),
            other => Err(unexpected("history response", &other)),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.channel.is_healthy()
    }

    fn reconnect(&self) -> SyncResult<()> {
        if !self.channel.is_healthy() {
            return Err(SyncError::transport_retryable("channel unavailable"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> SyncResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Channel that hands frames to an in-process function.
///
/// Pair it with a server's byte-level request handler to run the full
/// encode/decode path without a network.
pub struct LoopbackChannel<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    handler: F,
}

impl<F> LoopbackChannel<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    /// Creates a loopback channel.
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> RequestChannel for LoopbackChannel<F>
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn request(&self, body: Vec<u8>) -> Result<Vec<u8>, String> {
        Ok((self.handler)(&body))
    }
}
