//! Request dispatch for protocol messages.

use crate::error::ServerError;
use crate::server::CollabServer;
use std::sync::Arc;
use tandem_protocol::{ErrorKind, ErrorResponse, SyncMessage};
use tracing::warn;

/// Dispatches protocol messages to a [`CollabServer`].
///
/// This is the request/response surface a transport exposes: hand it a
/// decoded message, or a raw CBOR frame, and send back what it returns.
/// Failures become `SyncMessage::Error` responses instead of Rust errors.
#[derive(Clone)]
pub struct RequestHandler {
    server: Arc<CollabServer>,
}

impl RequestHandler {
    /// Creates a handler for the given server.
    pub fn new(server: Arc<CollabServer>) -> Self {
        Self { server }
    }

    /// The server behind this handler.
    pub fn server(&self) -> &Arc<CollabServer> {
        &self.server
    }

    /// Handles one request message.
    pub fn handle(&self, message: SyncMessage) -> SyncMessage {
        let result = match message {
            SyncMessage::SubmitRequest(request) => {
                self.server.submit(request).map(SyncMessage::SubmitResponse)
            }
            SyncMessage::SnapshotRequest(request) => {
                self.server.snapshot(&request).map(SyncMessage::Snapshot)
            }
            SyncMessage::HistoryRequest(request) => {
                self.server.history(&request).map(SyncMessage::HistoryResponse)
            }
            other => Err(ServerError::InvalidRequest(format!(
                "unexpected message type {}",
                other.type_code()
            ))),
        };

        result.unwrap_or_else(|e| {
            if e.is_server_error() {
                warn!(error = %e, "request failed");
            }
            SyncMessage::Error(e.to_response())
        })
    }

    /// Handles one CBOR-encoded request and returns the encoded response.
    ///
    /// A frame that does not decode (including deltas with negative lengths)
    /// is answered with an error message, never dropped silently.
    pub fn handle_bytes(&self, body: &[u8]) -> Vec<u8> {
        let response = match SyncMessage::decode(body) {
            Ok(message) => self.handle(message),
            Err(e) => {
                warn!(error = %e, "rejected undecodable request");
                SyncMessage::Error(ServerError::from(e).to_response())
            }
        };

        response.encode().unwrap_or_else(|e| {
            warn!(error = %e, "failed to encode response");
            // A plain error message always encodes.
            SyncMessage::Error(ErrorResponse::new(ErrorKind::Internal, e.to_string()))
                .encode()
                .unwrap_or_default()
        })
    }
}
