//! Error types for the sync engine.

use tandem_protocol::{ErrorKind, ErrorResponse, ProtocolError};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Protocol error (unexpected or undecodable message).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A delta failed validation.
    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    /// The server refused access.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Server rejected the request.
    #[error("server error: {0}")]
    ServerError(String),

    /// A remote delta or acknowledgement skipped a version.
    #[error("out-of-order delta: expected version {expected}, received {received}")]
    OutOfOrderDelta {
        /// Version the session expected next.
        expected: u64,
        /// Version that arrived.
        received: u64,
    },

    /// A conflict is waiting for the user.
    #[error("unresolved conflict at server version {current_version}")]
    UnresolvedConflict {
        /// Server version named by the conflict.
        current_version: u64,
    },

    /// Invalid state transition.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// Not connected.
    #[error("not connected to server")]
    NotConnected,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Maps a server error response.
    pub fn from_response(response: ErrorResponse) -> Self {
        match response.kind {
            ErrorKind::InvalidRequest => SyncError::Protocol(response.message),
            ErrorKind::NotAuthorized => SyncError::NotAuthorized(response.message),
            ErrorKind::NotFound => SyncError::NotFound(response.message),
            ErrorKind::MalformedDelta => SyncError::MalformedDelta(response.message),
            ErrorKind::Internal => SyncError::ServerError(response.message),
        }
    }

    /// Returns true if this error can be retried.
    ///
    /// Only idempotent reads are ever retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::ServerError(_) => true,
            _ => false,
        }
    }

    /// Returns true if local state can no longer be trusted and must be
    /// rebuilt from the server.
    pub fn requires_resync(&self) -> bool {
        matches!(
            self,
            SyncError::OutOfOrderDelta { .. } | SyncError::Transport { .. } | SyncError::NotConnected
        )
    }
}

impl From<ProtocolError> for SyncError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::MalformedDelta(msg) => SyncError::MalformedDelta(msg),
            other => SyncError::Protocol(other.to_string()),
        }
    }
}
