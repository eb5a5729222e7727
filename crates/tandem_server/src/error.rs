//! Error types for the collaboration server.

use tandem_protocol::{ErrorKind, ErrorResponse, ProtocolError};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the collaboration server.
///
/// A stale submission is not an error: it is answered with
/// `SubmitResponse::Conflict`.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requester is not a collaborator (or not the owner).
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Unknown document.
    #[error("unknown document: {0}")]
    UnknownDocument(String),

    /// The delta failed validation.
    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    /// A stored log is inconsistent.
    #[error("corrupted log: {0}")]
    Corrupted(String),

    /// The persistence layer failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::NotAuthorized(_)
                | ServerError::UnknownDocument(_)
                | ServerError::MalformedDelta(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ServerError::Corrupted(_) | ServerError::Storage(_) | ServerError::Internal(_)
        )
    }

    /// Wire category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ServerError::NotAuthorized(_) => ErrorKind::NotAuthorized,
            ServerError::UnknownDocument(_) => ErrorKind::NotFound,
            ServerError::MalformedDelta(_) => ErrorKind::MalformedDelta,
            ServerError::Corrupted(_) | ServerError::Storage(_) | ServerError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Converts to a wire error response.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.kind(), self.to_string())
    }
}

impl From<ProtocolError> for ServerError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::MalformedDelta(msg) => ServerError::MalformedDelta(msg),
            ProtocolError::Decoding(msg) => ServerError::InvalidRequest(msg),
            ProtocolError::Encoding(msg) => ServerError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::NotAuthorized("mallory".into()).is_client_error());
        assert!(ServerError::Storage("disk full".into()).is_server_error());
        assert!(!ServerError::InvalidRequest("bad".into()).is_server_error());
    }

    #[test]
    fn error_response_kind() {
        let response = ServerError::UnknownDocument("doc-9".into()).to_response();
        assert_eq!(response.kind, ErrorKind::NotFound);
        assert!(response.message.contains("doc-9"));
    }

    #[test]
    fn protocol_error_conversion() {
        let err: ServerError = ProtocolError::MalformedDelta("negative".into()).into();
        assert!(matches!(err, ServerError::MalformedDelta(_)));
        let err: ServerError = ProtocolError::Decoding("eof".into()).into();
        assert!(err.is_client_error());
    }
}
