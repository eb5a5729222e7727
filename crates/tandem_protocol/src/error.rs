//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding or validating protocol data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A delta or operation failed validation.
    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    /// A message could not be encoded.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A message could not be decoded.
    #[error("decoding failed: {0}")]
    Decoding(String),
}

impl ProtocolError {
    /// Returns true if the error was caused by invalid input rather than a codec failure.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ProtocolError::MalformedDelta(_) | ProtocolError::Decoding(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::MalformedDelta("negative retain length -3".into());
        assert_eq!(err.to_string(), "malformed delta: negative retain length -3");
    }

    #[test]
    fn error_classification() {
        assert!(ProtocolError::MalformedDelta("x".into()).is_malformed());
        assert!(ProtocolError::Decoding("x".into()).is_malformed());
        assert!(!ProtocolError::Encoding("x".into()).is_malformed());
    }
}
