//! Protocol messages exchanged between clients and the server.

use crate::conflict::VersionConflict;
use crate::delta::Delta;
use crate::error::{ProtocolError, ProtocolResult};
use crate::versioned::{DocumentId, VersionedDelta};
use serde::{Deserialize, Serialize};

/// Envelope for every message on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMessage {
    /// Submit request.
    SubmitRequest(SubmitRequest),
    /// Submit response.
    SubmitResponse(SubmitResponse),
    /// Snapshot request.
    SnapshotRequest(SnapshotRequest),
    /// Snapshot response.
    Snapshot(DocumentSnapshot),
    /// History request.
    HistoryRequest(HistoryRequest),
    /// History response.
    HistoryResponse(HistoryResponse),
    /// Broadcast event.
    Event(DocumentEvent),
    /// Error response.
    Error(ErrorResponse),
}

impl SyncMessage {
    /// Returns the message type code.
    pub fn type_code(&self) -> u8 {
        match self {
            SyncMessage::SubmitRequest(_) => 1,
            SyncMessage::SubmitResponse(_) => 2,
            SyncMessage::SnapshotRequest(_) => 3,
            SyncMessage::Snapshot(_) => 4,
            SyncMessage::HistoryRequest(_) => 5,
            SyncMessage::HistoryResponse(_) => 6,
            SyncMessage::Event(_) => 7,
            SyncMessage::Error(_) => 8,
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| ProtocolError::Encoding(format!("{e:?}")))?;
        Ok(buf)
    }

    /// Decodes from CBOR.
    ///
    /// Deltas are validated while decoding, so a negative length or an
    /// ambiguous operation fails here.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| {
            let detail = format!("{e:?}");
            if detail.contains("malformed delta") {
                ProtocolError::MalformedDelta(detail)
            } else {
                ProtocolError::Decoding(detail)
            }
        })
    }
}

/// A client's request to append a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Target document.
    pub document_id: DocumentId,
    /// The edit, built against `expected_version`.
    pub delta: Delta,
    /// Version the client believes is current.
    pub expected_version: u64,
    /// Submitting user.
    pub author: String,
}

impl SubmitRequest {
    /// Creates a new submit request.
    pub fn new(
        document_id: impl Into<DocumentId>,
        delta: Delta,
        expected_version: u64,
        author: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            delta,
            expected_version,
            author: author.into(),
        }
    }
}

/// Outcome of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitResponse {
    /// The delta was appended.
    Accepted(VersionedDelta),
    /// The delta changed nothing and was not appended.
    Unchanged {
        /// The document's current version.
        version: u64,
    },
    /// The expected version was stale.
    Conflict(VersionConflict),
}

impl SubmitResponse {
    /// Returns true if the delta was appended.
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitResponse::Accepted(_))
    }

    /// Returns true if the submission was rejected as stale.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SubmitResponse::Conflict(_))
    }

    /// The version the document is at after this response.
    pub fn version(&self) -> u64 {
        match self {
            SubmitResponse::Accepted(entry) => entry.version,
            SubmitResponse::Unchanged { version } => *version,
            SubmitResponse::Conflict(conflict) => conflict.current_version,
        }
    }
}

/// Request for the current state of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRequest {
    /// Target document.
    pub document_id: DocumentId,
    /// Requesting user.
    pub requester: String,
}

impl SnapshotRequest {
    /// Creates a new snapshot request.
    pub fn new(document_id: impl Into<DocumentId>, requester: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            requester: requester.into(),
        }
    }
}

/// The current state of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Document ID.
    pub document_id: DocumentId,
    /// Title.
    pub title: String,
    /// Owner.
    pub owner: String,
    /// Current content.
    pub content: String,
    /// Current version.
    pub version: u64,
    /// Users allowed to edit.
    pub collaborators: Vec<String>,
    /// Author of the latest accepted delta.
    pub last_edited_by: Option<String>,
}

/// Request for log entries after a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// Target document.
    pub document_id: DocumentId,
    /// Requesting user.
    pub requester: String,
    /// Return entries with a version strictly greater than this.
    pub since: u64,
    /// Maximum number of entries.
    pub limit: u32,
}

impl HistoryRequest {
    /// Creates a new history request.
    pub fn new(
        document_id: impl Into<DocumentId>,
        requester: impl Into<String>,
        since: u64,
        limit: u32,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            requester: requester.into(),
            since,
            limit,
        }
    }
}

/// A page of log entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Entries in version order.
    pub deltas: Vec<VersionedDelta>,
    /// The document's current version.
    pub current_version: u64,
    /// Whether more entries follow the last one returned.
    pub has_more: bool,
}

impl HistoryResponse {
    /// Creates a new history response.
    pub fn new(deltas: Vec<VersionedDelta>, current_version: u64, has_more: bool) -> Self {
        Self {
            deltas,
            current_version,
            has_more,
        }
    }

    /// Version of the last entry in the page, if any.
    pub fn last_version(&self) -> Option<u64> {
        self.deltas.last().map(|entry| entry.version)
    }
}

/// Event pushed to every subscriber of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentEvent {
    /// A delta was appended to the log.
    DeltaApplied {
        /// Document ID.
        document_id: DocumentId,
        /// The appended entry.
        delta: VersionedDelta,
    },
}

impl DocumentEvent {
    /// The document the event belongs to.
    pub fn document_id(&self) -> &str {
        match self {
            DocumentEvent::DeltaApplied { document_id, .. } => document_id,
        }
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            DocumentEvent::DeltaApplied { .. } => "document-delta",
        }
    }
}

/// Category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request was invalid.
    InvalidRequest,
    /// The requester may not access the document.
    NotAuthorized,
    /// The document does not exist.
    NotFound,
    /// The delta failed validation.
    MalformedDelta,
    /// The server failed.
    Internal,
}

impl ErrorKind {
    /// Returns the error code.
    pub fn to_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::NotAuthorized => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MalformedDelta => 422,
            ErrorKind::Internal => 500,
        }
    }

    /// Parses from an error code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            400 => Some(ErrorKind::InvalidRequest),
            403 => Some(ErrorKind::NotAuthorized),
            404 => Some(ErrorKind::NotFound),
            422 => Some(ErrorKind::MalformedDelta),
            500 => Some(ErrorKind::Internal),
            _ => None,
        }
    }
}

/// A failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
