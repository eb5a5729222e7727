//! Delta operations.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// A single step of a delta.
///
/// Lengths count `char`s of the source content. On the wire an operation is
/// a map with exactly one key: `{"retain": n}`, `{"delete": n}` or
/// `{"insert": "text"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawOperation", into = "RawOperation")]
pub enum Operation {
    /// Copy the next `n` characters of the source unchanged.
    Retain(usize),
    /// Skip the next `n` characters of the source.
    Delete(usize),
    /// Emit the text verbatim.
    Insert(String),
}

impl Operation {
    /// Returns the length of this operation in characters.
    ///
    /// For `Retain` and `Delete` this is the span of source consumed; for
    /// `Insert` it is the number of characters emitted.
    pub fn len(&self) -> usize {
        match self {
            Operation::Retain(n) | Operation::Delete(n) => *n,
            Operation::Insert(text) => text.chars().count(),
        }
    }

    /// Returns true if the operation has no effect.
    pub fn is_empty(&self) -> bool {
        match self {
            Operation::Retain(n) | Operation::Delete(n) => *n == 0,
            Operation::Insert(text) => text.is_empty(),
        }
    }

    /// Returns true for `Retain`.
    pub fn is_retain(&self) -> bool {
        matches!(self, Operation::Retain(_))
    }

    /// Returns true for `Delete`.
    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::Delete(_))
    }

    /// Returns true for `Insert`.
    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert(_))
    }

    /// Returns the number of source characters this operation consumes.
    pub fn consumed(&self) -> usize {
        match self {
            Operation::Retain(n) | Operation::Delete(n) => *n,
            Operation::Insert(_) => 0,
        }
    }

    /// Tries to absorb `next` into `self`. Returns `false` when the kinds differ.
    pub(crate) fn merge(&mut self, next: &Operation) -> bool {
        match (self, next) {
            (Operation::Retain(a), Operation::Retain(b)) => *a += b,
            (Operation::Delete(a), Operation::Delete(b)) => *a += b,
            (Operation::Insert(a), Operation::Insert(b)) => a.push_str(b),
            _ => return false,
        }
        true
    }
}

/// Wire shape of an operation.
///
/// Lengths are signed here so that negative values sent by a peer are
/// reported as malformed input instead of a generic decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retain: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delete: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    insert: Option<String>,
}

impl TryFrom<RawOperation> for Operation {
    type Error = ProtocolError;

    fn try_from(raw: RawOperation) -> Result<Self, Self::Error> {
        match (raw.retain, raw.delete, raw.insert) {
            (Some(n), None, None) => Ok(Operation::Retain(checked_len("retain", n)?)),
            (None, Some(n), None) => Ok(Operation::Delete(checked_len("delete", n)?)),
            (None, None, Some(text)) => Ok(Operation::Insert(text)),
            _ => Err(ProtocolError::MalformedDelta(
                "operation must have exactly one of retain, delete or insert".into(),
            )),
        }
    }
}

impl From<Operation> for RawOperation {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Retain(n) => RawOperation {
                retain: Some(wire_len(n)),
                ..Default::default()
            },
            Operation::Delete(n) => RawOperation {
                delete: Some(wire_len(n)),
                ..Default::default()
            },
            Operation::Insert(text) => RawOperation {
                insert: Some(text),
                ..Default::default()
            },
        }
    }
}

fn checked_len(kind: &str, n: i64) -> Result<usize, ProtocolError> {
    usize::try_from(n)
        .map_err(|_| ProtocolError::MalformedDelta(format!("negative {kind} length {n}")))
}

fn wire_len(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
