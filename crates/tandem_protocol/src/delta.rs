//! The delta type: an ordered sequence of operations.

use crate::compose::compose;
use crate::operation::Operation;
use crate::transform::transform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered sequence of operations, read as a function from content to content.
///
/// A delta is kept in normal form: no zero-length operations and no two
/// adjacent operations of the same kind. Every constructor goes through
/// [`Delta::push`], which maintains that form.
///
/// Applying a delta never fails. `Retain` and `Delete` lengths that run past
/// the end of the content are clamped, and content left unconsumed after the
/// last operation is retained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct Delta {
    ops: Vec<Operation>,
}

/// Character counts touched by a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Characters inserted.
    pub inserted: usize,
    /// Characters deleted.
    pub deleted: usize,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.inserted, self.deleted) {
            (0, 0) => write!(f, "no changes"),
            (added, 0) => write!(f, "added {added} {}", chars(added)),
            (0, removed) => write!(f, "removed {removed} {}", chars(removed)),
            (added, removed) => write!(
                f,
                "added {added} {} and removed {removed} {}",
                chars(added),
                chars(removed)
            ),
        }
    }
}

fn chars(n: usize) -> &'static str {
    if n == 1 {
        "character"
    } else {
        "characters"
    }
}

impl Delta {
    /// Creates an empty delta (the identity).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a delta from operations, normalizing as it goes.
    pub fn from_ops(ops: impl IntoIterator<Item = Operation>) -> Self {
        let mut delta = Self::new();
        for op in ops {
            delta.push(op);
        }
        delta
    }

    /// Appends an operation, dropping it if empty and merging it into the
    /// previous operation when both are the same kind.
    pub fn push(&mut self, op: Operation) {
        if op.is_empty() {
            return;
        }
        if let Some(last) = self.ops.last_mut() {
            if last.merge(&op) {
                return;
            }
        }
        self.ops.push(op);
    }

    /// Appends a `Retain(n)`.
    #[must_use]
    pub fn retain(mut self, n: usize) -> Self {
        self.push(Operation::Retain(n));
        self
    }

    /// Appends a `Delete(n)`.
    #[must_use]
    pub fn delete(mut self, n: usize) -> Self {
        self.push(Operation::Delete(n));
        self
    }

    /// Appends an `Insert(text)`.
    #[must_use]
    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.push(Operation::Insert(text.into()));
        self
    }

    /// Returns the operations.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Consumes the delta, returning its operations.
    pub fn into_ops(self) -> Vec<Operation> {
        self.ops
    }

    /// Returns the number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the delta has no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns true if applying the delta leaves any content unchanged.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(Operation::is_retain)
    }

    /// Number of source characters the delta explicitly consumes.
    pub fn base_len(&self) -> usize {
        self.ops.iter().map(Operation::consumed).sum()
    }

    /// Counts inserted and deleted characters.
    pub fn summary(&self) -> ChangeSummary {
        self.ops
            .iter()
            .fold(ChangeSummary::default(), |mut summary, op| {
                match op {
                    Operation::Insert(_) => summary.inserted += op.len(),
                    Operation::Delete(n) => summary.deleted += n,
                    Operation::Retain(_) => {}
                }
                summary
            })
    }

    /// Applies the delta to `content`.
    pub fn apply(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut rest = content.chars();
        for op in &self.ops {
            match op {
                Operation::Retain(n) => result.extend(rest.by_ref().take(*n)),
                Operation::Delete(n) => rest.by_ref().take(*n).for_each(drop),
                Operation::Insert(text) => result.push_str(text),
            }
        }
        result.extend(rest);
        result
    }

    /// Clamps `Retain` and `Delete` spans so the delta consumes at most
    /// `len` characters.
    ///
    /// Returns the clamped delta and whether anything was cut. The clamped
    /// delta has the same effect as the original on content of length `len`.
    pub fn clamp_to(&self, len: usize) -> (Delta, bool) {
        let mut remaining = len;
        let mut clamped = false;
        let mut out = Delta::new();
        for op in &self.ops {
            match op {
                Operation::Retain(n) | Operation::Delete(n) => {
                    let take = (*n).min(remaining);
                    clamped |= take < *n;
                    remaining -= take;
                    out.push(if op.is_retain() {
                        Operation::Retain(take)
                    } else {
                        Operation::Delete(take)
                    });
                }
                Operation::Insert(text) => out.push(Operation::Insert(text.clone())),
            }
        }
        (out, clamped)
    }

    /// Returns a delta equivalent to applying `self` and then `other`.
    #[must_use]
    pub fn compose(&self, other: &Delta) -> Delta {
        compose(self, other)
    }

    /// Transforms `self` against a concurrent `other`. See [`transform`].
    pub fn transform(&self, other: &Delta) -> (Delta, Delta) {
        transform(self, other)
    }
}

impl From<Vec<Operation>> for Delta {
    fn from(ops: Vec<Operation>) -> Self {
        Self::from_ops(ops)
    }
}

impl From<Delta> for Vec<Operation> {
    fn from(delta: Delta) -> Self {
        delta.ops
    }
}

impl FromIterator<Operation> for Delta {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::from_ops(iter)
    }
}
