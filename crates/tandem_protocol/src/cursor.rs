//! Iteration over a delta in arbitrarily sized pieces.

use crate::delta::Delta;
use crate::operation::Operation;

/// Walks a delta, handing out operations split to a requested length.
///
/// The character length of the current operation is counted once, and
/// inserts are split by byte position, so taking an operation in many
/// pieces stays linear in its length.
pub(crate) struct OpCursor<'a> {
    ops: &'a [Operation],
    index: usize,
    /// Characters of the current operation already taken.
    offset: usize,
    /// Byte position of `offset` inside the current insert.
    byte_offset: usize,
    /// Character length of the current operation.
    current_len: usize,
}

impl<'a> OpCursor<'a> {
    pub(crate) fn new(delta: &'a Delta) -> Self {
        let ops = delta.ops();
        Self {
            ops,
            index: 0,
            offset: 0,
            byte_offset: 0,
            current_len: ops.first().map_or(0, Operation::len),
        }
    }

    /// Current operation, if any remains.
    pub(crate) fn peek(&self) -> Option<&'a Operation> {
        self.ops.get(self.index)
    }

    /// Remaining length of the current operation.
    ///
    /// An exhausted cursor behaves like an endless retain.
    pub(crate) fn peek_len(&self) -> usize {
        self.peek()
            .map_or(usize::MAX, |_| self.current_len.saturating_sub(self.offset))
    }

    /// Takes up to `max` characters of the current operation.
    ///
    /// Returns `Retain(max)` once the cursor is exhausted.
    pub(crate) fn take(&mut self, max: usize) -> Operation {
        let Some(op) = self.peek() else {
            return Operation::Retain(max);
        };
        let remaining = self.current_len.saturating_sub(self.offset);
        let n = remaining.min(max);
        let piece = match op {
            Operation::Retain(_) => Operation::Retain(n),
            Operation::Delete(_) => Operation::Delete(n),
            Operation::Insert(text) => {
                let rest = text.get(self.byte_offset..).unwrap_or("");
                let end = rest.char_indices().nth(n).map_or(rest.len(), |(i, _)| i);
                self.byte_offset += end;
                Operation::Insert(rest[..end].to_string())
            }
        };
        if n == remaining {
            self.advance();
        } else {
            self.offset += n;
        }
        piece
    }

    /// Takes whatever is left of the current operation.
    pub(crate) fn take_all(&mut self) -> Operation {
        self.take(usize::MAX)
    }

    fn advance(&mut self) {
        self.index += 1;
        self.offset = 0;
        self.byte_offset = 0;
        self.current_len = self.peek().map_or(0, Operation::len);
    }
}
