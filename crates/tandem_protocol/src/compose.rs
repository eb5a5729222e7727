//! Sequential composition of deltas.

use crate::cursor::OpCursor;
use crate::delta::Delta;
use crate::operation::Operation;

/// Composes two deltas into one.
///
/// `second` must be a delta over the output of `first`. The result satisfies
/// `compose(a, b).apply(c) == b.apply(&a.apply(c))` for every content `c`
/// whose length `a` fully consumes. Adjacent compatible operations in the
/// result are merged.
pub fn compose(first: &Delta, second: &Delta) -> Delta {
    let mut a = OpCursor::new(first);
    let mut b = OpCursor::new(second);
    let mut out = Delta::new();

    while a.peek().is_some() || b.peek().is_some() {
        // Inserts from the second delta land before anything the first one
        // still has to say at this position.
        if b.peek().is_some_and(Operation::is_insert) {
            out.push(b.take_all());
            continue;
        }
        // Deletes in the first delta never reach the second.
        if a.peek().is_some_and(Operation::is_delete) {
            out.push(a.take_all());
            continue;
        }

        let len = a.peek_len().min(b.peek_len());
        let from_first = a.take(len);
        match b.take(len) {
            Operation::Retain(_) => out.push(from_first),
            Operation::Delete(n) => {
                // Deleting freshly inserted text cancels out.
                if from_first.is_retain() {
                    out.push(Operation::Delete(n));
                }
            }
            Operation::Insert(_) => {}
        }
    }

    out
}
