//! Operational transform of concurrent deltas.

use crate::cursor::OpCursor;
use crate::delta::Delta;
use crate::operation::Operation;

/// Transforms two deltas made concurrently against the same content.
///
/// Returns `(a_prime, b_prime)` such that, for that content `c`,
/// `b_prime.apply(&a.apply(c)) == a_prime.apply(&b.apply(c))`.
///
/// When both sides insert at the same position, `a`'s text comes first.
/// Callers pick which side is `a` to decide whose insert wins the tie.
pub fn transform(a: &Delta, b: &Delta) -> (Delta, Delta) {
    let mut left = OpCursor::new(a);
    let mut right = OpCursor::new(b);
    let mut a_prime = Delta::new();
    let mut b_prime = Delta::new();

    loop {
        match (left.peek(), right.peek()) {
            (None, None) => break,
            (Some(Operation::Insert(_)), _) => {
                let op = left.take_all();
                b_prime.push(Operation::Retain(op.len()));
                a_prime.push(op);
            }
            (_, Some(Operation::Insert(_))) => {
                let op = right.take_all();
                a_prime.push(Operation::Retain(op.len()));
                b_prime.push(op);
            }
            (Some(_), None) => a_prime.push(left.take_all()),
            (None, Some(_)) => b_prime.push(right.take_all()),
            (Some(_), Some(_)) => {
                let len = left.peek_len().min(right.peek_len());
                match (left.take(len), right.take(len)) {
                    (Operation::Retain(n), Operation::Retain(_)) => {
                        a_prime.push(Operation::Retain(n));
                        b_prime.push(Operation::Retain(n));
                    }
                    (Operation::Delete(n), Operation::Retain(_)) => {
                        a_prime.push(Operation::Delete(n));
                    }
                    (Operation::Retain(_), Operation::Delete(n)) => {
                        b_prime.push(Operation::Delete(n));
                    }
                    // Both deleted the same span, or an insert (handled above).
                    _ => {}
                }
            }
        }
    }

    (a_prime, b_prime)
}
