//! Transform command implementation.

use super::read_delta;
use serde::Serialize;
use std::path::Path;
use tandem_protocol::Delta;

/// Both halves of a transform.
#[derive(Debug, Serialize)]
pub struct TransformOutput {
    /// `a` rebased to apply after `b`.
    pub a_prime: Delta,
    /// `b` rebased to apply after `a`.
    pub b_prime: Delta,
}

/// Runs the transform command.
pub fn run(a: &Path, b: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (a_prime, b_prime) = read_delta(a)?.transform(&read_delta(b)?);
    let output = TransformOutput { a_prime, b_prime };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
