//! Compose command implementation.

use super::read_delta;
use std::path::Path;

/// Runs the compose command.
pub fn run(first: &Path, second: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let composed = read_delta(first)?.compose(&read_delta(second)?);
    println!("{}", serde_json::to_string(&composed)?);
    Ok(())
}
