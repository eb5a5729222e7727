//! Diff command implementation.

use std::fs;
use std::path::Path;
use tandem_protocol::{create_delta, Delta};

/// Runs the diff command.
pub fn run(old: &Path, new: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let delta = diff_files(old, new)?;
    println!("{}", serde_json::to_string(&delta)?);
    eprintln!("{}", delta.summary());
    Ok(())
}

fn diff_files(old: &Path, new: &Path) -> Result<Delta, Box<dyn std::error::Error>> {
    let old = fs::read_to_string(old)?;
    let new = fs::read_to_string(new)?;
    Ok(create_delta(&old, &new))
}
