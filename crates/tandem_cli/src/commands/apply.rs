//! Apply command implementation.

use super::read_delta;
use std::fs;
use std::path::Path;

/// Runs the apply command.
pub fn run(content: &Path, delta: &Path) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", apply_files(content, delta)?);
    Ok(())
}

fn apply_files(content: &Path, delta: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(content)?;
    let delta = read_delta(delta)?;

    let (delta, clamped) = delta.clamp_to(content.chars().count());
    if clamped {
        tracing::warn!("delta runs past the end of the content and was clamped");
    }
    Ok(delta.apply(&content))
}
