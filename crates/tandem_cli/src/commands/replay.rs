//! Replay command implementation.

use super::read_document;
use std::path::Path;
use tandem_server::DocumentState;

/// Runs the replay command.
pub fn run(path: &Path, version: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let state = read_document(path)?;
    print!("{}", replay(&state, version)?);
    Ok(())
}

fn replay(state: &DocumentState, version: Option<u64>) -> Result<String, Box<dyn std::error::Error>> {
    let version = version.unwrap_or_else(|| state.current_version());
    state.content_at(version).ok_or_else(|| {
        format!(
            "version {version} does not exist (document is at version {})",
            state.current_version()
        )
        .into()
    })
}
