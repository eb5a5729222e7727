//! CLI command implementations.

pub mod apply;
pub mod compose;
pub mod diff;
pub mod history;
pub mod replay;
pub mod transform;
pub mod verify;

use std::fs;
use std::path::Path;
use tandem_protocol::Delta;
use tandem_server::DocumentState;

/// Reads a JSON delta such as `[{"retain":1},{"insert":"a"}]`.
pub fn read_delta(path: &Path) -> Result<Delta, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| format!("invalid delta in {}: {e}", path.display()).into())
}

/// Reads an exported document.
pub fn read_document(path: &Path) -> Result<DocumentState, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| format!("invalid document in {}: {e}", path.display()).into())
}
