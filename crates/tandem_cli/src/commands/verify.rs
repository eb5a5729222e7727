//! Verify command implementation.

use super::read_document;
use std::path::Path;
use tandem_server::DocumentState;

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of log entries checked.
    pub entries_checked: usize,
    /// Entries whose spans run past the content they apply to.
    pub overruns: usize,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            entries_checked: 0,
            overruns: 0,
            errors: Vec::new(),
        }
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying document at {:?}", path);
    println!();

    let state = read_document(path)?;
    let result = verify_document(&state);

    println!("Entries checked: {}", result.entries_checked);
    println!("Overruns:        {}", result.overruns);
    if result.is_ok() {
        println!("Status:          OK");
        println!("Content length:  {} characters", state.current_content().chars().count());
        Ok(())
    } else {
        println!("Status:          FAILED");
        for error in &result.errors {
            println!("  - {}", error);
        }
        Err(format!("{} problem(s) found", result.errors.len()).into())
    }
}

fn verify_document(state: &DocumentState) -> VerifyResult {
    let mut result = VerifyResult::new();

    if let Err(e) = state.verify() {
        result.errors.push(e.to_string());
    }

    let mut content = state.base_content.clone();
    for entry in &state.deltas {
        result.entries_checked += 1;

        let len = content.chars().count();
        if entry.operations.base_len() > len {
            result.overruns += 1;
            result.errors.push(format!(
                "version {} consumes {} characters but the content has {}",
                entry.version,
                entry.operations.base_len(),
                len
            ));
        }
        if entry.operations.is_identity() {
            result
                .errors
                .push(format!("version {} changes nothing", entry.version));
        }
        content = entry.operations.apply(&content);
    }

    result
}
