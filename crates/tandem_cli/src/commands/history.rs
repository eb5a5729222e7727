//! History command implementation.

use super::read_document;
use serde::Serialize;
use std::path::Path;
use tandem_server::DocumentState;

/// Log entry representation for output.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    /// Version produced by the entry.
    pub version: u64,
    /// Author of the entry.
    pub author: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Characters inserted.
    pub inserted: usize,
    /// Characters deleted.
    pub deleted: usize,
    /// Human-readable change summary.
    pub summary: String,
}

/// Runs the history command.
pub fn run(
    path: &Path,
    since: u64,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = read_document(path)?;
    let entries = collect_entries(&state, since, limit);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            print_text_output(&state, &entries);
        }
    }

    Ok(())
}

fn collect_entries(state: &DocumentState, since: u64, limit: Option<usize>) -> Vec<HistoryEntry> {
    state
        .deltas
        .iter()
        .filter(|entry| entry.version > since)
        .take(limit.unwrap_or(usize::MAX))
        .map(|entry| {
            let summary = entry.summary();
            HistoryEntry {
                version: entry.version,
                author: entry.author.clone(),
                timestamp: entry.timestamp,
                inserted: summary.inserted,
                deleted: summary.deleted,
                summary: summary.to_string(),
            }
        })
        .collect()
}

fn print_text_output(state: &DocumentState, entries: &[HistoryEntry]) {
    println!("{} ({})", state.title, state.id);
    println!("Owner: {}", state.owner);
    println!("Current version: {}", state.current_version());
    println!();

    if entries.is_empty() {
        println!("No entries.");
        return;
    }

    for entry in entries {
        println!(
            "v{:<6} {:<16} {:>15}  {}",
            entry.version, entry.author, entry.timestamp, entry.summary
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::sample_document;

    #[test]
    fn summaries_per_entry() {
        let entries = collect_entries(&sample_document(), 0, None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].author, "alice");
        assert_eq!(entries[0].summary, "added 1 character");
        assert_eq!(entries[1].inserted, 1);
    }

    #[test]
    fn since_and_limit() {
        let state = sample_document();
        let entries = collect_entries(&state, 1, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version, 2);

        assert_eq!(collect_entries(&state, 0, Some(1)).len(), 1);
        assert!(collect_entries(&state, 2, None).is_empty());
    }
}
