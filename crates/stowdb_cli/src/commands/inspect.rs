//! Inspect command implementation.

use super::read_snapshot;
use serde::Serialize;
use std::path::Path;
use stowdb_core::Snapshot;

/// Snapshot inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store directory.
    pub path: String,
    /// Database name.
    pub name: String,
    /// Total number of records.
    pub record_count: usize,
    /// Per-collection statistics.
    pub collections: Vec<CollectionStats>,
}

/// Statistics for a single collection.
#[derive(Debug, Serialize)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// Number of records.
    pub record_count: usize,
    /// Distinct user field names seen across the records.
    pub fields: Vec<String>,
    /// Earliest `created_at`, if any records exist.
    pub oldest: Option<u64>,
    /// Latest `updated_at`, if any records exist.
    pub newest: Option<u64>,
}

/// Runs the inspect command.
pub fn run(path: &Path, name: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = read_snapshot(path, name)?;
    let result = inspect(path, name, &snapshot);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect(path: &Path, name: &str, snapshot: &Snapshot) -> InspectResult {
    let collections = snapshot
        .collections()
        .map(|(collection, records)| {
            let mut fields: Vec<String> = records
                .entries()
                .flat_map(|(_, record)| record.fields().keys().cloned())
                .collect();
            fields.sort();
            fields.dedup();
            CollectionStats {
                name: collection.to_string(),
                record_count: records.len(),
                fields,
                oldest: records.entries().map(|(_, r)| r.created_at()).min(),
                newest: records.entries().map(|(_, r)| r.updated_at()).max(),
            }
        })
        .collect();

    InspectResult {
        path: path.display().to_string(),
        name: name.to_string(),
        record_count: snapshot.record_count(),
        collections,
    }
}

fn print_text_output(result: &InspectResult) {
    println!("StowDB Snapshot Inspection");
    println!("==========================");
    println!();
    println!("Path: {}", result.path);
    println!("Name: {}", result.name);
    println!();
    println!("Records: {}", result.record_count);

    if !result.collections.is_empty() {
        println!();
        println!("Collections:");
        for col in &result.collections {
            println!("  {} - {} records", col.name, col.record_count);
            if !col.fields.is_empty() {
                println!("    fields: {}", col.fields.join(", "));
            }
            if let (Some(oldest), Some(newest)) = (col.oldest, col.newest) {
                println!("    created from {oldest}, last updated {newest}");
            }
        }
    }
}
