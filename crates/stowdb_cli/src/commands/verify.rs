//! Verify command implementation.

use super::read_snapshot;
use std::collections::HashMap;
use std::path::Path;
use stowdb_core::{RecordId, Snapshot};

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of records checked.
    pub records_checked: usize,
    /// Number of records with no problems.
    pub valid_records: usize,
    /// List of problems found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying database '{name}' in {}", path.display());
    println!();

    let snapshot = read_snapshot(path, name)?;
    let result = verify(&snapshot);
    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ Snapshot verification passed");
        Ok(())
    } else {
        println!("✗ Snapshot verification failed");
        Err("Verification failed".into())
    }
}

/// Checks that every record sits under its own ID, IDs are unique across
/// the snapshot, and no record was updated before it was created.
fn verify(snapshot: &Snapshot) -> VerifyResult {
    let mut result = VerifyResult::default();
    let mut seen: HashMap<RecordId, String> = HashMap::new();

    for (collection, records) in snapshot.collections() {
        for (key, record) in records.entries() {
            result.records_checked += 1;
            let errors_before = result.errors.len();

            if key != record.id().to_string() {
                result.errors.push(format!(
                    "{collection}/{key}: stored under a key that differs from its id {}",
                    record.id()
                ));
            }
            if record.created_at() > record.updated_at() {
                result.errors.push(format!(
                    "{collection}/{key}: created_at {} is after updated_at {}",
                    record.created_at(),
                    record.updated_at()
                ));
            }
            if let Some(other) = seen.insert(record.id(), collection.to_string()) {
                result.errors.push(format!(
                    "{collection}/{key}: id also used in {other}"
                ));
            }

            if result.errors.len() == errors_before {
                result.valid_records += 1;
            }
        }
    }

    result
}

fn print_result(result: &VerifyResult) {
    println!(
        "  records checked: {}, valid: {}",
        result.records_checked, result.valid_records
    );
    for error in &result.errors {
        println!("    ERROR: {}", error);
    }
}
