//! CLI command implementations.

pub mod inspect;
pub mod query;
pub mod verify;

use std::path::Path;
use stowdb_core::Snapshot;
use stowdb_storage::{FileStore, KeyValueStore};
use tracing::debug;

/// Reads the snapshot saved under `name` in the file store at `path`.
pub fn read_snapshot(path: &Path, name: &str) -> Result<Snapshot, Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No store found at {}", path.display()).into());
    }
    let store = FileStore::open(path)?;
    let text = store
        .get(name)?
        .ok_or_else(|| format!("No database '{name}' saved in {}", path.display()))?;
    debug!(database = name, bytes = text.len(), "snapshot read");
    Ok(Snapshot::from_json(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowdb_core::{doc, Database};
    use tempfile::TempDir;

    #[test]
    fn reads_snapshot_saved_to_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        let mut db = Database::open("shop", Box::new(store));
        db.migration("parts", |t| {
            t.string("name").not_nullable();
        })
        .unwrap();
        db.query("parts")
            .insert([doc! { "name" => "bolt" }, doc! { "name" => "nut" }])
            .execute()
            .unwrap();
        db.save().unwrap();

        let snapshot = read_snapshot(temp_dir.path(), "shop").unwrap();
        assert_eq!(snapshot.record_count(), 2);
        assert!(read_snapshot(temp_dir.path(), "other").is_err());
        assert!(read_snapshot(&temp_dir.path().join("missing"), "shop").is_err());
    }
}
