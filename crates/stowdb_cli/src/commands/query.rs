//! Query command implementation.

use super::read_snapshot;
use std::path::Path;
use stowdb_core::{Filter, Record, Snapshot};

/// What to print from one collection.
#[derive(Debug, Default)]
pub struct Request {
    /// Collection to read.
    pub collection: String,
    /// Filter as JSON.
    pub filter: Option<String>,
    /// Fields to keep.
    pub select: Vec<String>,
    /// Maximum number of records.
    pub limit: Option<usize>,
}

/// Runs the query command, printing one JSON record per line.
pub fn run(path: &Path, name: &str, request: &Request) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = read_snapshot(path, name)?;
    for record in select(&snapshot, request)? {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

fn select(snapshot: &Snapshot, request: &Request) -> Result<Vec<Record>, Box<dyn std::error::Error>> {
    let collection = snapshot
        .collection(&request.collection)
        .ok_or_else(|| format!("Collection '{}' not in snapshot", request.collection))?;
    let filter = match &request.filter {
        Some(text) => Filter::from_json(text)?,
        None => Filter::new(),
    };

    let mut records: Vec<&Record> = collection
        .entries()
        .map(|(_, record)| record)
        .filter(|record| filter.matches(record))
        .collect();
    records.sort_by_key(|record| record.created_at());

    Ok(records
        .into_iter()
        .take(request.limit.unwrap_or(usize::MAX))
        .map(|record| record.project(&request.select))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowdb_core::{doc, CollectionSnapshot, RecordId, Value};

    fn snapshot() -> Snapshot {
        let records = [
            Record::new(RecordId::new(), 3, 3, doc! { "name" => "Bob", "age" => 40 }),
            Record::new(RecordId::new(), 1, 1, doc! { "name" => "Tom", "age" => 31 }),
            Record::new(RecordId::new(), 2, 2, doc! { "name" => "Ann", "age" => 25 }),
        ];
        let mut snapshot = Snapshot::new();
        snapshot.insert("users", CollectionSnapshot::from_records(&records));
        snapshot
    }

    #[test]
    fn filters_and_orders_by_creation() {
        let request = Request {
            collection: "users".into(),
            filter: Some(r#"{"age": {"gt": 30}}"#.into()),
            ..Request::default()
        };
        let names: Vec<Value> = select(&snapshot(), &request)
            .unwrap()
            .iter()
            .map(|r| r.value("name"))
            .collect();
        assert_eq!(names, [Value::from("Tom"), Value::from("Bob")]);
    }

    #[test]
    fn projects_and_limits() {
        let request = Request {
            collection: "users".into(),
            select: vec!["name".into()],
            limit: Some(1),
            ..Request::default()
        };
        let records = select(&snapshot(), &request).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].get("age").is_none());
        assert_eq!(records[0].value("name"), Value::from("Tom"));
    }

    #[test]
    fn unknown_collection_and_bad_filter_fail() {
        let missing = Request {
            collection: "ghosts".into(),
            ..Request::default()
        };
        assert!(select(&snapshot(), &missing).is_err());

        let bad = Request {
            collection: "users".into(),
            filter: Some("[1]".into()),
            ..Request::default()
        };
        assert!(select(&snapshot(), &bad).is_err());
    }
}
