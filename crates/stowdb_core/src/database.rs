//! Database facade.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::query::{Intent, Query, QueryBuilder};
use crate::record::{IdGenerator, RandomIdGenerator, Record, RecordId, ID_FIELD};
use crate::schema::{Schema, SchemaBuilder};
use crate::snapshot::{load_order, CollectionSnapshot, LoadReport, Snapshot};
use crate::table::{Registry, Table, WriteContext};
use crate::value::{Document, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use stowdb_storage::{InMemoryStore, KeyValueStore};
use tracing::{debug, info, warn};

/// Old-to-new record IDs of one restored collection.
type IdMap = HashMap<RecordId, RecordId>;

/// A named registry of collections, saved to a key-value store as one
/// snapshot.
///
/// # Example
///
/// ```rust
/// use stowdb_core::{doc, Database};
///
/// let mut db = Database::open_in_memory("app");
/// db.migration("users", |t| {
///     t.string("name").not_nullable();
///     t.string("email").unique();
/// })
/// .unwrap()
/// .migration("colors", |t| {
///     t.string("user_id").references("id").from_table("users");
///     t.integer("color");
/// })
/// .unwrap();
///
/// let user = db.query("users").insert_one(doc! { "name" => "Ada" }).execute().unwrap();
/// let owner = user[0].id().to_string();
/// db.query("colors").insert_one(doc! { "user_id" => owner, "color" => 3 }).execute().unwrap();
///
/// db.save().unwrap();
/// let report = db.load_from_store().unwrap().unwrap();
/// assert_eq!(report.total_restored(), 2);
/// ```
pub struct Database {
    name: String,
    config: Config,
    tables: BTreeMap<String, Table>,
    store: Box<dyn KeyValueStore>,
    ids: Box<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Database {
    /// Opens a database saving to `store` under `name`.
    ///
    /// Nothing is read from the store until [`Database::load_from_store`].
    pub fn open(name: impl Into<String>, store: Box<dyn KeyValueStore>) -> Self {
        Self::open_with_config(name, Config::default(), store)
    }

    /// Opens a database with a custom configuration.
    pub fn open_with_config(
        name: impl Into<String>,
        config: Config,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            tables: BTreeMap::new(),
            store,
            ids: Box::new(RandomIdGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    /// Opens a database backed by a fresh in-memory store.
    pub fn open_in_memory(name: impl Into<String>) -> Self {
        Self::open(name, Box::new(InMemoryStore::new()))
    }

    /// Replaces the source of record IDs and generated tokens.
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Replaces the source of timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the database name, which is also its store key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    // ---------------------------------------------------------------------
    // Registry
    // ---------------------------------------------------------------------

    /// Declares a collection through a fresh [`SchemaBuilder`] and
    /// registers it.
    ///
    /// Returns `self` so migrations can be chained.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid or the name is taken.
    pub fn migration<F>(&mut self, name: impl Into<String>, declare: F) -> CoreResult<&mut Self>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        let mut builder = SchemaBuilder::new();
        declare(&mut builder);
        let schema = builder.build()?;
        self.register(name, schema)?;
        Ok(self)
    }

    /// Registers a collection with an already built schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or already registered.
    pub fn register(&mut self, name: impl Into<String>, schema: Schema) -> CoreResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::invalid_schema("collection name is empty"));
        }
        if self.tables.contains_key(&name) {
            return Err(CoreError::collection_already_exists(name));
        }
        debug!(
            database = %self.name,
            collection = %name,
            fields = schema.fields().len(),
            "collection registered"
        );
        self.tables.insert(name.clone(), Table::new(name, schema));
        Ok(())
    }

    /// Removes a collection and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] if it is not registered.
    pub fn drop_table(&mut self, name: &str) -> CoreResult<Table> {
        let table = self
            .tables
            .remove(name)
            .ok_or_else(|| CoreError::collection_not_found(name))?;
        debug!(database = %self.name, collection = name, "collection dropped");
        Ok(table)
    }

    /// Returns a collection by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Returns `true` if a collection is registered under `name`.
    #[must_use]
    pub fn has_collection(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Iterates over registered collection names in order.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Installs a save-hook on a collection, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] if it is not registered.
    pub fn set_save_hook<F>(&mut self, name: &str, hook: F) -> CoreResult<()>
    where
        F: Fn(Document) -> Document + Send + Sync + 'static,
    {
        self.table_mut(name)?.set_save_hook(Some(Arc::new(hook)));
        Ok(())
    }

    /// Removes the save-hook of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] if it is not registered.
    pub fn clear_save_hook(&mut self, name: &str) -> CoreResult<()> {
        self.table_mut(name)?.set_save_hook(None);
        Ok(())
    }

    /// Checks that every declared reference can be resolved: the target
    /// collection is registered and the target field is `id` or unique.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidReference`] for the first bad reference.
    pub fn check_references(&self) -> CoreResult<()> {
        for (name, table) in &self.tables {
            for (field, target) in table.schema().references() {
                let Some(target_table) = self.tables.get(&target.table) else {
                    return Err(CoreError::invalid_reference(
                        name,
                        field,
                        format!("collection '{}' is not registered", target.table),
                    ));
                };
                if target.field != ID_FIELD && !target_table.schema().is_unique(&target.field) {
                    return Err(CoreError::invalid_reference(
                        name,
                        field,
                        format!("'{}.{}' is not an id or unique field", target.table, target.field),
                    ));
                }
            }
        }
        Ok(())
    }

    fn table_mut(&mut self, name: &str) -> CoreResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    /// Runs `f` on a collection detached from the registry, so the other
    /// collections can serve reference lookups meanwhile.
    fn with_table<R, F>(&mut self, name: &str, f: F) -> CoreResult<R>
    where
        F: FnOnce(&mut Table, &mut WriteContext<'_>) -> R,
    {
        let mut table = self
            .tables
            .remove(name)
            .ok_or_else(|| CoreError::collection_not_found(name))?;
        let result = {
            let registry = Registry(&self.tables);
            let mut ctx = WriteContext::new(&registry, self.ids.as_mut(), self.clock.as_ref())
                .verbose(self.config.verbose);
            f(&mut table, &mut ctx)
        };
        self.tables.insert(name.to_string(), table);
        Ok(result)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Starts a query against a collection.
    pub fn query(&mut self, name: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder::new(self, name)
    }

    /// Runs a prepared query.
    ///
    /// Returns the inserted, updated, deleted or selected records, with
    /// the query's projection applied.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] if the collection is not
    /// registered.
    pub fn execute(&mut self, query: Query) -> CoreResult<Vec<Record>> {
        let mut parts = query.into_parts();
        let insert = std::mem::take(&mut parts.insert);
        let patch = std::mem::take(&mut parts.update);
        let filter = parts.filter.clone();
        let intent = parts.intent;

        let records = self.with_table(&parts.collection, |table, ctx| match intent {
            Intent::Insert => table.insert(insert, ctx),
            Intent::Update => table.update(|record| filter.matches(record), patch, ctx),
            Intent::Delete => table.delete(|record| filter.matches(record)),
            Intent::Select => table.select(|record| filter.matches(record)),
        })?;
        debug!(
            database = %self.name,
            collection = %parts.collection,
            ?intent,
            records = records.len(),
            "query executed"
        );
        Ok(parts.project(records))
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Captures every collection's records.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for (name, table) in &self.tables {
            snapshot.insert(name.clone(), CollectionSnapshot::from_records(table.records()));
        }
        snapshot
    }

    /// Renders the current snapshot as text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        self.snapshot().to_json(self.config.pretty_snapshots)
    }

    /// Writes the snapshot to the store under the database name.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub fn save(&mut self) -> CoreResult<()> {
        let text = self.to_json()?;
        self.store.set(&self.name, &text)?;
        info!(
            database = %self.name,
            collections = self.tables.len(),
            bytes = text.len(),
            "database saved"
        );
        Ok(())
    }

    /// Returns `true` if the store holds a saved database called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails.
    pub fn exists(&self, name: &str) -> CoreResult<bool> {
        Ok(self.store.contains(name)?)
    }

    /// Loads the snapshot saved under the database name, if there is one.
    ///
    /// # Errors
    ///
    /// See [`Database::load`].
    pub fn load_from_store(&mut self) -> CoreResult<Option<LoadReport>> {
        let Some(text) = self.store.get(&self.name)? else {
            debug!(database = %self.name, "nothing saved yet");
            return Ok(None);
        };
        self.load(&text).map(Some)
    }

    /// Replaces all records with those of a snapshot, keeping the
    /// registered schemas.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a snapshot, the collections
    /// reference each other in a cycle, or `strict_load` is set and the
    /// snapshot names unregistered collections. Nothing is changed in
    /// those cases.
    pub fn load(&mut self, text: &str) -> CoreResult<LoadReport> {
        let snapshot = Snapshot::from_json(text)?;
        self.reload(snapshot)
    }

    /// Drops every collection, lets `migrate` register them again, then
    /// restores the snapshot's records into them.
    ///
    /// # Errors
    ///
    /// As [`Database::load`], plus any error returned by `migrate`. On
    /// error the previous collections and their records are put back.
    pub fn load_with<F>(&mut self, text: &str, migrate: F) -> CoreResult<LoadReport>
    where
        F: FnOnce(&mut Self) -> CoreResult<()>,
    {
        let snapshot = Snapshot::from_json(text)?;
        let previous = std::mem::take(&mut self.tables);
        let result = migrate(self).and_then(|()| self.reload(snapshot));
        if result.is_err() {
            self.tables = previous;
        }
        result
    }

    fn reload(&mut self, snapshot: Snapshot) -> CoreResult<LoadReport> {
        let mut collections = snapshot.into_collections();
        let mut report = LoadReport::default();

        let unknown: Vec<String> = collections
            .keys()
            .filter(|name| !self.tables.contains_key(*name))
            .cloned()
            .collect();
        if !unknown.is_empty() && self.config.strict_load {
            return Err(CoreError::invalid_snapshot(format!(
                "no schema registered for: {}",
                unknown.join(", ")
            )));
        }

        let dependencies: BTreeMap<String, BTreeSet<String>> = self
            .tables
            .iter()
            .map(|(name, table)| {
                let targets = table
                    .schema()
                    .references()
                    .map(|(_, target)| target.table.clone())
                    .collect();
                (name.clone(), targets)
            })
            .collect();
        let order = load_order(&dependencies)?;

        for name in unknown {
            warn!(database = %self.name, collection = %name, "snapshot collection has no schema; skipped");
            collections.remove(&name);
            report.skipped.push(name);
        }
        for table in self.tables.values_mut() {
            table.clear();
        }

        let mut remapped: HashMap<String, IdMap> = HashMap::new();
        for name in order {
            let archived = collections
                .remove(&name)
                .map(CollectionSnapshot::into_chronological)
                .unwrap_or_default();
            let (restored, rejected, ids) = self.restore_collection(&name, archived, &remapped)?;
            report.restored.insert(name.clone(), restored);
            report.rejected.insert(name.clone(), rejected);
            remapped.insert(name, ids);
        }

        info!(
            database = %self.name,
            restored = report.total_restored(),
            rejected = report.total_rejected(),
            skipped = report.skipped.len(),
            "snapshot loaded"
        );
        Ok(report)
    }

    /// Re-admits archived records under fresh IDs.
    ///
    /// Records referencing not-yet-restored records of the same collection,
    /// by ID or by unique value, wait for a later pass; whatever cannot
    /// make progress is rejected.
    fn restore_collection(
        &mut self,
        name: &str,
        archived: Vec<Record>,
        remapped: &HashMap<String, IdMap>,
    ) -> CoreResult<(usize, usize, IdMap)> {
        self.with_table(name, |table, ctx| {
            let id_references: Vec<(String, String)> = table
                .schema()
                .references()
                .filter(|(_, target)| target.field == ID_FIELD)
                .map(|(field, target)| (field.to_string(), target.table.clone()))
                .collect();
            let archived_ids: HashSet<RecordId> = archived.iter().map(Record::id).collect();

            let mut own = IdMap::new();
            let mut restored = 0;
            let mut rejected = 0;
            let mut pending = archived;
            while !pending.is_empty() {
                let mut waiting = Vec::new();
                let mut progressed = false;
                for record in pending {
                    let remap = RemapScope {
                        collection: name,
                        own: &own,
                        others: remapped,
                        archived: &archived_ids,
                    };
                    let Some(fields) = remap.rewrite(&record, &id_references) else {
                        waiting.push(record);
                        continue;
                    };
                    match table.restore(fields, record.created_at(), record.updated_at(), ctx) {
                        Ok(fresh) => {
                            own.insert(record.id(), fresh.id());
                            restored += 1;
                            progressed = true;
                        }
                        Err(ValidationError::MissingReference { table: target, .. })
                            if target == name =>
                        {
                            waiting.push(record);
                        }
                        Err(error) => {
                            warn!(collection = name, archived_id = %record.id(), %error, "archived record rejected");
                            rejected += 1;
                        }
                    }
                }
                if !progressed {
                    for record in &waiting {
                        warn!(
                            collection = name,
                            archived_id = %record.id(),
                            "archived record references a record that was never restored; rejected"
                        );
                    }
                    rejected += waiting.len();
                    break;
                }
                pending = waiting;
            }
            (restored, rejected, own)
        })
    }
}

/// What a record's `id` references can be rewritten with.
struct RemapScope<'a> {
    collection: &'a str,
    own: &'a IdMap,
    others: &'a HashMap<String, IdMap>,
    archived: &'a HashSet<RecordId>,
}

impl RemapScope<'_> {
    /// Returns the record's fields with every `id` reference pointing at
    /// the new ID, or `None` if a referenced record of the same collection
    /// has not been restored yet.
    ///
    /// Values with no mapping are left as they are and fail validation.
    fn rewrite(&self, record: &Record, id_references: &[(String, String)]) -> Option<Document> {
        let mut fields = record.fields().clone();
        for (field, target) in id_references {
            let Some(old) = fields.get(field).and_then(Value::as_text).and_then(RecordId::parse)
            else {
                continue;
            };
            let same_collection = target == self.collection;
            let map = if same_collection {
                Some(self.own)
            } else {
                self.others.get(target)
            };
            match map.and_then(|ids| ids.get(&old)) {
                Some(new) => {
                    fields.insert(field.clone(), Value::Text(new.to_string()));
                }
                None if same_collection && self.archived.contains(&old) => return None,
                None => {}
            }
        }
        Some(fields)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("collections", &self.tables.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::doc;
    use crate::query::Filter;
    use crate::record::SeededIdGenerator;

    fn app() -> (Database, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let mut db = Database::open_in_memory("app")
            .with_id_generator(SeededIdGenerator::new(7))
            .with_clock(clock.clone());
        db.migration("users", |t| {
            t.string("name").not_nullable();
            t.string("email").unique();
        })
        .unwrap()
        .migration("colors", |t| {
            t.string("user_id").references("id").from_table("users");
            t.integer("color");
        })
        .unwrap();
        (db, clock)
    }

    fn insert(db: &mut Database, collection: &str, document: Document) -> Record {
        let mut inserted = db.query(collection).insert_one(document).execute().unwrap();
        assert_eq!(inserted.len(), 1, "insert into {collection} was rejected");
        inserted.remove(0)
    }

    fn all(db: &mut Database, collection: &str) -> Vec<Record> {
        db.query(collection).execute().unwrap()
    }

    #[test]
    fn duplicate_migration_is_rejected() {
        let (mut db, _) = app();
        let err = db.migration("users", |t| {
            t.string("name");
        });
        assert!(matches!(err, Err(CoreError::CollectionAlreadyExists { .. })));
    }

    #[test]
    fn invalid_schema_registers_nothing() {
        let (mut db, _) = app();
        let err = db.migration("broken", |t| {
            t.string("a");
            t.string("a");
        });
        assert!(matches!(err, Err(CoreError::InvalidSchema { .. })));
        assert!(!db.has_collection("broken"));
    }

    #[test]
    fn unknown_collection_query_fails() {
        let (mut db, _) = app();
        let err = db.query("ghosts").execute().unwrap_err();
        assert!(matches!(err, CoreError::CollectionNotFound { .. }));
    }

    #[test]
    fn drop_table_removes_collection() {
        let (mut db, _) = app();
        insert(&mut db, "users", doc! { "name" => "Ada" });
        let dropped = db.drop_table("users").unwrap();
        assert_eq!(dropped.len(), 1);
        assert!(!db.has_collection("users"));
        assert!(db.drop_table("users").is_err());
    }

    #[test]
    fn collection_names_are_sorted() {
        let (db, _) = app();
        assert_eq!(db.collection_names().collect::<Vec<_>>(), ["colors", "users"]);
    }

    #[test]
    fn check_references_reports_bad_targets() {
        let (mut db, _) = app();
        assert!(db.check_references().is_ok());

        db.migration("login", |t| {
            t.string("email").references("email").from_table("users");
        })
        .unwrap();
        assert!(db.check_references().is_ok());

        db.migration("badges", |t| {
            t.string("name").references("name").from_table("users");
        })
        .unwrap();
        let err = db.check_references().unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { ref collection, .. } if collection == "badges"));

        db.drop_table("badges").unwrap();
        db.migration("orphans", |t| {
            t.string("owner").references("id").from_table("nowhere");
        })
        .unwrap();
        assert!(db.check_references().is_err());
    }

    #[test]
    fn references_are_checked_across_collections() {
        let (mut db, _) = app();
        let ada = insert(&mut db, "users", doc! { "name" => "Ada" });

        let ok = db
            .query("colors")
            .insert_one(doc! { "user_id" => ada.id().to_string(), "color" => 3 })
            .execute()
            .unwrap();
        assert_eq!(ok.len(), 1);

        let missing = db
            .query("colors")
            .insert_one(doc! { "user_id" => RecordId::new().to_string(), "color" => 4 })
            .execute()
            .unwrap();
        assert!(missing.is_empty());
        assert_eq!(db.table("colors").unwrap().len(), 1);
    }

    #[test]
    fn select_update_delete() {
        let (mut db, clock) = app();
        insert(&mut db, "users", doc! { "name" => "Ada", "email" => "ada@example.com" });
        insert(&mut db, "users", doc! { "name" => "Tom" });

        let tom = Filter::new().eq("name", "Tom");
        let projected = db.query("users").filter(tom.clone()).select(["email"]).execute().unwrap();
        assert_eq!(projected.len(), 1);
        assert!(projected[0].get("name").is_none());
        assert!(projected[0].get("email").is_none());

        clock.advance(10);
        let updated = db
            .query("users")
            .filter(tom.clone())
            .update(doc! { "email" => "tom@example.com" })
            .execute()
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].updated_at(), 1_010);

        let deleted = db.query("users").filter(tom).delete().execute().unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(all(&mut db, "users").len(), 1);
    }

    #[test]
    fn save_hook_can_be_replaced_and_cleared() {
        let (mut db, _) = app();
        db.set_save_hook("users", |mut document| {
            document.insert("email".into(), Value::from("hooked@example.com"));
            document
        })
        .unwrap();
        let hooked = insert(&mut db, "users", doc! { "name" => "Ada" });
        assert_eq!(hooked.value("email"), Value::from("hooked@example.com"));

        db.clear_save_hook("users").unwrap();
        let plain = insert(&mut db, "users", doc! { "name" => "Tom" });
        assert!(plain.value("email").is_null());

        assert!(db.set_save_hook("ghosts", |d| d).is_err());
    }

    #[test]
    fn load_from_empty_store_is_none() {
        let (mut db, _) = app();
        assert!(!db.exists("app").unwrap());
        assert!(db.load_from_store().unwrap().is_none());
    }

    #[test]
    fn save_then_load_remaps_references() {
        let (mut db, clock) = app();
        let ada = insert(&mut db, "users", doc! { "name" => "Ada", "email" => "ada@example.com" });
        clock.advance(1);
        insert(&mut db, "colors", doc! { "user_id" => ada.id().to_string(), "color" => 3 });

        db.save().unwrap();
        assert!(db.exists("app").unwrap());

        let report = db.load_from_store().unwrap().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.restored["users"], 1);
        assert_eq!(report.restored["colors"], 1);

        let users = all(&mut db, "users");
        let colors = all(&mut db, "colors");
        assert_ne!(users[0].id(), ada.id());
        assert_eq!(users[0].created_at(), ada.created_at());
        assert_eq!(colors[0].value("user_id"), Value::Text(users[0].id().to_string()));
    }

    #[test]
    fn load_replaces_existing_records() {
        let (mut db, _) = app();
        insert(&mut db, "users", doc! { "name" => "Ada" });
        let text = db.to_json().unwrap();
        insert(&mut db, "users", doc! { "name" => "Tom" });

        db.load(&text).unwrap();
        let users = all(&mut db, "users");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].value("name"), Value::from("Ada"));
    }

    #[test]
    fn dangling_reference_is_rejected_on_load() {
        let (mut db, _) = app();
        let ada = insert(&mut db, "users", doc! { "name" => "Ada" });
        insert(&mut db, "colors", doc! { "user_id" => ada.id().to_string(), "color" => 1 });

        let mut snapshot = db.snapshot();
        snapshot.insert("users", CollectionSnapshot::default());
        let report = db.load(&snapshot.to_json(false).unwrap()).unwrap();

        assert_eq!(report.rejected["colors"], 1);
        assert!(all(&mut db, "colors").is_empty());
    }

    #[test]
    fn self_references_wait_for_their_target() {
        let clock = Arc::new(ManualClock::new(0));
        let mut db = Database::open_in_memory("tree").with_clock(clock.clone());
        db.migration("nodes", |t| {
            t.string("label");
            t.string("parent").references("id").from_table("nodes");
        })
        .unwrap();

        let leaf = insert(&mut db, "nodes", doc! { "label" => "leaf" });
        clock.advance(1);
        let root = insert(&mut db, "nodes", doc! { "label" => "root" });
        db.query("nodes")
            .filter(Filter::new().eq("label", "leaf"))
            .update(doc! { "parent" => root.id().to_string() })
            .execute()
            .unwrap();
        assert_ne!(leaf.id(), root.id());

        let text = db.to_json().unwrap();
        let report = db.load(&text).unwrap();
        assert_eq!(report.restored["nodes"], 2);

        let nodes = all(&mut db, "nodes");
        let new_root = nodes.iter().find(|n| n.value("label") == Value::from("root")).unwrap();
        let new_leaf = nodes.iter().find(|n| n.value("label") == Value::from("leaf")).unwrap();
        assert_eq!(new_leaf.value("parent"), Value::Text(new_root.id().to_string()));
    }

    #[test]
    fn unknown_collections_are_skipped_or_refused() {
        let (mut db, _) = app();
        let text = r#"{"ghosts": {"records": {}}}"#;

        let report = db.load(text).unwrap();
        assert_eq!(report.skipped, vec!["ghosts".to_string()]);

        let mut strict = Database::open_with_config(
            "strict",
            Config::new().strict_load(true),
            Box::new(InMemoryStore::new()),
        );
        strict
            .migration("users", |t| {
                t.string("name");
            })
            .unwrap();
        strict.query("users").insert_one(doc! { "name" => "kept" }).execute().unwrap();
        assert!(matches!(strict.load(text), Err(CoreError::InvalidSnapshot { .. })));
        assert_eq!(strict.table("users").unwrap().len(), 1);
    }

    #[test]
    fn reference_cycles_refuse_to_load() {
        let mut db = Database::open_in_memory("cyclic");
        db.migration("a", |t| {
            t.string("b_id").references("id").from_table("b");
        })
        .unwrap()
        .migration("b", |t| {
            t.string("a_id").references("id").from_table("a");
        })
        .unwrap();

        let err = db.load("{}").unwrap_err();
        assert!(matches!(err, CoreError::ReferenceCycle { .. }));
    }

    #[test]
    fn load_with_replays_migrations() {
        let (mut db, _) = app();
        insert(&mut db, "users", doc! { "name" => "Ada", "email" => "ada@example.com" });
        let text = db.to_json().unwrap();

        let report = db
            .load_with(&text, |db| {
                db.migration("users", |t| {
                    t.string("name").not_nullable();
                    t.string("email").unique();
                    t.integer("age").default(18);
                })?;
                Ok(())
            })
            .unwrap();

        assert_eq!(report.restored["users"], 1);
        assert_eq!(report.skipped, vec!["colors".to_string()]);
        assert!(!db.has_collection("colors"));
        assert_eq!(all(&mut db, "users")[0].value("age"), Value::Integer(18));
    }

    #[test]
    fn failed_load_with_keeps_previous_collections() {
        let (mut db, _) = app();
        insert(&mut db, "users", doc! { "name" => "Ada", "email" => "ada@example.com" });
        let text = db.to_json().unwrap();

        let err = db
            .load_with(&text, |db| {
                db.migration("a", |t| {
                    t.string("b_id").references("id").from_table("b");
                })?
                .migration("b", |t| {
                    t.string("a_id").references("id").from_table("a");
                })?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::ReferenceCycle { .. }));
        assert_eq!(db.collection_names().collect::<Vec<_>>(), ["colors", "users"]);
        assert_eq!(all(&mut db, "users").len(), 1);

        let err = db
            .load_with(&text, |db| {
                db.migration("users", |t| {
                    t.string("name");
                })?;
                db.migration("users", |t| {
                    t.string("name");
                })?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::CollectionAlreadyExists { .. }));
        assert_eq!(all(&mut db, "users").len(), 1);
    }

    #[test]
    fn pretty_snapshots_are_indented() {
        let mut db = Database::open_with_config(
            "pretty",
            Config::new().pretty_snapshots(true),
            Box::new(InMemoryStore::new()),
        );
        db.migration("users", |t| {
            t.string("name");
        })
        .unwrap();
        assert!(db.to_json().unwrap().contains('\n'));
    }
}
