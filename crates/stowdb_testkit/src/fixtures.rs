//! Test fixtures and database helpers.
//!
//! Provides an application-shaped schema set and convenience functions
//! for setting up test databases over either store.

use std::sync::Arc;
use stowdb_core::{
    doc, CoreResult, Database, Document, Filter, ManualClock, Record, SeededIdGenerator, Value,
};
use stowdb_storage::{FileStore, InMemoryStore, KeyValueStore};
use tempfile::TempDir;

/// Name every fixture database is saved under.
pub const APP_NAME: &str = "brick-order-app";

/// Timestamp the fixture clock starts at.
pub const START_TIME: u64 = 1_700_000_000_000;

/// Seed of the fixture ID generator.
pub const ID_SEED: u64 = 42;

/// Registers the fixture collections.
///
/// - `users`: `name` (required), `age`, `is_on_mailing_list` (default
///   `true`), `gender` (default `"male"`), `email` (unique)
/// - `login`: `email` (unique, references `users.email`), `password`
/// - `colors`: `user_id` (references `users.id`), `color`
/// - `parts`: `description`, `design_id`, `material_id` (unique),
///   `color_id`, `type` (default `"OTHER"`), `basic_element` (default `false`)
/// - `onsave`: `name`, rewritten to `"OnSave Ran"` by a save-hook
/// - `increments`: `serial` (auto-increment), `uuid`, `name`
///
/// # Errors
///
/// Returns an error if any collection is already registered.
pub fn app_migrations(db: &mut Database) -> CoreResult<()> {
    db.migration("users", |t| {
        t.string("name").not_nullable();
        t.integer("age");
        t.boolean("is_on_mailing_list").not_nullable().default(true);
        t.string("gender").default("male");
        t.string("email").not_nullable().unique();
    })?
    .migration("login", |t| {
        t.string("email")
            .not_nullable()
            .unique()
            .references("email")
            .from_table("users");
        t.string("password").not_nullable();
    })?
    .migration("colors", |t| {
        t.string("user_id").not_nullable().references("id").from_table("users");
        t.integer("color").not_nullable();
    })?
    .migration("parts", |t| {
        t.string("description");
        t.integer("design_id");
        t.integer("material_id").unique();
        t.integer("color_id").not_nullable();
        t.string("type").not_nullable().default("OTHER");
        t.boolean("basic_element").not_nullable().default(false);
    })?
    .migration("onsave", |t| {
        t.string("name");
        t.on_save(|mut record| {
            record.insert("name".into(), Value::from("OnSave Ran"));
            record
        });
    })?
    .migration("increments", |t| {
        t.increment("serial");
        t.uuid("uuid");
        t.string("name");
    })?;
    Ok(())
}

enum StoreHandle {
    Memory(InMemoryStore),
    File(TempDir),
}

/// A fixture database with a manual clock and automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The clock the database reads timestamps from.
    pub clock: Arc<ManualClock>,
    store: StoreHandle,
}

impl TestDatabase {
    /// Creates an in-memory database with the fixture collections.
    pub fn app() -> Self {
        let store = InMemoryStore::new();
        let clock = Arc::new(ManualClock::new(START_TIME));
        let db = open_app(Box::new(store.clone()), &clock, ID_SEED);
        Self {
            db,
            clock,
            store: StoreHandle::Memory(store),
        }
    }

    /// Creates a file-backed database with the fixture collections.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(temp_dir.path()).expect("Failed to open file store");
        let clock = Arc::new(ManualClock::new(START_TIME));
        let db = open_app(Box::new(store), &clock, ID_SEED);
        Self {
            db,
            clock,
            store: StoreHandle::File(temp_dir),
        }
    }

    /// Opens a second database over the same store, with the fixture
    /// collections registered but nothing loaded.
    pub fn reopen(&self) -> Database {
        let store: Box<dyn KeyValueStore> = match &self.store {
            StoreHandle::Memory(store) => Box::new(store.clone()),
            StoreHandle::File(dir) => {
                Box::new(FileStore::open(dir.path()).expect("Failed to reopen file store"))
            }
        };
        open_app(store, &self.clock, ID_SEED + 1)
    }

    /// Moves the clock forward.
    pub fn advance(&self, millis: u64) {
        self.clock.advance(millis);
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl std::ops::DerefMut for TestDatabase {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}

fn open_app(store: Box<dyn KeyValueStore>, clock: &Arc<ManualClock>, seed: u64) -> Database {
    let mut db = Database::open(APP_NAME, store)
        .with_id_generator(SeededIdGenerator::new(seed))
        .with_clock(clock.clone());
    app_migrations(&mut db).expect("Failed to register fixture collections");
    db
}

/// Runs a test with a fresh in-memory fixture database.
pub fn with_app_db<F, R>(f: F) -> R
where
    F: FnOnce(&mut TestDatabase) -> R,
{
    let mut test_db = TestDatabase::app();
    f(&mut test_db)
}

/// Inserts one document, returning the stored record if it was accepted.
pub fn try_insert(db: &mut Database, collection: &str, document: Document) -> Option<Record> {
    db.query(collection)
        .insert_one(document)
        .execute()
        .expect("Failed to run insert")
        .pop()
}

/// Inserts one document that must be accepted.
pub fn insert(db: &mut Database, collection: &str, document: Document) -> Record {
    try_insert(db, collection, document)
        .unwrap_or_else(|| panic!("insert into '{collection}' was rejected"))
}

/// Inserts a user that must be accepted.
pub fn insert_user(db: &mut Database, name: &str, email: Option<&str>) -> Record {
    let mut document = doc! { "name" => name };
    if let Some(email) = email {
        document.insert("email".into(), Value::from(email));
    }
    insert(db, "users", document)
}

/// Returns the records of a collection matching `filter`.
pub fn select_where(db: &mut Database, collection: &str, filter: Filter) -> Vec<Record> {
    db.query(collection)
        .filter(filter)
        .execute()
        .expect("Failed to run select")
}

/// Returns every record of a collection.
pub fn select_all(db: &mut Database, collection: &str) -> Vec<Record> {
    select_where(db, collection, Filter::new())
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a fixture database with `user_count` users, each with a
    /// login and a favourite color.
    pub fn populated_app(user_count: usize) -> TestDatabase {
        let mut test_db = TestDatabase::app();
        for i in 0..user_count {
            let email = format!("user{i}@example.com");
            let user = insert_user(&mut test_db, &format!("User {i}"), Some(&email));
            test_db.advance(1);
            insert(
                &mut test_db,
                "login",
                doc! { "email" => email, "password" => "secret" },
            );
            insert(
                &mut test_db,
                "colors",
                doc! { "user_id" => user.id().to_string(), "color" => i64::try_from(i).unwrap_or(i64::MAX) },
            );
            test_db.advance(1);
        }
        test_db
    }
}
