//! Query descriptions and their borrowed builder.

use super::filter::Filter;
use crate::database::Database;
use crate::error::CoreResult;
use crate::record::Record;
use crate::value::Document;

/// What a query does when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Insert the payload.
    Insert,
    /// Apply the patch to matching records.
    Update,
    /// Remove matching records.
    Delete,
    /// Read matching records.
    Select,
}

/// A detached description of one read or write against a collection.
///
/// Several intents may be set; execution picks one by precedence:
/// insert, then update, then delete, then select.
///
/// # Example
///
/// ```rust
/// use stowdb_core::{doc, Filter, Intent, Query};
///
/// let query = Query::new("users")
///     .filter(Filter::new().gt("age", 30))
///     .select(["name", "email"]);
/// assert_eq!(query.intent(), Intent::Select);
///
/// let insert = Query::new("users").insert_one(doc! { "name" => "Ada" }).delete();
/// assert_eq!(insert.intent(), Intent::Insert);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    collection: String,
    projection: Vec<String>,
    filter: Filter,
    insert: Option<Vec<Document>>,
    update: Option<Document>,
    delete: bool,
}

impl Query {
    /// Starts a query against `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Returns the target collection.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Limits results to the listed user fields.
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the predicate. Insert ignores it.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the documents to insert.
    #[must_use]
    pub fn insert<I>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        self.insert = Some(documents.into_iter().collect());
        self
    }

    /// Sets a single document to insert.
    #[must_use]
    pub fn insert_one(self, document: Document) -> Self {
        self.insert([document])
    }

    /// Sets the patch applied to matching records.
    #[must_use]
    pub fn update(mut self, patch: Document) -> Self {
        self.update = Some(patch);
        self
    }

    /// Marks matching records for removal.
    #[must_use]
    pub fn delete(mut self) -> Self {
        self.delete = true;
        self
    }

    /// Returns the intent execution will carry out.
    #[must_use]
    pub fn intent(&self) -> Intent {
        if self.insert.is_some() {
            Intent::Insert
        } else if self.update.is_some() {
            Intent::Update
        } else if self.delete {
            Intent::Delete
        } else {
            Intent::Select
        }
    }

    /// Returns the projection; empty means every field.
    #[must_use]
    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    /// Returns the predicate.
    #[must_use]
    pub fn predicate(&self) -> &Filter {
        &self.filter
    }

    pub(crate) fn into_parts(self) -> QueryParts {
        QueryParts {
            intent: self.intent(),
            collection: self.collection,
            projection: self.projection,
            filter: self.filter,
            insert: self.insert.unwrap_or_default(),
            update: self.update.unwrap_or_default(),
        }
    }
}

/// A query taken apart for execution.
pub(crate) struct QueryParts {
    pub(crate) intent: Intent,
    pub(crate) collection: String,
    pub(crate) projection: Vec<String>,
    pub(crate) filter: Filter,
    pub(crate) insert: Vec<Document>,
    pub(crate) update: Document,
}

impl QueryParts {
    pub(crate) fn project(&self, records: Vec<Record>) -> Vec<Record> {
        if self.projection.is_empty() {
            return records;
        }
        records
            .iter()
            .map(|record| record.project(&self.projection))
            .collect()
    }
}

/// A [`Query`] bound to the database it will run against.
///
/// Returned by [`Database::query`]. The builder holds the database
/// borrowed until it is executed or dropped.
///
/// # Example
///
/// ```rust
/// use stowdb_core::{doc, Database, Filter, Value};
///
/// let mut db = Database::open_in_memory("app");
/// db.migration("users", |t| {
///     t.string("name");
///     t.integer("age");
/// })
/// .unwrap();
///
/// db.query("users").insert_one(doc! { "name" => "Tom", "age" => "31" }).execute().unwrap();
/// let found = db
///     .query("users")
///     .filter(Filter::new().eq("name", "Tom"))
///     .execute()
///     .unwrap();
/// assert_eq!(found[0].value("age"), Value::Integer(31));
/// ```
#[must_use = "a query does nothing until executed"]
pub struct QueryBuilder<'db> {
    db: &'db mut Database,
    query: Query,
}

impl<'db> QueryBuilder<'db> {
    pub(crate) fn new(db: &'db mut Database, collection: impl Into<String>) -> Self {
        Self {
            db,
            query: Query::new(collection),
        }
    }

    /// Limits results to the listed user fields.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query = self.query.select(fields);
        self
    }

    /// Sets the predicate.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query = self.query.filter(filter);
        self
    }

    /// Sets the documents to insert.
    pub fn insert<I>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        self.query = self.query.insert(documents);
        self
    }

    /// Sets a single document to insert.
    pub fn insert_one(mut self, document: Document) -> Self {
        self.query = self.query.insert_one(document);
        self
    }

    /// Sets the patch applied to matching records.
    pub fn update(mut self, patch: Document) -> Self {
        self.query = self.query.update(patch);
        self
    }

    /// Marks matching records for removal.
    pub fn delete(mut self) -> Self {
        self.query = self.query.delete();
        self
    }

    /// Returns the description built so far.
    #[must_use]
    pub fn as_query(&self) -> &Query {
        &self.query
    }

    /// Runs the query.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::CollectionNotFound`] if the collection is
    /// not registered.
    pub fn execute(self) -> CoreResult<Vec<Record>> {
        self.db.execute(self.query)
    }
}
