//! Insert, update, delete and restore.

use super::{Table, WriteContext};
use crate::error::ValidationError;
use crate::record::{strip_system_fields, IdGenerator, Record, RecordId, Timestamp};
use crate::schema::{FieldType, ValidationScope};
use crate::value::{Document, Value};

impl Table {
    /// Inserts documents one by one.
    ///
    /// Each document is accepted or rejected on its own; the result holds
    /// the accepted records in input order.
    pub fn insert<I>(&mut self, documents: I, ctx: &mut WriteContext<'_>) -> Vec<Record>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut inserted = Vec::new();
        for document in documents {
            match self.insert_one(document, ctx) {
                Ok(record) => inserted.push(record),
                Err(error) => self.log_rejection("insert", &error, ctx.verbose),
            }
        }
        inserted
    }

    /// Inserts one document.
    ///
    /// System keys are stripped, the save-hook runs, then the document is
    /// normalized, completed with defaults and generated values, and
    /// validated before it gets an ID and timestamps.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] the document fails.
    pub fn insert_one(
        &mut self,
        document: Document,
        ctx: &mut WriteContext<'_>,
    ) -> Result<Record, ValidationError> {
        if document.is_empty() {
            return Err(ValidationError::EmptyRecord);
        }
        let document = self
            .schema
            .apply_save_hook(strip_system_fields(document));
        let document = self.schema.normalize(document);
        let now = ctx.clock.now();
        self.admit(document, now, now, ctx)
    }

    /// Re-admits an archived record under a fresh ID.
    ///
    /// The save-hook is skipped and the archived timestamps are kept.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] the record fails.
    pub fn restore(
        &mut self,
        fields: Document,
        created_at: Timestamp,
        updated_at: Timestamp,
        ctx: &mut WriteContext<'_>,
    ) -> Result<Record, ValidationError> {
        let document = self.schema.normalize(strip_system_fields(fields));
        self.admit(document, created_at, updated_at.max(created_at), ctx)
    }

    fn admit(
        &mut self,
        mut document: Document,
        created_at: Timestamp,
        updated_at: Timestamp,
        ctx: &mut WriteContext<'_>,
    ) -> Result<Record, ValidationError> {
        self.schema.fill_defaults(&mut document);
        self.fill_generated(&mut document, ctx.ids);
        self.schema.validate(
            &document,
            &ValidationScope {
                own: self,
                exempt: &[],
                resolver: ctx.resolver,
            },
        )?;

        let id = self.fresh_id(ctx.ids);
        self.index_document(id, &document)?;
        self.advance_counters(&document);

        let record = Record::new(id, created_at, updated_at, document);
        let slot = self.next_slot;
        self.next_slot += 1;
        self.slots.insert(id, slot);
        self.records.insert(slot, record.clone());
        Ok(record)
    }

    /// Applies `patch` to every record matching `predicate`.
    ///
    /// A patch that is empty after normalization, or that fails validation,
    /// touches nothing and yields an empty result.
    pub fn update<P>(
        &mut self,
        predicate: P,
        patch: Document,
        ctx: &mut WriteContext<'_>,
    ) -> Vec<Record>
    where
        P: Fn(&Record) -> bool,
    {
        match self.try_update(predicate, patch, ctx) {
            Ok(updated) => updated,
            Err(error) => {
                self.log_rejection("update", &error, ctx.verbose);
                Vec::new()
            }
        }
    }

    /// Like [`Table::update`], but reports why a patch was refused.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] that rejected the patch. No record
    /// is modified in that case.
    pub fn try_update<P>(
        &mut self,
        predicate: P,
        patch: Document,
        ctx: &mut WriteContext<'_>,
    ) -> Result<Vec<Record>, ValidationError>
    where
        P: Fn(&Record) -> bool,
    {
        let patch = self
            .schema
            .normalize(self.schema.apply_save_hook(strip_system_fields(patch)));
        if patch.is_empty() {
            return Ok(Vec::new());
        }

        let targets: Vec<RecordId> = self
            .records
            .values()
            .filter(|record| predicate(record))
            .map(Record::id)
            .collect();
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        if targets.len() > 1 {
            if let Some((field, _)) = patch
                .iter()
                .find(|(name, value)| !value.is_null() && self.schema.is_unique(name))
            {
                return Err(ValidationError::AmbiguousUniqueUpdate {
                    field: field.clone(),
                    matches: targets.len(),
                });
            }
        }
        self.schema.validate(
            &patch,
            &ValidationScope {
                own: self,
                exempt: &targets,
                resolver: ctx.resolver,
            },
        )?;

        let now = ctx.clock.now();
        let mut updated = Vec::with_capacity(targets.len());
        for id in targets {
            let Some(record) = self
                .slots
                .get(&id)
                .and_then(|slot| self.records.get_mut(slot))
            else {
                continue;
            };
            for (name, value) in &patch {
                if let Some(index) = self.indexes.get_mut(name) {
                    if let Some(old) = record.get(name) {
                        index.remove(old, id);
                    }
                    // Cannot conflict: validated with at most one target.
                    let _ = index.insert(value, id);
                }
                record.fields_mut().insert(name.clone(), value.clone());
            }
            record.touch(now.max(record.updated_at().saturating_add(1)));
            updated.push(record.clone());
        }
        self.advance_counters(&patch);
        Ok(updated)
    }

    /// Removes every record matching `predicate` and returns them.
    pub fn delete<P>(&mut self, predicate: P) -> Vec<Record>
    where
        P: Fn(&Record) -> bool,
    {
        let doomed: Vec<u64> = self
            .records
            .iter()
            .filter(|(_, record)| predicate(record))
            .map(|(slot, _)| *slot)
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for slot in doomed {
            let Some(record) = self.records.remove(&slot) else {
                continue;
            };
            self.slots.remove(&record.id());
            for index in self.indexes.values_mut() {
                if let Some(value) = record.get(index.field()) {
                    index.remove(value, record.id());
                }
            }
            removed.push(record);
        }
        removed
    }

    fn fill_generated(&self, document: &mut Document, ids: &mut dyn IdGenerator) {
        for field in self.schema.fields() {
            let slot = match field.field_type {
                FieldType::Uuid | FieldType::AutoIncrement => {
                    document.entry(field.name.clone()).or_insert(Value::Null)
                }
                _ => continue,
            };
            if !slot.is_null() {
                continue;
            }
            *slot = match field.field_type {
                FieldType::Uuid => Value::Text(ids.next_token()),
                _ => Value::Integer(self.counters.get(&field.name).copied().unwrap_or(1)),
            };
        }
    }

    fn advance_counters(&mut self, document: &Document) {
        for (field, next) in &mut self.counters {
            if let Some(Value::Integer(value)) = document.get(field) {
                *next = (*next).max(value.saturating_add(1));
            }
        }
    }

    fn fresh_id(&self, ids: &mut dyn IdGenerator) -> RecordId {
        loop {
            let id = ids.next_id();
            if !self.contains(id) {
                return id;
            }
        }
    }

    fn index_document(&mut self, id: RecordId, document: &Document) -> Result<(), ValidationError> {
        let mut indexed = Vec::new();
        let mut conflict = None;
        for index in self.indexes.values_mut() {
            let Some(value) = document.get(index.field()) else {
                continue;
            };
            if index.insert(value, id).is_err() {
                conflict = Some((index.field().to_string(), value.to_string()));
                break;
            }
            indexed.push(index.field().to_string());
        }

        let Some((field, value)) = conflict else {
            return Ok(());
        };
        for name in indexed {
            if let (Some(index), Some(held)) = (self.indexes.get_mut(&name), document.get(&name)) {
                index.remove(held, id);
            }
        }
        Err(ValidationError::DuplicateValue { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::doc;
    use crate::record::SeededIdGenerator;
    use crate::schema::{Reference, Resolution, SchemaBuilder};

    fn no_refs(_: &Reference, _: &Value) -> Resolution {
        Resolution::Unresolvable
    }

    struct Harness {
        ids: SeededIdGenerator,
        clock: ManualClock,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                ids: SeededIdGenerator::new(7),
                clock: ManualClock::new(1_000),
            }
        }

        fn ctx(&mut self) -> WriteContext<'_> {
            WriteContext::new(&no_refs, &mut self.ids, &self.clock)
        }
    }

    fn users() -> Table {
        let mut users = SchemaBuilder::new();
        users.string("name").not_nullable();
        users.integer("age");
        users.boolean("is_on_mailing_list").default(true);
        users.string("gender").default("male");
        users.string("email").unique();
        Table::new("users", users.build().unwrap())
    }

    #[test]
    fn insert_coerces_and_defaults() {
        let mut table = users();
        let mut h = Harness::new();

        let record = table
            .insert_one(doc! { "name" => "Tom", "age" => "31", "email" => "t@e.com" }, &mut h.ctx())
            .unwrap();

        assert_eq!(record.get("age"), Some(&Value::Integer(31)));
        assert_eq!(record.get("is_on_mailing_list"), Some(&Value::Bool(true)));
        assert_eq!(record.get("gender"), Some(&Value::from("male")));
        assert_eq!(record.created_at(), 1_000);
        assert_eq!(record.created_at(), record.updated_at());
    }

    #[test]
    fn insert_discards_client_id() {
        let mut table = users();
        let mut h = Harness::new();
        let forged = RecordId::new();

        let record = table
            .insert_one(doc! { "id" => forged.to_string(), "name" => "Forced" }, &mut h.ctx())
            .unwrap();

        assert_ne!(record.id(), forged);
        assert!(record.get("id").is_none());
    }

    #[test]
    fn fractional_integer_is_rejected() {
        let mut table = users();
        let mut h = Harness::new();

        let result = table.insert_one(doc! { "name" => "X", "age" => 65.5 }, &mut h.ctx());

        assert!(matches!(result, Err(ValidationError::TypeMismatch { .. })));
        assert!(table.is_empty());
    }

    #[test]
    fn null_on_not_nullable_is_rejected() {
        let mut table = users();
        let mut h = Harness::new();
        let result = table.insert_one(doc! { "name" => Value::Null }, &mut h.ctx());
        assert_eq!(
            result,
            Err(ValidationError::NullNotAllowed {
                field: "name".into()
            })
        );
    }

    #[test]
    fn empty_documents_insert_nothing() {
        let mut table = users();
        let mut h = Harness::new();
        assert!(table.insert(Vec::new(), &mut h.ctx()).is_empty());
        assert!(table.insert(vec![Document::new()], &mut h.ctx()).is_empty());
    }

    #[test]
    fn batch_insert_is_per_record() {
        let mut table = users();
        let mut h = Harness::new();

        let inserted = table.insert(
            vec![
                doc! { "name" => "A", "email" => "same@x.io" },
                doc! { "name" => "B", "email" => "same@x.io" },
                doc! { "name" => "C", "email" => "other@x.io" },
            ],
            &mut h.ctx(),
        );

        let names: Vec<_> = inserted.iter().map(|r| r.value("name")).collect();
        assert_eq!(names, vec![Value::from("A"), Value::from("C")]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn delete_frees_unique_value() {
        let mut table = users();
        let mut h = Harness::new();
        table
            .insert_one(doc! { "name" => "A", "email" => "a@x.io" }, &mut h.ctx())
            .unwrap();

        let removed = table.delete(|r| r.value("email") == Value::from("a@x.io"));
        assert_eq!(removed.len(), 1);
        assert!(table.delete(|_| true).is_empty());

        assert!(table
            .insert_one(doc! { "name" => "B", "email" => "a@x.io" }, &mut h.ctx())
            .is_ok());
    }

    #[test]
    fn update_refreshes_updated_at_only() {
        let mut table = users();
        let mut h = Harness::new();
        let before = table
            .insert_one(doc! { "name" => "Update Me", "email" => "u@x.io" }, &mut h.ctx())
            .unwrap();

        let updated = table.update(
            |r| r.id() == before.id(),
            doc! { "name" => "Is Updated", "age" => 60, "email" => "new@x.io" },
            &mut h.ctx(),
        );

        assert_eq!(updated.len(), 1);
        let record = &updated[0];
        assert_eq!(record.id(), before.id());
        assert_eq!(record.created_at(), before.created_at());
        assert!(record.updated_at() > before.updated_at());
        assert_eq!(record.get("age"), Some(&Value::Integer(60)));
        assert!(table.unique_holder("email", &Value::from("u@x.io")).is_none());
        assert_eq!(
            table.unique_holder("email", &Value::from("new@x.io")),
            Some(before.id())
        );
    }

    #[test]
    fn invalid_patch_touches_nothing() {
        let mut table = users();
        let mut h = Harness::new();
        let before = table
            .insert_one(doc! { "name" => "Keep", "age" => 1 }, &mut h.ctx())
            .unwrap();
        h.clock.advance(10);

        let updated = table.update(|_| true, doc! { "age" => 2.5 }, &mut h.ctx());

        assert!(updated.is_empty());
        let stored = table.get(before.id()).unwrap();
        assert_eq!(stored.get("age"), Some(&Value::Integer(1)));
        assert_eq!(stored.updated_at(), before.updated_at());
    }

    #[test]
    fn update_to_taken_unique_value_is_refused() {
        let mut table = users();
        let mut h = Harness::new();
        table
            .insert_one(doc! { "name" => "A", "email" => "a@x.io" }, &mut h.ctx())
            .unwrap();
        let b = table
            .insert_one(doc! { "name" => "B", "email" => "b@x.io" }, &mut h.ctx())
            .unwrap();

        let result = table.try_update(
            |r| r.id() == b.id(),
            doc! { "email" => "a@x.io" },
            &mut h.ctx(),
        );
        assert!(matches!(result, Err(ValidationError::DuplicateValue { .. })));
    }

    #[test]
    fn update_keeping_own_unique_value_is_allowed() {
        let mut table = users();
        let mut h = Harness::new();
        let a = table
            .insert_one(doc! { "name" => "A", "email" => "a@x.io" }, &mut h.ctx())
            .unwrap();

        let updated = table.update(
            |r| r.id() == a.id(),
            doc! { "name" => "A2", "email" => "a@x.io" },
            &mut h.ctx(),
        );
        assert_eq!(updated.len(), 1);
    }

    #[test]
    fn unique_value_for_many_records_is_refused() {
        let mut table = users();
        let mut h = Harness::new();
        table.insert(
            vec![doc! { "name" => "A" }, doc! { "name" => "B" }],
            &mut h.ctx(),
        );

        let result = table.try_update(|_| true, doc! { "email" => "x@x.io" }, &mut h.ctx());
        assert_eq!(
            result,
            Err(ValidationError::AmbiguousUniqueUpdate {
                field: "email".into(),
                matches: 2
            })
        );
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut table = users();
        let mut h = Harness::new();
        table.insert_one(doc! { "name" => "A" }, &mut h.ctx()).unwrap();
        assert!(table
            .update(|_| true, doc! { "unknown" => 1, "id" => "x" }, &mut h.ctx())
            .is_empty());
    }

    #[test]
    fn generated_fields() {
        let mut builder = SchemaBuilder::new();
        builder.increment("seq");
        builder.uuid("token");
        builder.string("name");
        let mut table = Table::new("increments", builder.build().unwrap());
        let mut h = Harness::new();

        let first = table.insert_one(doc! { "name" => "a" }, &mut h.ctx()).unwrap();
        table.insert_one(doc! { "name" => "b" }, &mut h.ctx()).unwrap();
        let third = table.insert_one(doc! { "name" => "c" }, &mut h.ctx()).unwrap();

        assert_eq!(first.get("seq"), Some(&Value::Integer(1)));
        assert_eq!(third.get("seq"), Some(&Value::Integer(3)));
        assert_eq!(first.get("token").and_then(Value::as_text).map(str::len), Some(36));

        let jumped = table
            .insert_one(doc! { "name" => "d", "seq" => 10 }, &mut h.ctx())
            .unwrap();
        assert_eq!(jumped.get("seq"), Some(&Value::Integer(10)));
        let next = table.insert_one(doc! { "name" => "e" }, &mut h.ctx()).unwrap();
        assert_eq!(next.get("seq"), Some(&Value::Integer(11)));
    }

    #[test]
    fn restore_keeps_timestamps_and_skips_hook() {
        let mut builder = SchemaBuilder::new();
        builder.string("name");
        builder.on_save(|mut d| {
            d.insert("name".into(), "OnSave Ran".into());
            d
        });
        let mut table = Table::new("onsave", builder.build().unwrap());
        let mut h = Harness::new();

        let record = table
            .restore(doc! { "name" => "archived" }, 5, 9, &mut h.ctx())
            .unwrap();
        assert_eq!(record.get("name"), Some(&Value::from("archived")));
        assert_eq!((record.created_at(), record.updated_at()), (5, 9));

        let hooked = table.insert_one(doc! { "name" => "fresh" }, &mut h.ctx()).unwrap();
        assert_eq!(hooked.get("name"), Some(&Value::from("OnSave Ran")));
    }

    #[test]
    fn self_reference_resolves_locally() {
        let mut builder = SchemaBuilder::new();
        builder.string("name");
        builder.string("parent").references("id").from_table("parts");
        let mut table = Table::new("parts", builder.build().unwrap());
        let mut h = Harness::new();

        let root = table.insert_one(doc! { "name" => "root" }, &mut h.ctx()).unwrap();
        let child = table.insert_one(
            doc! { "name" => "child", "parent" => root.id().to_string() },
            &mut h.ctx(),
        );
        assert!(child.is_ok());

        let orphan = table.insert_one(
            doc! { "name" => "orphan", "parent" => RecordId::new().to_string() },
            &mut h.ctx(),
        );
        assert!(matches!(orphan, Err(ValidationError::MissingReference { .. })));
    }
}
