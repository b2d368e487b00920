//! Constraint enforcement on the fixture collections.

use stowdb_core::{doc, Document, Filter, Value};
use stowdb_testkit::prelude::*;

fn users_named(db: &mut TestDatabase, name: &str) -> Vec<stowdb_core::Record> {
    select_where(db, "users", Filter::new().eq("name", name))
}

#[test]
fn empty_inserts_store_nothing() {
    let mut db = TestDatabase::app();
    let none: Vec<Document> = Vec::new();
    assert!(db.query("users").insert(none).execute().unwrap().is_empty());
    assert!(try_insert(&mut db, "users", doc! {}).is_none());
    assert!(select_all(&mut db, "users").is_empty());
}

#[test]
fn insert_coerces_numeric_strings() {
    let mut db = TestDatabase::app();
    let tom = insert(
        &mut db,
        "users",
        doc! { "name" => "Tom", "age" => "31", "email" => "t@e.com" },
    );
    assert_eq!(tom.value("age"), Value::Integer(31));
    assert_eq!(tom.value("is_on_mailing_list"), Value::Bool(true));
    assert_eq!(tom.value("gender"), Value::from("male"));
}

#[test]
fn fractional_integer_is_rejected() {
    let mut db = TestDatabase::app();
    assert!(try_insert(&mut db, "users", doc! { "name" => "X", "age" => 65.5 }).is_none());
    assert!(users_named(&mut db, "X").is_empty());
}

#[test]
fn undeclared_fields_are_dropped() {
    let mut db = TestDatabase::app();
    let user = insert(&mut db, "users", doc! { "name" => "Ada", "nickname" => "countess" });
    assert!(user.get("nickname").is_none());
}

#[test]
fn supplied_system_fields_are_ignored() {
    let mut db = TestDatabase::app();
    let forced = "7c851809-d630-437f-898f-a4f349b53fed";
    let user = insert(
        &mut db,
        "users",
        doc! { "name" => "Update ID", "id" => forced, "created_at" => 1 },
    );
    assert_ne!(user.id().to_string(), forced);
    assert_eq!(user.created_at(), START_TIME);

    let updated = db
        .query("users")
        .filter(Filter::new().eq("name", "Update ID"))
        .update(doc! { "age" => 66, "id" => forced })
        .execute()
        .unwrap();
    assert_eq!(updated[0].id(), user.id());
    assert_eq!(updated[0].value("age"), Value::Integer(66));
}

#[test]
fn duplicate_unique_value_stores_nothing() {
    let mut db = TestDatabase::app();
    let document = doc! { "name" => "Unique Value", "age" => 31, "email" => "unique@email.com" };
    assert!(try_insert(&mut db, "users", document.clone()).is_some());
    assert!(try_insert(&mut db, "users", document).is_none());

    let holders = select_where(&mut db, "users", Filter::new().eq("email", "unique@email.com"));
    assert_eq!(holders.len(), 1);
    assert_invariants(&db);
}

#[test]
fn deleting_the_holder_frees_a_unique_value() {
    let mut db = TestDatabase::app();
    let email = "uniqueReAdded@email.com";
    insert_user(&mut db, "First", Some(email));

    let deleted = db
        .query("users")
        .filter(Filter::new().eq("email", email))
        .delete()
        .execute()
        .unwrap();
    assert_eq!(deleted.len(), 1);

    insert_user(&mut db, "Second", Some(email));
    let holders = select_where(&mut db, "users", Filter::new().eq("email", email));
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].value("name"), Value::from("Second"));
}

#[test]
fn null_handling() {
    let mut db = TestDatabase::app();
    assert!(try_insert(&mut db, "users", doc! { "name" => "I can be null", "age" => Value::Null }).is_some());
    assert!(try_insert(&mut db, "users", doc! { "name" => Value::Null, "age" => 99 }).is_none());
    assert!(select_where(&mut db, "users", Filter::new().eq("age", 99)).is_empty());
}

#[test]
fn references_by_unique_field() {
    let mut db = TestDatabase::app();
    insert_user(&mut db, "Tom", Some("test@email.com"));

    let orphan = doc! { "email" => "test2@email.com", "password" => "test1234" };
    assert!(try_insert(&mut db, "login", orphan).is_none());

    let login = insert(
        &mut db,
        "login",
        doc! { "email" => "test@email.com", "password" => "test1234" },
    );
    assert_eq!(login.value("email"), Value::from("test@email.com"));
    assert_invariants(&db);
}

#[test]
fn references_by_id() {
    let mut db = TestDatabase::app();
    let user = insert_user(&mut db, "Favorite Color User", None);

    let color = insert(
        &mut db,
        "colors",
        doc! { "user_id" => user.id().to_string(), "color" => 1 },
    );
    assert_eq!(color.value("user_id"), Value::Text(user.id().to_string()));

    let stray = stowdb_core::RecordId::new().to_string();
    assert!(try_insert(&mut db, "colors", doc! { "user_id" => stray, "color" => 1 }).is_none());
}

#[test]
fn timestamps_follow_accepted_updates_only() {
    let mut db = TestDatabase::app();
    let user = insert_user(&mut db, "Updated At", Some("u@example.com"));
    insert_user(&mut db, "Other", Some("o@example.com"));
    let by_name = Filter::new().eq("name", "Updated At");

    db.advance(2_000);
    let updated = db
        .query("users")
        .filter(by_name.clone())
        .update(doc! { "age" => 36 })
        .execute()
        .unwrap();
    assert_eq!(updated[0].created_at(), user.created_at());
    assert_eq!(updated[0].updated_at(), START_TIME + 2_000);

    db.advance(2_000);
    let rejected = db
        .query("users")
        .filter(by_name.clone())
        .update(doc! { "email" => "o@example.com" })
        .execute()
        .unwrap();
    assert!(rejected.is_empty());

    let current = select_where(&mut db, "users", by_name);
    assert_eq!(current[0].updated_at(), START_TIME + 2_000);
    assert_eq!(current[0].value("email"), Value::from("u@example.com"));
}

#[test]
fn save_hook_runs_on_insert_and_update() {
    let mut db = TestDatabase::app();
    let record = insert(&mut db, "onsave", doc! { "name" => "Wooooo" });
    assert_eq!(record.value("name"), Value::from("OnSave Ran"));

    db.query("onsave").update(doc! { "name" => "Wooooo" }).execute().unwrap();
    let stored = select_all(&mut db, "onsave");
    assert_eq!(stored[0].value("name"), Value::from("OnSave Ran"));
}

#[test]
fn generated_fields() {
    let mut db = TestDatabase::app();
    let first = insert(&mut db, "increments", doc! { "name" => "Auto Increment" });
    insert(&mut db, "increments", doc! { "name" => "Auto Increment" });
    let third = insert(&mut db, "increments", doc! { "name" => "Auto Increment" });

    assert_eq!(first.value("serial"), Value::Integer(1));
    assert_eq!(third.value("serial"), Value::Integer(3));

    let token = third.value("uuid");
    let token = token.as_text().expect("uuid is text");
    assert_eq!(token.len(), 36);
    assert_ne!(first.value("uuid"), third.value("uuid"));
}

#[test]
fn parts_defaults_and_unique_integers() {
    let mut db = TestDatabase::app();
    let part = insert(&mut db, "parts", doc! { "color_id" => 4, "material_id" => 10 });
    assert_eq!(part.value("type"), Value::from("OTHER"));
    assert_eq!(part.value("basic_element"), Value::Bool(false));

    assert!(try_insert(&mut db, "parts", doc! { "color_id" => 5, "material_id" => "10" }).is_none());
    assert!(try_insert(&mut db, "parts", doc! { "material_id" => 11 }).is_some());
    assert!(try_insert(&mut db, "parts", doc! { "color_id" => Value::Null }).is_none());
    assert_invariants(&db);
}
