mod test_utils;

use std::fs;

use small_heap_db::{
    storage::{small_int_schema, Type},
    ErrorKind, TupleScheme,
};
use test_utils::*;

#[test]
fn test_load_schema() {
    let env = setup();
    let schema_path = env.path().join("catalog.txt");
    fs::write(
        &schema_path,
        "users (id int pk, name string)\n\nscores (user int, score int)\n",
    )
    .unwrap();

    let catalog = env.catalog();
    catalog.load_schema(&schema_path).unwrap();
    assert_eq!(catalog.table_ids().len(), 2);

    let users = catalog.get_table_id("users").unwrap();
    assert_eq!(catalog.get_table_name(users).unwrap(), "users");
    assert_eq!(catalog.get_primary_key(users).unwrap(), "id");
    let scheme = catalog.get_tuple_scheme(users).unwrap();
    assert_eq!(scheme, TupleScheme::from_types(&[Type::Int, Type::String]));
    assert_eq!(scheme.get_field_name(1), Some("name"));
    assert!(env.path().join("users.dat").exists());

    let scores = catalog.get_table_id("scores").unwrap();
    assert_eq!(catalog.get_primary_key(scores).unwrap(), "");
    assert_eq!(
        catalog.get_table(scores).unwrap().get_file_path(),
        env.path().join("scores.dat").canonicalize().unwrap()
    );
}

#[test]
fn test_malformed_schema() {
    let env = setup();
    let schema_path = env.path().join("catalog.txt");
    fs::write(&schema_path, "users (id int pk, name)\n").unwrap();
    let err = env.catalog().load_schema(&schema_path).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Db);

    fs::write(&schema_path, "users (id float)\n").unwrap();
    assert!(env.catalog().load_schema(&schema_path).is_err());

    let err = env
        .catalog()
        .load_schema(env.path().join("missing.txt"))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_unknown_table() {
    let env = setup();
    let catalog = env.catalog();
    assert_eq!(catalog.get_table(42).err().unwrap().kind(), ErrorKind::Db);
    assert_eq!(catalog.get_table_id("nope").err().unwrap().kind(), ErrorKind::Db);
    assert!(catalog.get_tuple_scheme(42).is_err());
    assert!(catalog.get_table_name(42).is_err());
}

#[test]
fn test_same_name_replaces() {
    let env = setup();
    let first = new_int_table(&env, "t", 1);
    let table = std::sync::Arc::new(
        small_heap_db::HeapTable::new(env.path().join("other.dat"), &small_int_schema(2, "t"))
            .unwrap(),
    );
    env.catalog().add_table(table.clone(), "t", "t-0");

    assert_eq!(env.catalog().table_ids(), vec![table.get_id()]);
    assert!(env.catalog().get_table(first.get_id()).is_err());
    assert_eq!(env.catalog().get_table_id("t").unwrap(), table.get_id());
    assert_eq!(env.catalog().get_primary_key(table.get_id()).unwrap(), "t-0");
}
