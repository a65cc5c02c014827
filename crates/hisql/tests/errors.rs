//! Configuration, validation and execution failures.

mod common;

use common::MockSource;
use hisql::{ClientConfig, ConfigErrorKind, DbVersion, Entity, OrmError, SqlClient, Value};
use std::error::Error as _;

#[derive(Debug, Default, Entity)]
#[orm(table = "person", key = "id")]
struct Person {
    id: Option<i64>,
    name: String,
}

#[derive(Debug, Default, Entity)]
#[orm(key = "id")]
struct NoTable {
    id: i64,
}

#[derive(Debug, Default, Entity)]
#[orm(table = "   ", key = "id")]
struct BlankTable {
    id: i64,
}

#[derive(Debug, Default, Entity)]
#[orm(table = "keyless")]
struct NoKey {
    id: i64,
}

#[derive(Debug, Default, Entity)]
#[orm(table = "mismatch", key = "code")]
struct WrongKey {
    id: i64,
}

fn setup() -> (MockSource, SqlClient<MockSource>) {
    let source = MockSource::new();
    source.create_table("person", "id", &["id", "name"]);
    let client = SqlClient::new(source.clone(), ClientConfig::new().db_version(DbVersion::MySql));
    (source, client)
}

#[test]
fn declaration_errors_surface_before_any_connection() {
    let (source, client) = setup();

    let err = client.get::<NoTable>(1).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(
        err,
        OrmError::Configuration {
            entity: "NoTable",
            kind: ConfigErrorKind::MissingTable
        }
    ));

    let err = client.delete::<BlankTable>(1).unwrap_err();
    assert!(matches!(err, OrmError::EmptyTableName { entity: "BlankTable" }));

    let err = client.get_many::<NoKey>(&[1]).unwrap_err();
    assert!(matches!(
        err,
        OrmError::Configuration {
            kind: ConfigErrorKind::MissingKey,
            ..
        }
    ));

    let err = client.insert(&mut WrongKey::default()).unwrap_err();
    assert!(matches!(
        err,
        OrmError::Configuration {
            kind: ConfigErrorKind::UnknownKeyField,
            ..
        }
    ));

    assert_eq!(source.acquired(), 0);
}

#[test]
fn write_operations_require_a_key_value() {
    let (source, client) = setup();
    let person = Person {
        id: None,
        name: "Ann".into(),
    };

    let err = client.update(&person).unwrap_err();
    assert!(matches!(
        err,
        OrmError::EmptyKeyValue {
            entity: "Person",
            operation: "update"
        }
    ));
    let err = client.update_fields(&person, &["name"]).unwrap_err();
    assert!(matches!(
        err,
        OrmError::EmptyKeyValue {
            operation: "update_fields",
            ..
        }
    ));
    assert_eq!(source.acquired(), 0);
}

#[test]
fn field_subsets_are_validated() {
    let (_, client) = setup();
    let person = Person {
        id: Some(1),
        name: "Ann".into(),
    };

    let err = client.update_fields(&person, &["nmae"]).unwrap_err();
    assert!(matches!(err, OrmError::UnknownField { ref field, .. } if field == "nmae"));

    let err = client.update_fields(&person, &["id"]).unwrap_err();
    assert!(matches!(err, OrmError::NoUpdatableFields { entity: "Person" }));

    let err = client
        .get_by::<Person>(&[("name) OR (1=1", Value::from("x"))])
        .unwrap_err();
    assert!(matches!(err, OrmError::InvalidIdentifier(_)));
}

#[test]
fn driver_failures_carry_operation_and_entity() {
    let (source, client) = setup();
    source.seed("person", vec![Value::BigInt(1), Value::from("Ann")]);
    source.fail_on("DELETE");

    let err = client.delete::<Person>(1).unwrap_err();
    assert!(err.is_execution());
    match &err {
        OrmError::SqlExecution {
            operation, entity, ..
        } => {
            assert_eq!(*operation, "delete");
            assert_eq!(*entity, Some("Person"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.source().map(|e| e.to_string()).as_deref(),
        Some("simulated driver failure")
    );
    assert!(err.to_string().contains("delete for Person"));

    assert_eq!(source.row_count("person"), 1);
    assert_eq!(source.acquired(), 1);
    assert_eq!(source.released(), 1);
}

#[test]
fn raw_query_failures_have_no_entity() {
    let (source, client) = setup();
    let err = client
        .query::<i64>("SELECT nothing FROM nowhere", &[])
        .unwrap_err();
    assert!(matches!(
        err,
        OrmError::SqlExecution {
            operation: "query",
            entity: None,
            ..
        }
    ));
    assert_eq!(source.acquired(), source.released());
}

#[test]
fn acquire_failures_are_execution_errors() {
    let (source, client) = setup();
    source.fail_acquire(true);

    let err = client.get::<Person>(1).unwrap_err();
    assert!(matches!(
        err,
        OrmError::SqlExecution {
            operation: "get",
            entity: Some("Person"),
            ..
        }
    ));
    assert_eq!(
        err.source().map(|e| e.to_string()).as_deref(),
        Some("pool exhausted")
    );
    assert_eq!(source.released(), 0);

    source.fail_acquire(false);
    assert!(client.get::<Person>(1).unwrap().is_none());
}

#[derive(Debug, Default, Entity)]
#[orm(table = "member", key = "id")]
struct Member {
    id: i64,
    age: i32,
}

fn mapping_context(err: &OrmError) -> (&'static str, &'static str, &'static str) {
    match err {
        OrmError::FieldMapping {
            entity,
            field,
            operation,
            source,
        } => {
            assert!(matches!(
                **source,
                OrmError::UnsupportedCoercion {
                    target: "i32",
                    value_type: "Text"
                }
            ));
            (*entity, *field, *operation)
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unconvertible_column_values_name_entity_field_and_operation() {
    let (source, client) = setup();
    source.create_table("member", "id", &["id", "age"]);
    source.seed("member", vec![Value::BigInt(1), Value::from("old")]);

    let err = client.get::<Member>(1).unwrap_err();
    assert_eq!(mapping_context(&err), ("Member", "age", "get"));
    assert!(err.to_string().contains("Member.age in get"));

    let err = client.get_many::<Member>(&[1]).unwrap_err();
    assert_eq!(mapping_context(&err), ("Member", "age", "get_many"));

    let err = client
        .query::<Member>("SELECT * FROM member", &[])
        .unwrap_err();
    assert_eq!(mapping_context(&err), ("Member", "age", "query"));

    let err = client
        .query_for_object::<Member>("SELECT * FROM member", &[])
        .unwrap_err();
    assert_eq!(mapping_context(&err), ("Member", "age", "query_for_object"));

    assert_eq!(source.acquired(), source.released());
}

#[test]
fn registry_reports_broken_declarations() {
    let problems = hisql::registry::check_registered();
    let broken: Vec<_> = problems
        .iter()
        .filter_map(|e| match e {
            OrmError::Configuration { entity, .. } | OrmError::EmptyTableName { entity } => {
                Some(*entity)
            }
            _ => None,
        })
        .collect();
    for name in ["NoTable", "BlankTable", "NoKey", "WrongKey"] {
        assert!(broken.contains(&name), "{name} not reported: {problems:?}");
    }
    assert!(!broken.contains(&"Person"));
}
