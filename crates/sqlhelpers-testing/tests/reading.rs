//! Reading typed values out of query results.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use sqlhelpers::{
    CommandExt, ConnectionExt, Coord, Error, ParameterBinder, Policy, RowReader, Shape, SqlDbType,
    TypeSize,
};
use sqlhelpers_testing::{FakeServer, MockConnection, ResultSet};

use common::{policy, server};

/// `SELECT @v AS v` over one NVARCHAR scalar.
fn select_text(server: &FakeServer, policy: &Policy, text: Option<&str>) -> ResultSet {
    let conn = MockConnection::new();
    let binder = ParameterBinder::new(policy);
    let mut cmd = conn.get_command(Some("SELECT @v AS v"), None, None, policy);
    cmd.add_scalar(&binder, "@v", &text, TypeSize::new(SqlDbType::NVarChar))
        .unwrap();
    let mut rs = server.execute_reader(&cmd).unwrap();
    assert!(rs.read());
    rs
}

#[test]
fn test_empty_text_reads_as_null_for_nullable_getters() {
    let policy = policy();
    let server = server(&policy);
    let rs = select_text(&server, &policy, Some(""));
    let reader = RowReader::new(&policy);

    assert_eq!(reader.get_nullable_int(&rs, "v").unwrap(), None);
    assert_eq!(reader.get_nullable_bool(&rs, "v").unwrap(), None);
    assert_eq!(reader.get_nullable_date_time(&rs, "v").unwrap(), None);
    assert_eq!(reader.get_string(&rs, "v").unwrap(), Some(String::new()));
}

#[test]
fn test_null_text_reads_as_none() {
    let policy = policy();
    let server = server(&policy);
    let rs = select_text(&server, &policy, None);
    let reader = RowReader::new(&policy);

    assert_eq!(reader.get_string(&rs, "v").unwrap(), None);
    assert_eq!(reader.get_nullable_uuid(&rs, "v").unwrap(), None);
    assert!(reader.get_geography_from_text(&rs, "v", None).unwrap().is_none());
}

#[test]
fn test_text_parses_for_typed_getters() {
    let policy = policy();
    let server = server(&policy);
    let reader = RowReader::new(&policy);

    let rs = select_text(&server, &policy, Some("True"));
    assert!(reader.get_bool(&rs, "v").unwrap());

    let rs = select_text(&server, &policy, Some(" 42 "));
    assert_eq!(reader.get_nullable_long(&rs, "v").unwrap(), Some(42));

    let rs = select_text(&server, &policy, Some("not a number"));
    assert!(matches!(reader.get_int(&rs, "v"), Err(Error::Type(_))));
}

#[test]
fn test_geography_from_text() {
    let policy = policy();
    let server = server(&policy);
    let reader = RowReader::new(&policy);

    let rs = select_text(&server, &policy, Some("POINT (-122.35 47.65)"));
    let point = reader.get_geography_from_text(&rs, "v", None).unwrap().unwrap();
    assert_eq!(point.srid(), 4326);
    assert_eq!(point.shape(), &Shape::Point(Some(Coord::new(-122.35, 47.65))));

    let rs = select_text(&server, &policy, Some("LINESTRING (0 0, 1 1, 2 0)"));
    let line = reader
        .get_geography_from_text(&rs, "v", Some(4269))
        .unwrap()
        .unwrap();
    assert_eq!(line.srid(), 4269);
    assert_eq!(line.to_wkt(), "LINESTRING (0 0, 1 1, 2 0)");

    let rs = select_text(&server, &policy, Some("POINT (0 91)"));
    assert!(reader.get_geography_from_text(&rs, "v", None).is_err());

    let rs = select_text(&server, &policy, Some(""));
    assert!(reader.get_geography_from_text(&rs, "v", None).unwrap().is_none());
    assert!(
        reader
            .get_geography_from_text(&rs, "v", Some(4269))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_default_srid_from_policy() {
    let policy = policy().with_default_srid(4269);
    let server = server(&policy);
    let rs = select_text(&server, &policy, Some("POINT (1 2)"));

    let geography = RowReader::new(&policy)
        .get_geography_from_text(&rs, "v", None)
        .unwrap()
        .unwrap();
    assert_eq!(geography.srid(), 4269);
}

#[test]
fn test_has_field_and_missing_field() {
    let policy = policy();
    let server = server(&policy);
    let rs = select_text(&server, &policy, Some("x"));
    let reader = RowReader::new(&policy);

    assert!(reader.has_field(&rs, "v"));
    assert!(reader.has_field(&rs, "V"));
    assert!(!reader.has_field(&rs, "w"));
    assert!(matches!(
        reader.get_string(&rs, "w"),
        Err(Error::FieldNotFound(name)) if name == "w"
    ));
}
