//! Typed, null-aware reading of result-set fields.
//!
//! Every getter looks the field up by name on a [`Cursor`] and converts the
//! raw cell with [`FromSql`]. The `get_nullable*` getters read both a
//! database NULL and an empty string as `None`; [`RowReader::get_string`]
//! only treats NULL as absent.
//!
//! Date-times go through the policy's UTC rule, see [`crate::time`].

use bytes::Bytes;
use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sqlhelpers_types::temporal::parse_date_time;
use sqlhelpers_types::{FromSql, SqlValue, TypeError};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::geography::Geography;
use crate::policy::Policy;
use crate::row::Cursor;
use crate::time;

/// Reads fields from the current row of a cursor.
#[derive(Debug, Clone, Copy)]
pub struct RowReader<'p> {
    policy: &'p Policy,
}

macro_rules! typed_getters {
    ($($(#[$doc:meta])* $get:ident, $get_nullable:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $get<C: Cursor + ?Sized>(&self, cursor: &C, field: &str) -> Result<$ty> {
                self.get(cursor, field)
            }

            /// Nullable form; NULL and empty text read as `None`.
            pub fn $get_nullable<C: Cursor + ?Sized>(
                &self,
                cursor: &C,
                field: &str,
            ) -> Result<Option<$ty>> {
                self.get_nullable(cursor, field)
            }
        )*
    };
}

impl<'p> RowReader<'p> {
    /// Create a reader using `policy`.
    #[must_use]
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    #[must_use]
    pub fn policy(&self) -> &'p Policy {
        self.policy
    }

    /// Whether the cursor's result set has the named field.
    pub fn has_field<C: Cursor + ?Sized>(&self, cursor: &C, field: &str) -> bool {
        cursor.has_field(field)
    }

    fn raw<'c, C: Cursor + ?Sized>(&self, cursor: &'c C, field: &str) -> Result<&'c SqlValue> {
        cursor
            .value(field)
            .ok_or_else(|| Error::FieldNotFound(field.to_string()))
    }

    /// Read a non-null field.
    pub fn get<T: FromSql, C: Cursor + ?Sized>(&self, cursor: &C, field: &str) -> Result<T> {
        let raw = self.raw(cursor, field)?;
        tracing::trace!(field = field, kind = raw.type_name(), "reading field");
        Ok(T::from_sql(raw)?)
    }

    /// Read a field that may be NULL or empty text.
    pub fn get_nullable<T: FromSql, C: Cursor + ?Sized>(
        &self,
        cursor: &C,
        field: &str,
    ) -> Result<Option<T>> {
        let raw = self.raw(cursor, field)?;
        tracing::trace!(field = field, kind = raw.type_name(), "reading nullable field");
        Ok(T::from_sql_nullable(raw)?)
    }

    typed_getters! {
        /// Read a boolean. Text cells accept `True`/`False` and `1`/`0`.
        get_bool, get_nullable_bool => bool;
        /// Read an unsigned byte.
        get_byte, get_nullable_byte => u8;
        /// Read a 16-bit integer.
        get_short, get_nullable_short => i16;
        /// Read a 32-bit integer.
        get_int, get_nullable_int => i32;
        /// Read a 64-bit integer.
        get_long, get_nullable_long => i64;
        /// Read a double.
        get_double, get_nullable_double => f64;
        /// Read a decimal.
        get_decimal, get_nullable_decimal => Decimal;
        /// Read a GUID.
        get_uuid, get_nullable_uuid => Uuid;
        /// Read a time of day.
        get_time, get_nullable_time => NaiveTime;
    }

    /// Read binary data.
    pub fn get_bytes<C: Cursor + ?Sized>(&self, cursor: &C, field: &str) -> Result<Bytes> {
        self.get(cursor, field)
    }

    /// Read text. Only a database NULL reads as `None`; an empty string is
    /// returned as `Some("")`.
    pub fn get_string<C: Cursor + ?Sized>(&self, cursor: &C, field: &str) -> Result<Option<String>> {
        let raw = self.raw(cursor, field)?;
        Ok(String::from_sql_nullable(raw)?)
    }

    /// Read a date-time, converted from UTC to local when times are stored
    /// in UTC.
    pub fn get_date_time<C: Cursor + ?Sized>(&self, cursor: &C, field: &str) -> Result<NaiveDateTime> {
        let raw = self.raw(cursor, field)?;
        self.date_time(raw)
    }

    /// Nullable form of [`get_date_time`](Self::get_date_time).
    pub fn get_nullable_date_time<C: Cursor + ?Sized>(
        &self,
        cursor: &C,
        field: &str,
    ) -> Result<Option<NaiveDateTime>> {
        let raw = self.raw(cursor, field)?;
        if raw.is_absent() {
            return Ok(None);
        }
        self.date_time(raw).map(Some)
    }

    fn date_time(&self, raw: &SqlValue) -> Result<NaiveDateTime> {
        let value = match raw {
            SqlValue::DateTime(v) => time::from_storage(*v, self.policy),
            // Calendar dates carry no time of day to shift.
            SqlValue::Date(d) => d.and_time(NaiveTime::MIN),
            SqlValue::DateTimeOffset(dto) => self.policy.local_zone.utc_to_local(dto.naive_utc()),
            SqlValue::String(s) => time::from_storage(parse_date_time(s)?, self.policy),
            SqlValue::Null => return Err(TypeError::UnexpectedNull.into()),
            other => {
                return Err(TypeError::TypeMismatch {
                    expected: "datetime",
                    actual: other.type_name().to_string(),
                }
                .into());
            }
        };
        Ok(value)
    }

    /// Read a geography from its WKT text.
    ///
    /// NULL or empty text reads as `None`. `srid` defaults to the policy's
    /// [`default_srid`](Policy::default_srid).
    pub fn get_geography_from_text<C: Cursor + ?Sized>(
        &self,
        cursor: &C,
        field: &str,
        srid: Option<i32>,
    ) -> Result<Option<Geography>> {
        let raw = self.raw(cursor, field)?;
        if raw.is_absent() {
            return Ok(None);
        }
        let text = String::from_sql(raw)?;
        let srid = srid.unwrap_or(self.policy.default_srid);
        Ok(Some(Geography::from_text(&text, srid)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::policy::LocalZone;
    use crate::row::Row;
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    fn policy() -> Policy {
        Policy::default().with_local_zone(LocalZone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap()))
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1993, 8, 23)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_missing_field() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let row = Row::from_pairs([("v", SqlValue::Int(1))]);

        assert!(matches!(reader.get_int(&row, "w"), Err(Error::FieldNotFound(f)) if f == "w"));
        assert!(reader.has_field(&row, "V"));
        assert!(!reader.has_field(&row, "w"));
    }

    #[test]
    fn test_nullable_conflates_null_and_empty() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let row = Row::from_pairs([
            ("null", SqlValue::Null),
            ("empty", SqlValue::String(String::new())),
            ("text", SqlValue::String("42".into())),
        ]);

        assert_eq!(reader.get_nullable_int(&row, "null").unwrap(), None);
        assert_eq!(reader.get_nullable_int(&row, "empty").unwrap(), None);
        assert_eq!(reader.get_nullable_int(&row, "text").unwrap(), Some(42));
        assert_eq!(reader.get_nullable_date_time(&row, "empty").unwrap(), None);
    }

    #[test]
    fn test_string_distinguishes_null_from_empty() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let row = Row::from_pairs([
            ("null", SqlValue::Null),
            ("empty", SqlValue::String(String::new())),
        ]);

        assert_eq!(reader.get_string(&row, "null").unwrap(), None);
        assert_eq!(reader.get_string(&row, "empty").unwrap(), Some(String::new()));
    }

    #[test]
    fn test_non_null_getter_rejects_null() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let row = Row::from_pairs([("v", SqlValue::Null)]);

        assert!(matches!(
            reader.get_int(&row, "v"),
            Err(Error::Type(TypeError::UnexpectedNull))
        ));
        assert!(matches!(
            reader.get_date_time(&row, "v"),
            Err(Error::Type(TypeError::UnexpectedNull))
        ));
    }

    #[test]
    fn test_parse_errors_propagate() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let row = Row::from_pairs([("v", SqlValue::String("abc".into()))]);

        assert!(matches!(
            reader.get_int(&row, "v"),
            Err(Error::Type(TypeError::ParseInt(_)))
        ));
        assert!(matches!(
            reader.get_uuid(&row, "v"),
            Err(Error::Type(TypeError::ParseUuid(_)))
        ));
        assert!(matches!(
            reader.get_date_time(&row, "v"),
            Err(Error::Type(TypeError::ParseDateTime(_)))
        ));
    }

    #[test]
    fn test_bool_from_text() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let row = Row::from_pairs([
            ("a", SqlValue::String("True".into())),
            ("b", SqlValue::Bool(false)),
        ]);

        assert!(reader.get_bool(&row, "a").unwrap());
        assert_eq!(reader.get_nullable_bool(&row, "b").unwrap(), Some(false));
    }

    #[test]
    fn test_date_time_converted_from_utc() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let stored = noon() - chrono::TimeDelta::hours(2);
        let row = Row::from_pairs([
            ("dt", SqlValue::DateTime(stored)),
            ("text", SqlValue::String("1993-08-23T10:00:00.0000000".into())),
            ("date", SqlValue::Date(noon().date())),
        ]);

        assert_eq!(reader.get_date_time(&row, "dt").unwrap(), noon());
        assert_eq!(reader.get_date_time(&row, "text").unwrap(), noon());
        assert_eq!(
            reader.get_date_time(&row, "date").unwrap(),
            noon().date().and_time(NaiveTime::MIN)
        );
    }

    #[test]
    fn test_date_time_unconverted_when_policy_off() {
        let policy = policy().with_times_stored_in_utc(false);
        let reader = RowReader::new(&policy);
        let row = Row::from_pairs([("dt", SqlValue::DateTime(noon()))]);

        assert_eq!(reader.get_date_time(&row, "dt").unwrap(), noon());
    }

    #[test]
    fn test_date_time_offset_to_local() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let dto = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .from_local_datetime(&(noon() - chrono::TimeDelta::hours(7)))
            .unwrap();
        let row = Row::from_pairs([("v", SqlValue::DateTimeOffset(dto))]);

        assert_eq!(reader.get_date_time(&row, "v").unwrap(), noon());
    }

    #[test]
    fn test_geography() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let row = Row::from_pairs([
            ("g", SqlValue::String("POINT (1 2)".into())),
            ("empty", SqlValue::String(String::new())),
            ("bad", SqlValue::String("POINT (1)".into())),
        ]);

        let g = reader.get_geography_from_text(&row, "g", None).unwrap().unwrap();
        assert_eq!(g.srid(), 4326);
        let g = reader.get_geography_from_text(&row, "g", Some(4269)).unwrap().unwrap();
        assert_eq!(g.srid(), 4269);
        assert!(reader.get_geography_from_text(&row, "empty", None).unwrap().is_none());
        assert!(matches!(
            reader.get_geography_from_text(&row, "bad", None),
            Err(Error::Type(TypeError::InvalidWkt(_)))
        ));
    }

    #[test]
    fn test_typed_getters() {
        let policy = policy();
        let reader = RowReader::new(&policy);
        let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let row = Row::from_pairs([
            ("b", SqlValue::TinyInt(200)),
            ("s", SqlValue::SmallInt(-3)),
            ("l", SqlValue::BigInt(i64::MAX)),
            ("d", SqlValue::Float(1.5)),
            ("m", SqlValue::Decimal(Decimal::new(1234, 2))),
            ("u", SqlValue::String(id.to_string())),
            ("t", SqlValue::Time(NaiveTime::from_hms_opt(13, 51, 33).unwrap())),
            ("bin", SqlValue::Binary(Bytes::from_static(b"\x01\x02"))),
        ]);

        assert_eq!(reader.get_byte(&row, "b").unwrap(), 200);
        assert_eq!(reader.get_short(&row, "s").unwrap(), -3);
        assert_eq!(reader.get_long(&row, "l").unwrap(), i64::MAX);
        assert!((reader.get_double(&row, "d").unwrap() - 1.5).abs() < f64::EPSILON);
        assert_eq!(reader.get_decimal(&row, "m").unwrap(), Decimal::new(1234, 2));
        assert_eq!(reader.get_uuid(&row, "u").unwrap(), id);
        assert_eq!(
            reader.get_time(&row, "t").unwrap(),
            NaiveTime::from_hms_opt(13, 51, 33).unwrap()
        );
        assert_eq!(reader.get_bytes(&row, "bin").unwrap().as_ref(), &[1, 2]);
    }
}
