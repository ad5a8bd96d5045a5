//! Conversion of [`SqlValue`]s into Rust values.
//!
//! Every implementation takes the native variant first and falls back to
//! parsing the cell's text only when the client hands back a string. Parse
//! failures surface as the underlying parse error.

use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::error::TypeError;
use crate::temporal::parse_date_time;
use crate::value::SqlValue;

/// A Rust value that can be read from a SQL Server cell.
pub trait FromSql: Sized {
    /// Convert a non-NULL cell. A database NULL is an error.
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError>;

    /// Convert a cell that may be absent.
    ///
    /// Both a database NULL and an empty string read as `None`. Callers that
    /// store optional scalars as text rely on this conflation.
    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        if value.is_absent() {
            Ok(None)
        } else {
            Self::from_sql(value).map(Some)
        }
    }
}

fn mismatch(expected: &'static str, value: &SqlValue) -> TypeError {
    if value.is_null() {
        TypeError::UnexpectedNull
    } else {
        TypeError::TypeMismatch {
            expected,
            actual: value.type_name().to_string(),
        }
    }
}

fn out_of_range(expected: &'static str, value: &SqlValue) -> TypeError {
    TypeError::TypeMismatch {
        expected,
        actual: format!("{} {value} out of range", value.type_name()),
    }
}

macro_rules! impl_from_sql_integer {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromSql for $ty {
                fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
                    let converted = match value {
                        SqlValue::TinyInt(v) => <$ty>::try_from(*v).ok(),
                        SqlValue::SmallInt(v) => <$ty>::try_from(*v).ok(),
                        SqlValue::Int(v) => <$ty>::try_from(*v).ok(),
                        SqlValue::BigInt(v) => <$ty>::try_from(*v).ok(),
                        SqlValue::Bool(v) => Some(<$ty>::from(*v)),
                        SqlValue::String(s) => return Ok(s.trim().parse::<$ty>()?),
                        other => return Err(mismatch($name, other)),
                    };
                    converted.ok_or_else(|| out_of_range($name, value))
                }
            }
        )*
    };
}

impl_from_sql_integer! {
    u8 => "tinyint",
    i16 => "smallint",
    i32 => "int",
    i64 => "bigint",
}

impl FromSql for bool {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Bool(v) => Ok(*v),
            SqlValue::TinyInt(v) => Ok(*v != 0),
            SqlValue::SmallInt(v) => Ok(*v != 0),
            SqlValue::Int(v) => Ok(*v != 0),
            SqlValue::BigInt(v) => Ok(*v != 0),
            SqlValue::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") || s == "1" {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") || s == "0" {
                    Ok(false)
                } else {
                    Err(TypeError::TypeMismatch {
                        expected: "bit",
                        actual: format!("string '{s}'"),
                    })
                }
            }
            other => Err(mismatch("bit", other)),
        }
    }
}

impl FromSql for f64 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Float(v) => Ok(*v),
            SqlValue::Real(v) => Ok(f64::from(*v)),
            SqlValue::TinyInt(v) => Ok(f64::from(*v)),
            SqlValue::SmallInt(v) => Ok(f64::from(*v)),
            SqlValue::Int(v) => Ok(f64::from(*v)),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::BigInt(v) => Ok(*v as f64),
            SqlValue::Decimal(v) => v.to_f64().ok_or_else(|| out_of_range("float", value)),
            SqlValue::String(s) => Ok(s.trim().parse()?),
            other => Err(mismatch("float", other)),
        }
    }
}

impl FromSql for f32 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Real(v) => Ok(*v),
            SqlValue::TinyInt(v) => Ok(f32::from(*v)),
            SqlValue::SmallInt(v) => Ok(f32::from(*v)),
            SqlValue::String(s) => Ok(s.trim().parse()?),
            other => Err(mismatch("real", other)),
        }
    }
}

impl FromSql for Decimal {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Decimal(v) => Ok(*v),
            SqlValue::TinyInt(v) => Ok(Decimal::from(*v)),
            SqlValue::SmallInt(v) => Ok(Decimal::from(*v)),
            SqlValue::Int(v) => Ok(Decimal::from(*v)),
            SqlValue::BigInt(v) => Ok(Decimal::from(*v)),
            SqlValue::Float(v) => Ok(Decimal::try_from(*v)?),
            SqlValue::Real(v) => Ok(Decimal::try_from(*v)?),
            SqlValue::String(s) => Ok(Decimal::from_str(s.trim())?),
            other => Err(mismatch("decimal", other)),
        }
    }
}

/// Any non-NULL cell reads as its textual representation.
impl FromSql for String {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Err(TypeError::UnexpectedNull),
            SqlValue::String(s) | SqlValue::Xml(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }

    /// Only a database NULL is absent; an empty string stays `Some("")`.
    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            Self::from_sql(value).map(Some)
        }
    }
}

impl FromSql for Bytes {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Binary(b) => Ok(b.clone()),
            other => Err(mismatch("binary", other)),
        }
    }
}

impl FromSql for Vec<u8> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        Bytes::from_sql(value).map(|b| b.to_vec())
    }
}

impl FromSql for Uuid {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Uuid(v) => Ok(*v),
            SqlValue::String(s) => Ok(Uuid::parse_str(s.trim())?),
            other => Err(mismatch("uniqueidentifier", other)),
        }
    }
}

impl FromSql for NaiveDate {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Date(v) => Ok(*v),
            SqlValue::DateTime(v) => Ok(v.date()),
            SqlValue::String(s) => Ok(parse_date_time(s)?.date()),
            other => Err(mismatch("date", other)),
        }
    }
}

impl FromSql for NaiveTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Time(v) => Ok(*v),
            SqlValue::String(s) => Ok(NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")?),
            other => Err(mismatch("time", other)),
        }
    }
}

/// Reads the stored wall-clock value. Zone handling is left to the caller.
impl FromSql for NaiveDateTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::DateTime(v) => Ok(*v),
            SqlValue::Date(v) => Ok(v.and_time(NaiveTime::MIN)),
            SqlValue::DateTimeOffset(v) => Ok(v.naive_local()),
            SqlValue::String(s) => parse_date_time(s),
            other => Err(mismatch("datetime", other)),
        }
    }
}

impl FromSql for DateTime<FixedOffset> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::DateTimeOffset(v) => Ok(*v),
            SqlValue::String(s) => {
                let s = s.trim();
                DateTime::parse_from_rfc3339(s)
                    .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %:z"))
                    .map_err(TypeError::from)
            }
            other => Err(mismatch("datetimeoffset", other)),
        }
    }
}

impl FromSql for SqlValue {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        Ok(value.clone())
    }

    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        Ok((!value.is_null()).then(|| value.clone()))
    }
}
