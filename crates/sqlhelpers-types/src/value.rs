//! Raw SQL values.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db_type::SqlDbType;

/// A value as exchanged with the database client: a parameter value before
/// it is sent, or a cell read from a result set.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SqlValue {
    /// Database NULL.
    Null,
    /// BIT.
    Bool(bool),
    /// TINYINT.
    TinyInt(u8),
    /// SMALLINT.
    SmallInt(i16),
    /// INT.
    Int(i32),
    /// BIGINT.
    BigInt(i64),
    /// REAL.
    Real(f32),
    /// FLOAT.
    Float(f64),
    /// DECIMAL, NUMERIC, MONEY and SMALLMONEY.
    Decimal(Decimal),
    /// Character data of any width.
    String(String),
    /// Binary data of any width.
    Binary(Bytes),
    /// UNIQUEIDENTIFIER.
    Uuid(Uuid),
    /// DATE.
    Date(NaiveDate),
    /// TIME.
    Time(NaiveTime),
    /// DATETIME, SMALLDATETIME and DATETIME2. Carries no zone.
    DateTime(NaiveDateTime),
    /// DATETIMEOFFSET.
    DateTimeOffset(DateTime<FixedOffset>),
    /// XML.
    Xml(String),
}

impl SqlValue {
    /// Whether this is a database NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this cell counts as absent for nullable reads: a database
    /// NULL or an empty string.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Whether this is a zone-less date-time.
    #[must_use]
    pub fn is_date_time(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }

    /// Borrow character data, if this is a string or XML value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Xml(s) => Some(s),
            _ => None,
        }
    }

    /// Short description of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bit",
            Self::TinyInt(_) => "tinyint",
            Self::SmallInt(_) => "smallint",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Real(_) => "real",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::Uuid(_) => "uniqueidentifier",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::DateTimeOffset(_) => "datetimeoffset",
            Self::Xml(_) => "xml",
        }
    }

    /// The column kind a value of this variant is naturally sent as.
    ///
    /// Returns `None` for NULL, which carries no type of its own.
    #[must_use]
    pub fn natural_type(&self) -> Option<SqlDbType> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => SqlDbType::Bit,
            Self::TinyInt(_) => SqlDbType::TinyInt,
            Self::SmallInt(_) => SqlDbType::SmallInt,
            Self::Int(_) => SqlDbType::Int,
            Self::BigInt(_) => SqlDbType::BigInt,
            Self::Real(_) => SqlDbType::Real,
            Self::Float(_) => SqlDbType::Float,
            Self::Decimal(_) => SqlDbType::Decimal,
            Self::String(_) => SqlDbType::NVarChar,
            Self::Binary(_) => SqlDbType::VarBinary,
            Self::Uuid(_) => SqlDbType::UniqueIdentifier,
            Self::Date(_) => SqlDbType::Date,
            Self::Time(_) => SqlDbType::Time,
            Self::DateTime(_) => SqlDbType::DateTime2,
            Self::DateTimeOffset(_) => SqlDbType::DateTimeOffset,
            Self::Xml(_) => SqlDbType::Xml,
        })
    }
}

/// Textual representation, as the client library would render the cell.
/// NULL renders as an empty string.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::TinyInt(v) => write!(f, "{v}"),
            Self::SmallInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::String(s) | Self::Xml(s) => f.write_str(s),
            Self::Binary(b) => {
                f.write_str("0x")?;
                for byte in b.iter() {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::DateTimeOffset(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f %:z")),
        }
    }
}
