//! Conversion of Rust values into [`SqlValue`]s.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::value::SqlValue;

/// A Rust value that can be sent to SQL Server.
///
/// `Option<T>` maps `None` to a database NULL.
pub trait ToSql {
    /// Convert to a raw SQL value.
    fn to_sql(&self) -> SqlValue;
}

macro_rules! impl_to_sql {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ToSql for $ty {
                #[allow(clippy::clone_on_copy)]
                fn to_sql(&self) -> SqlValue {
                    SqlValue::$variant(self.clone())
                }
            }
        )*
    };
}

impl_to_sql! {
    bool => Bool,
    u8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Real,
    f64 => Float,
    Decimal => Decimal,
    String => String,
    Bytes => Binary,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
}

impl ToSql for str {
    fn to_sql(&self) -> SqlValue {
        SqlValue::String(self.to_owned())
    }
}

impl ToSql for [u8] {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Binary(Bytes::copy_from_slice(self))
    }
}

impl ToSql for Vec<u8> {
    fn to_sql(&self) -> SqlValue {
        SqlValue::Binary(Bytes::copy_from_slice(self))
    }
}

impl ToSql for DateTime<Utc> {
    fn to_sql(&self) -> SqlValue {
        SqlValue::DateTimeOffset(self.fixed_offset())
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> SqlValue {
        self.clone()
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> SqlValue {
        match self {
            Some(value) => value.to_sql(),
            None => SqlValue::Null,
        }
    }
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> SqlValue {
        (**self).to_sql()
    }
}
