//! Column type descriptors.

use crate::db_type::{ColumnStrategy, SqlDbType};
use crate::error::TypeError;
use crate::temporal::TextFormat;
use crate::tvp::{ColumnLength, ColumnMetadata};
use crate::value::SqlValue;

/// A column kind plus an optional length.
///
/// Constructed per logical column and immutable afterwards. A size of
/// [`TypeSize::UNSPECIFIED`] (`-1`) means "unspecified", which for
/// character and binary kinds is the kind's maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSize {
    db_type: SqlDbType,
    size: i32,
}

/// How a column is encoded inside a table-valued parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEncoding {
    /// Column metadata as sent to the client.
    pub metadata: ColumnMetadata,
    /// Text conversion applied to every cell, for kinds the TVP encoder
    /// cannot carry natively.
    pub text_format: Option<TextFormat>,
}

impl TypeSize {
    /// Marker for an unspecified size.
    pub const UNSPECIFIED: i32 = -1;

    /// A descriptor with unspecified size.
    #[must_use]
    pub const fn new(db_type: SqlDbType) -> Self {
        Self {
            db_type,
            size: Self::UNSPECIFIED,
        }
    }

    /// A descriptor with an explicit size.
    #[must_use]
    pub const fn with_size(db_type: SqlDbType, size: i32) -> Self {
        Self { db_type, size }
    }

    /// The column kind.
    #[must_use]
    pub const fn db_type(&self) -> SqlDbType {
        self.db_type
    }

    /// The raw size, `-1` when unspecified.
    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    /// The size if set, otherwise the kind's documented maximum.
    ///
    /// Fails with [`TypeError::UnsupportedOperation`] for kinds that have no
    /// defined maximum when the size is unspecified.
    pub fn max_length(&self) -> Result<i32, TypeError> {
        if self.size != Self::UNSPECIFIED {
            return Ok(self.size);
        }
        match self.db_type {
            SqlDbType::Char | SqlDbType::VarChar => Ok(8000),
            SqlDbType::NChar | SqlDbType::NVarChar => Ok(4000),
            SqlDbType::Binary | SqlDbType::VarBinary => Ok(8000),
            SqlDbType::Text | SqlDbType::Image => Ok(i32::MAX),
            SqlDbType::NText => Ok(1_073_741_823),
            other => Err(TypeError::UnsupportedOperation(format!(
                "{other} has no defined maximum length"
            ))),
        }
    }

    /// The size as a declared column length.
    ///
    /// `-1` is `(MAX)`; zero and other negative sizes are rejected.
    pub fn column_length(&self) -> Result<ColumnLength, TypeError> {
        match self.size {
            Self::UNSPECIFIED => Ok(ColumnLength::Max),
            n if n > 0 => Ok(ColumnLength::Fixed(n.unsigned_abs())),
            n => Err(TypeError::InvalidLength(n)),
        }
    }

    /// Describe this column for a table-valued parameter.
    ///
    /// Returns `Ok(None)` when the kind has no safe representation and the
    /// caller should infer the column from its data instead. Nesting a
    /// structured kind fails with [`TypeError::InvalidOperation`].
    pub fn to_column_encoding(&self, field_name: &str) -> Result<Option<ColumnEncoding>, TypeError> {
        let (metadata, text_format) = match self.db_type.column_strategy() {
            ColumnStrategy::WithLength => (
                ColumnMetadata::new(field_name, self.db_type, self.column_length()?),
                None,
            ),
            ColumnStrategy::WithoutLength => (
                ColumnMetadata::new(field_name, self.db_type, ColumnLength::Unsized),
                None,
            ),
            ColumnStrategy::Substitute(to) => {
                let length = match to.column_strategy() {
                    ColumnStrategy::WithLength => Self::with_size(to, self.size).column_length()?,
                    _ => ColumnLength::Unsized,
                };
                (ColumnMetadata::new(field_name, to, length), None)
            }
            ColumnStrategy::AsText(format) => (
                ColumnMetadata::new(
                    field_name,
                    SqlDbType::Char,
                    ColumnLength::Fixed(format.length()),
                ),
                Some(format),
            ),
            ColumnStrategy::Forbidden => {
                return Err(TypeError::InvalidOperation(format!(
                    "column '{field_name}' cannot be {} inside a table-valued parameter",
                    self.db_type
                )));
            }
            ColumnStrategy::Unsupported => return Ok(None),
        };

        Ok(Some(ColumnEncoding {
            metadata,
            text_format,
        }))
    }

    /// Parse a T-SQL type declaration like `INT`, `NVARCHAR(100)` or
    /// `VARBINARY(MAX)`.
    ///
    /// Precision and scale of `DECIMAL(p, s)` are accepted but not kept.
    pub fn from_sql_type(sql_type: &str) -> Result<Self, TypeError> {
        let sql_type = sql_type.trim();
        let (base, args) = match sql_type.find('(') {
            Some(start) => {
                let end = sql_type
                    .rfind(')')
                    .filter(|end| *end > start)
                    .ok_or_else(|| TypeError::UnknownSqlType(sql_type.to_string()))?;
                (&sql_type[..start], Some(sql_type[start + 1..end].trim()))
            }
            None => (sql_type, None),
        };

        let db_type = SqlDbType::from_name(base)
            .ok_or_else(|| TypeError::UnknownSqlType(sql_type.to_string()))?;

        let size = match args {
            Some(inner) if matches!(db_type.column_strategy(), ColumnStrategy::WithLength) => {
                Self::parse_length(inner)?
            }
            _ => Self::UNSPECIFIED,
        };
        Ok(Self::with_size(db_type, size))
    }

    /// Parse a length from `100` or `MAX`.
    fn parse_length(inner: &str) -> Result<i32, TypeError> {
        if inner.eq_ignore_ascii_case("MAX") {
            Ok(Self::UNSPECIFIED)
        } else {
            Ok(inner.parse()?)
        }
    }
}

impl ColumnEncoding {
    /// Infer the encoding of a column from its first non-null value.
    ///
    /// Kinds that must travel as text keep doing so when inferred, so a
    /// `NaiveDateTime` sample yields `CHAR(27)` rather than a lossy
    /// `DATETIME`. Returns `None` for NULL.
    #[must_use]
    pub fn infer_from_value(field_name: &str, sample: &SqlValue) -> Option<Self> {
        let db_type = sample.natural_type()?;
        if let ColumnStrategy::AsText(format) = db_type.column_strategy() {
            return Some(Self {
                metadata: ColumnMetadata::new(
                    field_name,
                    SqlDbType::Char,
                    ColumnLength::Fixed(format.length()),
                ),
                text_format: Some(format),
            });
        }
        Some(Self {
            metadata: ColumnMetadata::infer_from_value(field_name, sample)?,
            text_format: None,
        })
    }
}

impl From<SqlDbType> for TypeSize {
    fn from(db_type: SqlDbType) -> Self {
        Self::new(db_type)
    }
}
