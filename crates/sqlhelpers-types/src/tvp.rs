//! Table-valued parameter (TVP) data structures.
//!
//! A TVP carries a whole table as a single command parameter. The client
//! needs the user-defined table type name, per-column metadata, and the
//! rows themselves:
//!
//! ```text
//! TVP = TYPENAME COLUMN_METADATA (NO_ROWS | ROW+)
//! ```
//!
//! The protocol distinguishes a table with zero rows from an absent table,
//! so an empty TVP is always represented by the explicit
//! [`TableRows::NoRows`] marker rather than an empty row list.

use std::fmt;

use crate::db_type::SqlDbType;
use crate::error::TypeError;
use crate::value::SqlValue;

/// Declared length of a TVP column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnLength {
    /// `(MAX)`.
    Max,
    /// An explicit length in characters or bytes.
    Fixed(u32),
    /// The kind takes no length.
    Unsized,
}

impl fmt::Display for ColumnLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => f.write_str("(MAX)"),
            Self::Fixed(n) => write!(f, "({n})"),
            Self::Unsized => Ok(()),
        }
    }
}

/// Metadata for one column of a table-valued parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Field name within the table type.
    pub name: String,
    /// Column kind as sent on the wire.
    pub db_type: SqlDbType,
    /// Declared length.
    pub length: ColumnLength,
}

impl ColumnMetadata {
    /// Create column metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, db_type: SqlDbType, length: ColumnLength) -> Self {
        Self {
            name: name.into(),
            db_type,
            length,
        }
    }

    /// Infer column metadata from a sample value.
    ///
    /// Character and binary data infer as `(MAX)` so that later, longer
    /// values are never truncated to the sample's length. Returns `None`
    /// for NULL, which carries no type.
    #[must_use]
    pub fn infer_from_value(name: impl Into<String>, value: &SqlValue) -> Option<Self> {
        let db_type = value.natural_type()?;
        let length = match db_type {
            SqlDbType::NVarChar | SqlDbType::VarBinary => ColumnLength::Max,
            _ => ColumnLength::Unsized,
        };
        Some(Self::new(name, db_type, length))
    }

    /// T-SQL spelling of the column type, e.g. `NVARCHAR(MAX)` or `CHAR(27)`.
    #[must_use]
    pub fn sql_type(&self) -> String {
        format!("{}{}", self.db_type.name().to_ascii_uppercase(), self.length)
    }
}

/// Rows of a table-valued parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRows {
    /// The table has no rows.
    NoRows,
    /// At least one row, each exactly as wide as `columns`.
    Records {
        /// Column definitions.
        columns: Vec<ColumnMetadata>,
        /// Row data, one `SqlValue` per column.
        rows: Vec<Vec<SqlValue>>,
    },
}

/// Table-valued parameter data ready to hand to the database client.
#[derive(Debug, Clone, PartialEq)]
pub struct TableValue {
    /// The table type name as declared in the database, optionally
    /// schema-qualified (`dbo.TableType_Generic_Int`).
    pub type_name: String,
    /// The rows.
    pub rows: TableRows,
}

impl TableValue {
    /// A table with no rows.
    #[must_use]
    pub fn no_rows(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            rows: TableRows::NoRows,
        }
    }

    /// Build a table from column definitions and rows.
    ///
    /// Returns `Err` if any row's width differs from the column count. An
    /// empty row list yields [`TableRows::NoRows`].
    pub fn from_records(
        type_name: impl Into<String>,
        columns: Vec<ColumnMetadata>,
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<Self, TypeError> {
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(TypeError::ColumnCountMismatch {
                expected: columns.len(),
                actual: row.len(),
            });
        }
        if rows.is_empty() {
            return Ok(Self::no_rows(type_name));
        }
        Ok(Self {
            type_name: type_name.into(),
            rows: TableRows::Records { columns, rows },
        })
    }

    /// Schema part of the type name, if qualified.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.type_name.rsplit_once('.').map(|(schema, _)| schema)
    }

    /// Type name without the schema.
    #[must_use]
    pub fn unqualified_name(&self) -> &str {
        self.type_name
            .rsplit_once('.')
            .map_or(self.type_name.as_str(), |(_, name)| name)
    }

    /// Column definitions. Empty for a table with no rows.
    #[must_use]
    pub fn columns(&self) -> &[ColumnMetadata] {
        match &self.rows {
            TableRows::NoRows => &[],
            TableRows::Records { columns, .. } => columns,
        }
    }

    /// Row data. Empty for a table with no rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        match &self.rows {
            TableRows::NoRows => &[],
            TableRows::Records { rows, .. } => rows,
        }
    }

    /// Get the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    /// Check if the TVP has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.rows, TableRows::NoRows)
    }

    /// Get the number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns().len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn int_column(name: &str) -> ColumnMetadata {
        ColumnMetadata::new(name, SqlDbType::Int, ColumnLength::Unsized)
    }

    #[test]
    fn test_from_records() {
        let tvp = TableValue::from_records(
            "dbo.UserIdList",
            vec![int_column("v")],
            vec![
                vec![SqlValue::Int(1)],
                vec![SqlValue::Int(2)],
                vec![SqlValue::Int(3)],
            ],
        )
        .unwrap();

        assert_eq!(tvp.schema(), Some("dbo"));
        assert_eq!(tvp.unqualified_name(), "UserIdList");
        assert_eq!(tvp.column_count(), 1);
        assert_eq!(tvp.len(), 3);
        assert!(!tvp.is_empty());
    }

    #[test]
    fn test_row_mismatch() {
        let result = TableValue::from_records(
            "Test",
            vec![int_column("i")],
            vec![vec![SqlValue::Int(1), SqlValue::Int(2)]],
        );
        assert!(matches!(
            result,
            Err(TypeError::ColumnCountMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_zero_rows_is_explicit_marker() {
        let tvp = TableValue::from_records("Test", vec![int_column("i")], Vec::new()).unwrap();
        assert_eq!(tvp.rows, TableRows::NoRows);
        assert!(tvp.is_empty());
        assert_eq!(tvp.schema(), None);
        assert_eq!(tvp.unqualified_name(), "Test");
    }

    #[test]
    fn test_infer_from_value() {
        let meta = ColumnMetadata::infer_from_value("v", &SqlValue::String("abd".into())).unwrap();
        assert_eq!(meta.db_type, SqlDbType::NVarChar);
        assert_eq!(meta.length, ColumnLength::Max);
        assert_eq!(meta.sql_type(), "NVARCHAR(MAX)");

        let meta = ColumnMetadata::infer_from_value("v", &SqlValue::BigInt(1)).unwrap();
        assert_eq!(meta.sql_type(), "BIGINT");

        assert!(ColumnMetadata::infer_from_value("v", &SqlValue::Null).is_none());
    }
}
