//! Type conversion errors.

use thiserror::Error;

/// Errors that can occur when describing SQL types or converting values.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum TypeError {
    /// A database NULL was read where a value was required.
    #[error("unexpected NULL value")]
    UnexpectedNull,

    /// The raw value cannot be converted to the requested type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The requested type.
        expected: &'static str,
        /// Description of the value that was found.
        actual: String,
    },

    /// The operation has no meaning for this column kind.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The operation is structurally invalid (e.g. nesting a table type).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A length that is neither positive nor the `-1` max marker.
    #[error("invalid length {0}: must be positive, or -1 for max")]
    InvalidLength(i32),

    /// Row width does not match the column definitions.
    #[error("column count mismatch: expected {expected}, got {actual}")]
    ColumnCountMismatch {
        /// Expected number of columns.
        expected: usize,
        /// Actual number of values in the row.
        actual: usize,
    },

    /// Unknown SQL type name.
    #[error("unknown SQL type: {0}")]
    UnknownSqlType(String),

    /// Malformed well-known text.
    #[error("invalid well-known text: {0}")]
    InvalidWkt(String),

    /// Integer text failed to parse.
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    /// Floating point text failed to parse.
    #[error(transparent)]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// Date or time text failed to parse.
    #[error(transparent)]
    ParseDateTime(#[from] chrono::ParseError),

    /// GUID text failed to parse.
    #[error(transparent)]
    ParseUuid(#[from] uuid::Error),

    /// Decimal text failed to parse.
    #[error(transparent)]
    ParseDecimal(#[from] rust_decimal::Error),
}
