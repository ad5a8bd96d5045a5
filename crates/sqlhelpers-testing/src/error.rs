//! Errors raised by the fake server.

use thiserror::Error;

/// An error the fake server reports, mirroring the server-side failures a
/// real SQL Server would raise for the same command.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// The command references a parameter that was never added.
    #[error("must declare the scalar variable \"{0}\"")]
    UnknownParameter(String),

    /// A table-valued parameter names a type the server does not know.
    #[error("cannot find table type '{0}'")]
    UnknownType(String),

    /// A type with this name already exists.
    #[error("there is already an object named '{0}' in the database")]
    TypeExists(String),

    /// A scalar parameter was used as a table.
    #[error("parameter '{0}' is not a table-valued parameter")]
    NotTableValued(String),

    /// A table-valued parameter was used as a scalar.
    #[error("parameter '{0}' is a table-valued parameter")]
    NotScalar(String),

    /// The rows do not match the table type's width.
    #[error("table type '{type_name}' has {expected} columns, parameter has {actual}")]
    ColumnCount {
        /// Table type name.
        type_name: String,
        /// Declared column count.
        expected: usize,
        /// Bound column count.
        actual: usize,
    },

    /// A projected column does not exist.
    #[error("invalid column name '{0}'")]
    InvalidColumn(String),

    /// NULL inserted into a NOT NULL column.
    #[error("cannot insert the value NULL into column '{0}'")]
    NullViolation(String),

    /// Duplicate primary key.
    #[error("violation of PRIMARY KEY constraint on table type '{0}'")]
    DuplicateKey(String),

    /// A cell could not be converted to the declared column type.
    #[error("conversion failed for column '{column}': {message}")]
    Conversion {
        /// Column name.
        column: String,
        /// What went wrong.
        message: String,
    },

    /// The value does not fit the column.
    #[error("string or binary data would be truncated in column '{column}'")]
    Truncation {
        /// Column name.
        column: String,
    },

    /// The value is outside the column type's range.
    #[error("value out of range for column '{column}': {message}")]
    OutOfRange {
        /// Column name.
        column: String,
        /// What went wrong.
        message: String,
    },

    /// The DDL could not be parsed.
    #[error("invalid DDL: {0}")]
    Ddl(String),

    /// The command text is not one of the supported query shapes.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// Client-side error while building results.
    #[error(transparent)]
    Client(#[from] sqlhelpers::Error),
}
