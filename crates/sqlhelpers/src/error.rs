//! Error types for binding and reading.

use sqlhelpers_types::TypeError;
use thiserror::Error;

/// Errors surfaced by the binder, the reader and the command helpers.
///
/// Argument errors are caller contract violations and are never recovered
/// from internally. Parse failures on cell conversion arrive as
/// [`Error::Type`] wrapping the underlying parse error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A required argument is missing.
    #[error("argument '{0}' is required")]
    ArgumentNull(&'static str),

    /// An argument is outside its allowed range.
    #[error("argument '{argument}' out of range: {message}")]
    ArgumentOutOfRange {
        /// The offending argument.
        argument: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// An argument is malformed.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The type cannot be translated, even by inference.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Structural misuse, such as nesting a table type in a table type.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The field is not part of the active result set.
    #[error("field '{0}' not found in result set")]
    FieldNotFound(String),

    /// A parameter or type name is not a valid identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Invalid policy configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Value conversion failed.
    #[error(transparent)]
    Type(TypeError),
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOperation(message) => Self::InvalidOperation(message),
            TypeError::InvalidLength(length) => Self::ArgumentOutOfRange {
                argument: "size",
                message: format!("{length} is neither positive nor -1 (max)"),
            },
            TypeError::ColumnCountMismatch { expected, actual } => Self::ArgumentOutOfRange {
                argument: "rows",
                message: format!("row has {actual} values, expected {expected}"),
            },
            other => Self::Type(other),
        }
    }
}

/// Result type for sqlhelpers operations.
pub type Result<T> = std::result::Result<T, Error>;
