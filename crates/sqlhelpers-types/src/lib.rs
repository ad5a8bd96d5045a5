//! # sqlhelpers-types
//!
//! SQL Server column kinds, type descriptors and value conversions used by
//! the `sqlhelpers` binding and reading layer.
//!
//! ## Overview
//!
//! - [`SqlDbType`] enumerates the column kinds a parameter or table-type
//!   column can be declared as.
//! - [`TypeSize`] pairs a kind with an optional length and knows how to
//!   describe itself as table-valued parameter column metadata.
//! - [`SqlValue`] is the raw value exchanged with the database client, with
//!   [`ToSql`] and [`FromSql`] converting to and from Rust types.
//! - [`TableValue`] carries the rows of a table-valued parameter.
//!
//! ## Example
//!
//! ```rust
//! use sqlhelpers_types::{SqlDbType, TypeSize};
//!
//! let size = TypeSize::new(SqlDbType::NVarChar);
//! assert_eq!(size.max_length().ok(), Some(4000));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod db_type;
pub mod error;
pub mod from_sql;
pub mod temporal;
pub mod to_sql;
pub mod tvp;
pub mod type_size;
pub mod value;

pub use db_type::{ColumnStrategy, SqlDbType};
pub use error::TypeError;
pub use from_sql::FromSql;
pub use temporal::TextFormat;
pub use to_sql::ToSql;
pub use tvp::{ColumnLength, ColumnMetadata, TableRows, TableValue};
pub use type_size::{ColumnEncoding, TypeSize};
pub use value::SqlValue;
