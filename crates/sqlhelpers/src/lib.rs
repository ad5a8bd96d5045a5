//! # sqlhelpers
//!
//! Helpers for binding command parameters to, and reading typed values
//! from, SQL Server.
//!
//! ## Features
//!
//! - **Table-valued parameters**: bind any row sequence against a
//!   user-defined table type, or a plain sequence against the generic
//!   `TableType_Generic_<Kind>` types
//! - **Null-aware reading**: nullable getters treat NULL and empty text
//!   alike, with textual fallback parsing for every getter
//! - **Time zone policy**: date-times stored in UTC are converted on the
//!   way in and out
//! - **Geography**: WKT text columns read as [`Geography`] values
//! - **Schema**: `CREATE TYPE` scripts for the generic table types
//!
//! ## Example
//!
//! ```rust
//! use sqlhelpers::{ParameterBinder, Policy, Row, RowReader, SqlDbType, SqlValue, TypeSize};
//!
//! # fn main() -> Result<(), sqlhelpers::Error> {
//! let policy = Policy::default();
//!
//! let binder = ParameterBinder::new(&policy);
//! let ids = binder.bind_ints("@ids", [1, 2, 3])?;
//! assert_eq!(ids.as_table().map(|t| t.type_name.as_str()), Some("dbo.TableType_Generic_Int"));
//!
//! let row = Row::from_pairs([("Name", SqlValue::String(String::new()))]);
//! let reader = RowReader::new(&policy);
//! assert_eq!(reader.get_string(&row, "name")?, Some(String::new()));
//! assert_eq!(reader.get_nullable_int(&row, "name")?, None);
//! # let _ = TypeSize::new(SqlDbType::Int);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod binder;
pub mod command;
pub mod diagnostics;
pub mod error;
pub mod geography;
pub mod policy;
pub mod reader;
pub mod row;
pub mod schema;
pub mod time;

pub use binder::{BoundParameter, DEFAULT_FIELD_NAME, ParameterBinder, ParameterValue, TableColumn};
pub use command::{Command, CommandExt, Connection, ConnectionExt};
pub use diagnostics::{DiagnosticSink, Diagnostics};
pub use error::{Error, Result};
pub use geography::{Coord, Geography, Shape};
pub use policy::{CommandSettings, LocalZone, Policy, PolicyOptions};
pub use reader::RowReader;
pub use row::{Column, Cursor, Row};

// Re-export the value layer
pub use sqlhelpers_types::{
    ColumnLength, ColumnMetadata, FromSql, SqlDbType, SqlValue, TableRows, TableValue, ToSql,
    TypeError, TypeSize,
};
