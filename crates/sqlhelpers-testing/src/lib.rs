//! # sqlhelpers-testing
//!
//! Test infrastructure for `sqlhelpers`: recording [`MockConnection`] and
//! [`MockCommand`] implementations of the client traits, and a
//! [`FakeServer`] that evaluates table-valued and scalar parameters the way
//! SQL Server does.
//!
//! ## Example
//!
//! ```rust
//! use sqlhelpers::{CommandExt, ConnectionExt, ParameterBinder, Policy, RowReader, SqlDbType, TypeSize};
//! use sqlhelpers_testing::{FakeServer, MockConnection};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = Policy::default();
//! let server = FakeServer::with_generic_types(&policy)?;
//! let conn = MockConnection::new();
//!
//! let mut cmd = conn.get_command(Some("SELECT v FROM @ids"), None, None, &policy);
//! let binder = ParameterBinder::new(&policy);
//! cmd.add_values(&binder, "@ids", [3, 1, 2], TypeSize::new(SqlDbType::Int), false)?;
//!
//! let mut rs = server.execute_reader(&cmd)?;
//! let reader = RowReader::new(&policy);
//! let ids = rs.read_all(|row| reader.get_int(row, "v"))?;
//! assert_eq!(ids, vec![3, 1, 2]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod mock;
pub mod result_set;
pub mod server;

pub use error::ServerError;
pub use mock::{MockCommand, MockConnection, MockTransaction};
pub use result_set::ResultSet;
pub use server::{FakeServer, TableType, TypeColumn};
