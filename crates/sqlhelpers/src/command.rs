//! Command creation and parameter appending.
//!
//! The database client is abstracted behind [`Connection`] and [`Command`];
//! an adapter implements the two traits and gets [`ConnectionExt`] and
//! [`CommandExt`] for free.

use std::time::Duration;

use sqlhelpers_types::{SqlValue, ToSql, TypeSize};

use crate::binder::{BoundParameter, ParameterBinder, TableColumn};
use crate::error::Result;
use crate::policy::{CommandSettings, Policy};

/// A database command being prepared.
pub trait Command {
    /// Set the command timeout.
    fn set_command_timeout(&mut self, timeout: Duration);

    /// Append a bound parameter.
    fn add_parameter(&mut self, parameter: BoundParameter);
}

/// An open database connection.
pub trait Connection {
    /// Command type created by this connection.
    type Command: Command;
    /// Transaction handle type.
    type Transaction;

    /// Create a command, optionally with text and enlisted in a transaction.
    fn create_command(
        &self,
        text: Option<&str>,
        transaction: Option<&Self::Transaction>,
    ) -> Self::Command;
}

/// Command creation with settings applied.
pub trait ConnectionExt: Connection {
    /// Create a command and apply the command timeout.
    ///
    /// The timeout comes from `settings` when it sets one, else from the
    /// policy's command defaults. With neither, the client default stays.
    fn get_command(
        &self,
        text: Option<&str>,
        transaction: Option<&Self::Transaction>,
        settings: Option<&CommandSettings>,
        policy: &Policy,
    ) -> Self::Command {
        let mut command = self.create_command(text, transaction);
        let timeout = settings
            .and_then(|s| s.command_timeout)
            .or(policy.command.command_timeout);
        if let Some(timeout) = timeout {
            tracing::debug!(timeout_secs = timeout.as_secs(), "applying command timeout");
            command.set_command_timeout(timeout);
        }
        command
    }
}

impl<C: Connection + ?Sized> ConnectionExt for C {}

/// Bind-and-append helpers for any [`Command`].
pub trait CommandExt: Command {
    /// Bind a scalar and append it.
    fn add_scalar<T: ToSql + ?Sized>(
        &mut self,
        binder: &ParameterBinder<'_>,
        name: &str,
        value: &T,
        type_size: TypeSize,
    ) -> Result<()> {
        let parameter = binder.bind_scalar(name, value, type_size)?;
        self.add_parameter(parameter);
        Ok(())
    }

    /// Bind a sequence as a generic single-column table and append it.
    fn add_values<I>(
        &mut self,
        binder: &ParameterBinder<'_>,
        name: &str,
        values: I,
        type_size: TypeSize,
        nullable: bool,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: ToSql,
    {
        let parameter = binder.bind_values(name, values, type_size, nullable)?;
        self.add_parameter(parameter);
        Ok(())
    }

    /// Bind a table-valued parameter and append it.
    fn add_table<R, C>(
        &mut self,
        binder: &ParameterBinder<'_>,
        name: &str,
        type_name: &str,
        rows: R,
        columns: &[TableColumn],
    ) -> Result<()>
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = SqlValue>,
    {
        let parameter = binder.bind_table(name, type_name, rows, columns)?;
        self.add_parameter(parameter);
        Ok(())
    }
}

impl<C: Command + ?Sized> CommandExt for C {}
