//! Recording [`Connection`] and [`Command`] implementations.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use sqlhelpers::{BoundParameter, Command, Connection};

/// A connection that hands out [`MockCommand`]s.
#[derive(Debug, Default)]
pub struct MockConnection {
    next_transaction: AtomicU32,
}

/// A transaction handle; only its id is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTransaction {
    /// Transaction id, unique per connection.
    pub id: u32,
}

impl MockConnection {
    /// Create a connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a transaction.
    pub fn begin_transaction(&self) -> MockTransaction {
        let id = self.next_transaction.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(id = id, "beginning mock transaction");
        MockTransaction { id }
    }
}

impl Connection for MockConnection {
    type Command = MockCommand;
    type Transaction = MockTransaction;

    fn create_command(
        &self,
        text: Option<&str>,
        transaction: Option<&MockTransaction>,
    ) -> MockCommand {
        MockCommand {
            text: text.map(str::to_string),
            transaction: transaction.map(|t| t.id),
            ..MockCommand::default()
        }
    }
}

/// A command that records its settings and parameters.
#[derive(Debug, Clone, Default)]
pub struct MockCommand {
    /// Command text.
    pub text: Option<String>,
    /// Command timeout, if one was set.
    pub timeout: Option<Duration>,
    /// Id of the enlisted transaction.
    pub transaction: Option<u32>,
    parameters: Vec<BoundParameter>,
}

impl MockCommand {
    /// Create a command with text and no parameters.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Parameters in the order they were added.
    #[must_use]
    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    /// Look up a parameter by name, ignoring case and a leading `@`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&BoundParameter> {
        let name = name.trim_start_matches('@');
        self.parameters
            .iter()
            .find(|p| p.name.trim_start_matches('@').eq_ignore_ascii_case(name))
    }
}

impl Command for MockCommand {
    fn set_command_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn add_parameter(&mut self, parameter: BoundParameter) {
        tracing::trace!(name = %parameter.name, "adding parameter");
        self.parameters.push(parameter);
    }
}
