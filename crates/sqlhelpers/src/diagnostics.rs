//! Best-effort diagnostics for non-fatal anomalies.
//!
//! Binding and reading never fail because of a diagnostic. Every message is
//! logged through `tracing` at `WARN`; if a [`DiagnosticSink`] is installed
//! it also receives the message, and any error or panic it raises is
//! swallowed at the call site.
//!
//! ```rust
//! use sqlhelpers::diagnostics::Diagnostics;
//!
//! let diagnostics = Diagnostics::from_fn(|message| eprintln!("sqlhelpers: {message}"));
//! diagnostics.emit("falling back to inference");
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Error type a sink may report. It is discarded.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// A consumer of diagnostic messages.
pub trait DiagnosticSink: Send + Sync {
    /// Receive one message.
    fn write(&self, message: &str) -> Result<(), SinkError>;
}

struct FnSink<F>(F);

impl<F> DiagnosticSink for FnSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn write(&self, message: &str) -> Result<(), SinkError> {
        (self.0)(message);
        Ok(())
    }
}

/// Handle to an optional diagnostic sink. Defaults to no sink.
#[derive(Clone, Default)]
pub struct Diagnostics {
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl Diagnostics {
    /// No sink; messages only go to `tracing`.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Forward messages to `sink`.
    #[must_use]
    pub fn new(sink: impl DiagnosticSink + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
        }
    }

    /// Forward messages to a closure.
    #[must_use]
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self::new(FnSink(f))
    }

    /// Whether a sink is installed.
    #[must_use]
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Emit a message.
    ///
    /// Sink errors and panics are caught and discarded. A process built with
    /// `panic = "abort"` cannot catch panics, so sinks should not panic.
    pub fn emit(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::warn!(message, "sqlhelpers diagnostic");

        let Some(sink) = &self.sink else {
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| sink.write(message))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "diagnostic sink failed"),
            Err(_) => tracing::debug!("diagnostic sink panicked"),
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("sink", &self.sink.as_ref().map(|_| "installed"))
            .finish()
    }
}
