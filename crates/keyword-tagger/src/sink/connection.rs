//! Driver seam for relational sinks.

use std::ops::{Deref, DerefMut};

use tracing::{info, warn};

use crate::error::Result;

use super::config::RelationalTarget;
use super::value::SinkValue;

/// An open connection to a relational target.
///
/// Implementations group every statement of one connection into a single
/// unit of work that becomes durable on [`SinkConnection::commit`].
pub trait SinkConnection {
    /// Run a session setup statement (date formats, pragmas, ...).
    fn apply_session(&mut self, statement: &str) -> Result<()>;

    /// Execute a parameterized statement once; returns affected rows.
    fn execute(&mut self, sql: &str, params: &[SinkValue]) -> Result<usize>;

    /// Execute a parameterized statement once per parameter row.
    fn execute_many(&mut self, sql: &str, rows: &[Vec<SinkValue>]) -> Result<usize>;

    /// Run a `SELECT COUNT(*)`-style query and return the single value.
    fn query_count(&mut self, sql: &str) -> Result<i64>;

    fn commit(&mut self) -> Result<()>;

    /// Release the connection. Uncommitted work is discarded.
    fn close(&mut self) -> Result<()>;
}

/// Opens connections for a target.
pub trait Connector {
    type Connection: SinkConnection;

    fn connect(&self, target: &RelationalTarget) -> Result<Self::Connection>;
}

/// Closes the wrapped connection when dropped, so every exit path releases
/// it; [`ScopedConnection::finish`] closes it explicitly and reports errors.
pub struct ScopedConnection<C: SinkConnection> {
    inner: C,
    endpoint: String,
    closed: bool,
}

impl<C: SinkConnection> ScopedConnection<C> {
    pub fn new(inner: C, endpoint: impl Into<String>) -> Self {
        Self {
            inner,
            endpoint: endpoint.into(),
            closed: false,
        }
    }

    /// Close now, surfacing any driver error.
    pub fn finish(mut self) -> Result<()> {
        self.closed = true;
        self.inner.close()?;
        info!(endpoint = %self.endpoint, "Disconnected");
        Ok(())
    }
}

impl<C: SinkConnection> Deref for ScopedConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<C: SinkConnection> DerefMut for ScopedConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.inner
    }
}

impl<C: SinkConnection> Drop for ScopedConnection<C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.inner.close() {
            Ok(()) => info!(endpoint = %self.endpoint, "Disconnected without commit"),
            Err(e) => warn!(endpoint = %self.endpoint, error = %e, "Failed to close connection"),
        }
    }
}
