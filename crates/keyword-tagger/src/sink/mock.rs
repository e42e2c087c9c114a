//! Recording connector for testing sink behaviour without a database.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, TaggerError};

use super::config::RelationalTarget;
use super::connection::{Connector, SinkConnection};
use super::value::SinkValue;

/// A statement observed by a [`RecordingConnector`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedStatement {
    Connect { endpoint: String },
    Session(String),
    Execute { sql: String, params: Vec<SinkValue> },
    ExecuteMany { sql: String, rows: Vec<Vec<SinkValue>> },
    Count(String),
    Commit,
    Close,
}

#[derive(Debug, Default)]
struct Shared {
    log: Vec<RecordedStatement>,
    committed_rows: i64,
}

/// Connector whose connections record every call and keep an in-memory row
/// count, so `query_count` reflects inserts made through it.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    shared: Arc<Mutex<Shared>>,
    fail_inserts: bool,
    initial_rows: i64,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows the fake table holds before the first insert.
    pub fn with_initial_rows(mut self, rows: i64) -> Self {
        self.initial_rows = rows;
        self
    }

    /// Make every insert fail with a driver error.
    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    /// Everything recorded so far, across connections.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        lock(&self.shared).log.clone()
    }

    /// Whether any insert statement was issued.
    pub fn inserted_anything(&self) -> bool {
        self.statements().iter().any(|s| {
            matches!(
                s,
                RecordedStatement::Execute { .. } | RecordedStatement::ExecuteMany { .. }
            )
        })
    }
}

impl Connector for RecordingConnector {
    type Connection = RecordingConnection;

    fn connect(&self, target: &RelationalTarget) -> Result<RecordingConnection> {
        lock(&self.shared).log.push(RecordedStatement::Connect {
            endpoint: target.connection.endpoint(),
        });
        Ok(RecordingConnection {
            shared: Arc::clone(&self.shared),
            fail_inserts: self.fail_inserts,
            base_rows: self.initial_rows,
            pending_rows: 0,
        })
    }
}

/// Connection handed out by [`RecordingConnector`].
#[derive(Debug)]
pub struct RecordingConnection {
    shared: Arc<Mutex<Shared>>,
    fail_inserts: bool,
    base_rows: i64,
    pending_rows: i64,
}

impl RecordingConnection {
    fn record(&self, statement: RecordedStatement) {
        lock(&self.shared).log.push(statement);
    }
}

impl SinkConnection for RecordingConnection {
    fn apply_session(&mut self, statement: &str) -> Result<()> {
        self.record(RecordedStatement::Session(statement.to_string()));
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[SinkValue]) -> Result<usize> {
        self.record(RecordedStatement::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if self.fail_inserts {
            return Err(TaggerError::sink_write("insert", "simulated driver failure"));
        }
        self.pending_rows += 1;
        Ok(1)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<SinkValue>]) -> Result<usize> {
        self.record(RecordedStatement::ExecuteMany {
            sql: sql.to_string(),
            rows: rows.to_vec(),
        });
        if self.fail_inserts {
            return Err(TaggerError::sink_write("insert", "simulated driver failure"));
        }
        self.pending_rows += rows.len() as i64;
        Ok(rows.len())
    }

    fn query_count(&mut self, sql: &str) -> Result<i64> {
        self.record(RecordedStatement::Count(sql.to_string()));
        let committed = lock(&self.shared).committed_rows;
        Ok(self.base_rows + committed + self.pending_rows)
    }

    fn commit(&mut self) -> Result<()> {
        self.record(RecordedStatement::Commit);
        lock(&self.shared).committed_rows += self.pending_rows;
        self.pending_rows = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.record(RecordedStatement::Close);
        self.pending_rows = 0;
        Ok(())
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
