//! Batch persistence of tagged rows into a relational table.

use serde::Serialize;
use tracing::{info, info_span, warn, Span};

use crate::error::{Result, TaggerError};
use crate::input::DataTable;

use super::config::{RelationalTarget, SinkMapping};
use super::connection::{Connector, ScopedConnection, SinkConnection};
use super::sqlite::SqliteConnector;
use super::value::SinkValue;

/// Coerced rows ready for one insert call.
///
/// Built once per [`RelationalSink::persist`] call and consumed by
/// submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    rows: Vec<Vec<SinkValue>>,
}

impl Batch {
    /// Project every table row through the mapping, coercing each cell to its
    /// column kind.
    pub fn build(table: &DataTable, mapping: &SinkMapping, date_format: &str) -> Result<Self> {
        let sources = mapping
            .columns()
            .iter()
            .map(|column| {
                table.column_index(&column.source).ok_or_else(|| {
                    TaggerError::Configuration(format!(
                        "Output column '{}' not found in table (columns: {:?})",
                        column.source, table.headers
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(table.row_count());
        for row_idx in 0..table.row_count() {
            let mut values = Vec::with_capacity(sources.len());
            for (column, &col_idx) in mapping.columns().iter().zip(&sources) {
                let raw = table.get(row_idx, col_idx).unwrap_or("");
                let value = column.kind.coerce(raw, date_format).map_err(|message| {
                    TaggerError::Coercion {
                        row: row_idx + 1,
                        column: column.source.clone(),
                        message,
                    }
                })?;
                values.push(value);
            }
            rows.push(values);
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<SinkValue>] {
        &self.rows
    }

    /// Insert the batch: one plain execute for a single row, a batched
    /// execute otherwise.
    fn submit<C: SinkConnection>(self, conn: &mut C, insert: &str) -> Result<usize> {
        match self.rows.as_slice() {
            [] => Ok(0),
            [row] => conn.execute(insert, row),
            rows => conn.execute_many(insert, rows),
        }
    }
}

/// Outcome of one persist call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    /// Rows the driver reported as inserted.
    pub rows_inserted: usize,
    /// Row count of the target table after inserting, for operator
    /// visibility only.
    pub table_count: Option<i64>,
    /// True when the batch was empty and no insert was issued.
    pub skipped: bool,
}

/// Persists a subset of a tagged table's columns into a relational table.
///
/// Each call validates the configuration, builds the whole batch, and only
/// then opens exactly one connection. The connection is committed once and
/// released on every exit path. Failures are not retried.
pub struct RelationalSink<C: Connector> {
    connector: C,
    span: Span,
}

impl RelationalSink<SqliteConnector> {
    /// Sink writing to SQLite database files.
    pub fn sqlite() -> Self {
        Self::new(SqliteConnector)
    }
}

impl<C: Connector> RelationalSink<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            span: info_span!("relational_sink"),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Persist the mapped columns of `table` into `target`.
    pub fn persist(&self, table: &DataTable, target: &RelationalTarget) -> Result<PersistReport> {
        let _entered = self.span.enter();

        let mapping = target.mapping()?;
        target.check_resource()?;

        info!("Creating SQL dump");
        let batch = Batch::build(table, &mapping, &target.date_format)?;
        let insert = target.insert_statement(&mapping);
        let count = target.count_statement();
        info!(dump_size = batch.len(), insert = %insert, "Finished creating SQL dump");

        let endpoint = target.connection.endpoint();
        let mut conn = ScopedConnection::new(self.connector.connect(target)?, endpoint.clone());
        info!(endpoint = %endpoint, table = %target.table, "Connected");

        for statement in &target.session_statements {
            conn.apply_session(statement)?;
        }

        if batch.is_empty() {
            warn!(table = %target.table, "Empty SQL dump. Skip inserting data to table");
            conn.commit()?;
            conn.finish()?;
            return Ok(PersistReport {
                rows_inserted: 0,
                table_count: None,
                skipped: true,
            });
        }

        let rows_inserted = batch.submit(&mut *conn, &insert)?;
        let table_count = conn.query_count(&count)?;
        info!(
            rows_inserted,
            table_rows = table_count,
            "Finished pushing data"
        );

        conn.commit()?;
        conn.finish()?;

        Ok(PersistReport {
            rows_inserted,
            table_count: Some(table_count),
            skipped: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::mock::{RecordedStatement, RecordingConnector};
    use crate::sink::value::ValueKind;
    use tempfile::NamedTempFile;

    fn table() -> DataTable {
        DataTable::from_rows(
            ["title", "body", "finance", "views"],
            [
                ["t1", "I went to the bank", "1", "12"],
                ["t2", "riverside view today", "0", "7"],
            ],
        )
    }

    fn target(resource: &NamedTempFile) -> RelationalTarget {
        RelationalTarget::new(
            resource.path(),
            "CRAWLER_DATA",
            vec!["title".into(), "finance".into(), "views".into()],
            vec!["DETECTED_LINK".into(), "IS_FINANCE".into(), "VIEWS".into()],
        )
        .with_kind("finance", ValueKind::Flag)
        .with_kind("views", ValueKind::Int16)
    }

    #[test]
    fn test_batch_coerces_by_kind() {
        let resource = NamedTempFile::new().unwrap();
        let target = target(&resource);
        let batch = Batch::build(&table(), &target.mapping().unwrap(), &target.date_format).unwrap();

        assert_eq!(
            batch.rows()[0],
            vec![
                SinkValue::Text("t1".into()),
                SinkValue::Integer(1),
                SinkValue::Integer(12)
            ]
        );
    }

    #[test]
    fn test_batch_reports_coercion_position() {
        let resource = NamedTempFile::new().unwrap();
        let target = target(&resource);
        let mut bad = table();
        bad.set(1, 3, "lots".to_string());

        let err = Batch::build(&bad, &target.mapping().unwrap(), &target.date_format).unwrap_err();
        match err {
            TaggerError::Coercion { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "views");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_multi_row_uses_batched_insert() {
        let resource = NamedTempFile::new().unwrap();
        let sink = RelationalSink::new(RecordingConnector::new().with_initial_rows(5));
        let report = sink.persist(&table(), &target(&resource)).unwrap();

        assert_eq!(report.rows_inserted, 2);
        assert_eq!(report.table_count, Some(7));
        let statements = sink.connector().statements();
        assert!(matches!(statements[1], RecordedStatement::ExecuteMany { ref rows, .. } if rows.len() == 2));
        assert_eq!(statements.last(), Some(&RecordedStatement::Close));
    }

    #[test]
    fn test_single_row_uses_plain_insert() {
        let resource = NamedTempFile::new().unwrap();
        let mut single = table();
        single.rows.truncate(1);

        let sink = RelationalSink::new(RecordingConnector::new());
        let report = sink.persist(&single, &target(&resource)).unwrap();

        assert_eq!(report.rows_inserted, 1);
        assert!(sink
            .connector()
            .statements()
            .iter()
            .any(|s| matches!(s, RecordedStatement::Execute { .. })));
    }

    #[test]
    fn test_session_statements_run_before_insert() {
        let resource = NamedTempFile::new().unwrap();
        let target = target(&resource)
            .with_session_statement("ALTER SESSION SET NLS_DATE_FORMAT = 'YYYY/MM/DD HH24:MI:SS'");
        let sink = RelationalSink::new(RecordingConnector::new());
        sink.persist(&table(), &target).unwrap();

        let statements = sink.connector().statements();
        assert!(matches!(statements[1], RecordedStatement::Session(_)));
        assert!(matches!(statements[2], RecordedStatement::ExecuteMany { .. }));
    }

    #[test]
    fn test_empty_batch_is_a_noop_that_still_releases() {
        let resource = NamedTempFile::new().unwrap();
        let mut empty = table();
        empty.rows.clear();

        let sink = RelationalSink::new(RecordingConnector::new());
        let report = sink.persist(&empty, &target(&resource)).unwrap();

        assert!(report.skipped);
        assert_eq!(report.rows_inserted, 0);
        assert!(!sink.connector().inserted_anything());
        assert_eq!(sink.connector().statements().last(), Some(&RecordedStatement::Close));
    }

    #[test]
    fn test_insert_failure_releases_connection_without_commit() {
        let resource = NamedTempFile::new().unwrap();
        let sink = RelationalSink::new(RecordingConnector::new().failing_inserts());
        let err = sink.persist(&table(), &target(&resource)).unwrap_err();

        assert!(matches!(err, TaggerError::SinkWrite { .. }));
        let statements = sink.connector().statements();
        assert!(!statements.contains(&RecordedStatement::Commit));
        assert_eq!(statements.last(), Some(&RecordedStatement::Close));
    }

    #[test]
    fn test_configuration_checked_before_connecting() {
        let resource = NamedTempFile::new().unwrap();
        let mut bad = target(&resource);
        bad.table_columns.pop();

        let sink = RelationalSink::new(RecordingConnector::new());
        let err = sink.persist(&table(), &bad).unwrap_err();
        assert!(matches!(err, TaggerError::Configuration(_)));
        assert!(sink.connector().statements().is_empty());
    }

    #[test]
    fn test_missing_resource_checked_before_connecting() {
        let missing = RelationalTarget::new(
            "/nonexistent/tibero6-jdbc.jar",
            "T",
            vec!["title".into()],
            vec!["TITLE".into()],
        );

        let sink = RelationalSink::new(RecordingConnector::new());
        let err = sink.persist(&table(), &missing).unwrap_err();
        assert!(matches!(err, TaggerError::ResourceNotFound { .. }));
        assert!(sink.connector().statements().is_empty());
    }
}
