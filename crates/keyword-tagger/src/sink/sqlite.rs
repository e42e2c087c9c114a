//! SQLite driver backed by `rusqlite`.

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, OpenFlags, params_from_iter};
use tracing::debug;

use crate::error::{Result, TaggerError};

use super::config::RelationalTarget;
use super::connection::{Connector, SinkConnection};
use super::value::SinkValue;

impl ToSql for SinkValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SinkValue::Null => ToSqlOutput::Owned(Value::Null),
            SinkValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SinkValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SinkValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Connects to an existing SQLite database file named by the target's
/// `resource`. The file is never created, so a missing database is reported
/// instead of silently producing an empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    type Connection = SqliteConnection;

    fn connect(&self, target: &RelationalTarget) -> Result<SqliteConnection> {
        let path = &target.resource;
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| TaggerError::sink_write(format!("connect to '{}'", path.display()), e))?;

        if !target.connection.credentials.user().is_empty() {
            debug!("SQLite ignores credentials");
        }

        conn.execute_batch("BEGIN")
            .map_err(|e| TaggerError::sink_write("begin transaction", e))?;

        Ok(SqliteConnection { conn: Some(conn) })
    }
}

/// One SQLite connection holding an open transaction until commit.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Option<Connection>,
}

impl SqliteConnection {
    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| {
            TaggerError::sink_write("statement", "connection already closed")
        })
    }
}

impl SinkConnection for SqliteConnection {
    fn apply_session(&mut self, statement: &str) -> Result<()> {
        self.conn()?
            .execute_batch(statement)
            .map_err(|e| TaggerError::sink_write(format!("session statement '{}'", statement), e))
    }

    fn execute(&mut self, sql: &str, params: &[SinkValue]) -> Result<usize> {
        self.conn()?
            .execute(sql, params_from_iter(params.iter()))
            .map_err(|e| TaggerError::sink_write("insert", e))
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<SinkValue>]) -> Result<usize> {
        let conn = self.conn()?;
        let mut statement = conn
            .prepare_cached(sql)
            .map_err(|e| TaggerError::sink_write("prepare insert", e))?;

        let mut affected = 0;
        for (idx, row) in rows.iter().enumerate() {
            affected += statement
                .execute(params_from_iter(row.iter()))
                .map_err(|e| TaggerError::sink_write(format!("insert of batch row {}", idx + 1), e))?;
        }
        Ok(affected)
    }

    fn query_count(&mut self, sql: &str) -> Result<i64> {
        self.conn()?
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .map_err(|e| TaggerError::sink_write("count query", e))
    }

    fn commit(&mut self) -> Result<()> {
        self.conn()?
            .execute_batch("COMMIT")
            .map_err(|e| TaggerError::sink_write("commit", e))
    }

    fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| TaggerError::sink_write("close", e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn database() -> (TempDir, RelationalTarget) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sink.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT, b INTEGER)").unwrap();
        drop(conn);

        let target = RelationalTarget::new(
            path,
            "t",
            vec!["a".to_string(), "b".to_string()],
            vec!["a".to_string(), "b".to_string()],
        );
        (dir, target)
    }

    #[test]
    fn test_insert_commit_and_count() {
        let (_dir, target) = database();
        let mut conn = SqliteConnector.connect(&target).unwrap();

        let rows = vec![
            vec![SinkValue::Text("x".into()), SinkValue::Integer(1)],
            vec![SinkValue::Null, SinkValue::Integer(2)],
        ];
        assert_eq!(conn.execute_many("INSERT INTO t (a, b) VALUES (?, ?)", &rows).unwrap(), 2);
        assert_eq!(conn.query_count("SELECT COUNT(*) FROM t").unwrap(), 2);
        conn.commit().unwrap();
        conn.close().unwrap();

        let check = Connection::open(&target.resource).unwrap();
        let total: i64 = check.query_row("SELECT SUM(b) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_close_without_commit_discards() {
        let (_dir, target) = database();
        let mut conn = SqliteConnector.connect(&target).unwrap();
        conn.execute(
            "INSERT INTO t (a, b) VALUES (?, ?)",
            &[SinkValue::Text("x".into()), SinkValue::Integer(1)],
        )
        .unwrap();
        conn.close().unwrap();

        let check = Connection::open(&target.resource).unwrap();
        let count: i64 = check.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_statement_after_close_is_an_error() {
        let (_dir, target) = database();
        let mut conn = SqliteConnector.connect(&target).unwrap();
        conn.close().unwrap();
        assert!(matches!(
            conn.query_count("SELECT COUNT(*) FROM t"),
            Err(TaggerError::SinkWrite { .. })
        ));
    }

    #[test]
    fn test_missing_table_surfaces_driver_error() {
        let (_dir, target) = database();
        let mut conn = SqliteConnector.connect(&target).unwrap();
        let err = conn
            .execute("INSERT INTO missing (a) VALUES (?)", &[SinkValue::Null])
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
