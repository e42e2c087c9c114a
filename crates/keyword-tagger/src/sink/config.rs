//! Relational sink configuration and column mapping.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaggerError};

use super::value::{check_date_format, ValueKind};

/// Session date format matching `YYYY/MM/DD HH24:MI:SS`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Plain or schema-qualified SQL identifier. Names are interpolated into
/// statements, so anything else is refused.
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}_][\p{L}\p{N}_$#]*(\.[\p{L}_][\p{L}\p{N}_$#]*)?$")
        .expect("identifier pattern is valid")
});

/// `[user, password]` pair. Debug output never shows the password.
///
/// Handed to the [`Connector`](super::Connector) as-is. The SQLite driver
/// ignores both parts; network drivers authenticate with them.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials(pub String, pub String);

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self(user.into(), password.into())
    }

    pub fn user(&self) -> &str {
        &self.0
    }

    pub fn password(&self) -> &str {
        &self.1
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credentials").field(&self.0).field(&"***").finish()
    }
}

/// Where and as whom to connect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Host name or IP address.
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database instance / service id.
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub credentials: Credentials,
}

impl ConnectionDescriptor {
    /// `address:port:instance`, omitting empty parts.
    pub fn endpoint(&self) -> String {
        let mut parts = Vec::new();
        if !self.address.is_empty() {
            parts.push(self.address.clone());
        }
        if let Some(port) = self.port {
            parts.push(port.to_string());
        }
        if !self.instance.is_empty() {
            parts.push(self.instance.clone());
        }
        parts.join(":")
    }
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

/// A relational table to persist tagged rows into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalTarget {
    pub connection: ConnectionDescriptor,
    /// Driver archive or database file the connector needs on disk.
    pub resource: PathBuf,
    /// Target table name.
    pub table: String,
    /// Target column names, paired by position with `output_columns`.
    pub table_columns: Vec<String>,
    /// Source column names read from the tagged table.
    pub output_columns: Vec<String>,
    /// Semantic type per source column; unlisted columns are text.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub column_kinds: IndexMap<String, ValueKind>,
    /// Statements run right after connecting, e.g. a date format directive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_statements: Vec<String>,
    /// chrono format used to render date and date-time values.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl RelationalTarget {
    /// Create a target with text columns and no session statements.
    pub fn new(
        resource: impl Into<PathBuf>,
        table: impl Into<String>,
        output_columns: Vec<String>,
        table_columns: Vec<String>,
    ) -> Self {
        Self {
            connection: ConnectionDescriptor::default(),
            resource: resource.into(),
            table: table.into(),
            table_columns,
            output_columns,
            column_kinds: IndexMap::new(),
            session_statements: Vec::new(),
            date_format: default_date_format(),
        }
    }

    /// Declare the semantic type of a source column.
    pub fn with_kind(mut self, column: impl Into<String>, kind: ValueKind) -> Self {
        self.column_kinds.insert(column.into(), kind);
        self
    }

    /// Add a statement to run after connecting.
    pub fn with_session_statement(mut self, statement: impl Into<String>) -> Self {
        self.session_statements.push(statement.into());
        self
    }

    pub fn with_connection(mut self, connection: ConnectionDescriptor) -> Self {
        self.connection = connection;
        self
    }

    /// Load a target from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TaggerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Resolve and check the column mapping, the table name and the date
    /// format.
    pub fn mapping(&self) -> Result<SinkMapping> {
        check_identifier(&self.table, "table")?;
        check_date_format(&self.date_format).map_err(TaggerError::Configuration)?;
        let mapping = SinkMapping::new(&self.output_columns, &self.table_columns)?
            .with_kinds(&self.column_kinds);
        if let Some(unknown) = self
            .column_kinds
            .keys()
            .find(|k| !self.output_columns.contains(k))
        {
            return Err(TaggerError::Configuration(format!(
                "Column kind declared for '{}', which is not an output column",
                unknown
            )));
        }
        Ok(mapping)
    }

    /// Fail unless the configured resource exists on disk.
    pub fn check_resource(&self) -> Result<()> {
        if self.resource.is_file() {
            Ok(())
        } else {
            Err(TaggerError::ResourceNotFound {
                path: self.resource.clone(),
            })
        }
    }

    pub fn insert_statement(&self, mapping: &SinkMapping) -> String {
        let columns: Vec<&str> = mapping.columns().iter().map(|c| c.target.as_str()).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders
        )
    }

    pub fn count_statement(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.table)
    }
}

/// One source column bound to one target column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source: String,
    pub target: String,
    pub kind: ValueKind,
}

/// Ordered `(source column, target column)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkMapping {
    columns: Vec<ColumnMapping>,
}

impl SinkMapping {
    /// Pair source and target columns by position.
    ///
    /// Lists of different lengths, an empty mapping, or an invalid target
    /// identifier are configuration errors.
    pub fn new(sources: &[String], targets: &[String]) -> Result<Self> {
        if sources.len() != targets.len() {
            return Err(TaggerError::Configuration(format!(
                "output_columns has {} entries but table_columns has {}",
                sources.len(),
                targets.len()
            )));
        }
        if sources.is_empty() {
            return Err(TaggerError::Configuration(
                "No columns mapped to the target table".to_string(),
            ));
        }
        for target in targets {
            check_identifier(target, "column")?;
        }

        let columns = sources
            .iter()
            .zip(targets)
            .map(|(source, target)| ColumnMapping {
                source: source.clone(),
                target: target.clone(),
                kind: ValueKind::Text,
            })
            .collect();
        Ok(Self { columns })
    }

    /// Apply per-source-column kinds.
    pub fn with_kinds(mut self, kinds: &IndexMap<String, ValueKind>) -> Self {
        for column in &mut self.columns {
            if let Some(&kind) = kinds.get(&column.source) {
                column.kind = kind;
            }
        }
        self
    }

    pub fn columns(&self) -> &[ColumnMapping] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn check_identifier(name: &str, what: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(TaggerError::Configuration(format!(
            "Invalid {} name '{}'",
            what, name
        )))
    }
}
