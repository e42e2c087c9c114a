//! Delimited-file sink that appends tagged tables to a file.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Span};

use crate::error::{Result, TaggerError};
use crate::input::DataTable;

/// When to write the header row on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    /// Only when the file is new or empty.
    #[default]
    IfEmpty,
    /// On every append, so repeated runs leave a header before each block.
    Always,
}

fn default_delimiter() -> u8 {
    b','
}

/// File sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSinkConfig {
    /// Output file; relative paths resolve against the working directory.
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
    #[serde(default)]
    pub header: HeaderMode,
}

impl FileSinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: default_delimiter(),
            header: HeaderMode::default(),
        }
    }
}

/// Appends a table to a delimited file.
pub struct CsvFileSink {
    config: FileSinkConfig,
    span: Span,
}

impl CsvFileSink {
    pub fn new(config: FileSinkConfig) -> Self {
        Self {
            config,
            span: info_span!("file_sink"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Append every row of `table`; returns the number of rows written.
    pub fn append(&self, table: &DataTable) -> Result<usize> {
        let _entered = self.span.enter();
        let path = &self.config.path;
        let io_err = |source| TaggerError::Io {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        let is_empty = file.metadata().map_err(io_err)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.config.delimiter)
            .from_writer(file);

        if is_empty || self.config.header == HeaderMode::Always {
            writer.write_record(&table.headers)?;
        }
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(io_err)?;

        info!(
            path = %path.display(),
            rows = table.row_count(),
            "Finished saving file"
        );
        Ok(table.row_count())
    }
}
