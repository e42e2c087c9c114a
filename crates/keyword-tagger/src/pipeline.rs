//! End-to-end tagging job: parse, index, tag, stamp, persist.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Span};

use crate::error::{Result, TaggerError};
use crate::index::{KeywordDictionary, KeywordIndex};
use crate::input::{DataTable, Parser, ParserConfig, SourceMetadata};
use crate::sink::{
    check_date_format, render_date, Connector, CsvFileSink, FileSinkConfig, PersistReport,
    RelationalSink, RelationalTarget, SqliteConnector,
};
use crate::tag::{CategoryTagger, TagSummary, TaggerConfig};

/// Value written into a stamp column on every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stamp {
    /// A literal value.
    Value(String),
    /// The local time when the job runs, formatted with the given chrono
    /// format string.
    Now(String),
}

impl Stamp {
    /// Reject `now` patterns chrono cannot render.
    pub fn check(&self) -> Result<()> {
        match self {
            Stamp::Value(_) => Ok(()),
            Stamp::Now(format) => check_date_format(format).map_err(TaggerError::Configuration),
        }
    }

    fn render(&self) -> Result<String> {
        match self {
            Stamp::Value(value) => Ok(value.clone()),
            Stamp::Now(format) => render_date(Local::now().format(format), format)
                .map_err(TaggerError::Configuration),
        }
    }
}

/// A tagging job, usually loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input table; callers may pass their own path instead.
    #[serde(default)]
    pub input: Option<PathBuf>,
    /// Keyword master table, or a JSON dictionary.
    #[serde(default)]
    pub keywords: Option<PathBuf>,
    /// Column holding the text to match.
    pub text_column: String,
    /// Declared categories; one flag column is appended per category.
    pub categories: Vec<String>,
    /// Category label column of the keyword master table.
    pub keyword_category_column: String,
    /// Keyword column of the keyword master table.
    pub keyword_value_column: String,
    #[serde(default)]
    pub tagger: TaggerConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    /// Shard tagging across threads.
    #[serde(default)]
    pub parallel: bool,
    /// Columns set to the same value on every row after tagging.
    #[serde(default)]
    pub stamp_columns: IndexMap<String, Stamp>,
    #[serde(default)]
    pub file_sink: Option<FileSinkConfig>,
    #[serde(default)]
    pub relational: Option<RelationalTarget>,
}

impl PipelineConfig {
    pub fn new(
        text_column: impl Into<String>,
        categories: Vec<String>,
        keyword_category_column: impl Into<String>,
        keyword_value_column: impl Into<String>,
    ) -> Self {
        Self {
            input: None,
            keywords: None,
            text_column: text_column.into(),
            categories,
            keyword_category_column: keyword_category_column.into(),
            keyword_value_column: keyword_value_column.into(),
            tagger: TaggerConfig::default(),
            parser: ParserConfig::default(),
            parallel: false,
            stamp_columns: IndexMap::new(),
            file_sink: None,
            relational: None,
        }
    }

    /// Load a job file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TaggerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub source: SourceMetadata,
    /// Keywords compiled into the index.
    pub keyword_count: usize,
    pub summary: TagSummary,
    /// Rows appended to the file sink, if one is configured.
    pub file_rows: Option<usize>,
    /// Relational sink outcome, if one is configured.
    pub persist: Option<PersistReport>,
}

/// Runs a [`PipelineConfig`] against an input file and a keyword master.
pub struct TaggingPipeline<C: Connector = SqliteConnector> {
    config: PipelineConfig,
    parser: Parser,
    tagger: CategoryTagger,
    sink: RelationalSink<C>,
    span: Span,
}

impl TaggingPipeline<SqliteConnector> {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_connector(config, SqliteConnector)
    }
}

impl<C: Connector> TaggingPipeline<C> {
    /// Pipeline whose relational sink connects through `connector`.
    pub fn with_connector(config: PipelineConfig, connector: C) -> Self {
        Self {
            parser: Parser::with_config(config.parser.clone()),
            tagger: CategoryTagger::with_config(config.tagger),
            sink: RelationalSink::new(connector),
            config,
            span: info_span!("tagging_pipeline"),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sink(&self) -> &RelationalSink<C> {
        &self.sink
    }

    /// Run the job on the input and keyword paths named in the config.
    pub fn run_configured(&self) -> Result<PipelineReport> {
        let (input, keywords) = self.configured_paths()?;
        self.run(input, keywords)
    }

    /// Input and keyword paths from the config.
    pub fn configured_paths(&self) -> Result<(&Path, &Path)> {
        let input = self.config.input.as_deref().ok_or_else(|| {
            TaggerError::Configuration("No input table configured".to_string())
        })?;
        let keywords = self.config.keywords.as_deref().ok_or_else(|| {
            TaggerError::Configuration("No keyword table configured".to_string())
        })?;
        Ok((input, keywords))
    }

    /// Run the job.
    pub fn run(
        &self,
        input_path: impl AsRef<Path>,
        keywords_path: impl AsRef<Path>,
    ) -> Result<PipelineReport> {
        self.run_with_progress(input_path, keywords_path, |_, _| {})
    }

    /// Run the job, reporting tagging progress as `(done, total)` rows.
    ///
    /// Parallel runs report only once, when tagging completes.
    pub fn run_with_progress<F>(
        &self,
        input_path: impl AsRef<Path>,
        keywords_path: impl AsRef<Path>,
        mut progress: F,
    ) -> Result<PipelineReport>
    where
        F: FnMut(usize, usize),
    {
        let _entered = self.span.enter();
        self.check_outputs()?;

        let (mut table, source) = self.parser.parse_file(input_path)?;
        info!(file = %source.file, rows = source.row_count, "Loaded input");

        let index = KeywordIndex::build(self.load_dictionary(keywords_path.as_ref())?);

        let summary = if self.config.parallel {
            let summary = self.tagger.tag_parallel(
                &mut table,
                &self.config.text_column,
                &index,
                &self.config.categories,
            )?;
            progress(summary.rows, summary.rows);
            summary
        } else {
            self.tagger.tag_with_progress(
                &mut table,
                &self.config.text_column,
                &index,
                &self.config.categories,
                &mut progress,
            )?
        };

        self.apply_stamps(&mut table)?;

        let file_rows = match &self.config.file_sink {
            Some(config) => Some(CsvFileSink::new(config.clone()).append(&table)?),
            None => None,
        };
        let persist = match &self.config.relational {
            Some(target) => Some(self.sink.persist(&table, target)?),
            None => None,
        };

        Ok(PipelineReport {
            source,
            keyword_count: index.keyword_count(),
            summary,
            file_rows,
            persist,
        })
    }

    /// JSON dictionaries are used as-is; anything else is parsed as a
    /// keyword master table.
    fn load_dictionary(&self, path: &Path) -> Result<KeywordDictionary> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            return KeywordDictionary::load_json(path);
        }

        let (master, _) = self.parser.parse_file(path)?;
        KeywordDictionary::from_table(
            &master,
            &self.config.keyword_category_column,
            &self.config.keyword_value_column,
            &self.config.categories,
        )
    }

    /// Output settings that can be checked without the data, so a bad job
    /// fails before anything is written.
    fn check_outputs(&self) -> Result<()> {
        for stamp in self.config.stamp_columns.values() {
            stamp.check()?;
        }
        if let Some(target) = &self.config.relational {
            target.mapping()?;
            target.check_resource()?;
        }
        Ok(())
    }

    fn apply_stamps(&self, table: &mut DataTable) -> Result<()> {
        for (column, stamp) in &self.config.stamp_columns {
            table.set_constant_column(column, &stamp.render()?);
        }
        Ok(())
    }
}
