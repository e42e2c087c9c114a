//! Row-by-row category tagging.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Span};

use crate::error::{Result, TaggerError};
use crate::index::KeywordIndex;
use crate::input::DataTable;

use super::summary::{FlagEncoding, TagSummary};

/// Rows between progress debug events.
const PROGRESS_LOG_INTERVAL: usize = 10_000;

/// Tagger configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Cell representation of category flags.
    pub flag_encoding: FlagEncoding,
}

/// A table with one flag column appended per declared category.
#[derive(Debug, Clone)]
pub struct TaggedTable {
    pub table: DataTable,
    /// Declared categories, which are also the flag column names.
    pub categories: Vec<String>,
    pub summary: TagSummary,
}

impl TaggedTable {
    pub fn into_table(self) -> DataTable {
        self.table
    }
}

/// Column positions resolved once per run.
struct TagPlan {
    text_idx: usize,
    /// (flag column index, category id in the index) per declared category.
    targets: Vec<(usize, Option<usize>)>,
}

/// Writes per-category flags into a table from keyword index lookups.
///
/// Each row's flags depend only on that row's text, so row order never
/// changes the result, and flags are overwritten on every run so re-tagging
/// an already tagged table reproduces the same values.
#[derive(Debug, Clone)]
pub struct CategoryTagger {
    config: TaggerConfig,
    span: Span,
}

impl CategoryTagger {
    /// Create a tagger with default configuration.
    pub fn new() -> Self {
        Self::with_config(TaggerConfig::default())
    }

    /// Create a tagger with custom configuration.
    pub fn with_config(config: TaggerConfig) -> Self {
        Self {
            config,
            span: info_span!("category_tagger"),
        }
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    /// Tag a copy of `table`; the input is left unmodified.
    pub fn tag(
        &self,
        table: &DataTable,
        text_column: &str,
        index: &KeywordIndex,
        categories: &[String],
    ) -> Result<TaggedTable> {
        let mut tagged = table.clone();
        let summary = self.tag_in_place(&mut tagged, text_column, index, categories)?;
        Ok(TaggedTable {
            table: tagged,
            categories: categories.to_vec(),
            summary,
        })
    }

    /// Tag `table` in place, appending flag columns that do not exist yet and
    /// overwriting the ones that do.
    ///
    /// Arguments are validated before the table is touched.
    pub fn tag_in_place(
        &self,
        table: &mut DataTable,
        text_column: &str,
        index: &KeywordIndex,
        categories: &[String],
    ) -> Result<TagSummary> {
        self.tag_with_progress(table, text_column, index, categories, |_, _| {})
    }

    /// Tag `table` in place, calling `progress(done, total)` after every row.
    pub fn tag_with_progress<F>(
        &self,
        table: &mut DataTable,
        text_column: &str,
        index: &KeywordIndex,
        categories: &[String],
        mut progress: F,
    ) -> Result<TagSummary>
    where
        F: FnMut(usize, usize),
    {
        let _entered = self.span.enter();
        let plan = self.prepare(table, text_column, index, categories)?;

        let total = table.row_count();
        info!(rows = total, categories = ?categories, "Start keyword match");

        let mut summary = TagSummary::new(categories);
        let mut flags = vec![false; plan.targets.len()];
        for (done, row) in table.rows.iter_mut().enumerate() {
            self.tag_row(row, &plan, index, &mut flags);
            summary.record(&flags);

            progress(done + 1, total);
            if (done + 1) % PROGRESS_LOG_INTERVAL == 0 {
                debug!(done = done + 1, total, "Keyword match progress");
            }
        }

        info!(
            rows = summary.rows,
            flagged_rows = summary.flagged_rows,
            "Finished keyword match"
        );
        Ok(summary)
    }

    /// Tag `table` in place with rows sharded across the rayon thread pool.
    ///
    /// Produces exactly the flags of [`CategoryTagger::tag_in_place`].
    pub fn tag_parallel(
        &self,
        table: &mut DataTable,
        text_column: &str,
        index: &KeywordIndex,
        categories: &[String],
    ) -> Result<TagSummary> {
        let _entered = self.span.enter();
        let plan = self.prepare(table, text_column, index, categories)?;
        info!(rows = table.row_count(), categories = ?categories, "Start parallel keyword match");

        let row_flags: Vec<Vec<bool>> = table
            .rows
            .par_iter_mut()
            .map(|row| {
                let mut flags = vec![false; plan.targets.len()];
                self.tag_row(row, &plan, index, &mut flags);
                flags
            })
            .collect();

        let mut summary = TagSummary::new(categories);
        for flags in &row_flags {
            summary.record(flags);
        }

        info!(
            rows = summary.rows,
            flagged_rows = summary.flagged_rows,
            "Finished parallel keyword match"
        );
        Ok(summary)
    }

    /// Validate arguments and add any missing flag columns.
    fn prepare(
        &self,
        table: &mut DataTable,
        text_column: &str,
        index: &KeywordIndex,
        categories: &[String],
    ) -> Result<TagPlan> {
        validate_arguments(table, text_column, categories)?;

        let text_idx = table
            .column_index(text_column)
            .ok_or_else(|| TaggerError::Validation(format!("Column '{}' not found", text_column)))?;

        let default = self.config.flag_encoding.encode(false);
        let targets = categories
            .iter()
            .map(|category| {
                let column = table.add_column(category.clone(), default.to_string());
                let category_id = index.categories().iter().position(|c| c == category);
                if category_id.is_none() {
                    debug!(category = %category, "Category has no keywords in the index");
                }
                (column, category_id)
            })
            .collect();
        debug!(columns = ?categories, "Finished adding flag columns");

        Ok(TagPlan { text_idx, targets })
    }

    fn tag_row(&self, row: &mut [String], plan: &TagPlan, index: &KeywordIndex, flags: &mut [bool]) {
        let found = index.query(row.get(plan.text_idx).map(String::as_str).unwrap_or(""));
        let encoding = self.config.flag_encoding;

        for (slot, &(column, category_id)) in flags.iter_mut().zip(&plan.targets) {
            let flag = category_id.is_some_and(|id| found.contains_id(id));
            *slot = flag;
            if let Some(cell) = row.get_mut(column) {
                *cell = encoding.encode(flag).to_string();
            }
        }
    }
}

impl Default for CategoryTagger {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks run before any mutation of the table.
fn validate_arguments(table: &DataTable, text_column: &str, categories: &[String]) -> Result<()> {
    if text_column.is_empty() {
        return Err(TaggerError::Validation("Text column name is empty".to_string()));
    }
    if table.column_index(text_column).is_none() {
        return Err(TaggerError::Validation(format!(
            "Text column '{}' not found (columns: {:?})",
            text_column, table.headers
        )));
    }
    if categories.is_empty() {
        return Err(TaggerError::Validation(
            "At least one category is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for category in categories {
        if category.is_empty() {
            return Err(TaggerError::Validation("Category name is empty".to_string()));
        }
        if category == text_column {
            return Err(TaggerError::Validation(format!(
                "Category '{}' would overwrite the text column",
                category
            )));
        }
        if !seen.insert(category.as_str()) {
            return Err(TaggerError::Validation(format!(
                "Category '{}' is declared more than once",
                category
            )));
        }
    }
    Ok(())
}
