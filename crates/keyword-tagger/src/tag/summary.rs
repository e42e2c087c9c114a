//! Flag encoding and tagging summaries.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How category flags are written into table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagEncoding {
    /// `"0"` / `"1"`.
    #[default]
    Digit,
    /// `"false"` / `"true"`.
    Boolean,
}

impl FlagEncoding {
    /// Cell text for a flag value.
    pub fn encode(self, flag: bool) -> &'static str {
        match (self, flag) {
            (FlagEncoding::Digit, false) => "0",
            (FlagEncoding::Digit, true) => "1",
            (FlagEncoding::Boolean, false) => "false",
            (FlagEncoding::Boolean, true) => "true",
        }
    }

    /// Read a flag cell written in either encoding.
    pub fn decode(value: &str) -> Option<bool> {
        match value.trim() {
            "1" | "true" | "TRUE" | "True" => Some(true),
            "0" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        }
    }
}

/// Counts produced by one tagging run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    /// Rows processed.
    pub rows: usize,
    /// Rows with at least one category flag set.
    pub flagged_rows: usize,
    /// Rows flagged per category, in declaration order.
    pub per_category: IndexMap<String, usize>,
}

impl TagSummary {
    pub(crate) fn new(categories: &[String]) -> Self {
        Self {
            rows: 0,
            flagged_rows: 0,
            per_category: categories.iter().map(|c| (c.clone(), 0)).collect(),
        }
    }

    /// Record the flags of one row, in declaration order.
    pub(crate) fn record(&mut self, flags: &[bool]) {
        self.rows += 1;
        if flags.iter().any(|&f| f) {
            self.flagged_rows += 1;
        }
        for (count, &flag) in self.per_category.values_mut().zip(flags) {
            if flag {
                *count += 1;
            }
        }
    }

    /// Number of rows flagged for `category`.
    pub fn count(&self, category: &str) -> usize {
        self.per_category.get(category).copied().unwrap_or(0)
    }
}
