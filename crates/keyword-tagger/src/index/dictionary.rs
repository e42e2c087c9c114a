//! Keyword dictionary: category labels mapped to exact-match keywords.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaggerError};
use crate::input::DataTable;

/// A single `(category, keyword)` pair from a keyword master table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub category: String,
    pub keyword: String,
}

impl KeywordEntry {
    pub fn new(category: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            keyword: keyword.into(),
        }
    }
}

/// Ordered mapping from category to its keywords.
///
/// Category order is insertion order and becomes the category id order of any
/// index built from the dictionary. Keywords are kept verbatim: no trimming,
/// no case folding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordDictionary {
    categories: IndexMap<String, Vec<String>>,
}

impl KeywordDictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a category with no keywords yet.
    pub fn add_category(&mut self, category: impl Into<String>) {
        self.categories.entry(category.into()).or_default();
    }

    /// Add a keyword under a category, declaring the category if needed.
    ///
    /// Empty keywords are rejected; a keyword already present in the same
    /// category is ignored.
    pub fn insert(&mut self, category: impl Into<String>, keyword: impl Into<String>) -> Result<()> {
        let category = category.into();
        let keyword = keyword.into();

        if keyword.is_empty() {
            return Err(TaggerError::Validation(format!(
                "Empty keyword for category '{}'",
                category
            )));
        }

        let keywords = self.categories.entry(category).or_default();
        if !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
        Ok(())
    }

    /// Build a dictionary from `(category, keyword)` entries.
    pub fn from_entries(entries: impl IntoIterator<Item = KeywordEntry>) -> Result<Self> {
        let mut dictionary = Self::new();
        for entry in entries {
            dictionary.insert(entry.category, entry.keyword)?;
        }
        Ok(dictionary)
    }

    /// Build a dictionary from a keyword master table.
    ///
    /// Every declared category gets an entry, in declaration order, even if the
    /// master table has no keywords for it. Rows labelled with an undeclared
    /// category are ignored.
    pub fn from_table(
        master: &DataTable,
        category_column: &str,
        keyword_column: &str,
        categories: &[String],
    ) -> Result<Self> {
        let category_idx = master.column_index(category_column).ok_or_else(|| {
            TaggerError::Validation(format!(
                "Category column '{}' not found in keyword table",
                category_column
            ))
        })?;
        let keyword_idx = master.column_index(keyword_column).ok_or_else(|| {
            TaggerError::Validation(format!(
                "Keyword column '{}' not found in keyword table",
                keyword_column
            ))
        })?;

        let mut dictionary = Self::new();
        for category in categories {
            dictionary.add_category(category.clone());
        }

        for (row_idx, row) in master.rows.iter().enumerate() {
            let category = row.get(category_idx).map(String::as_str).unwrap_or("");
            if !dictionary.categories.contains_key(category) {
                continue;
            }
            let keyword = row.get(keyword_idx).map(String::as_str).unwrap_or("");
            if keyword.is_empty() {
                return Err(TaggerError::Validation(format!(
                    "Empty keyword at row {} for category '{}'",
                    row_idx + 1,
                    category
                )));
            }
            dictionary.insert(category, keyword)?;
        }

        Ok(dictionary)
    }

    /// Load a dictionary from a JSON object of `{"category": ["keyword", ...]}`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TaggerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let dictionary: Self = serde_json::from_reader(BufReader::new(file))?;
        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Check that no keyword is empty.
    pub fn validate(&self) -> Result<()> {
        for (category, keywords) in &self.categories {
            if keywords.iter().any(String::is_empty) {
                return Err(TaggerError::Validation(format!(
                    "Empty keyword for category '{}'",
                    category
                )));
            }
        }
        Ok(())
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Keywords of one category, if declared.
    pub fn keywords(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Iterate `(category, keywords)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(c, k)| (c.as_str(), k.as_slice()))
    }

    /// Number of declared categories.
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Total number of keywords across categories.
    pub fn keyword_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl<C, K> FromIterator<(C, Vec<K>)> for KeywordDictionary
where
    C: Into<String>,
    K: Into<String>,
{
    /// Collect without validation; call [`KeywordDictionary::validate`] on
    /// untrusted input.
    fn from_iter<T: IntoIterator<Item = (C, Vec<K>)>>(iter: T) -> Self {
        let mut categories: IndexMap<String, Vec<String>> = IndexMap::new();
        for (category, keywords) in iter {
            let entry = categories.entry(category.into()).or_default();
            for keyword in keywords {
                let keyword = keyword.into();
                if !entry.contains(&keyword) {
                    entry.push(keyword);
                }
            }
        }
        Self { categories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master_table() -> DataTable {
        DataTable::from_rows(
            ["타입", "키워드"],
            [
                ["금융", "은행"],
                ["주택", "중랑구"],
                ["금융", "송금"],
                ["주택", "부산"],
                ["금융", "출금"],
                ["주택", "경남"],
                ["기타", "날씨"],
            ],
        )
    }

    #[test]
    fn test_from_table_filters_to_declared_categories() {
        let categories = vec!["주택".to_string(), "금융".to_string()];
        let dict = KeywordDictionary::from_table(&master_table(), "타입", "키워드", &categories)
            .unwrap();

        assert_eq!(dict.categories().collect::<Vec<_>>(), vec!["주택", "금융"]);
        assert_eq!(dict.keywords("금융").unwrap(), ["은행", "송금", "출금"]);
        assert_eq!(dict.keywords("주택").unwrap(), ["중랑구", "부산", "경남"]);
        assert!(dict.keywords("기타").is_none());
        assert_eq!(dict.keyword_count(), 6);
    }

    #[test]
    fn test_from_table_keeps_declared_category_without_keywords() {
        let categories = vec!["금융".to_string(), "교통".to_string()];
        let dict = KeywordDictionary::from_table(&master_table(), "타입", "키워드", &categories)
            .unwrap();
        assert_eq!(dict.keywords("교통").unwrap().len(), 0);
    }

    #[test]
    fn test_from_table_missing_column() {
        let err = KeywordDictionary::from_table(&master_table(), "type", "키워드", &[])
            .unwrap_err();
        assert!(matches!(err, TaggerError::Validation(_)));
    }

    #[test]
    fn test_from_table_rejects_blank_keyword() {
        let master = DataTable::from_rows(["type", "keyword"], [["finance", ""]]);
        let err = KeywordDictionary::from_table(&master, "type", "keyword", &["finance".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_insert_rejects_empty_and_dedups() {
        let mut dict = KeywordDictionary::new();
        assert!(dict.insert("finance", "").is_err());
        dict.insert("finance", "bank").unwrap();
        dict.insert("finance", "bank").unwrap();
        assert_eq!(dict.keywords("finance").unwrap(), ["bank"]);
    }

    #[test]
    fn test_json_form() {
        let dict: KeywordDictionary =
            serde_json::from_str(r#"{"housing":["riverside"],"finance":["bank","withdraw"]}"#)
                .unwrap();
        assert_eq!(dict.categories().collect::<Vec<_>>(), vec!["housing", "finance"]);
        assert_eq!(dict.keyword_count(), 3);
    }
}
