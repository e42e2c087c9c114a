//! Keyword dictionary and the multi-pattern index built from it.

mod automaton;
mod dictionary;
mod matches;

use std::sync::Arc;

use tracing::{info, info_span, Span};

use automaton::Automaton;

pub use dictionary::{KeywordDictionary, KeywordEntry};
pub use matches::{CategorySet, KeywordMatch};

/// Immutable keyword index over a [`KeywordDictionary`].
///
/// Every keyword of every category is compiled into one Aho-Corasick
/// automaton, so building is linear in the total keyword length and a query
/// is linear in the text length plus the number of occurrences, independent
/// of how many keywords the dictionary holds.
///
/// Matching is exact, case-sensitive substring containment: a keyword found
/// inside a longer token still counts. The index holds no mutable state and
/// can be shared across threads.
#[derive(Debug, Clone)]
pub struct KeywordIndex {
    dictionary: KeywordDictionary,
    categories: Arc<[String]>,
    automaton: Automaton,
    /// Category id of each pattern.
    pattern_categories: Vec<usize>,
    /// Keyword text of each pattern, by (category id, keyword position).
    pattern_keywords: Vec<(usize, usize)>,
    span: Span,
}

impl KeywordIndex {
    /// Build an index from a dictionary.
    pub fn build(dictionary: KeywordDictionary) -> Self {
        let span = info_span!("keyword_index");

        let categories: Arc<[String]> = dictionary.categories().map(str::to_string).collect();

        let mut pattern_categories = Vec::with_capacity(dictionary.keyword_count());
        let mut pattern_keywords = Vec::with_capacity(dictionary.keyword_count());
        for (category_id, (_, keywords)) in dictionary.iter().enumerate() {
            for keyword_pos in 0..keywords.len() {
                pattern_categories.push(category_id);
                pattern_keywords.push((category_id, keyword_pos));
            }
        }

        let automaton = Automaton::build(
            dictionary
                .iter()
                .flat_map(|(_, keywords)| keywords.iter().map(|k| k.as_bytes())),
        );

        info!(
            parent: &span,
            categories = categories.len(),
            keywords = pattern_categories.len(),
            states = automaton.state_count(),
            "Finished building keyword index"
        );

        Self {
            dictionary,
            categories,
            automaton,
            pattern_categories,
            pattern_keywords,
            span,
        }
    }

    /// Distinct categories with at least one keyword occurring in `text`.
    ///
    /// An empty text, or an index with no keywords, yields an empty set.
    pub fn query(&self, text: &str) -> CategorySet {
        let mut found = CategorySet::empty(Arc::clone(&self.categories));
        if text.is_empty() || self.pattern_categories.is_empty() {
            return found;
        }

        self.automaton.scan(text.as_bytes(), |m| {
            found.insert_id(self.pattern_categories[m.pattern]);
            !found.is_full()
        });
        found
    }

    /// Every keyword occurrence in `text`, ordered by end offset.
    pub fn find_iter<'a>(&'a self, text: &str) -> Vec<KeywordMatch<'a>> {
        let mut occurrences = Vec::new();
        self.automaton.scan(text.as_bytes(), |m| {
            let (category_id, keyword_pos) = self.pattern_keywords[m.pattern];
            let category = self.categories[category_id].as_str();
            let keyword = self
                .dictionary
                .keywords(category)
                .and_then(|keywords| keywords.get(keyword_pos))
                .map(String::as_str)
                .unwrap_or_default();
            occurrences.push(KeywordMatch {
                category,
                keyword,
                start: m.start,
                end: m.end,
            });
            true
        });
        occurrences
    }

    /// Category names in dictionary order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// The dictionary the index was built from.
    pub fn dictionary(&self) -> &KeywordDictionary {
        &self.dictionary
    }

    /// Total number of indexed keywords.
    pub fn keyword_count(&self) -> usize {
        self.pattern_categories.len()
    }

    /// Tracing span the index logs under.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for KeywordIndex {
    fn default() -> Self {
        Self::build(KeywordDictionary::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> KeywordIndex {
        let dictionary: KeywordDictionary = [
            ("housing", vec!["riverside"]),
            ("finance", vec!["bank", "withdraw"]),
        ]
        .into_iter()
        .collect();
        KeywordIndex::build(dictionary)
    }

    #[test]
    fn test_query_single_category() {
        let index = sample_index();
        let found = index.query("I went to the bank");
        assert!(found.contains("finance"));
        assert!(!found.contains("housing"));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_query_multiple_keywords_collapse() {
        let index = sample_index();
        let found = index.query("withdraw from the bank, then the bank again");
        assert_eq!(found.iter().collect::<Vec<_>>(), vec!["finance"]);
    }

    #[test]
    fn test_query_is_case_sensitive() {
        let index = sample_index();
        assert!(index.query("Bank holiday").is_empty());
    }

    #[test]
    fn test_substring_containment() {
        let index = sample_index();
        assert!(index.query("embankment").contains("finance"));
    }

    #[test]
    fn test_empty_text_and_empty_dictionary() {
        let index = sample_index();
        assert!(index.query("").is_empty());

        let empty = KeywordIndex::default();
        assert!(empty.query("bank riverside").is_empty());
        assert_eq!(empty.keyword_count(), 0);
    }

    #[test]
    fn test_shared_keyword_flags_both_categories() {
        let dictionary: KeywordDictionary =
            [("finance", vec!["loan"]), ("housing", vec!["loan"])].into_iter().collect();
        let index = KeywordIndex::build(dictionary);
        let found = index.query("mortgage loan");
        assert!(found.contains("finance"));
        assert!(found.contains("housing"));
    }

    #[test]
    fn test_hangul_keyword_inside_longer_token() {
        let dictionary: KeywordDictionary = [("금융", vec!["송금"])].into_iter().collect();
        let index = KeywordIndex::build(dictionary);
        assert!(index.query("해외송금서비스").contains("금융"));
    }

    #[test]
    fn test_find_iter_reports_spans() {
        let index = sample_index();
        let text = "bank by the riverside";
        let found = index.find_iter(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].keyword, "bank");
        assert_eq!(&text[found[1].start..found[1].end], "riverside");
        assert_eq!(found[1].category, "housing");
    }

    #[test]
    fn test_index_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeywordIndex>();
    }
}
