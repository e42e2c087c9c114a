//! Property-based tests for keyword matching and tagging.
//!
//! Matching is checked against a naive `str::contains` oracle over small
//! alphabets, so keywords overlap, nest and share prefixes often.
//!
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p keyword-tagger --test property_tests
//! ```

use proptest::prelude::*;

use keyword_tagger::{CategoryTagger, DataTable, KeywordDictionary, KeywordIndex};

// =============================================================================
// Test Strategies
// =============================================================================

/// Short strings over a tiny alphabet, so collisions are common.
fn small_word() -> impl Strategy<Value = String> {
    "[ab가]{1,4}"
}

fn text() -> impl Strategy<Value = String> {
    "[ab가 ]{0,40}"
}

/// Up to four categories of up to five keywords each.
fn dictionary() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec(prop::collection::vec(small_word(), 0..5), 0..4).prop_map(|groups| {
        groups
            .into_iter()
            .enumerate()
            .map(|(i, keywords)| (format!("c{}", i), keywords))
            .collect()
    })
}

fn build(groups: &[(String, Vec<String>)]) -> KeywordIndex {
    KeywordIndex::build(groups.iter().cloned().collect::<KeywordDictionary>())
}

fn oracle(groups: &[(String, Vec<String>)], text: &str) -> Vec<String> {
    groups
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
        .map(|(category, _)| category.clone())
        .collect()
}

// =============================================================================
// Index Properties
// =============================================================================

proptest! {
    /// A category matches iff one of its keywords is a substring of the text.
    #[test]
    fn query_matches_substring_oracle(groups in dictionary(), text in text()) {
        let index = build(&groups);
        let found: Vec<String> = index.query(&text).iter().map(str::to_string).collect();
        prop_assert_eq!(found, oracle(&groups, &text));
    }

    /// Every reported occurrence is a real occurrence of its keyword.
    #[test]
    fn find_iter_reports_real_occurrences(groups in dictionary(), text in text()) {
        let index = build(&groups);
        for m in index.find_iter(&text) {
            prop_assert_eq!(&text[m.start..m.end], m.keyword);
            prop_assert!(index.dictionary().keywords(m.category).unwrap().iter().any(|k| k == m.keyword));
        }
    }

    /// The number of occurrences equals a brute-force count.
    #[test]
    fn find_iter_counts_every_occurrence(groups in dictionary(), text in text()) {
        let index = build(&groups);
        let expected: usize = index
            .dictionary()
            .iter()
            .flat_map(|(_, keywords)| keywords.iter())
            .map(|k| overlapping(&text, k))
            .sum();
        prop_assert_eq!(index.find_iter(&text).len(), expected);
    }

    /// An empty dictionary never matches.
    #[test]
    fn empty_dictionary_matches_nothing(text in text()) {
        let index = KeywordIndex::build(KeywordDictionary::new());
        prop_assert!(index.query(&text).is_empty());
    }

    /// Empty text never matches.
    #[test]
    fn empty_text_matches_nothing(groups in dictionary()) {
        prop_assert!(build(&groups).query("").is_empty());
    }
}

/// Occurrences of `needle` in `haystack`, overlaps included.
fn overlapping(haystack: &str, needle: &str) -> usize {
    (0..haystack.len())
        .filter(|&i| haystack.is_char_boundary(i) && haystack[i..].starts_with(needle))
        .count()
}

// =============================================================================
// Tagger Properties
// =============================================================================

proptest! {
    /// Tagging an already tagged table reproduces the same flags.
    #[test]
    fn tagging_is_idempotent(
        groups in dictionary(),
        texts in prop::collection::vec(text(), 0..20),
    ) {
        let index = build(&groups);
        let categories: Vec<String> = groups.iter().map(|(c, _)| c.clone()).collect();
        prop_assume!(!categories.is_empty());

        let table = DataTable::from_rows(["text"], texts.iter().map(|t| [t.as_str()]));
        let tagger = CategoryTagger::new();
        let once = tagger.tag(&table, "text", &index, &categories).unwrap();
        let twice = tagger.tag(&once.table, "text", &index, &categories).unwrap();
        prop_assert_eq!(once.table, twice.table);
    }

    /// Each row's flags depend only on that row's text.
    #[test]
    fn flags_follow_the_oracle(
        groups in dictionary(),
        texts in prop::collection::vec(text(), 0..20),
    ) {
        let index = build(&groups);
        let categories: Vec<String> = groups.iter().map(|(c, _)| c.clone()).collect();
        prop_assume!(!categories.is_empty());

        let table = DataTable::from_rows(["text"], texts.iter().map(|t| [t.as_str()]));
        let tagged = CategoryTagger::new().tag(&table, "text", &index, &categories).unwrap();

        for (row, text) in tagged.table.rows.iter().zip(&texts) {
            let matched = oracle(&groups, text);
            for (offset, category) in categories.iter().enumerate() {
                let expected = if matched.contains(category) { "1" } else { "0" };
                prop_assert_eq!(row[offset + 1].as_str(), expected);
            }
        }
    }
}
