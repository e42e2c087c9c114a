//! Query results: matched category sets and keyword occurrences.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// The distinct categories matched in one text.
///
/// Backed by a bitset over the index's category ids; iteration follows the
/// dictionary's category order.
#[derive(Clone, PartialEq, Eq)]
pub struct CategorySet {
    names: Arc<[String]>,
    bits: Vec<u64>,
    len: usize,
}

impl CategorySet {
    pub(crate) fn empty(names: Arc<[String]>) -> Self {
        let words = names.len().div_ceil(64);
        Self {
            names,
            bits: vec![0; words],
            len: 0,
        }
    }

    /// Mark a category id; returns `true` if it was not yet present.
    pub(crate) fn insert_id(&mut self, id: usize) -> bool {
        let (word, bit) = (id / 64, id % 64);
        let mask = 1u64 << bit;
        if self.bits[word] & mask != 0 {
            return false;
        }
        self.bits[word] |= mask;
        self.len += 1;
        true
    }

    pub(crate) fn contains_id(&self, id: usize) -> bool {
        self.bits
            .get(id / 64)
            .is_some_and(|word| word & (1u64 << (id % 64)) != 0)
    }

    /// Whether every category of the index has been matched.
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.names.len()
    }

    /// Check membership by category name.
    pub fn contains(&self, category: &str) -> bool {
        self.names
            .iter()
            .position(|name| name == category)
            .is_some_and(|id| self.contains_id(id))
    }

    /// Number of distinct categories matched.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Matched category names in dictionary order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names
            .iter()
            .enumerate()
            .filter(|(id, _)| self.contains_id(*id))
            .map(|(_, name)| name.as_str())
    }
}

impl fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for CategorySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// One keyword occurrence in a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordMatch<'a> {
    pub category: &'a str,
    pub keyword: &'a str,
    /// Byte offset of the first byte of the keyword.
    pub start: usize,
    /// Byte offset one past the last byte of the keyword.
    pub end: usize,
}
