//! Category tagging of tabular rows.

mod summary;
mod tagger;

pub use summary::{FlagEncoding, TagSummary};
pub use tagger::{CategoryTagger, TaggedTable, TaggerConfig};
