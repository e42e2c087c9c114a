//! Keyword Tagger: categorical keyword tagging for tabular text data.
//!
//! Rows of a table are tagged with one flag per declared category, set when
//! any keyword of that category occurs in the row's text column. The tagged
//! table can then be appended to a delimited file or batch-inserted into a
//! relational table.
//!
//! # Core Principles
//!
//! - **One pass per row**: all keywords are compiled into a single
//!   Aho-Corasick automaton, so matching cost does not grow with the
//!   dictionary
//! - **Validate first**: arguments and sink configuration are checked before
//!   any table mutation or connection
//! - **Scoped connections**: a sink connection is released on every exit path
//!
//! # Example
//!
//! ```
//! use keyword_tagger::{CategoryTagger, DataTable, KeywordDictionary, KeywordIndex};
//!
//! let mut dictionary = KeywordDictionary::new();
//! dictionary.insert("housing", "riverside").unwrap();
//! dictionary.insert("finance", "bank").unwrap();
//! let index = KeywordIndex::build(dictionary);
//!
//! let table = DataTable::from_rows(["body"], [["I went to the bank"]]);
//! let categories = vec!["housing".to_string(), "finance".to_string()];
//! let tagged = CategoryTagger::new()
//!     .tag(&table, "body", &index, &categories)
//!     .unwrap();
//!
//! assert_eq!(tagged.table.rows[0], ["I went to the bank", "0", "1"]);
//! ```

pub mod error;
pub mod index;
pub mod input;
pub mod sink;
pub mod tag;

mod pipeline;

pub use crate::pipeline::{PipelineConfig, PipelineReport, Stamp, TaggingPipeline};
pub use error::{Result, TaggerError};
pub use index::{CategorySet, KeywordDictionary, KeywordEntry, KeywordIndex, KeywordMatch};
pub use input::{DataTable, Parser, ParserConfig, SourceMetadata};
pub use sink::{
    CsvFileSink, FileSinkConfig, HeaderMode, PersistReport, RelationalSink, RelationalTarget,
    SinkMapping, ValueKind,
};
pub use tag::{CategoryTagger, FlagEncoding, TagSummary, TaggedTable, TaggerConfig};
