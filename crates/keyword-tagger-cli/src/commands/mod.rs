//! CLI command implementations.

pub mod inspect;
pub mod query;
pub mod tag;

use keyword_tagger::{KeywordDictionary, Parser};

use crate::cli::KeywordArgs;

/// Load keywords the way `query` and `inspect` share: JSON dictionaries
/// as-is, master tables restricted to the requested categories (or every
/// category the table names, in first-seen order).
pub fn load_dictionary(args: &KeywordArgs) -> Result<KeywordDictionary, Box<dyn std::error::Error>> {
    if !args.keywords.exists() {
        return Err(format!("File not found: {}", args.keywords.display()).into());
    }

    let is_json = args
        .keywords
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return Ok(KeywordDictionary::load_json(&args.keywords)?);
    }

    let (master, _) = Parser::new().parse_file(&args.keywords)?;
    let categories = if args.categories.is_empty() {
        let column = master
            .column_by_name(&args.category_column)
            .ok_or_else(|| format!("Column '{}' not found in keyword table", args.category_column))?;
        let mut seen = Vec::new();
        for value in column {
            if !value.is_empty() && !seen.iter().any(|s: &String| s == value) {
                seen.push(value.to_string());
            }
        }
        seen
    } else {
        args.categories.clone()
    };

    Ok(KeywordDictionary::from_table(
        &master,
        &args.category_column,
        &args.keyword_column,
        &categories,
    )?)
}
