//! Query command - show the categories and keywords found in a text.

use colored::Colorize;
use keyword_tagger::KeywordIndex;

use super::load_dictionary;
use crate::cli::KeywordArgs;

pub fn run(
    keywords: KeywordArgs,
    text: String,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = KeywordIndex::build(load_dictionary(&keywords)?);
    let found = index.query(&text);

    if found.is_empty() {
        println!("{}", "No categories matched".yellow());
        return Ok(());
    }

    println!("{}", "Matched categories:".cyan().bold());
    for category in found.iter() {
        println!("  {}", category.green());
    }

    println!();
    println!("{}", "Occurrences:".cyan().bold());
    for m in index.find_iter(&text) {
        if verbose {
            println!(
                "  {:>5}..{:<5} {:20} {}",
                m.start,
                m.end,
                m.keyword.white().bold(),
                m.category
            );
        } else {
            println!("  {:20} {}", m.keyword.white().bold(), m.category);
        }
    }

    Ok(())
}
