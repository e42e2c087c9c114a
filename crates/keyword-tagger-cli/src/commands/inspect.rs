//! Inspect command - summarize a keyword dictionary.

use colored::Colorize;

use super::load_dictionary;
use crate::cli::KeywordArgs;

/// Keywords shown per category without `--verbose`.
const PREVIEW: usize = 5;

pub fn run(keywords: KeywordArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dictionary = load_dictionary(&keywords)?;

    println!(
        "{} {} ({} categories, {} keywords)",
        "Keywords from".cyan().bold(),
        keywords.keywords.display().to_string().white(),
        dictionary.category_count(),
        dictionary.keyword_count()
    );
    println!();

    for (category, list) in dictionary.iter() {
        let count = if list.is_empty() {
            "0".red()
        } else {
            list.len().to_string().yellow()
        };
        println!("  {:20} {}", category.bold(), count);

        let shown = if verbose { list.len() } else { PREVIEW.min(list.len()) };
        if shown > 0 {
            let mut preview = list[..shown].join(", ");
            if shown < list.len() {
                preview.push_str(", ...");
            }
            println!("    {}", preview.dimmed());
        }
    }

    Ok(())
}
