//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keyword Tagger: tag rows of tabular text with keyword categories
#[derive(Parser)]
#[command(name = "keyword-tagger")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file (rotated at 10 MiB, 2 backups kept)
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a tagging job
    Tag {
        /// Job configuration (JSON)
        #[arg(short, long, value_name = "JOB_FILE")]
        config: PathBuf,

        /// Input table, overriding the job file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Keyword master table or JSON dictionary, overriding the job file
        #[arg(short, long)]
        keywords: Option<PathBuf>,

        /// Append the tagged table to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Relational target configuration (JSON), overriding the job file
        #[arg(long, value_name = "SINK_FILE")]
        sink: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which categories and keywords match a text
    Query {
        #[command(flatten)]
        keywords: KeywordArgs,

        /// Text to match
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Show keyword counts per category
    Inspect {
        #[command(flatten)]
        keywords: KeywordArgs,
    },
}

/// Where to load keywords from.
#[derive(clap::Args)]
pub struct KeywordArgs {
    /// Keyword master table (CSV/TSV) or JSON dictionary
    #[arg(short, long, value_name = "FILE")]
    pub keywords: PathBuf,

    /// Category label column of the master table
    #[arg(long, default_value = "category")]
    pub category_column: String,

    /// Keyword column of the master table
    #[arg(long, default_value = "keyword")]
    pub keyword_column: String,

    /// Categories to load (default: every category in the table)
    #[arg(short = 'c', long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,
}
