//! Keyword Tagger CLI.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Tag {
            config,
            input,
            keywords,
            output,
            sink,
            json,
        } => commands::tag::run(config, input, keywords, output, sink, json, cli.verbose),

        Commands::Query { keywords, text } => commands::query::run(keywords, text, cli.verbose),

        Commands::Inspect { keywords } => commands::inspect::run(keywords, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
