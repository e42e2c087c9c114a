//! Tag command - run a tagging job and persist the result.

use std::path::PathBuf;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use keyword_tagger::{FileSinkConfig, PipelineConfig, RelationalTarget, TaggingPipeline};

/// Redraw the bar at most this often, in rows.
const PROGRESS_STEP: usize = 500;

pub fn run(
    config_path: PathBuf,
    input: Option<PathBuf>,
    keywords: Option<PathBuf>,
    output: Option<PathBuf>,
    sink: Option<PathBuf>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config_path.exists() {
        return Err(format!("Job file not found: {}", config_path.display()).into());
    }

    let mut config = PipelineConfig::load(&config_path)?;
    if input.is_some() {
        config.input = input;
    }
    if keywords.is_some() {
        config.keywords = keywords;
    }
    if let Some(path) = output {
        match config.file_sink.as_mut() {
            Some(file_sink) => file_sink.path = path,
            None => config.file_sink = Some(FileSinkConfig::new(path)),
        }
    }
    if let Some(path) = sink {
        config.relational = Some(RelationalTarget::load(&path)?);
    }

    let pipeline = TaggingPipeline::new(config);
    let (input_path, keywords_path) = pipeline.configured_paths()?;

    if !json_output {
        println!(
            "{} {} with keywords from {}",
            "Tagging".cyan().bold(),
            input_path.display().to_string().white(),
            keywords_path.display().to_string().white()
        );
    }

    let bar = if json_output {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} rows ({eta})")?
            .progress_chars("=> "),
    );

    let result = pipeline.run_with_progress(input_path, keywords_path, |done, total| {
        if done == 1 {
            bar.set_length(total as u64);
        }
        if done % PROGRESS_STEP == 0 || done == total {
            bar.set_position(done as u64);
        }
    });
    bar.finish_and_clear();
    let report = result?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let summary = &report.summary;
    println!(
        "Tagged {} rows, {} with at least one category",
        summary.rows.to_string().white().bold(),
        summary.flagged_rows.to_string().green().bold()
    );
    for (category, count) in &summary.per_category {
        println!("  {:20} {}", category, count.to_string().yellow());
    }
    if verbose {
        println!(
            "Source {} ({}, {} bytes, {})",
            report.source.file,
            report.source.format,
            report.source.size_bytes,
            report.source.hash.dimmed()
        );
        println!("Index holds {} keywords", report.keyword_count);
    }

    if let Some(rows) = report.file_rows {
        let path = pipeline
            .config()
            .file_sink
            .as_ref()
            .map(|f| f.path.display().to_string())
            .unwrap_or_default();
        println!(
            "{} {} rows to {}",
            "Appended".green().bold(),
            rows,
            path.white()
        );
    }

    match &report.persist {
        Some(persist) if persist.skipped => {
            println!("{}", "Nothing to insert - table is empty".yellow());
        }
        Some(persist) => {
            let table_rows = persist
                .table_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "{} {} rows (table now holds {})",
                "Inserted".green().bold(),
                persist.rows_inserted,
                table_rows
            );
        }
        None => {}
    }

    Ok(())
}
