//! The `carto analyze` command.

use std::path::{Path, PathBuf};

use colored::Colorize;

use carto_core::{analyze, AnalyzeOptions};

/// Run the analyzer with CLI overrides layered over `.carto.toml` and the
/// environment. Returns the process exit code: 0 on success, 1 on any
/// analyzer error.
#[allow(clippy::too_many_arguments)]
pub fn run(
    directory: &Path,
    extensions: Option<&str>,
    ignore: Vec<String>,
    update_schema: bool,
    reset_db: bool,
    db_path: Option<PathBuf>,
    batch_size: Option<usize>,
) -> i32 {
    let mut options = match AnalyzeOptions::find_and_load(directory) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            return 1;
        }
    };

    if let Some(list) = extensions {
        options.set_extensions_from_list(list);
    }
    options.ignore.extend(ignore);
    options.update_schema = update_schema;
    options.reset_db = reset_db;
    if let Some(path) = db_path {
        options.store_path = Some(path);
    }
    if let Some(size) = batch_size {
        options.batch_size = size.max(1);
    }

    match analyze(directory, &options) {
        Ok(report) => {
            println!(
                "{} {} files scanned, {} parsed, {} failed, {} skipped",
                "✓".green().bold(),
                report.files_discovered,
                report.files_parsed,
                report.files_failed,
                report.files_skipped,
            );
            println!(
                "  {} nodes and {} relationships written in {:.2?}",
                report.nodes_written, report.relationships_written, report.duration,
            );
            0
        }
        Err(err) => {
            tracing::error!(error = %err, "analyze failed");
            eprintln!("{} {err}", "error:".red().bold());
            1
        }
    }
}
