use crate::cli_args::GenerateArgs;
use crate::output;
use crate::{load_config_for_command, overrides_from_cli};
use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use log;
use std::path::PathBuf;
use dirdigest_core::{Collector, Config, Digest, render_digest};

pub fn handle_generate_command(args: GenerateArgs, quiet: bool, verbose: u8) -> Result<()> {
    let overrides = overrides_from_cli(
        &args.project_config,
        &args.filters,
        &args.format_output,
        quiet,
        verbose,
    )?;
    let config = load_config_for_command(&args.project_config, &overrides)
        .context("Failed to load configuration")?;

    log::info!(
        "Starting digest generation for: {}",
        config.root_dir.display()
    );
    let collection = Collector::new(config.clone()).run()?;
    log::debug!(
        "Collection complete: {} files, {} skipped.",
        collection.files.len(),
        collection.skipped.len()
    );

    let digest = Digest::new(
        &collection,
        config.project_name(),
        config.root_dir.display().to_string(),
        Some(Utc::now()),
    );
    let content = render_digest(&digest, config.output_format)?;

    match output_target(&args, &config) {
        Some(path) => {
            output::write_to_file(&path, &content)?;
            if !config.silent {
                println!(
                    "{} Digest saved to: {}",
                    "✅".green(),
                    output::file_link(&path).blue()
                );
                println!(
                    "   {} files, {} lines ({})",
                    collection.stats.total_files.to_string().cyan(),
                    collection.stats.total_lines.to_string().cyan(),
                    output::human_size(content.len() as u64).dimmed()
                );
                if config.verbose {
                    output::print_stats_table(&collection.stats);
                    output::print_file_list(&collection.files);
                }
            }
        }
        None => {
            output::write_to_stdout(&content)?;
            if config.verbose && !config.silent {
                log::info!(
                    "Wrote {} files ({} lines) to stdout.",
                    collection.stats.total_files,
                    collection.stats.total_lines
                );
            }
        }
    }

    if collection.files.is_empty() && !config.silent {
        log::warn!("No files matched the current filters.");
    }
    Ok(())
}

/// `--output` wins, `--stdout` suppresses a configured file, otherwise the
/// configured `output_file` is used.
fn output_target(args: &GenerateArgs, config: &Config) -> Option<PathBuf> {
    if let Some(path) = &args.output {
        return Some(path.clone());
    }
    if args.stdout {
        return None;
    }
    config.output_file.clone()
}
