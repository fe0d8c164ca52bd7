use crate::cli_args::DebugArgs;
use crate::output::print_data_or_text;
use crate::{load_config_for_command, overrides_from_cli};
use anyhow::{Context, Result};
use colored::*;
use log;
use serde::Serialize;
use dirdigest_core::{Collection, Collector, Config, OutputFormat, SkippedEntry};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugInfo<'a> {
    effective_config: &'a Config,
    included: Vec<&'a str>,
    skipped: &'a [SkippedEntry],
}

impl<'a> DebugInfo<'a> {
    fn new(config: &'a Config, collection: &'a Collection) -> Self {
        Self {
            effective_config: config,
            included: collection.files.iter().map(|f| f.path.as_str()).collect(),
            skipped: &collection.skipped,
        }
    }
}

pub fn handle_debug_command(args: DebugArgs, quiet: bool, verbose: u8) -> Result<()> {
    let overrides = overrides_from_cli(
        &args.project_config,
        &args.filters,
        &args.format_output,
        quiet,
        verbose,
    )?;
    let config = load_config_for_command(&args.project_config, &overrides)
        .context("Failed to load configuration for debug command")?;

    log::debug!("Debug: Collecting files...");
    let collection = Collector::new(config.clone()).run()?;
    log::debug!("Debug: Collection complete.");

    let debug_data = DebugInfo::new(&config, &collection);

    match args.format_output.format.as_deref() {
        None => print_debug_info_pretty(&debug_data),
        Some(raw) => {
            let format: OutputFormat = raw.parse()?;
            log::debug!("Debug: Printing structured output (format: {})...", format);
            print_data_or_text(&debug_data, None, format, "debug")
        }
    }
}

fn print_debug_info_pretty(debug_info: &DebugInfo) -> Result<()> {
    println!(
        "{}",
        "\n--- Effective Configuration ---"
            .green()
            .bold()
            .underline()
    );
    let config_toml = toml::to_string_pretty(debug_info.effective_config)
        .context("Failed to serialize effective config to TOML")?;
    println!("{}", config_toml);

    println!(
        "{}",
        format!("\n--- Included ({}) ---", debug_info.included.len())
            .green()
            .bold()
            .underline()
    );
    if debug_info.included.is_empty() {
        println!("{}", "(None)".dimmed());
    } else {
        debug_info
            .included
            .iter()
            .for_each(|p| println!("- {}", p.cyan()));
    }

    println!(
        "{}",
        format!("\n--- Skipped ({}) ---", debug_info.skipped.len())
            .green()
            .bold()
            .underline()
    );
    if debug_info.skipped.is_empty() {
        println!("{}", "(None)".dimmed());
    } else {
        for entry in debug_info.skipped {
            println!(
                "- {} {}",
                entry.path.yellow(),
                format!("({})", entry.reason).dimmed()
            );
        }
    }

    println!("{}", "\n--- End Debug Info ---".green().bold());
    Ok(())
}
