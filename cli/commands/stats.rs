use crate::cli_args::StatsArgs;
use crate::output::{print_data_or_text, print_stats_table};
use crate::{load_config_for_command, overrides_from_cli};
use anyhow::{Context, Result};
use log;
use dirdigest_core::output_formats::DigestStats;
use dirdigest_core::{Collector, OutputFormat};

pub fn handle_stats_command(args: StatsArgs, quiet: bool, verbose: u8) -> Result<()> {
    let overrides = overrides_from_cli(
        &args.project_config,
        &args.filters,
        &args.format_output,
        quiet,
        verbose,
    )?;
    let config = load_config_for_command(&args.project_config, &overrides)
        .context("Failed to load configuration for stats command")?;

    log::debug!("Collecting files for statistics...");
    let collection = Collector::new(config).run()?;
    log::debug!("Statistics ready.");

    // Structured output only when asked for on the command line; the
    // configured output format belongs to `generate`.
    match args.format_output.format.as_deref() {
        None => {
            print_stats_table(&collection.stats);
            Ok(())
        }
        Some(raw) => {
            let format: OutputFormat = raw.parse()?;
            print_data_or_text(&DigestStats::from(&collection.stats), None, format, "stats")
        }
    }
}
