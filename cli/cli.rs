mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use log;
use std::process;

use cli_args::{Cli, Commands, FilterOpts, FormatOutputOpts, ProjectConfigOpts};
use dirdigest_core::{AppError, Config, OutputFormat, PartialConfig};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;
    let verbose = cli_args.verbose;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet, verbose) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let core_err = e.downcast_ref::<AppError>();
            let exit_code = match core_err {
                Some(AppError::Config(_)) => 1,
                Some(AppError::ConfigParse { .. }) => 1,
                Some(AppError::RootNotFound(_)) => 1,
                Some(AppError::RootNotDirectory(_)) => 1,
                Some(AppError::Glob(_)) => 1,
                Some(AppError::RootInaccessible { .. }) => 2,
                Some(AppError::Io(_)) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::FileWrite { .. }) => 2,
                Some(AppError::Ignore(_)) => 2,
                Some(AppError::InvalidArgument(_)) => 5,
                Some(AppError::JsonSerialize(_)) => 6,
                Some(AppError::YamlError(_)) => 6,
                Some(AppError::XmlSerialize(_)) => 6,
                Some(AppError::TomlSerialize(_)) => 6,
                Some(AppError::Cancelled) => 130,
                Some(_) => 1,
                None => 1,
            };

            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn level_for(quiet: bool, verbose: u8) -> log::LevelFilter {
    if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

// The logger itself accepts everything; the global max level is the only
// gate so that config-file `verbose`/`silent` can adjust it after loading.
fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = level_for(quiet, verbose);
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .format_timestamp(None)
        .init();
    log::set_max_level(log_level);
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn apply_config_logging(config: &Config) {
    if config.silent {
        log::set_max_level(log::LevelFilter::Off);
    } else if config.verbose && log::max_level() < log::LevelFilter::Info {
        log::set_max_level(log::LevelFilter::Info);
    }
}

fn run_app(cli: Cli, quiet: bool, verbose: u8) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(command) => match command {
            Commands::Generate(args) => {
                log::debug!("Executing 'generate' command...");
                commands::generate::handle_generate_command(args, quiet, verbose)?;
            }
            Commands::Stats(args) => {
                log::debug!("Executing 'stats' command...");
                commands::stats::handle_stats_command(args, quiet, verbose)?;
            }
            Commands::Debug(args) => {
                log::debug!("Executing 'debug' command...");
                commands::debug::handle_debug_command(args, quiet, verbose)?;
            }
            Commands::Config(args) => {
                log::debug!("Executing 'config' command...");
                commands::config::handle_config_command(&args, quiet)?;
            }
        },
    }
    Ok(())
}

/// Turns CLI flags into the override tier. Empty list flags leave the
/// lower tiers untouched.
pub fn overrides_from_cli(
    project_opts: &ProjectConfigOpts,
    filters: &FilterOpts,
    format_opts: &FormatOutputOpts,
    quiet: bool,
    verbose: u8,
) -> Result<PartialConfig> {
    log::trace!("Building override layer from CLI flags...");
    let non_empty = |v: &Vec<String>| (!v.is_empty()).then(|| v.clone());

    let output_format = format_opts
        .format
        .as_deref()
        .map(|f| f.parse::<OutputFormat>())
        .transpose()?;

    let respect_gitignore = if filters.no_gitignore {
        Some(false)
    } else if filters.gitignore {
        Some(true)
    } else {
        None
    };

    Ok(PartialConfig {
        root_dir: project_opts.root.clone(),
        output_format,
        output_file: None,
        file_types: non_empty(&filters.file_types),
        exclude_folders: non_empty(&filters.exclude_folders),
        exclude_files: non_empty(&filters.exclude_files),
        include_patterns: non_empty(&filters.include_patterns),
        exclude_patterns: non_empty(&filters.exclude_patterns),
        max_size_mb: filters.max_size_mb,
        max_depth: filters.max_depth,
        respect_gitignore,
        verbose: (verbose > 0).then_some(true),
        silent: quiet.then_some(true),
    })
}

/// Resolves defaults, the config file and the CLI overrides into one `Config`.
pub fn load_config_for_command(
    project_opts: &ProjectConfigOpts,
    overrides: &PartialConfig,
) -> Result<Config> {
    let lookup_root = overrides
        .root_dir
        .clone()
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    let config_path = Config::resolve_config_path(
        &lookup_root,
        project_opts.config.as_deref(),
        project_opts.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let file_layer = match &config_path {
        Some(path) => Some(
            PartialConfig::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
        ),
        None => None,
    };

    let config = Config::resolve(file_layer.as_ref(), overrides);
    apply_config_logging(&config);
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_turns_logging_off() {
        assert_eq!(level_for(true, 3), log::LevelFilter::Off);
        assert_eq!(level_for(false, 0), log::LevelFilter::Warn);
        assert_eq!(level_for(false, 2), log::LevelFilter::Debug);
        assert_eq!(level_for(false, 9), log::LevelFilter::Trace);
    }

    #[test]
    fn empty_flags_leave_lower_tiers_alone() {
        let overrides = overrides_from_cli(
            &ProjectConfigOpts::default(),
            &FilterOpts::default(),
            &FormatOutputOpts::default(),
            false,
            0,
        )
        .unwrap();
        assert_eq!(overrides, PartialConfig::default());
    }

    #[test]
    fn flags_become_overrides() {
        let filters = FilterOpts {
            file_types: vec!["rs".into()],
            no_gitignore: true,
            max_size_mb: Some(1.5),
            ..Default::default()
        };
        let format = FormatOutputOpts {
            format: Some("yaml".into()),
        };
        let overrides =
            overrides_from_cli(&ProjectConfigOpts::default(), &filters, &format, true, 1)
                .unwrap();
        assert_eq!(overrides.file_types, Some(vec!["rs".to_string()]));
        assert_eq!(overrides.respect_gitignore, Some(false));
        assert_eq!(overrides.output_format, Some(OutputFormat::Yaml));
        assert_eq!(overrides.max_size_mb, Some(1.5));
        assert_eq!(overrides.silent, Some(true));
        assert_eq!(overrides.verbose, Some(true));
    }

    #[test]
    fn cli_overrides_beat_project_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".dirdigest.toml"),
            "max_size_mb = 2.0\nfile_types = [\".md\"]\n",
        )
        .unwrap();
        let project = ProjectConfigOpts {
            root: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let filters = FilterOpts {
            max_size_mb: Some(4.0),
            ..Default::default()
        };
        let overrides =
            overrides_from_cli(&project, &filters, &FormatOutputOpts::default(), false, 0)
                .unwrap();
        let config = load_config_for_command(&project, &overrides).unwrap();
        assert_eq!(config.max_size_mb, 4.0);
        assert_eq!(config.file_types, vec![".md".to_string()]);
        assert_eq!(config.root_dir, dir.path().to_path_buf());
    }
}
