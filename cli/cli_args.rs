use clap::{Args, Parser, Subcommand};
use dirdigest_core::MaxDepth;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        short = 'r',
        long,
        help = "Directory to collect from (default: current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        help = "Config file to load (default: <root>/.dirdigest.toml, then the user config).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Project Setup"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Do not load any config file.",
        conflicts_with = "config",
        help_heading = "Project Setup"
    )]
    pub no_config: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterOpts {
    #[arg(
        short = 't',
        long = "file-type",
        value_name = "EXT",
        help = "Only collect files with this extension (repeatable, e.g. -t .rs -t md).",
        help_heading = "Filters"
    )]
    pub file_types: Vec<String>,

    #[arg(
        long = "exclude-folder",
        value_name = "NAME",
        help = "Skip directories with this exact name (repeatable, replaces defaults).",
        help_heading = "Filters"
    )]
    pub exclude_folders: Vec<String>,

    #[arg(
        long = "exclude-file",
        value_name = "GLOB",
        help = "Skip files matching this glob (repeatable, replaces defaults).",
        help_heading = "Filters"
    )]
    pub exclude_files: Vec<String>,

    #[arg(
        short = 'i',
        long = "include",
        value_name = "GLOB",
        help = "Only collect paths matching one of these globs (repeatable).",
        help_heading = "Filters"
    )]
    pub include_patterns: Vec<String>,

    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "GLOB",
        help = "Skip paths matching any of these globs (repeatable).",
        help_heading = "Filters"
    )]
    pub exclude_patterns: Vec<String>,

    #[arg(
        long,
        value_name = "MB",
        help = "Skip files larger than this many megabytes.",
        help_heading = "Filters"
    )]
    pub max_size_mb: Option<f64>,

    #[arg(
        long,
        value_name = "DEPTH",
        value_parser = parse_max_depth,
        help = "Maximum recursion depth (0 = root only, or 'unbounded').",
        help_heading = "Filters"
    )]
    pub max_depth: Option<MaxDepth>,

    #[arg(
        long,
        help = "Honor the root .gitignore [default].",
        conflicts_with = "no_gitignore",
        help_heading = "Filters"
    )]
    pub gitignore: bool,

    #[arg(
        long,
        help = "Ignore the root .gitignore.",
        conflicts_with = "gitignore",
        help_heading = "Filters"
    )]
    pub no_gitignore: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Set the output format.", value_name = "FORMAT", value_parser = ["text", "json", "yaml", "xml"], help_heading = "Output Formatting")]
    pub format: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Collect a filtered snapshot of a directory tree into one file.",
    long_about = "dirdigest walks a directory, selects files by extension, size, depth, globs, \nexcluded folders and .gitignore rules, and writes them as one text or structured \ndigest together with per-extension statistics.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  dirdigest generate -t .rs -o digest.txt\n  dirdigest generate -f json -e '**/*.test.ts'\n  dirdigest stats --max-depth 2\n  dirdigest debug",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "g",
        visible_alias = "gen",
        about = "Collect files and write the digest."
    )]
    Generate(GenerateArgs),

    #[command(
        visible_alias = "m",
        about = "Show file and line statistics per extension."
    )]
    Stats(StatsArgs),

    #[command(
        visible_alias = "d",
        about = "Show effective configuration, collected and skipped paths."
    )]
    Debug(DebugArgs),

    #[command(about = "Show or save the default configuration file.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the digest to this file instead of standard output.",
        help_heading = "Output Control",
        conflicts_with = "stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        help = "Write to standard output even if the config names an output file.",
        help_heading = "Output Control",
        conflicts_with = "output"
    )]
    pub stdout: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
}

#[derive(Args, Debug, Clone)]
pub struct DebugArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'r',
        long,
        value_name = "PATH",
        help = "Directory where --save writes .dirdigest.toml (default: current dir)."
    )]
    pub root: Option<PathBuf>,

    #[arg(long, help = "Save the default configuration to <root>/.dirdigest.toml.")]
    pub save: bool,
}

fn parse_max_depth(raw: &str) -> Result<MaxDepth, String> {
    raw.parse::<MaxDepth>().map_err(|e| e.to_string())
}
