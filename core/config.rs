use crate::error::{AppError, Result};
use log;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILENAME: &str = ".dirdigest.toml";
pub const USER_CONFIG_DIR: &str = "dirdigest";
pub const USER_CONFIG_FILENAME: &str = "config.toml";
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";
pub const DEFAULT_MAX_SIZE_MB: f64 = 10.0;

#[derive(Debug, Default, Deserialize)]
pub struct BuiltinDefaults {
    #[serde(default)]
    pub exclude_folders: Vec<String>,
    #[serde(default)]
    pub exclude_files: Vec<String>,
}

static BUILTIN_DEFAULTS: Lazy<BuiltinDefaults> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/defaults.yaml"));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/defaults.yaml")
});

pub fn get_builtin_defaults() -> &'static BuiltinDefaults {
    &BUILTIN_DEFAULTS
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
    Xml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Xml => "xml",
        }
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self, OutputFormat::Text)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Xml => "xml",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown output format '{}'. Use text, json, yaml or xml.",
                other
            ))),
        }
    }
}

/// Recursion bound for the walk. `Limited(0)` keeps the walk in the root
/// directory itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "MaxDepthRepr", into = "MaxDepthRepr")]
pub enum MaxDepth {
    Limited(usize),
    #[default]
    Unbounded,
}

impl MaxDepth {
    /// Whether entries at `depth` (0 = direct children of the root) may be visited.
    pub fn allows(&self, depth: usize) -> bool {
        match self {
            MaxDepth::Limited(limit) => depth <= *limit,
            MaxDepth::Unbounded => true,
        }
    }
}

impl fmt::Display for MaxDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxDepth::Limited(limit) => write!(f, "{}", limit),
            MaxDepth::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl FromStr for MaxDepth {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if matches!(
            trimmed.to_lowercase().as_str(),
            "unbounded" | "infinity" | "inf" | "none"
        ) {
            return Ok(MaxDepth::Unbounded);
        }
        trimmed
            .parse::<usize>()
            .map(MaxDepth::Limited)
            .map_err(|_| {
                AppError::InvalidArgument(format!(
                    "Invalid max depth '{}'. Use a non-negative integer or 'unbounded'.",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum MaxDepthRepr {
    Number(i64),
    Text(String),
}

impl From<MaxDepth> for MaxDepthRepr {
    fn from(depth: MaxDepth) -> Self {
        match depth {
            MaxDepth::Limited(limit) => MaxDepthRepr::Number(limit as i64),
            MaxDepth::Unbounded => MaxDepthRepr::Text("unbounded".to_string()),
        }
    }
}

impl TryFrom<MaxDepthRepr> for MaxDepth {
    type Error = String;

    fn try_from(repr: MaxDepthRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            MaxDepthRepr::Number(n) if n >= 0 => Ok(MaxDepth::Limited(n as usize)),
            MaxDepthRepr::Number(n) => Err(format!("max_depth must not be negative, got {}", n)),
            MaxDepthRepr::Text(s) => s.parse().map_err(|e: AppError| e.to_string()),
        }
    }
}

/// Fully resolved, immutable settings for one collection run.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Config {
    pub root_dir: PathBuf,
    pub output_format: OutputFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    pub file_types: Vec<String>,
    pub exclude_folders: Vec<String>,
    pub exclude_files: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_size_mb: f64,
    pub max_depth: MaxDepth,
    pub respect_gitignore: bool,
    pub verbose: bool,
    pub silent: bool,
}

impl Default for Config {
    fn default() -> Self {
        let builtin = get_builtin_defaults();
        Self {
            root_dir: PathBuf::from("."),
            output_format: OutputFormat::default(),
            output_file: None,
            file_types: Vec::new(),
            exclude_folders: builtin.exclude_folders.clone(),
            exclude_files: builtin.exclude_files.clone(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_depth: MaxDepth::Unbounded,
            respect_gitignore: true,
            verbose: false,
            silent: false,
        }
    }
}

/// One tier of configuration input. Present fields replace the value from
/// the tier below; lists are replaced wholesale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_folders: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_patterns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<MaxDepth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respect_gitignore: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
}

impl PartialConfig {
    /// Parses a config file, picking the format from its extension
    /// (`.json`, `.yaml`/`.yml`, anything else is TOML).
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        let extension = config_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let parsed = match extension.as_str() {
            "json" => serde_json::from_str::<PartialConfig>(&content).map_err(|e| e.to_string()),
            "yaml" | "yml" => {
                serde_yml::from_str::<PartialConfig>(&content).map_err(|e| e.to_string())
            }
            _ => toml::from_str::<PartialConfig>(&content).map_err(|e| e.to_string()),
        };
        let mut layer = parsed.map_err(|message| AppError::ConfigParse {
            path: config_path.to_path_buf(),
            message,
        })?;

        // A relative root in a config file is relative to that file.
        if let (Some(root), Some(parent)) = (&layer.root_dir, config_path.parent()) {
            let expanded = PathBuf::from(shellexpand::tilde(&root.to_string_lossy()).as_ref());
            if expanded.is_relative() {
                layer.root_dir = Some(parent.join(expanded));
            }
        }
        Ok(layer)
    }
}

impl Config {
    /// Built-in defaults, then the file tier, then explicit overrides.
    pub fn resolve(file: Option<&PartialConfig>, overrides: &PartialConfig) -> Self {
        let mut config = Config::default();
        if let Some(file_layer) = file {
            log::trace!("Applying file configuration layer: {:?}", file_layer);
            config.apply(file_layer);
        }
        log::trace!("Applying override layer: {:?}", overrides);
        config.apply(overrides);
        config.normalized()
    }

    fn apply(&mut self, layer: &PartialConfig) {
        if let Some(root_dir) = &layer.root_dir {
            self.root_dir = root_dir.clone();
        }
        if let Some(format) = layer.output_format {
            self.output_format = format;
        }
        if let Some(output_file) = &layer.output_file {
            self.output_file = Some(output_file.clone());
        }
        if let Some(file_types) = &layer.file_types {
            self.file_types = file_types.clone();
        }
        if let Some(exclude_folders) = &layer.exclude_folders {
            self.exclude_folders = exclude_folders.clone();
        }
        if let Some(exclude_files) = &layer.exclude_files {
            self.exclude_files = exclude_files.clone();
        }
        if let Some(include_patterns) = &layer.include_patterns {
            self.include_patterns = include_patterns.clone();
        }
        if let Some(exclude_patterns) = &layer.exclude_patterns {
            self.exclude_patterns = exclude_patterns.clone();
        }
        if let Some(max_size_mb) = layer.max_size_mb {
            self.max_size_mb = max_size_mb;
        }
        if let Some(max_depth) = layer.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(respect_gitignore) = layer.respect_gitignore {
            self.respect_gitignore = respect_gitignore;
        }
        if let Some(verbose) = layer.verbose {
            self.verbose = verbose;
        }
        if let Some(silent) = layer.silent {
            self.silent = silent;
        }
    }

    fn normalized(mut self) -> Self {
        let root_str = self.root_dir.to_string_lossy().to_string();
        self.root_dir = PathBuf::from(shellexpand::tilde(&root_str).as_ref());

        let mut seen = std::collections::HashSet::new();
        self.file_types = self
            .file_types
            .iter()
            .filter_map(|ft| normalize_file_type(ft))
            .filter(|ft| seen.insert(ft.clone()))
            .collect();

        self.exclude_folders = self
            .exclude_folders
            .iter()
            .map(|name| name.trim().trim_end_matches(['/', '\\']).to_string())
            .filter(|name| !name.is_empty())
            .collect();
        self
    }

    /// Rejects numeric settings no run can honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_size_mb.is_nan() || self.max_size_mb < 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "max_size_mb must be a non-negative number, got {}",
                self.max_size_mb
            )));
        }
        Ok(())
    }

    /// Locates the file tier: an explicit path wins, then the project file
    /// under `root`, then the per-user config file.
    pub fn resolve_config_path(
        root: &Path,
        cli_config_file: Option<&Path>,
        disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        if let Some(explicit) = cli_config_file {
            let expanded = PathBuf::from(
                shellexpand::tilde(&explicit.to_string_lossy().to_string()).as_ref(),
            );
            if !expanded.exists() {
                return Err(AppError::Config(format!(
                    "Specified config file not found at path: {}",
                    expanded.display()
                )));
            }
            log::debug!("Using specified config file path: {}", expanded.display());
            return Ok(Some(expanded));
        }

        let project_path = root.join(DEFAULT_CONFIG_FILENAME);
        if project_path.is_file() {
            log::debug!("Using project config file: {}", project_path.display());
            return Ok(Some(project_path));
        }

        if let Some(user_dir) = dirs::config_dir() {
            let user_path = user_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILENAME);
            if user_path.is_file() {
                log::debug!("Using user config file: {}", user_path.display());
                return Ok(Some(user_path));
            }
        }

        log::debug!(
            "No config file specified and none found at: {}",
            project_path.display()
        );
        Ok(None)
    }

    pub fn project_name(&self) -> String {
        self.root_dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| "project".to_string())
    }
}

/// Lower-cases an allowlist entry and gives it a leading dot.
pub fn normalize_file_type(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('*');
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with('.') {
        Some(lowered)
    } else {
        Some(format!(".{}", lowered))
    }
}
