//! Compilation of every exclusion/inclusion input into matchable rule sets.
//!
//! Two families of rules live here:
//! - [`IgnoreRules`]: gitignore-syntax patterns read from the root's ignore
//!   file, with negation and last-match-wins precedence.
//! - [`FilterRules`]: the configured folder names and glob lists.
//!
//! All matching happens on root-relative paths with `/` separators.

use crate::config::{Config, DEFAULT_IGNORE_FILE};
use crate::error::{AppError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path};

/// Capability for reading the ignore file of a root directory.
pub trait IgnoreSource: Send + Sync {
    fn read_ignore_file(&self, root: &Path) -> io::Result<String>;
}

/// Reads `<root>/.gitignore` from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsIgnoreSource;

impl IgnoreSource for FsIgnoreSource {
    fn read_ignore_file(&self, root: &Path) -> io::Result<String> {
        fs::read_to_string(root.join(DEFAULT_IGNORE_FILE))
    }
}

/// Serves fixed ignore-file content regardless of the root.
#[derive(Debug, Clone, Default)]
pub struct StaticIgnoreSource(pub String);

impl IgnoreSource for StaticIgnoreSource {
    fn read_ignore_file(&self, _root: &Path) -> io::Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct IgnoreRules {
    matcher: Gitignore,
}

impl IgnoreRules {
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Builds the rule set for `root`. Any failure to read the ignore file
    /// yields an empty rule set.
    pub fn compile(root: &Path, honor_ignore_file: bool, source: &dyn IgnoreSource) -> Self {
        if !honor_ignore_file {
            log::debug!("Ignore file disabled, using empty rule set.");
            return Self::empty();
        }
        match source.read_ignore_file(root) {
            Ok(content) => Self::from_content(root, &content),
            Err(e) => {
                log::debug!(
                    "No ignore rules loaded for {} ({}), using empty rule set.",
                    root.display(),
                    e
                );
                Self::empty()
            }
        }
    }

    /// Parses gitignore text. Lines that fail to parse are dropped with a warning.
    pub fn from_content(root: &Path, content: &str) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        for (line_no, line) in content.lines().enumerate() {
            if let Err(e) = builder.add_line(None, line) {
                log::warn!(
                    "Skipping invalid ignore pattern on line {} ({:?}): {}",
                    line_no + 1,
                    line,
                    e
                );
            }
        }
        match builder.build() {
            Ok(matcher) => {
                log::debug!("Compiled {} ignore rules.", matcher.len());
                Self { matcher }
            }
            Err(e) => {
                log::warn!("Failed to build ignore rules, using empty set: {}", e);
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.matcher.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }

    /// True when the last rule matching `relative_path` is an ignore rule
    /// (not a `!` negation).
    pub fn matches(&self, relative_path: &str, is_dir: bool) -> bool {
        let normalized = normalize_separators(relative_path);
        if normalized.is_empty() {
            return false;
        }
        self.matcher.matched(Path::new(&normalized), is_dir).is_ignore()
    }
}

/// Configured folder-name, file-glob and include/exclude rules.
#[derive(Debug, Clone)]
pub struct FilterRules {
    exclude_folders: HashSet<String>,
    exclude_file_paths: GlobSet,
    exclude_file_names: GlobSet,
    include: GlobSet,
    has_includes: bool,
    exclude: GlobSet,
}

impl FilterRules {
    pub fn compile(config: &Config) -> Result<Self> {
        log::trace!("Building glob sets for filtering...");
        let (name_patterns, path_patterns): (Vec<String>, Vec<String>) = config
            .exclude_files
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .partition(|p| !p.contains('/'));

        let include_patterns = active_patterns(&config.include_patterns);

        let rules = Self {
            exclude_folders: config.exclude_folders.iter().cloned().collect(),
            exclude_file_paths: build_glob_set_from_vec(&path_patterns)?,
            exclude_file_names: build_glob_set_from_vec(&name_patterns)?,
            include: build_glob_set_from_vec(&include_patterns)?,
            has_includes: !include_patterns.is_empty(),
            exclude: build_glob_set_from_vec(&config.exclude_patterns)?,
        };
        log::trace!("Glob sets built successfully.");
        Ok(rules)
    }

    /// Exact directory-name match, never a path match.
    pub fn is_excluded_folder(&self, name: &str) -> bool {
        self.exclude_folders.contains(name)
    }

    pub fn is_excluded_file(&self, relative_path: &str) -> bool {
        if self.exclude_file_paths.is_match(relative_path) {
            return true;
        }
        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
        self.exclude_file_names.is_match(file_name)
    }

    /// False only when include patterns exist and none matches.
    pub fn is_included(&self, relative_path: &str) -> bool {
        !self.has_includes || self.include.is_match(relative_path)
    }

    pub fn is_excluded_pattern(&self, relative_path: &str) -> bool {
        self.exclude.is_match(relative_path)
    }
}

/// Both rule families, compiled once per run and shared read-only by all
/// traversal branches.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub ignore: IgnoreRules,
    pub filters: FilterRules,
}

impl RuleSet {
    pub fn compile(config: &Config, root: &Path, source: &dyn IgnoreSource) -> Result<Self> {
        Ok(Self {
            ignore: IgnoreRules::compile(root, config.respect_gitignore, source),
            filters: FilterRules::compile(config)?,
        })
    }
}

/// Patterns left after trimming; blank entries and a bare `./` carry no rule.
fn active_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.trim_start_matches("./").is_empty())
        .map(str::to_string)
        .collect()
}

fn build_glob_set_from_vec(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern_str in &active_patterns(patterns) {
        let mut processed_pattern = pattern_str.trim_start_matches("./").to_string();
        if processed_pattern.ends_with('/') && processed_pattern.len() > 1 {
            processed_pattern.push_str("**");
        }
        match GlobBuilder::new(&processed_pattern)
            .literal_separator(true)
            .build()
        {
            Ok(glob) => {
                log::trace!(
                    "Adding glob pattern: {} (processed as {})",
                    pattern_str,
                    processed_pattern
                );
                builder.add(glob);
            }
            Err(e) => {
                log::error!("Invalid glob pattern \"{}\": {}", pattern_str, e);
                return Err(AppError::Glob(format!(
                    "Invalid glob pattern \"{}\" (processed as \"{}\"): {}",
                    pattern_str, processed_pattern, e
                )));
            }
        }
    }
    builder.build().map_err(|e| {
        log::error!("Error building glob set: {}", e);
        AppError::Glob(e.to_string())
    })
}

/// Root-relative path as a `/`-joined string, whatever the platform separator.
pub fn to_relative_string(relative_path: &Path) -> String {
    relative_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_separators(relative_path: &str) -> String {
    let unified = if cfg!(windows) {
        relative_path.replace('\\', "/")
    } else {
        relative_path.to_string()
    };
    unified.trim_start_matches("./").trim_matches('/').to_string()
}
