use crate::admission::{CollectedFile, SkippedEntry};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::ignore_rules::{FsIgnoreSource, IgnoreSource, RuleSet};
use crate::stats::Stats;
use crate::walk::{CancelFlag, Walker};
use log;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// Result of one run: files sorted by relative path, their statistics, and
/// every entry that was left out together with the reason.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub files: Vec<CollectedFile>,
    pub stats: Stats,
    pub skipped: Vec<SkippedEntry>,
}

pub struct Collector {
    config: Config,
    ignore_source: Box<dyn IgnoreSource>,
    cancel: CancelFlag,
}

impl Collector {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ignore_source: Box::new(FsIgnoreSource),
            cancel: CancelFlag::new(),
        }
    }

    #[must_use]
    pub fn with_ignore_source(mut self, source: impl IgnoreSource + 'static) -> Self {
        self.ignore_source = Box::new(source);
        self
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self) -> Result<Collection> {
        self.config.validate()?;
        let root = self.config.root_dir.as_path();
        validate_root(root)?;
        log::debug!(
            "Collecting from {} (gitignore: {}, max depth: {}, max size: {} MB)",
            root.display(),
            self.config.respect_gitignore,
            self.config.max_depth,
            self.config.max_size_mb
        );

        let rules = RuleSet::compile(&self.config, root, self.ignore_source.as_ref())?;
        let walker = Walker::new(root, &self.config, &rules, &self.cancel);
        let mut output = walker.walk()?;

        output.files.sort_unstable_by(|a, b| a.path.cmp(&b.path));
        output.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        let stats = Stats::aggregate(&output.files);
        log::info!(
            "Collected {} files ({} lines).",
            stats.total_files,
            stats.total_lines
        );

        Ok(Collection {
            files: output.files,
            stats,
            skipped: output.skipped,
        })
    }
}

/// Collects with the on-disk `.gitignore` as the ignore source.
pub fn collect_files(config: &Config) -> Result<Collection> {
    Collector::new(config.clone()).run()
}

fn validate_root(root: &Path) -> Result<()> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(AppError::RootNotDirectory(root.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(AppError::RootNotFound(root.to_path_buf()))
        }
        Err(e) => Err(AppError::RootInaccessible {
            path: root.to_path_buf(),
            source: e,
        }),
    }
}
