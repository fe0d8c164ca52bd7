//! Traversal under a depth bound.
//!
//! The walk runs on `ignore`'s parallel walker with every built-in filter
//! turned off; the root ignore rules and configured filters are applied here
//! instead, so each pruning decision can be recorded as a skip. Visitors on
//! worker threads send their outcomes over a channel and the caller collects
//! them after the walk. Symlinks are never followed, which keeps the walk
//! finite on cyclic link graphs.

use crate::admission::{self, Admission, CollectedFile, SkipReason, SkippedEntry};
use crate::config::{Config, MaxDepth};
use crate::error::{AppError, Result};
use crate::ignore_rules::{RuleSet, to_relative_string};
use ignore::{DirEntry, WalkBuilder, WalkState};
use log;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
    Other,
}

/// One filesystem node seen during the walk.
#[derive(Debug, Clone)]
pub struct TraversalEntry {
    pub path: PathBuf,
    pub relative_path: String,
    pub name: String,
    pub kind: EntryKind,
    /// 0 for direct children of the root.
    pub depth: usize,
}

/// Shared cancellation signal, checked before every entry and every admission.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Collected(CollectedFile),
    Skipped(SkippedEntry),
}

#[derive(Debug, Default)]
pub struct WalkOutput {
    pub files: Vec<CollectedFile>,
    pub skipped: Vec<SkippedEntry>,
}

pub struct Walker<'a> {
    root: &'a Path,
    config: &'a Config,
    rules: &'a RuleSet,
    cancel: &'a CancelFlag,
}

impl<'a> Walker<'a> {
    pub fn new(
        root: &'a Path,
        config: &'a Config,
        rules: &'a RuleSet,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            root,
            config,
            rules,
            cancel,
        }
    }

    /// Walks the whole tree. Only a failure to list the root itself, or
    /// cancellation, is an error; everything below the root degrades to
    /// skip records.
    pub fn walk(&self) -> Result<WalkOutput> {
        self.cancel.check()?;
        fs::read_dir(self.root).map_err(|e| AppError::RootInaccessible {
            path: self.root.to_path_buf(),
            source: e,
        })?;

        let mut builder = WalkBuilder::new(self.root);
        builder
            .threads(rayon::current_num_threads().min(12))
            .standard_filters(false)
            .follow_links(false);
        // Walker depth counts the root as 0, so root children sit at 1.
        if let MaxDepth::Limited(limit) = self.config.max_depth {
            builder.max_depth(Some(limit.saturating_add(1)));
        }
        log::debug!(
            "WalkBuilder configured (gitignore: {}, max depth: {})",
            self.config.respect_gitignore,
            self.config.max_depth
        );

        let (tx, rx) = mpsc::channel::<Outcome>();
        log::info!("Walking directory: {}", self.root.display());
        builder.build_parallel().run(|| {
            let tx = tx.clone();
            Box::new(move |entry_result| self.visit(entry_result, &tx))
        });
        drop(tx);

        let mut output = WalkOutput::default();
        for outcome in rx {
            match outcome {
                Outcome::Collected(file) => output.files.push(file),
                Outcome::Skipped(skipped) => output.skipped.push(skipped),
            }
        }
        self.cancel.check()?;

        log::info!(
            "Directory walk complete. Collected {} files, skipped {} entries.",
            output.files.len(),
            output.skipped.len()
        );
        Ok(output)
    }

    fn visit(
        &self,
        entry_result: std::result::Result<DirEntry, ignore::Error>,
        tx: &Sender<Outcome>,
    ) -> WalkState {
        if self.cancel.is_cancelled() {
            return WalkState::Quit;
        }

        let (outcome, state) = match entry_result {
            Ok(dir_entry) if dir_entry.depth() == 0 => return WalkState::Continue,
            Ok(dir_entry) => self.classify(self.entry_for(&dir_entry)),
            Err(err) => (self.walk_error(&err), WalkState::Continue),
        };

        if let Some(outcome) = outcome {
            if tx.send(outcome).is_err() {
                log::error!("Receiver dropped for walk outcomes, stopping walk early.");
                return WalkState::Quit;
            }
        }
        state
    }

    fn entry_for(&self, dir_entry: &DirEntry) -> TraversalEntry {
        let path = dir_entry.path().to_path_buf();
        let kind = match dir_entry.file_type() {
            Some(ft) if ft.is_symlink() => EntryKind::Symlink,
            Some(ft) if ft.is_dir() => EntryKind::Directory,
            Some(ft) if ft.is_file() => EntryKind::File,
            _ => EntryKind::Other,
        };
        let entry = TraversalEntry {
            relative_path: self.relative_path(&path),
            name: dir_entry.file_name().to_string_lossy().into_owned(),
            path,
            kind,
            depth: dir_entry.depth().saturating_sub(1),
        };
        log::trace!(
            "Visiting {:?} at depth {}: {}",
            entry.kind,
            entry.depth,
            entry.relative_path
        );
        entry
    }

    fn relative_path(&self, path: &Path) -> String {
        pathdiff::diff_paths(path, self.root)
            .map(|rel| to_relative_string(&rel))
            .unwrap_or_else(|| to_relative_string(path))
    }

    fn classify(&self, entry: TraversalEntry) -> (Option<Outcome>, WalkState) {
        let is_dir = entry.kind == EntryKind::Directory;
        if self.config.respect_gitignore && self.rules.ignore.matches(&entry.relative_path, is_dir)
        {
            return (
                Some(self.skip(&entry.relative_path, SkipReason::Ignored)),
                WalkState::Skip,
            );
        }

        match entry.kind {
            EntryKind::Symlink => (
                Some(self.skip(&entry.relative_path, SkipReason::Symlink)),
                WalkState::Skip,
            ),
            EntryKind::Directory => self.descend(&entry),
            EntryKind::File => {
                if self.cancel.is_cancelled() {
                    return (None, WalkState::Quit);
                }
                let outcome = match admission::admit(
                    &entry.path,
                    &entry.relative_path,
                    self.config,
                    &self.rules.filters,
                ) {
                    Admission::Admitted(file) => Outcome::Collected(file),
                    Admission::Rejected(reason) => self.skip(&entry.relative_path, reason),
                };
                (Some(outcome), WalkState::Continue)
            }
            EntryKind::Other => (
                Some(self.skip(&entry.relative_path, SkipReason::NotRegularFile)),
                WalkState::Continue,
            ),
        }
    }

    fn descend(&self, entry: &TraversalEntry) -> (Option<Outcome>, WalkState) {
        if self.rules.filters.is_excluded_folder(&entry.name) {
            return (
                Some(self.skip(&entry.relative_path, SkipReason::ExcludedFolder)),
                WalkState::Skip,
            );
        }
        if !self.config.max_depth.allows(entry.depth + 1) {
            return (
                Some(self.skip(&entry.relative_path, SkipReason::DepthExceeded)),
                WalkState::Skip,
            );
        }
        (None, WalkState::Continue)
    }

    /// A directory that could not be listed, or an entry whose metadata
    /// could not be read, becomes an `Unreadable` skip.
    fn walk_error(&self, err: &ignore::Error) -> Option<Outcome> {
        let message = err
            .io_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| err.to_string());
        match error_path(err) {
            Some(path) => {
                let relative_path = self.relative_path(path);
                if relative_path.is_empty() {
                    log::warn!("Error walking directory: {}", err);
                    return None;
                }
                Some(self.skip(&relative_path, SkipReason::Unreadable { message }))
            }
            None => {
                log::warn!("Error walking directory: {}", err);
                None
            }
        }
    }

    fn skip(&self, relative_path: &str, reason: SkipReason) -> Outcome {
        admission::report_skip(self.config.verbose, relative_path, &reason);
        Outcome::Skipped(SkippedEntry {
            path: relative_path.to_string(),
            reason,
        })
    }
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        _ => None,
    }
}
