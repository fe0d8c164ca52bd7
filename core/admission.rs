use crate::config::Config;
use crate::ignore_rules::FilterRules;
use byte_unit::{Byte, UnitType};
use log;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A file that passed every filter, keyed by its root-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedFile {
    pub path: String,
    pub content: String,
}

impl CollectedFile {
    pub fn extension(&self) -> String {
        file_extension(&self.path)
    }
}

/// Why an entry was left out of the collection. None of these abort a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Ignored,
    Symlink,
    ExcludedFolder,
    DepthExceeded,
    ExcludedFile,
    NotIncluded,
    ExcludedPattern,
    ExtensionNotAllowed { extension: String },
    TooLarge { size_bytes: u64 },
    NotText,
    Unreadable { message: String },
    NotRegularFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Ignored => f.write_str("matched an ignore-file rule"),
            SkipReason::Symlink => f.write_str("symbolic link"),
            SkipReason::ExcludedFolder => f.write_str("excluded folder"),
            SkipReason::DepthExceeded => f.write_str("exceeds maximum depth"),
            SkipReason::ExcludedFile => f.write_str("matched an exclude-file pattern"),
            SkipReason::NotIncluded => f.write_str("matched no include pattern"),
            SkipReason::ExcludedPattern => f.write_str("matched an exclude pattern"),
            SkipReason::ExtensionNotAllowed { extension } if extension.is_empty() => {
                f.write_str("no extension, not in allowed file types")
            }
            SkipReason::ExtensionNotAllowed { extension } => {
                write!(f, "extension '{}' not in allowed file types", extension)
            }
            SkipReason::TooLarge { size_bytes } => write!(
                f,
                "too large ({:.2} MB, {})",
                size_in_mb(*size_bytes),
                Byte::from_u64(*size_bytes).get_appropriate_unit(UnitType::Binary)
            ),
            SkipReason::NotText => f.write_str("not valid UTF-8 text"),
            SkipReason::Unreadable { message } => write!(f, "unreadable ({})", message),
            SkipReason::NotRegularFile => f.write_str("not a regular file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    pub path: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Admitted(CollectedFile),
    Rejected(SkipReason),
}

/// Runs the per-file veto chain. The first failing check decides; content
/// is read only after every cheaper check has passed.
pub fn admit(
    full_path: &Path,
    relative_path: &str,
    config: &Config,
    filters: &FilterRules,
) -> Admission {
    if filters.is_excluded_file(relative_path) {
        return Admission::Rejected(SkipReason::ExcludedFile);
    }
    if !filters.is_included(relative_path) {
        return Admission::Rejected(SkipReason::NotIncluded);
    }
    if filters.is_excluded_pattern(relative_path) {
        return Admission::Rejected(SkipReason::ExcludedPattern);
    }

    let extension = file_extension(relative_path);
    if !config.file_types.is_empty() && !config.file_types.contains(&extension) {
        return Admission::Rejected(SkipReason::ExtensionNotAllowed { extension });
    }

    let size_bytes = match fs::metadata(full_path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            return Admission::Rejected(SkipReason::Unreadable {
                message: e.to_string(),
            });
        }
    };
    if size_in_mb(size_bytes) > config.max_size_mb {
        return Admission::Rejected(SkipReason::TooLarge { size_bytes });
    }

    let bytes = match fs::read(full_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Admission::Rejected(SkipReason::Unreadable {
                message: e.to_string(),
            });
        }
    };
    match String::from_utf8(bytes) {
        Ok(content) => {
            log::trace!("Admitted file: {}", relative_path);
            Admission::Admitted(CollectedFile {
                path: relative_path.to_string(),
                content,
            })
        }
        Err(_) => Admission::Rejected(SkipReason::NotText),
    }
}

/// Lower-cased extension with its leading dot, or `""` when there is none.
/// Dotfiles such as `.gitignore` have no extension.
pub fn file_extension(relative_path: &str) -> String {
    Path::new(relative_path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub fn size_in_mb(size_bytes: u64) -> f64 {
    size_bytes as f64 / BYTES_PER_MB
}

pub(crate) fn report_skip(verbose: bool, relative_path: &str, reason: &SkipReason) {
    if verbose {
        log::info!("Skipping {}: {}", relative_path, reason);
    } else {
        log::debug!("Skipping {}: {}", relative_path, reason);
    }
}
