pub mod admission;
pub mod collect;
pub mod config;
pub mod error;
pub mod ignore_rules;
pub mod output_formats;
pub mod stats;
pub mod walk;

pub use admission::{Admission, CollectedFile, SkipReason, SkippedEntry, admit, file_extension};
pub use collect::{Collection, Collector, collect_files};
pub use config::{Config, MaxDepth, OutputFormat, PartialConfig};
pub use error::{AppError, Result};
pub use ignore_rules::{FsIgnoreSource, IgnoreRules, IgnoreSource, RuleSet, StaticIgnoreSource};
pub use output_formats::{Digest, render_digest};
pub use stats::{ExtensionStats, Stats, count_lines};
pub use walk::{CancelFlag, EntryKind, TraversalEntry};
