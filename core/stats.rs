use crate::admission::{CollectedFile, file_extension};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStats {
    pub files: usize,
    pub lines: usize,
}

/// Totals over a collected file set, with per-extension buckets sorted by
/// extension (`""` for extensionless files).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_files: usize,
    pub total_lines: usize,
    pub by_extension: IndexMap<String, ExtensionStats>,
}

impl Stats {
    pub fn aggregate(files: &[CollectedFile]) -> Self {
        let mut stats = Stats::default();
        for file in files {
            let lines = count_lines(&file.content);
            stats.total_files += 1;
            stats.total_lines += lines;
            let bucket = stats
                .by_extension
                .entry(file_extension(&file.path))
                .or_default();
            bucket.files += 1;
            bucket.lines += lines;
        }
        stats.by_extension.sort_keys();
        stats
    }
}

/// Number of segments produced by splitting on `\n`. Content ending in a
/// newline gains one empty trailing segment; empty content counts as 1.
pub fn count_lines(content: &str) -> usize {
    content.split('\n').count()
}
