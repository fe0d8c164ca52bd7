use crate::admission::CollectedFile;
use crate::collect::Collection;
use crate::config::OutputFormat;
use crate::error::{AppError, Result};
use crate::stats::Stats;
use chrono::{DateTime, Utc};
use serde::Serialize;

const SEPARATOR: &str =
    "================================================================";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRow {
    pub extension: String,
    pub files: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestStats {
    pub total_files: usize,
    pub total_lines: usize,
    pub extensions: Vec<ExtensionRow>,
}

impl From<&Stats> for DigestStats {
    fn from(stats: &Stats) -> Self {
        Self {
            total_files: stats.total_files,
            total_lines: stats.total_lines,
            extensions: stats
                .by_extension
                .iter()
                .map(|(ext, bucket)| ExtensionRow {
                    extension: ext.clone(),
                    files: bucket.files,
                    lines: bucket.lines,
                })
                .collect(),
        }
    }
}

/// Serializable snapshot of a collection, the structured output artifact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest<'a> {
    pub project_name: String,
    pub root_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub stats: DigestStats,
    pub files: &'a [CollectedFile],
}

impl<'a> Digest<'a> {
    pub fn new(
        collection: &'a Collection,
        project_name: impl Into<String>,
        root_dir: impl Into<String>,
        generated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            root_dir: root_dir.into(),
            generated_at,
            stats: DigestStats::from(&collection.stats),
            files: &collection.files,
        }
    }
}

pub fn render_digest(digest: &Digest<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(digest)),
        OutputFormat::Json => serialize_to_json(digest, true),
        OutputFormat::Yaml => serialize_to_yaml(digest),
        OutputFormat::Xml => serialize_to_xml(digest, "digest"),
    }
}

/// Concatenated text: a short header, then one delimited block per file in
/// collection order.
pub fn render_text(digest: &Digest<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Project: {}\n", digest.project_name));
    out.push_str(&format!("Root: {}\n", digest.root_dir));
    if let Some(ts) = digest.generated_at {
        out.push_str(&format!("Generated: {}\n", ts.to_rfc3339()));
    }
    out.push_str(&format!(
        "Files: {} | Lines: {}\n",
        digest.stats.total_files, digest.stats.total_lines
    ));

    for file in digest.files {
        out.push('\n');
        out.push_str(SEPARATOR);
        out.push_str(&format!("\nFile: {}\n", file.path));
        out.push_str(SEPARATOR);
        out.push('\n');
        out.push_str(&file.content);
        if !file.content.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

pub fn serialize_to_json<T: Serialize>(data: &T, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(data).map_err(AppError::JsonSerialize)
    } else {
        serde_json::to_string(data).map_err(AppError::JsonSerialize)
    }
}

pub fn serialize_to_yaml<T: Serialize>(data: &T) -> Result<String> {
    serde_yml::to_string(data).map_err(AppError::YamlError)
}

#[cfg(feature = "xml")]
pub fn serialize_to_xml<T: Serialize>(data: &T, root_name: &str) -> Result<String> {
    quick_xml::se::to_string_with_root(root_name, data).map_err(AppError::from)
}

#[cfg(not(feature = "xml"))]
pub fn serialize_to_xml<T: Serialize>(_data: &T, _root_name: &str) -> Result<String> {
    Err(AppError::InvalidArgument(
        "XML output requires the 'xml' feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Stats;

    fn collection() -> Collection {
        let files = vec![
            CollectedFile {
                path: "a.ts".into(),
                content: "let a = 1;\n".into(),
            },
            CollectedFile {
                path: "src/b.rs".into(),
                content: "fn b() {}".into(),
            },
        ];
        Collection {
            stats: Stats::aggregate(&files),
            files,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn text_output_keeps_collection_order() {
        let c = collection();
        let digest = Digest::new(&c, "demo", "/tmp/demo", None);
        let text = render_text(&digest);
        let a = text.find("File: a.ts").unwrap();
        let b = text.find("File: src/b.rs").unwrap();
        assert!(a < b);
        assert!(text.starts_with("Project: demo\n"));
        assert!(text.contains("Files: 2 | Lines: 3"));
        assert!(text.contains("fn b() {}\n"));
        assert!(!text.contains("Generated:"));
    }

    #[test]
    fn text_header_lists_timestamp_and_totals() {
        let c = collection();
        let ts = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let text = render_text(&Digest::new(&c, "demo", "/tmp/demo", Some(ts)));
        let header: Vec<&str> = text.lines().take(4).collect();
        assert_eq!(
            header,
            vec![
                "Project: demo",
                "Root: /tmp/demo",
                "Generated: 2024-05-01T12:00:00+00:00",
                "Files: 2 | Lines: 3",
            ]
        );
        assert!(text.contains(&format!("{}\nFile: a.ts\n{}\n", SEPARATOR, SEPARATOR)));
    }

    #[test]
    fn json_output_carries_files_and_stats() {
        let c = collection();
        let digest = Digest::new(&c, "demo", "/tmp/demo", None);
        let json = render_digest(&digest, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["projectName"], "demo");
        assert_eq!(value["stats"]["totalFiles"], 2);
        assert_eq!(value["files"][1]["path"], "src/b.rs");
        assert_eq!(value["stats"]["extensions"][0]["extension"], ".rs");
        assert!(value.get("generatedAt").is_none());
    }

    #[test]
    fn yaml_output_lists_paths() {
        let c = collection();
        let digest = Digest::new(&c, "demo", "/tmp/demo", None);
        let yaml = render_digest(&digest, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("path: a.ts"));
        assert!(yaml.contains("totalLines: 3"));
    }

    #[cfg(feature = "xml")]
    #[test]
    fn xml_output_escapes_content() {
        let files = vec![CollectedFile {
            path: "x.html".into(),
            content: "<b>&</b>".into(),
        }];
        let c = Collection {
            stats: Stats::aggregate(&files),
            files,
            skipped: Vec::new(),
        };
        let digest = Digest::new(&c, "demo", "/tmp/demo", None);
        let xml = render_digest(&digest, OutputFormat::Xml).unwrap();
        assert!(xml.starts_with("<digest>"));
        assert!(xml.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    }
}
