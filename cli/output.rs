use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use dirdigest_core::{AppError, CollectedFile, OutputFormat, Stats, output_formats};

/// Prints `data` as the requested structured format, or the plain-text
/// rendering when the format is text.
pub fn print_data_or_text<T: Serialize>(
    data: &T,
    plain_text: Option<String>,
    format: OutputFormat,
    root_name: &str,
) -> Result<()> {
    let content = match (format, plain_text) {
        (OutputFormat::Text, Some(text)) => text,
        (OutputFormat::Text, None) | (OutputFormat::Json, _) => {
            output_formats::serialize_to_json(data, true)?
        }
        (OutputFormat::Yaml, _) => output_formats::serialize_to_yaml(data)?,
        (OutputFormat::Xml, _) => output_formats::serialize_to_xml(data, root_name)?,
    };
    write_to_stdout(&content)
}

pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    let write_err = |e: io::Error| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut file = File::create(path).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    Ok(())
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// OSC-8 hyperlink to a local file, shown as its display path.
pub fn file_link(path: &Path) -> String {
    let target = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    format!(
        "\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\",
        target.display(),
        path.display()
    )
}

pub fn human_size(bytes: u64) -> String {
    format!(
        "{:.2}",
        Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary)
    )
}

pub fn print_stats_table(stats: &Stats) {
    println!();
    println!("{}", " Collection Summary ".green().bold().underline());
    println!(
        "{:<20} {}",
        "Total Files:".green(),
        stats.total_files.to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Total Lines:".green(),
        stats.total_lines.to_string().cyan()
    );

    if stats.by_extension.is_empty() {
        println!("\n{}", "(No files collected)".yellow());
        println!();
        return;
    }

    println!("\n{}", " By Extension ".green().bold().underline());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Extension").fg(Color::Green),
        Cell::new("Files").fg(Color::Green),
        Cell::new("Lines").fg(Color::Green),
    ]);
    for (extension, bucket) in &stats.by_extension {
        let label = if extension.is_empty() {
            "(none)"
        } else {
            extension.as_str()
        };
        table.add_row(vec![
            Cell::new(label).fg(Color::Cyan),
            Cell::new(bucket.files).set_alignment(CellAlignment::Right),
            Cell::new(bucket.lines).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    println!();
}

pub fn print_file_list(files: &[CollectedFile]) {
    println!("{}", " Files ".green().bold().underline());
    if files.is_empty() {
        println!("{}", "(None)".dimmed());
        return;
    }
    let width = files.len().to_string().len();
    for (index, file) in files.iter().enumerate() {
        println!(
            "{:>width$}. {} {}",
            index + 1,
            file.path.cyan(),
            format!("({})", human_size(file.content.len() as u64)).dimmed(),
            width = width
        );
    }
}
