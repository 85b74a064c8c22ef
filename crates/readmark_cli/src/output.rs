//! Output rendering for command results.
//!
//! Commands hand in-memory slices to this module; it renders tables,
//! tab-separated plain lines, pretty JSON, or NDJSON. The core stays
//! format-agnostic.

use crate::report::CliError;
use comfy_table::{presets, Table};
use readmark_api::{Bookmark, Folder, Highlight, User};
use serde::Serialize;
use std::io::Write;

/// Output format selected by `--format` or the config default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Aligned table for humans.
    Table,
    /// Tab-separated lines for shell pipelines.
    Plain,
    /// One pretty-printed JSON document.
    Json,
    /// One JSON object per line.
    #[value(alias = "jsonl")]
    Ndjson,
}

/// Parses a format name from config values.
pub fn parse_format(name: &str) -> Result<Format, CliError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "table" => Ok(Format::Table),
        "plain" => Ok(Format::Plain),
        "json" => Ok(Format::Json),
        "ndjson" | "jsonl" => Ok(Format::Ndjson),
        other => Err(CliError::usage(format!(
            "invalid format {other:?} (expected table, plain, json, or ndjson)"
        ))),
    }
}

/// Writes one pretty-printed JSON document.
pub fn write_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> Result<(), CliError> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| CliError::Config(e.to_string()))?;
    writeln!(w, "{text}")?;
    Ok(())
}

/// Writes one value as a single NDJSON line.
pub fn write_json_line<W: Write, T: Serialize>(w: &mut W, value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string(value).map_err(|e| CliError::Config(e.to_string()))?;
    writeln!(w, "{text}")?;
    Ok(())
}

/// Renders bookmarks in the chosen format.
pub fn print_bookmarks<W: Write>(
    w: &mut W,
    format: Format,
    bookmarks: &[Bookmark],
) -> Result<(), CliError> {
    match format {
        Format::Json => write_json(w, &bookmarks),
        Format::Ndjson => {
            for bookmark in bookmarks {
                write_json_line(w, bookmark)?;
            }
            Ok(())
        }
        Format::Plain => {
            for b in bookmarks {
                writeln!(
                    w,
                    "{}\t{}\t{:.4}\t{}\t{}",
                    b.bookmark_id.0,
                    if b.starred.0 { "1" } else { "0" },
                    b.progress.0,
                    one_line(&b.title),
                    one_line(&b.url),
                )?;
            }
            Ok(())
        }
        Format::Table => {
            let mut table = Table::new();
            table.load_preset(presets::NOTHING);
            table.set_header(["ID", "STAR", "PROG", "TITLE", "URL"]);
            for b in bookmarks {
                table.add_row([
                    b.bookmark_id.0.to_string(),
                    if b.starred.0 { "*" } else { "" }.to_string(),
                    format!("{:.2}", b.progress.0),
                    truncate_one_line(&b.title, 60),
                    truncate_one_line(&b.url, 60),
                ]);
            }
            writeln!(w, "{table}")?;
            Ok(())
        }
    }
}

/// Renders folders in the chosen format.
pub fn print_folders<W: Write>(
    w: &mut W,
    format: Format,
    folders: &[Folder],
) -> Result<(), CliError> {
    match format {
        Format::Json => write_json(w, &folders),
        Format::Ndjson => {
            for folder in folders {
                write_json_line(w, folder)?;
            }
            Ok(())
        }
        Format::Plain => {
            for f in folders {
                writeln!(
                    w,
                    "{}\t{}\t{}",
                    f.folder_id.0,
                    f.position.0 as i64,
                    one_line(&f.title)
                )?;
            }
            Ok(())
        }
        Format::Table => {
            let mut table = Table::new();
            table.load_preset(presets::NOTHING);
            table.set_header(["ID", "POSITION", "TITLE"]);
            for f in folders {
                table.add_row([
                    f.folder_id.0.to_string(),
                    (f.position.0 as i64).to_string(),
                    truncate_one_line(&f.title, 80),
                ]);
            }
            writeln!(w, "{table}")?;
            Ok(())
        }
    }
}

/// Renders highlights in the chosen format.
pub fn print_highlights<W: Write>(
    w: &mut W,
    format: Format,
    highlights: &[Highlight],
) -> Result<(), CliError> {
    match format {
        Format::Json => write_json(w, &highlights),
        Format::Ndjson => {
            for highlight in highlights {
                write_json_line(w, highlight)?;
            }
            Ok(())
        }
        Format::Plain => {
            for h in highlights {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    h.highlight_id.0,
                    h.bookmark_id.0,
                    h.position.0,
                    one_line(&h.text)
                )?;
            }
            Ok(())
        }
        Format::Table => {
            let mut table = Table::new();
            table.load_preset(presets::NOTHING);
            table.set_header(["ID", "BOOKMARK", "POSITION", "TEXT"]);
            for h in highlights {
                table.add_row([
                    h.highlight_id.0.to_string(),
                    h.bookmark_id.0.to_string(),
                    h.position.0.to_string(),
                    truncate_one_line(&h.text, 80),
                ]);
            }
            writeln!(w, "{table}")?;
            Ok(())
        }
    }
}

/// Renders the authenticated account.
pub fn print_user<W: Write>(w: &mut W, format: Format, user: &User) -> Result<(), CliError> {
    match format {
        Format::Json => write_json(w, user),
        Format::Ndjson => write_json_line(w, user),
        _ => {
            writeln!(w, "{}\t{}", user.user_id.0, user.username)?;
            Ok(())
        }
    }
}

fn one_line(s: &str) -> String {
    s.replace('\n', " ").trim().to_string()
}

fn truncate_one_line(s: &str, max: usize) -> String {
    let s = one_line(s);
    if s.chars().count() <= max {
        return s;
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}...")
}
