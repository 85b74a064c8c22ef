//! Command implementations.

pub mod add;
pub mod auth;
pub mod bookmarks;
pub mod config_cmd;
pub mod export;
pub mod folders;
pub mod highlights;
pub mod list;

use crate::report::CliError;
use readmark_api::{Client, HttpBackend};

/// Resolves a user-facing folder name to the id the API expects.
///
/// The default folder maps to the empty id; the well-known `starred`
/// and `archive` folders and numeric ids pass through; anything else is
/// matched against folder titles, case-insensitively.
pub fn resolve_folder_id<B: HttpBackend>(
    client: &Client<B>,
    folder: &str,
) -> Result<String, CliError> {
    let folder = folder.trim();
    match folder.to_ascii_lowercase().as_str() {
        "" | "unread" => return Ok(String::new()),
        "starred" | "archive" => return Ok(folder.to_ascii_lowercase()),
        _ => {}
    }
    if folder.chars().all(|c| c.is_ascii_digit()) {
        return Ok(folder.to_string());
    }
    let folders = client.list_folders()?;
    folders
        .iter()
        .find(|f| f.title.eq_ignore_ascii_case(folder))
        .map(|f| f.folder_id.0.to_string())
        .ok_or_else(|| CliError::usage(format!("unknown folder: {folder}")))
}
