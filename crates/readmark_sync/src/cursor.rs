//! Persisted sync cursor and the "have" exclusion protocol.
//!
//! The cursor remembers a fingerprint per known bookmark. Before every
//! list call it serializes into the server's `have` parameter; after
//! every page it folds in upserts and deletions. The entry tokenization
//! (`id`, `id:hash`, `id:hash:progress:progress_timestamp`, comma-joined,
//! sorted by id string order) is a wire contract with the server and
//! must be preserved exactly.

use crate::error::{SyncError, SyncResult};
use readmark_api::{Bookmark, IntValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What the client knows about one bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Server content hash.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
    /// Reading progress.
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub progress: f64,
    /// Unix time of the last progress update.
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub progress_timestamp: i64,
}

/// Fingerprints keyed by bookmark id.
///
/// A `BTreeMap` keeps ids in string order, which is exactly the order
/// the "have" serialization requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Known bookmarks.
    #[serde(default)]
    pub have: BTreeMap<String, Fingerprint>,
}

impl SyncCursor {
    /// Creates an empty cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a cursor from `path`. A missing or empty file yields an
    /// empty cursor; a present but unparseable file is an error.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(err) => return Err(err.into()),
        };
        if bytes.is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| SyncError::CursorParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes the cursor to `path` atomically: temp file, then rename,
    /// with a remove-then-rename fallback for filesystems that refuse
    /// to replace an existing file.
    pub fn save(&self, path: &Path) -> SyncResult<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let mut bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        bytes.push(b'\n');

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        if fs::rename(&tmp, path).is_err() {
            let _ = fs::remove_file(path);
            if let Err(err) = fs::rename(&tmp, path) {
                let _ = fs::remove_file(&tmp);
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Serializes the exclusion string sent as the `have` parameter.
    /// Empty cursor serializes to the empty string.
    pub fn have_string(&self) -> String {
        let parts: Vec<String> = self
            .have
            .iter()
            .map(|(id, entry)| format_have_entry(id, entry))
            .collect();
        parts.join(",")
    }

    /// Folds a caller-supplied exclusion string into this cursor,
    /// composing an explicit override with persisted state. Malformed
    /// progress fields are ignored; empty ids are skipped.
    pub fn merge_have_string(&mut self, have: &str) {
        for part in have.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let fields: Vec<&str> = part.split(':').collect();
            let id = fields[0].trim();
            if id.is_empty() {
                continue;
            }
            let mut entry = Fingerprint::default();
            if fields.len() > 1 {
                entry.hash = fields[1].to_string();
            }
            if fields.len() > 3 {
                if let Ok(progress) = fields[2].parse::<f64>() {
                    entry.progress = progress;
                }
                if let Ok(ts) = fields[3].parse::<i64>() {
                    entry.progress_timestamp = ts;
                }
            }
            self.have.insert(id.to_string(), entry);
        }
    }

    /// Folds one page into the cursor: every returned bookmark upserts
    /// its fingerprint, every id in the delete list is removed.
    ///
    /// Callers must apply this even when discarding page content; the
    /// cursor is the only state a streaming walk retains.
    pub fn apply_page(&mut self, bookmarks: &[Bookmark], delete_ids: &[IntValue]) {
        for bookmark in bookmarks {
            let id = bookmark.bookmark_id.0.to_string();
            self.have.insert(
                id,
                Fingerprint {
                    hash: bookmark.hash.clone(),
                    progress: bookmark.progress.0,
                    progress_timestamp: bookmark.progress_timestamp.0,
                },
            );
        }
        for id in delete_ids {
            self.have.remove(&id.0.to_string());
        }
    }

    /// Number of known bookmarks.
    pub fn len(&self) -> usize {
        self.have.len()
    }

    /// True when no bookmarks are known.
    pub fn is_empty(&self) -> bool {
        self.have.is_empty()
    }
}

fn format_have_entry(id: &str, entry: &Fingerprint) -> String {
    if entry.hash.is_empty() {
        return id.to_string();
    }
    if entry.progress_timestamp > 0 {
        return format!(
            "{}:{}:{}:{}",
            id, entry.hash, entry.progress, entry.progress_timestamp
        );
    }
    format!("{}:{}", id, entry.hash)
}

/// Picks the cursor file inside `dir` for a folder/tag scope:
/// `unread.json` by default, `tag-<name>.json` or `folder-<id>.json`
/// otherwise, with the name sanitized for the filesystem.
pub fn resolve_cursor_path(dir: &Path, folder_id: &str, tag: &str) -> PathBuf {
    let name = if !tag.is_empty() {
        format!("tag-{tag}")
    } else if !folder_id.is_empty() {
        format!("folder-{folder_id}")
    } else {
        "unread".to_string()
    };
    dir.join(format!("{}.json", sanitize_filename(&name)))
}

fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return "cursor".to_string();
    }
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}
