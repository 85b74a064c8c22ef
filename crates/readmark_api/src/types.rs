//! Wire types for the Readmark API.
//!
//! The service is loose about scalar encodings: ids arrive as numbers or
//! strings, booleans as `true`/`"1"`/`1`, progress as a number or string.
//! The lenient wrappers here accept all of those and treat `null`/empty
//! as the zero value.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// An `i64` that deserializes from a JSON number, string, or null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IntValue(pub i64);

impl<'de> Deserialize<'de> for IntValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null => Ok(IntValue(0)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(IntValue)
                .ok_or_else(|| D::Error::custom(format!("parse i64 from {n}"))),
            serde_json::Value::String(s) if s.is_empty() => Ok(IntValue(0)),
            serde_json::Value::String(s) => s
                .parse::<i64>()
                .map(IntValue)
                .map_err(|e| D::Error::custom(format!("parse i64 from {s:?}: {e}"))),
            other => Err(D::Error::custom(format!("expected integer, got {other}"))),
        }
    }
}

impl From<i64> for IntValue {
    fn from(v: i64) -> Self {
        IntValue(v)
    }
}

/// An `f64` that deserializes from a JSON number, string, or null.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct FloatValue(pub f64);

impl<'de> Deserialize<'de> for FloatValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null => Ok(FloatValue(0.0)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(FloatValue)
                .ok_or_else(|| D::Error::custom(format!("parse f64 from {n}"))),
            serde_json::Value::String(s) if s.is_empty() => Ok(FloatValue(0.0)),
            serde_json::Value::String(s) => s
                .parse::<f64>()
                .map(FloatValue)
                .map_err(|e| D::Error::custom(format!("parse f64 from {s:?}: {e}"))),
            other => Err(D::Error::custom(format!("expected float, got {other}"))),
        }
    }
}

impl From<f64> for FloatValue {
    fn from(v: f64) -> Self {
        FloatValue(v)
    }
}

/// A `bool` that deserializes from a JSON bool, number (0/1), or string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BoolValue(pub bool);

impl<'de> Deserialize<'de> for BoolValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null => Ok(BoolValue(false)),
            serde_json::Value::Bool(b) => Ok(BoolValue(b)),
            serde_json::Value::String(s) => Ok(BoolValue(s == "1" || s == "true")),
            serde_json::Value::Number(n) => Ok(BoolValue(n.as_i64().unwrap_or(0) != 0)),
            other => Err(D::Error::custom(format!("expected boolean, got {other}"))),
        }
    }
}

impl From<bool> for BoolValue {
    fn from(v: bool) -> Self {
        BoolValue(v)
    }
}

/// The authenticated account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Record type tag (`"user"`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Server-assigned user id.
    #[serde(default)]
    pub user_id: IntValue,
    /// Account name.
    #[serde(default)]
    pub username: String,
}

/// A tag attached to a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Server-assigned tag id, absent on submission.
    #[serde(default, skip_serializing_if = "is_zero_int")]
    pub id: IntValue,
    /// Tag name.
    pub name: String,
}

/// A saved bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Record type tag (`"bookmark"`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Server-assigned bookmark id.
    #[serde(default)]
    pub bookmark_id: IntValue,
    /// Saved URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Server content hash; part of the "have" exclusion entry.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
    /// Reading progress in `0.0..=1.0`.
    #[serde(default)]
    pub progress: FloatValue,
    /// Unix time of the last progress update.
    #[serde(default)]
    pub progress_timestamp: IntValue,
    /// Whether the bookmark is starred.
    #[serde(default)]
    pub starred: BoolValue,
    /// Private source label, set for content-supplied bookmarks.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_source: String,
    /// Unix creation time.
    #[serde(default)]
    pub time: IntValue,
    /// Attached tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// A folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    /// Record type tag (`"folder"`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Server-assigned folder id.
    #[serde(default)]
    pub folder_id: IntValue,
    /// Folder title.
    #[serde(default)]
    pub title: String,
    /// Sort position.
    #[serde(default)]
    pub position: FloatValue,
}

/// A highlight within a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Record type tag (`"highlight"`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Server-assigned highlight id.
    #[serde(default)]
    pub highlight_id: IntValue,
    /// Owning bookmark id.
    #[serde(default)]
    pub bookmark_id: IntValue,
    /// Highlighted text.
    #[serde(default)]
    pub text: String,
    /// Optional note.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    /// Unix creation time.
    #[serde(default)]
    pub time: IntValue,
    /// Character position within the text.
    #[serde(default)]
    pub position: IntValue,
}

/// Canonical result of a list call, normalized from either response
/// shape the service emits: a top-level object with named arrays, or a
/// flat array of `{"type": ...}`-tagged records.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListResponse {
    /// The authenticated account, when echoed back.
    #[serde(default)]
    pub user: User,
    /// Bookmarks in the page.
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    /// Highlights in the page.
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    /// Ids the server reports as deleted relative to the exclusion set.
    #[serde(default)]
    pub delete_ids: Vec<IntValue>,
}

impl ListResponse {
    /// Parses a list response body, accepting both wire shapes.
    pub fn from_body(body: &[u8]) -> Result<Self, String> {
        let trimmed = trim_ascii(body);
        match trimmed.first() {
            Some(b'{') => serde_json::from_slice(trimmed).map_err(|e| e.to_string()),
            Some(b'[') => {
                let items: Vec<serde_json::Value> =
                    serde_json::from_slice(trimmed).map_err(|e| e.to_string())?;
                let mut resp = ListResponse::default();
                for item in items {
                    let kind = item.get("type").and_then(|v| v.as_str()).unwrap_or("");
                    match kind {
                        "user" => {
                            resp.user =
                                serde_json::from_value(item).map_err(|e| e.to_string())?;
                        }
                        "bookmark" => {
                            resp.bookmarks
                                .push(serde_json::from_value(item).map_err(|e| e.to_string())?);
                        }
                        "highlight" => {
                            resp.highlights
                                .push(serde_json::from_value(item).map_err(|e| e.to_string())?);
                        }
                        "delete" => {
                            #[derive(Deserialize)]
                            struct DeleteRecord {
                                #[serde(default)]
                                delete_ids: Vec<IntValue>,
                            }
                            let d: DeleteRecord =
                                serde_json::from_value(item).map_err(|e| e.to_string())?;
                            resp.delete_ids.extend(d.delete_ids);
                        }
                        // Unknown record types (e.g. meta) are skipped for
                        // forward compatibility.
                        _ => {}
                    }
                }
                Ok(resp)
            }
            Some(_) => Err("invalid JSON response".into()),
            None => Err("empty body".into()),
        }
    }
}

pub(crate) fn trim_ascii(body: &[u8]) -> &[u8] {
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let end = body
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|i| i + 1)
        .unwrap_or(start);
    &body[start..end]
}

fn is_zero_int(v: &IntValue) -> bool {
    v.0 == 0
}
