//! Since/until bound filtering.
//!
//! A bound is `field:value` with a contextual default field. Values are
//! raw integers (unix seconds or a bookmark id), RFC 3339 timestamps, or
//! bare `YYYY-MM-DD` dates, all normalized to an `i64` before any
//! comparison. Since and until are inclusive on both ends.

use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, NaiveDate};
use readmark_api::Bookmark;

/// Field a bound compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundField {
    /// The bookmark id itself.
    BookmarkId,
    /// Creation time.
    Time,
    /// Last progress update time.
    ProgressTimestamp,
    /// Most-recently-touched: progress timestamp if set, else creation
    /// time.
    Updated,
}

/// One side of a since/until comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    /// Field compared.
    pub field: BoundField,
    /// Normalized comparison value.
    pub value: i64,
}

/// Parses a bound expression, `None` for blank input.
///
/// `default_field` applies when the spec carries no `field:` prefix
/// (callers pass `"bookmark_id"` for id-flavored flags and `"updated"`
/// for time-flavored ones).
pub fn parse_bound(spec: &str, default_field: &str) -> SyncResult<Option<Bound>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(None);
    }
    // Split at the first colon only; RFC 3339 values keep theirs.
    let (raw_field, raw_value) = match spec.split_once(':') {
        Some((field, value)) if !field.trim().is_empty() => {
            (field.trim().to_string(), value.trim().to_string())
        }
        Some((_, value)) => (default_field.trim().to_string(), value.trim().to_string()),
        None => (default_field.trim().to_string(), spec.to_string()),
    };
    if raw_value.is_empty() {
        return Err(SyncError::InvalidBound(spec.to_string()));
    }
    let field = normalize_field(&raw_field)
        .ok_or_else(|| SyncError::UnknownBoundField(raw_field.clone()))?;
    let value = match field {
        BoundField::BookmarkId => raw_value
            .parse::<i64>()
            .map_err(|_| SyncError::InvalidBound(spec.to_string()))?,
        _ => parse_time_value(&raw_value)?,
    };
    Ok(Some(Bound { field, value }))
}

/// Parses a bare time value as an "updated" bound, `None` for blank.
pub fn parse_updated_bound(spec: &str) -> SyncResult<Option<Bound>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(None);
    }
    Ok(Some(Bound {
        field: BoundField::Updated,
        value: parse_time_value(spec)?,
    }))
}

fn normalize_field(field: &str) -> Option<BoundField> {
    match field.to_ascii_lowercase().as_str() {
        "id" | "bookmark" | "bookmarkid" | "bookmark_id" => Some(BoundField::BookmarkId),
        "time" | "created" | "created_at" => Some(BoundField::Time),
        "progress" | "progress_ts" | "progress_timestamp" => Some(BoundField::ProgressTimestamp),
        "updated" | "updated_at" => Some(BoundField::Updated),
        _ => None,
    }
}

/// Normalizes a time value to unix seconds: raw integer, RFC 3339, or
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_time_value(value: &str) -> SyncResult<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SyncError::InvalidTimeValue(value.to_string()));
    }
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.timestamp());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc().timestamp());
        }
    }
    Err(SyncError::InvalidTimeValue(value.to_string()))
}

/// Keeps bookmarks inside the inclusive `[since, until]` window.
pub fn filter_by_bounds(
    bookmarks: Vec<Bookmark>,
    since: Option<&Bound>,
    until: Option<&Bound>,
) -> Vec<Bookmark> {
    if since.is_none() && until.is_none() {
        return bookmarks;
    }
    bookmarks
        .into_iter()
        .filter(|b| within_bounds(b, since, until))
        .collect()
}

fn within_bounds(bookmark: &Bookmark, since: Option<&Bound>, until: Option<&Bound>) -> bool {
    if let Some(since) = since {
        if field_value(bookmark, since.field) < since.value {
            return false;
        }
    }
    if let Some(until) = until {
        if field_value(bookmark, until.field) > until.value {
            return false;
        }
    }
    true
}

fn field_value(bookmark: &Bookmark, field: BoundField) -> i64 {
    match field {
        BoundField::BookmarkId => bookmark.bookmark_id.0,
        BoundField::Time => bookmark.time.0,
        BoundField::ProgressTimestamp => bookmark.progress_timestamp.0,
        BoundField::Updated => updated_value(bookmark),
    }
}

/// Most-recently-touched instant for a bookmark.
pub fn updated_value(bookmark: &Bookmark) -> i64 {
    if bookmark.progress_timestamp.0 > 0 {
        bookmark.progress_timestamp.0
    } else {
        bookmark.time.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmark_api::IntValue;

    fn bookmark_at(id: i64, time: i64, progress_ts: i64) -> Bookmark {
        Bookmark {
            bookmark_id: IntValue(id),
            time: IntValue(time),
            progress_timestamp: IntValue(progress_ts),
            ..Default::default()
        }
    }

    #[test]
    fn since_and_until_are_inclusive() {
        let items = vec![
            bookmark_at(1, 100, 0),
            bookmark_at(2, 200, 0),
            bookmark_at(3, 300, 0),
        ];
        let since = Bound {
            field: BoundField::Time,
            value: 150,
        };
        let kept = filter_by_bounds(items.clone(), Some(&since), None);
        assert_eq!(
            kept.iter().map(|b| b.time.0).collect::<Vec<_>>(),
            vec![200, 300]
        );

        let until = Bound {
            field: BoundField::Time,
            value: 250,
        };
        let kept = filter_by_bounds(items.clone(), Some(&since), Some(&until));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].time.0, 200);

        // Boundary values stay in.
        let exact = Bound {
            field: BoundField::Time,
            value: 200,
        };
        let kept = filter_by_bounds(items, Some(&exact), Some(&exact));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn updated_prefers_progress_timestamp() {
        assert_eq!(updated_value(&bookmark_at(1, 100, 500)), 500);
        assert_eq!(updated_value(&bookmark_at(1, 100, 0)), 100);
    }

    #[test]
    fn parse_bound_with_and_without_field_prefix() {
        let b = parse_bound("42", "bookmark_id").unwrap().unwrap();
        assert_eq!(b.field, BoundField::BookmarkId);
        assert_eq!(b.value, 42);

        let b = parse_bound("time:1700000000", "bookmark_id").unwrap().unwrap();
        assert_eq!(b.field, BoundField::Time);
        assert_eq!(b.value, 1_700_000_000);

        let b = parse_bound("updated:2023-11-14", "bookmark_id").unwrap().unwrap();
        assert_eq!(b.field, BoundField::Updated);
        assert_eq!(b.value, 1_699_920_000);
    }

    #[test]
    fn rfc3339_values_keep_their_colons_after_the_field_prefix() {
        let b = parse_updated_bound("2023-11-14T22:13:20Z").unwrap().unwrap();
        assert_eq!(b.value, 1_700_000_000);

        let b = parse_bound("time:2023-11-14T22:13:20Z", "bookmark_id")
            .unwrap()
            .unwrap();
        assert_eq!(b.value, 1_700_000_000);
    }

    #[test]
    fn blank_specs_parse_to_none() {
        assert_eq!(parse_bound("", "bookmark_id").unwrap(), None);
        assert_eq!(parse_bound("  ", "time").unwrap(), None);
        assert_eq!(parse_updated_bound("").unwrap(), None);
    }

    #[test]
    fn bad_bounds_fail_eagerly() {
        assert!(matches!(
            parse_bound("nonsense:5", "bookmark_id"),
            Err(SyncError::UnknownBoundField(_))
        ));
        assert!(parse_bound("time:", "bookmark_id").is_err());
        assert!(parse_bound("time:soon", "bookmark_id").is_err());
        assert!(parse_bound("abc", "bookmark_id").is_err());
    }

    #[test]
    fn field_aliases_normalize() {
        for alias in ["id", "bookmark", "bookmarkid", "bookmark_id"] {
            assert_eq!(normalize_field(alias), Some(BoundField::BookmarkId));
        }
        for alias in ["time", "created", "created_at"] {
            assert_eq!(normalize_field(alias), Some(BoundField::Time));
        }
        for alias in ["progress", "progress_ts", "progress_timestamp"] {
            assert_eq!(normalize_field(alias), Some(BoundField::ProgressTimestamp));
        }
        for alias in ["updated", "updated_at"] {
            assert_eq!(normalize_field(alias), Some(BoundField::Updated));
        }
        assert_eq!(normalize_field("title"), None);
    }
}
