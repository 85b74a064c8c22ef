//! Select-expression filtering.
//!
//! A select expression is comma-separated `field<op>value` clauses,
//! AND-combined. Operators are `=`, `!=`, and `~` (case-insensitive
//! substring). Fields and their legal operators are fixed; parsing
//! fails on the first invalid clause so no partial filter set is ever
//! applied.

use crate::error::{SyncError, SyncResult};
use readmark_api::{Bookmark, Tag};

/// Comparison operator in a select clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOp {
    /// Case-insensitive equality.
    Eq,
    /// Case-insensitive inequality.
    Ne,
    /// Case-insensitive substring match.
    Contains,
}

impl SelectOp {
    /// The operator as written in expressions.
    pub fn symbol(&self) -> &'static str {
        match self {
            SelectOp::Eq => "=",
            SelectOp::Ne => "!=",
            SelectOp::Contains => "~",
        }
    }
}

/// Field a select clause inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectField {
    /// Bookmark id; `=`/`!=` with an integer value.
    BookmarkId,
    /// Creation time; `=`/`!=` with an integer value.
    Time,
    /// Progress timestamp; `=`/`!=` with an integer value.
    ProgressTimestamp,
    /// Reading progress; `=`/`!=` with a float value.
    Progress,
    /// Starred flag; `=`/`!=` with a boolean value.
    Starred,
    /// Title; all operators.
    Title,
    /// URL; all operators.
    Url,
    /// Description; all operators.
    Description,
    /// Tags (multi-valued); `=`/`~` match any tag, `!=` requires none.
    Tags,
}

/// One parsed select clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectFilter {
    /// Inspected field.
    pub field: SelectField,
    /// Operator.
    pub op: SelectOp,
    /// Raw comparison value (validated at parse time).
    pub value: String,
}

/// Parses a full select expression; blank input yields no filters.
pub fn parse_select_expr(expr: &str) -> SyncResult<Vec<SelectFilter>> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Ok(Vec::new());
    }
    let mut filters = Vec::new();
    for clause in expr.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        filters.push(parse_clause(clause)?);
    }
    Ok(filters)
}

fn parse_clause(clause: &str) -> SyncResult<SelectFilter> {
    let (op_str, op) = if clause.contains("!=") {
        ("!=", SelectOp::Ne)
    } else if clause.contains('~') {
        ("~", SelectOp::Contains)
    } else if clause.contains('=') {
        ("=", SelectOp::Eq)
    } else {
        return Err(SyncError::InvalidSelect(clause.to_string()));
    };
    let (field_str, value) = clause
        .split_once(op_str)
        .ok_or_else(|| SyncError::InvalidSelect(clause.to_string()))?;
    let field_str = field_str.trim().to_ascii_lowercase();
    let value = value.trim().to_string();
    if field_str.is_empty() || value.is_empty() {
        return Err(SyncError::InvalidSelect(clause.to_string()));
    }
    let field = normalize_field(&field_str)
        .ok_or_else(|| SyncError::InvalidSelect(format!("unknown field: {field_str}")))?;
    let filter = SelectFilter { field, op, value };
    validate(&filter)?;
    Ok(filter)
}

fn normalize_field(field: &str) -> Option<SelectField> {
    match field {
        "id" | "bookmark" | "bookmarkid" | "bookmark_id" => Some(SelectField::BookmarkId),
        "time" => Some(SelectField::Time),
        "progress_ts" | "progress_timestamp" => Some(SelectField::ProgressTimestamp),
        "progress" => Some(SelectField::Progress),
        "star" | "starred" => Some(SelectField::Starred),
        "title" => Some(SelectField::Title),
        "url" => Some(SelectField::Url),
        "description" => Some(SelectField::Description),
        "tag" | "tags" => Some(SelectField::Tags),
        _ => None,
    }
}

fn validate(filter: &SelectFilter) -> SyncResult<()> {
    let eq_only = matches!(filter.op, SelectOp::Eq | SelectOp::Ne);
    match filter.field {
        SelectField::BookmarkId | SelectField::Time | SelectField::ProgressTimestamp => {
            if !eq_only {
                return Err(SyncError::InvalidSelect(format!(
                    "unsupported operator for numeric field: {}",
                    filter.op.symbol()
                )));
            }
            filter
                .value
                .parse::<i64>()
                .map_err(|_| {
                    SyncError::InvalidSelect(format!("invalid numeric value: {}", filter.value))
                })
                .map(|_| ())
        }
        SelectField::Progress => {
            if !eq_only {
                return Err(SyncError::InvalidSelect(format!(
                    "unsupported operator for progress: {}",
                    filter.op.symbol()
                )));
            }
            filter
                .value
                .parse::<f64>()
                .map_err(|_| {
                    SyncError::InvalidSelect(format!("invalid numeric value: {}", filter.value))
                })
                .map(|_| ())
        }
        SelectField::Starred => {
            if !eq_only {
                return Err(SyncError::InvalidSelect(format!(
                    "unsupported operator for starred: {}",
                    filter.op.symbol()
                )));
            }
            parse_bool(&filter.value)
                .ok_or_else(|| {
                    SyncError::InvalidSelect(format!("invalid boolean value: {}", filter.value))
                })
                .map(|_| ())
        }
        SelectField::Title | SelectField::Url | SelectField::Description | SelectField::Tags => {
            Ok(())
        }
    }
}

/// Keeps bookmarks matching every filter. No filters keeps everything.
pub fn filter_by_select(bookmarks: Vec<Bookmark>, filters: &[SelectFilter]) -> Vec<Bookmark> {
    if filters.is_empty() {
        return bookmarks;
    }
    bookmarks
        .into_iter()
        .filter(|b| matches_all(b, filters))
        .collect()
}

/// True when the bookmark satisfies every filter.
pub fn matches_all(bookmark: &Bookmark, filters: &[SelectFilter]) -> bool {
    filters.iter().all(|f| matches_one(bookmark, f))
}

fn matches_one(bookmark: &Bookmark, filter: &SelectFilter) -> bool {
    match filter.field {
        SelectField::BookmarkId => match_i64(bookmark.bookmark_id.0, filter),
        SelectField::Time => match_i64(bookmark.time.0, filter),
        SelectField::ProgressTimestamp => match_i64(bookmark.progress_timestamp.0, filter),
        SelectField::Progress => match_f64(bookmark.progress.0, filter),
        SelectField::Starred => match_bool(bookmark.starred.0, filter),
        SelectField::Title => match_str(&bookmark.title, filter),
        SelectField::Url => match_str(&bookmark.url, filter),
        SelectField::Description => match_str(&bookmark.description, filter),
        SelectField::Tags => match_tags(&bookmark.tags, filter),
    }
}

fn match_i64(value: i64, filter: &SelectFilter) -> bool {
    match (filter.value.parse::<i64>(), filter.op) {
        (Ok(v), SelectOp::Eq) => value == v,
        (Ok(v), SelectOp::Ne) => value != v,
        _ => false,
    }
}

fn match_f64(value: f64, filter: &SelectFilter) -> bool {
    match (filter.value.parse::<f64>(), filter.op) {
        (Ok(v), SelectOp::Eq) => value == v,
        (Ok(v), SelectOp::Ne) => value != v,
        _ => false,
    }
}

fn match_bool(value: bool, filter: &SelectFilter) -> bool {
    match (parse_bool(&filter.value), filter.op) {
        (Some(v), SelectOp::Eq) => value == v,
        (Some(v), SelectOp::Ne) => value != v,
        _ => false,
    }
}

fn match_str(value: &str, filter: &SelectFilter) -> bool {
    match filter.op {
        SelectOp::Eq => value.eq_ignore_ascii_case(&filter.value),
        SelectOp::Ne => !value.eq_ignore_ascii_case(&filter.value),
        SelectOp::Contains => value
            .to_lowercase()
            .contains(&filter.value.to_lowercase()),
    }
}

/// `=` and `~` match if any tag matches; `!=` only if no tag does.
fn match_tags(tags: &[Tag], filter: &SelectFilter) -> bool {
    for tag in tags {
        match filter.op {
            SelectOp::Eq => {
                if tag.name.eq_ignore_ascii_case(&filter.value) {
                    return true;
                }
            }
            SelectOp::Ne => {
                if tag.name.eq_ignore_ascii_case(&filter.value) {
                    return false;
                }
            }
            SelectOp::Contains => {
                if tag
                    .name
                    .to_lowercase()
                    .contains(&filter.value.to_lowercase())
                {
                    return true;
                }
            }
        }
    }
    filter.op == SelectOp::Ne
}

/// Accepted boolean spellings for select values.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmark_api::{BoolValue, IntValue};

    fn tagged(id: i64, starred: bool, tags: &[&str]) -> Bookmark {
        Bookmark {
            bookmark_id: IntValue(id),
            starred: BoolValue(starred),
            tags: tags
                .iter()
                .map(|name| Tag {
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn starred_and_tag_contains_combine_with_and() {
        let items = vec![
            tagged(1, true, &["World News", "politics"]),
            tagged(2, true, &["sports"]),
            tagged(3, false, &["newsletters"]),
        ];
        let filters = parse_select_expr("starred=1,tag~news").unwrap();
        let kept = filter_by_select(items, &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bookmark_id.0, 1);
    }

    #[test]
    fn tag_not_equal_requires_no_match() {
        let items = vec![
            tagged(1, false, &["news", "tech"]),
            tagged(2, false, &["tech"]),
            tagged(3, false, &[]),
        ];
        let filters = parse_select_expr("tag!=news").unwrap();
        let kept = filter_by_select(items, &filters);
        assert_eq!(
            kept.iter().map(|b| b.bookmark_id.0).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn string_match_is_case_insensitive() {
        let mut b = tagged(1, false, &[]);
        b.title = "The Daily Readmark".into();
        let filters = parse_select_expr("title~DAILY").unwrap();
        assert!(matches_all(&b, &filters));
        let filters = parse_select_expr("title=the daily readmark").unwrap();
        assert!(matches_all(&b, &filters));
    }

    #[test]
    fn numeric_and_bool_fields_reject_contains() {
        assert!(parse_select_expr("bookmark_id~5").is_err());
        assert!(parse_select_expr("starred~1").is_err());
        assert!(parse_select_expr("progress~0.5").is_err());
        assert!(parse_select_expr("time~100").is_err());
    }

    #[test]
    fn invalid_values_fail_eagerly() {
        assert!(parse_select_expr("bookmark_id=abc").is_err());
        assert!(parse_select_expr("progress=high").is_err());
        assert!(parse_select_expr("starred=maybe").is_err());
        assert!(parse_select_expr("unknown=1").is_err());
        assert!(parse_select_expr("title=").is_err());
        assert!(parse_select_expr("justtext").is_err());
    }

    #[test]
    fn one_bad_clause_fails_the_whole_expression() {
        assert!(parse_select_expr("starred=1,bogus").is_err());
    }

    #[test]
    fn progress_and_id_equality() {
        let mut b = tagged(7, false, &[]);
        b.progress = 0.5.into();
        let filters = parse_select_expr("bookmark_id=7,progress=0.5").unwrap();
        assert!(matches_all(&b, &filters));
        let filters = parse_select_expr("bookmark_id!=7").unwrap();
        assert!(!matches_all(&b, &filters));
    }

    #[test]
    fn blank_expression_keeps_everything() {
        let items = vec![tagged(1, false, &[]), tagged(2, true, &[])];
        let filters = parse_select_expr("").unwrap();
        assert!(filters.is_empty());
        assert_eq!(filter_by_select(items, &filters).len(), 2);
    }

    #[test]
    fn boolean_spellings() {
        for v in ["1", "true", "yes", "y", "on", "TRUE"] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["0", "false", "no", "n", "off"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }
}
