//! Paginated list walker.
//!
//! Drives repeated list calls against the server, feeding the evolving
//! "have" exclusion string back in before every request so the server
//! stops resending bookmarks the walk has already seen.

use crate::cursor::SyncCursor;
use crate::error::{SyncError, SyncResult};
use readmark_api::{Bookmark, Client, HttpBackend, ListOptions, ListResponse};
use std::path::PathBuf;

/// Largest page size the server accepts.
pub const MAX_PAGE_SIZE: i64 = 500;
/// Page size used for open-ended walks (`limit == 0`).
pub const FULL_WALK_PAGE_SIZE: i64 = 500;
/// Default safety cap on open-ended walks.
pub const DEFAULT_MAX_PAGES: u32 = 200;

/// Parameters for one list walk.
#[derive(Debug, Clone)]
pub struct ListParams {
    /// Requested count; 0 walks everything in fixed-size pages.
    pub limit: i64,
    /// Folder id scope, empty for the default folder.
    pub folder_id: String,
    /// Tag scope; when set the server ignores the folder.
    pub tag: String,
    /// Explicit exclusion string merged into the cursor before the walk.
    pub have: String,
    /// Comma-separated bookmark ids for highlight fetching.
    pub highlights: String,
    /// Cursor file enabling incremental sync across runs.
    pub cursor_path: Option<PathBuf>,
    /// Safety cap for open-ended walks; must be positive.
    pub max_pages: u32,
    /// Drop page bookmarks instead of accumulating them. The cursor
    /// still updates; streaming callers keep only the callback's view.
    pub discard_bookmarks: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: 0,
            folder_id: String::new(),
            tag: String::new(),
            have: String::new(),
            highlights: String::new(),
            cursor_path: None,
            max_pages: DEFAULT_MAX_PAGES,
            discard_bookmarks: false,
        }
    }
}

/// Called after each fetched page with the page's bookmarks and the
/// 1-based page index. An error aborts the walk.
pub type PageHandler<'a> = &'a mut dyn FnMut(&[Bookmark], u32) -> SyncResult<()>;

/// Walks the list endpoint to exhaustion or the safety cap.
///
/// With `limit == 0` pages of [`FULL_WALK_PAGE_SIZE`] are fetched until
/// the server returns an empty page; a cursor (persisted or implicit)
/// tracks what the walk has seen and its exclusion string is recomputed
/// after every page. With `limit > 0` a single page is fetched.
///
/// The cursor file is written once, after the whole walk has succeeded.
/// A failed walk leaves any previously saved cursor untouched.
pub fn list_bookmarks<B: HttpBackend>(
    client: &Client<B>,
    params: &ListParams,
    mut on_page: Option<PageHandler<'_>>,
) -> SyncResult<ListResponse> {
    if params.limit < 0 || params.limit > MAX_PAGE_SIZE {
        return Err(SyncError::InvalidLimit(params.limit));
    }
    if params.max_pages == 0 {
        return Err(SyncError::InvalidMaxPages);
    }

    let mut cursor: Option<SyncCursor> = match &params.cursor_path {
        Some(path) => Some(SyncCursor::load(path)?),
        None => None,
    };

    let explicit = params.have.trim();
    let mut have = if !explicit.is_empty() {
        let cur = cursor.get_or_insert_with(SyncCursor::new);
        cur.merge_have_string(explicit);
        cur.have_string()
    } else {
        cursor
            .as_ref()
            .map(|c| c.have_string())
            .unwrap_or_default()
    };

    let page_limit = if params.limit == 0 {
        // An open-ended walk always carries a cursor; without one the
        // server would resend the same first page forever.
        cursor.get_or_insert_with(SyncCursor::new);
        FULL_WALK_PAGE_SIZE
    } else {
        params.limit
    };

    let mut result = ListResponse::default();
    let mut pages: u32 = 0;
    loop {
        pages += 1;
        if params.limit == 0 && pages > params.max_pages {
            return Err(SyncError::MaxPagesExceeded {
                pages: params.max_pages,
            });
        }

        let page = client.list_bookmarks(&ListOptions {
            limit: page_limit,
            folder_id: params.folder_id.clone(),
            tag: params.tag.clone(),
            have: have.clone(),
            highlights: params.highlights.clone(),
        })?;

        tracing::debug!(
            page = pages,
            bookmarks = page.bookmarks.len(),
            deletes = page.delete_ids.len(),
            "fetched page"
        );

        result.user = page.user.clone();
        if !params.discard_bookmarks {
            result.bookmarks.extend(page.bookmarks.iter().cloned());
        }
        result.highlights.extend(page.highlights.iter().cloned());
        result.delete_ids.extend(page.delete_ids.iter().cloned());

        if let Some(handler) = on_page.as_deref_mut() {
            handler(&page.bookmarks, pages)?;
        }

        if let Some(cur) = cursor.as_mut() {
            cur.apply_page(&page.bookmarks, &page.delete_ids);
            have = cur.have_string();
        }

        if params.limit > 0 || page.bookmarks.is_empty() {
            break;
        }
    }

    if let (Some(cur), Some(path)) = (cursor.as_ref(), params.cursor_path.as_ref()) {
        cur.save(path)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmark_api::{ApiResult, HttpResponse, Token};
    use std::sync::Mutex;

    /// Backend that serves canned list pages and records the `have`
    /// parameter of every request body.
    struct PagedServer {
        pages: Mutex<Vec<String>>,
        haves: Mutex<Vec<String>>,
    }

    impl PagedServer {
        fn new(pages: Vec<String>) -> Self {
            Self {
                pages: Mutex::new(pages),
                haves: Mutex::new(Vec::new()),
            }
        }

        fn recorded_haves(&self) -> Vec<String> {
            self.haves.lock().unwrap().clone()
        }
    }

    impl HttpBackend for PagedServer {
        fn post(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            body: &str,
        ) -> ApiResult<HttpResponse> {
            let have = body
                .split('&')
                .find_map(|p| p.strip_prefix("have="))
                .unwrap_or("")
                .to_string();
            self.haves.lock().unwrap().push(have);

            let mut pages = self.pages.lock().unwrap();
            let body = if pages.is_empty() {
                r#"{"bookmarks": []}"#.to_string()
            } else {
                pages.remove(0)
            };
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.into_bytes(),
            })
        }
    }

    fn client(pages: Vec<String>) -> Client<PagedServer> {
        Client::with_backend(
            "https://api.example.com",
            "ck",
            "cs",
            Some(Token::new("t", "s")),
            PagedServer::new(pages),
        )
    }

    fn page(bookmarks: &[(i64, &str)], deletes: &[i64]) -> String {
        let items: Vec<String> = bookmarks
            .iter()
            .map(|(id, hash)| {
                format!(r#"{{"type":"bookmark","bookmark_id":{id},"hash":"{hash}"}}"#)
            })
            .chain(if deletes.is_empty() {
                None
            } else {
                let ids: Vec<String> = deletes.iter().map(|d| d.to_string()).collect();
                Some(format!(
                    r#"{{"type":"delete","delete_ids":[{}]}}"#,
                    ids.join(",")
                ))
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn single_page_when_limit_is_positive() {
        let c = client(vec![page(&[(1, "a"), (2, "b")], &[])]);
        let params = ListParams {
            limit: 2,
            ..Default::default()
        };
        let resp = list_bookmarks(&c, &params, None).unwrap();
        assert_eq!(resp.bookmarks.len(), 2);
        assert_eq!(c.backend().recorded_haves().len(), 1);
    }

    #[test]
    fn full_walk_stops_on_empty_page_and_evolves_have() {
        let c = client(vec![
            page(&[(1, "a")], &[]),
            page(&[(2, "b")], &[]),
            page(&[], &[]),
        ]);
        let params = ListParams::default();
        let resp = list_bookmarks(&c, &params, None).unwrap();
        assert_eq!(resp.bookmarks.len(), 2);

        let haves = c.backend().recorded_haves();
        assert_eq!(haves.len(), 3);
        assert_eq!(haves[0], "");
        assert_eq!(haves[1], "1%3Aa");
        assert_eq!(haves[2], "1%3Aa%2C2%3Ab");
    }

    #[test]
    fn max_pages_cap_is_a_distinct_error_after_exactly_that_many_calls() {
        let endless: Vec<String> = (0i64..10).map(|i| page(&[(i, "h")], &[])).collect();
        let c = client(endless);
        let params = ListParams {
            max_pages: 2,
            ..Default::default()
        };
        let err = list_bookmarks(&c, &params, None).unwrap_err();
        assert!(matches!(err, SyncError::MaxPagesExceeded { pages: 2 }));
        assert_eq!(c.backend().recorded_haves().len(), 2);
    }

    #[test]
    fn limit_out_of_range_fails_before_any_call() {
        let c = client(vec![]);
        for limit in [-1, 501] {
            let params = ListParams {
                limit,
                ..Default::default()
            };
            assert!(matches!(
                list_bookmarks(&c, &params, None),
                Err(SyncError::InvalidLimit(_))
            ));
        }
        assert!(c.backend().recorded_haves().is_empty());
    }

    #[test]
    fn zero_max_pages_is_rejected_before_any_call() {
        let c = client(vec![]);
        let params = ListParams {
            max_pages: 0,
            ..Default::default()
        };
        assert!(matches!(
            list_bookmarks(&c, &params, None),
            Err(SyncError::InvalidMaxPages)
        ));
        assert!(c.backend().recorded_haves().is_empty());
    }

    #[test]
    fn cursor_updates_even_when_discarding_pages() {
        let dir = tempfile::tempdir().unwrap();
        let cursor_path = dir.path().join("cursor.json");
        let c = client(vec![page(&[(1, "a"), (2, "b")], &[]), page(&[], &[1])]);
        let params = ListParams {
            cursor_path: Some(cursor_path.clone()),
            discard_bookmarks: true,
            ..Default::default()
        };
        let mut seen = Vec::new();
        let mut handler = |bookmarks: &[Bookmark], page_index: u32| {
            seen.push((page_index, bookmarks.len()));
            Ok(())
        };
        let resp = list_bookmarks(&c, &params, Some(&mut handler)).unwrap();

        assert!(resp.bookmarks.is_empty());
        assert_eq!(seen, vec![(1, 2), (2, 0)]);
        // Deletion from the second page landed in the persisted cursor.
        let saved = SyncCursor::load(&cursor_path).unwrap();
        assert_eq!(saved.have_string(), "2:b");
    }

    #[test]
    fn explicit_have_merges_with_persisted_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let cursor_path = dir.path().join("cursor.json");
        let mut persisted = SyncCursor::new();
        persisted.merge_have_string("1:a");
        persisted.save(&cursor_path).unwrap();

        let c = client(vec![page(&[], &[])]);
        let params = ListParams {
            cursor_path: Some(cursor_path),
            have: "2:b".into(),
            ..Default::default()
        };
        list_bookmarks(&c, &params, None).unwrap();

        let haves = c.backend().recorded_haves();
        assert_eq!(haves[0], "1%3Aa%2C2%3Ab");
    }

    #[test]
    fn failed_walk_leaves_previous_cursor_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cursor_path = dir.path().join("cursor.json");
        let mut persisted = SyncCursor::new();
        persisted.merge_have_string("1:a");
        persisted.save(&cursor_path).unwrap();

        // First page succeeds, second walks past the cap.
        let endless: Vec<String> = (10i64..20).map(|i| page(&[(i, "h")], &[])).collect();
        let c = client(endless);
        let params = ListParams {
            cursor_path: Some(cursor_path.clone()),
            max_pages: 2,
            ..Default::default()
        };
        assert!(list_bookmarks(&c, &params, None).is_err());

        let saved = SyncCursor::load(&cursor_path).unwrap();
        assert_eq!(saved.have_string(), "1:a");
    }

    #[test]
    fn page_handler_error_aborts_walk() {
        let c = client(vec![page(&[(1, "a")], &[]), page(&[(2, "b")], &[])]);
        let params = ListParams::default();
        let mut handler = |_: &[Bookmark], _: u32| {
            Err(SyncError::InvalidBound("handler refused".into()))
        };
        let err = list_bookmarks(&c, &params, Some(&mut handler)).unwrap_err();
        assert!(matches!(err, SyncError::InvalidBound(_)));
        assert_eq!(c.backend().recorded_haves().len(), 1);
    }
}
