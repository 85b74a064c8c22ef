//! Integration tests: a full incremental walk against an in-memory
//! server, across two runs sharing one cursor file.

use readmark_api::{ApiResult, Client, HttpBackend, HttpResponse, Token};
use readmark_sync::{
    filter_by_bounds, filter_by_select, list_bookmarks, parse_bound, parse_select_expr,
    ListParams, SyncCursor,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-memory bookmark store answering list calls the way the service
/// does: items not covered by the client's `have` string come back,
/// already-known ids are suppressed, and ids deleted server-side are
/// reported once in a delete record.
struct InMemoryServer {
    bookmarks: Mutex<BTreeMap<i64, (String, bool, String)>>, // id -> (hash, starred, tag)
    deleted: Mutex<Vec<i64>>,
    page_size: usize,
}

impl InMemoryServer {
    fn new(page_size: usize) -> Self {
        Self {
            bookmarks: Mutex::new(BTreeMap::new()),
            deleted: Mutex::new(Vec::new()),
            page_size,
        }
    }

    fn insert(&self, id: i64, hash: &str, starred: bool, tag: &str) {
        self.bookmarks
            .lock()
            .unwrap()
            .insert(id, (hash.to_string(), starred, tag.to_string()));
    }

    fn delete(&self, id: i64) {
        self.bookmarks.lock().unwrap().remove(&id);
        self.deleted.lock().unwrap().push(id);
    }
}

fn decode_have(body: &str) -> Vec<(i64, String)> {
    let raw = body
        .split('&')
        .find_map(|p| p.strip_prefix("have="))
        .unwrap_or("");
    let decoded = raw.replace("%3A", ":").replace("%2C", ",");
    decoded
        .split(',')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let mut fields = p.split(':');
            let id = fields.next().unwrap_or("").parse::<i64>().unwrap_or(0);
            let hash = fields.next().unwrap_or("").to_string();
            (id, hash)
        })
        .collect()
}

impl HttpBackend for InMemoryServer {
    fn post(
        &self,
        _url: &str,
        _headers: &[(String, String)],
        body: &str,
    ) -> ApiResult<HttpResponse> {
        let have: BTreeMap<i64, String> = decode_have(body).into_iter().collect();
        let bookmarks = self.bookmarks.lock().unwrap();

        let mut items: Vec<String> = bookmarks
            .iter()
            .filter(|(id, (hash, _, _))| have.get(id) != Some(hash))
            .take(self.page_size)
            .map(|(id, (hash, starred, tag))| {
                format!(
                    r#"{{"type":"bookmark","bookmark_id":{id},"hash":"{hash}","starred":{},"time":{},"tags":[{{"name":"{tag}"}}]}}"#,
                    if *starred { 1 } else { 0 },
                    100 * id,
                )
            })
            .collect();

        let deleted: Vec<i64> = self
            .deleted
            .lock()
            .unwrap()
            .iter()
            .copied()
            .filter(|id| have.contains_key(id))
            .collect();
        if !deleted.is_empty() {
            let ids: Vec<String> = deleted.iter().map(|d| d.to_string()).collect();
            items.push(format!(
                r#"{{"type":"delete","delete_ids":[{}]}}"#,
                ids.join(",")
            ));
        }

        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: format!("[{}]", items.join(",")).into_bytes(),
        })
    }
}

fn client(server: InMemoryServer) -> Client<InMemoryServer> {
    Client::with_backend(
        "https://api.example.com",
        "ck",
        "cs",
        Some(Token::new("tok", "sec")),
        server,
    )
}

#[test]
fn two_runs_converge_through_the_cursor_file() {
    let dir = tempfile::tempdir().unwrap();
    let cursor_path = dir.path().join("unread.json");

    // First run: three bookmarks, small pages, everything arrives.
    let server = InMemoryServer::new(2);
    server.insert(1, "a1", true, "news");
    server.insert(2, "b1", false, "tech");
    server.insert(3, "c1", true, "newsletters");
    let c = client(server);

    let params = ListParams {
        cursor_path: Some(cursor_path.clone()),
        ..Default::default()
    };
    let first = list_bookmarks(&c, &params, None).unwrap();
    assert_eq!(first.bookmarks.len(), 3);

    let saved = SyncCursor::load(&cursor_path).unwrap();
    assert_eq!(saved.len(), 3);

    // Second run: one bookmark re-hashed, one deleted server-side.
    let server = InMemoryServer::new(2);
    server.insert(1, "a2", true, "news");
    server.insert(3, "c1", true, "newsletters");
    server.delete(2);
    let c = client(server);

    let second = list_bookmarks(&c, &params, None).unwrap();
    // Only the changed bookmark comes back; the unchanged one is excluded.
    assert_eq!(second.bookmarks.len(), 1);
    assert_eq!(second.bookmarks[0].bookmark_id.0, 1);
    assert_eq!(second.delete_ids.len(), 1);

    let saved = SyncCursor::load(&cursor_path).unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved.have_string().contains("1:a2"));
    assert!(!saved.have_string().contains("2:"));
}

#[test]
fn walk_then_filter_pipeline() {
    let server = InMemoryServer::new(10);
    server.insert(1, "a", true, "world news");
    server.insert(2, "b", true, "sports");
    server.insert(3, "c", false, "news digest");
    let c = client(server);

    let response = list_bookmarks(&c, &ListParams::default(), None).unwrap();
    assert_eq!(response.bookmarks.len(), 3);

    // time = 100 * id; keep ids 2..3, then starred AND tag~news.
    let since = parse_bound("time:150", "bookmark_id").unwrap();
    let bounded = filter_by_bounds(response.bookmarks, since.as_ref(), None);
    assert_eq!(bounded.len(), 2);

    let filters = parse_select_expr("starred=1,tag~news").unwrap();
    let kept = filter_by_select(bounded, &filters);
    assert!(kept.is_empty());

    // Starred bookmark 1 carries the news tag but is bounded out; widen
    // the bound and it survives the select.
    let server = InMemoryServer::new(10);
    server.insert(1, "a", true, "world news");
    server.insert(2, "b", true, "sports");
    server.insert(3, "c", false, "news digest");
    let c = client(server);
    let response = list_bookmarks(&c, &ListParams::default(), None).unwrap();
    let filters = parse_select_expr("starred=1,tag~news").unwrap();
    let kept = filter_by_select(response.bookmarks, &filters);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].bookmark_id.0, 1);
}
