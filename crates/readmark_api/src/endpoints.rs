//! Remote endpoints.
//!
//! Every call posts a signed form and decodes the service's JSON array
//! responses. Paths and error codes are a wire contract with the remote
//! service and must not drift.

use crate::client::{decode_array, ensure_ok, parse_query, Client};
use crate::error::{ApiError, ApiResult, CODE_PRIVATE_REQUIRES_CONTENT};
use crate::http::HttpBackend;
use crate::types::{Bookmark, Folder, Highlight, ListResponse, User};
use readmark_oauth::Token;

const ACCEPT_JSON: &str = "application/json";

/// Options for one list call.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Page size; 0 lets the server pick its default.
    pub limit: i64,
    /// Folder id or well-known folder name; empty for the default folder.
    pub folder_id: String,
    /// Tag name; when set the server ignores the folder.
    pub tag: String,
    /// "have" exclusion string (see the sync crate).
    pub have: String,
    /// Comma-separated bookmark ids to fetch highlights for.
    pub highlights: String,
}

/// Fields for adding a bookmark.
#[derive(Debug, Clone, Default)]
pub struct AddBookmarkRequest {
    /// URL to save; ignored when `private_source` is set.
    pub url: String,
    /// Optional title override.
    pub title: String,
    /// Optional description.
    pub description: String,
    /// Optional destination folder id.
    pub folder_id: String,
    /// Ask the server to resolve redirects before saving.
    pub resolve_final_url: bool,
    /// Save directly to the archive.
    pub archived: bool,
    /// Tag names to attach.
    pub tags: Vec<String>,
    /// Full content; required when `private_source` is set.
    pub content: String,
    /// Private source label (`is_private_from_source`).
    pub private_source: String,
}

impl<B: HttpBackend> Client<B> {
    /// Exchanges username/password for an access token via xAuth.
    ///
    /// The password is sent once and never stored; callers persist only
    /// the returned token and secret.
    pub fn xauth_access_token(&self, username: &str, password: &str) -> ApiResult<Token> {
        let form = vec![
            ("x_auth_username".to_string(), username.to_string()),
            ("x_auth_password".to_string(), password.to_string()),
            ("x_auth_mode".to_string(), "client_auth".to_string()),
        ];
        // This endpoint answers with querystring-formatted text, not JSON.
        let response = self.post_form("/api/1/oauth/access_token", &form, "text/plain")?;
        ensure_ok(&response)?;

        let body = String::from_utf8_lossy(&response.body);
        let pairs = parse_query(&body)?;
        let find = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        let token = find("oauth_token");
        let secret = find("oauth_token_secret");
        if token.is_empty() || secret.is_empty() {
            return Err(ApiError::Decode(
                "missing oauth_token/oauth_token_secret in response".into(),
            ));
        }
        Ok(Token::new(token, secret))
    }

    /// Confirms the stored token and returns the account it belongs to.
    pub fn verify_credentials(&self) -> ApiResult<User> {
        let response = self.post_form("/api/1/account/verify_credentials", &[], ACCEPT_JSON)?;
        ensure_ok(&response)?;
        first_record(&response.body)
    }

    /// Saves a bookmark.
    pub fn add_bookmark(&self, req: &AddBookmarkRequest) -> ApiResult<Bookmark> {
        let mut form: Vec<(String, String)> = Vec::new();
        if !req.private_source.is_empty() {
            if req.content.is_empty() {
                return Err(ApiError::service(
                    CODE_PRIVATE_REQUIRES_CONTENT,
                    "private bookmarks require supplied content",
                ));
            }
            form.push(("is_private_from_source".into(), req.private_source.clone()));
            form.push(("content".into(), req.content.clone()));
        } else {
            form.push(("url".into(), req.url.clone()));
            if !req.content.is_empty() {
                form.push(("content".into(), req.content.clone()));
            }
        }
        if !req.title.is_empty() {
            form.push(("title".into(), req.title.clone()));
        }
        if !req.description.is_empty() {
            form.push(("description".into(), req.description.clone()));
        }
        if !req.folder_id.is_empty() {
            form.push(("folder_id".into(), req.folder_id.clone()));
        }
        form.push((
            "resolve_final_url".into(),
            if req.resolve_final_url { "1" } else { "0" }.into(),
        ));
        if req.archived {
            form.push(("archived".into(), "1".into()));
        }
        let tags: Vec<serde_json::Value> = req
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| serde_json::json!({ "name": t }))
            .collect();
        if !tags.is_empty() {
            let encoded = serde_json::to_string(&tags)
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            form.push(("tags".into(), encoded));
        }

        let response = self.post_form("/api/1/bookmarks/add", &form, ACCEPT_JSON)?;
        ensure_ok(&response)?;
        first_record(&response.body)
    }

    /// Fetches one page of bookmarks.
    pub fn list_bookmarks(&self, opts: &ListOptions) -> ApiResult<ListResponse> {
        let mut form: Vec<(String, String)> = Vec::new();
        if opts.limit > 0 {
            form.push(("limit".into(), opts.limit.to_string()));
        }
        if !opts.folder_id.is_empty() {
            form.push(("folder_id".into(), opts.folder_id.clone()));
        }
        if !opts.tag.is_empty() {
            form.push(("tag".into(), opts.tag.clone()));
        }
        if !opts.have.is_empty() {
            form.push(("have".into(), opts.have.clone()));
        }
        if !opts.highlights.is_empty() {
            form.push(("highlights".into(), opts.highlights.clone()));
        }
        let response = self.post_form("/api/1/bookmarks/list", &form, ACCEPT_JSON)?;
        ensure_ok(&response)?;
        ListResponse::from_body(&response.body).map_err(ApiError::Decode)
    }

    /// Records reading progress for a bookmark.
    pub fn update_read_progress(
        &self,
        bookmark_id: i64,
        progress: f64,
        progress_timestamp: i64,
    ) -> ApiResult<Bookmark> {
        let form = vec![
            ("bookmark_id".to_string(), bookmark_id.to_string()),
            ("progress".to_string(), format_progress(progress)),
            (
                "progress_timestamp".to_string(),
                progress_timestamp.to_string(),
            ),
        ];
        let response = self.post_form("/api/1/bookmarks/update_read_progress", &form, ACCEPT_JSON)?;
        ensure_ok(&response)?;
        first_record(&response.body)
    }

    /// Permanently deletes a bookmark.
    pub fn delete_bookmark(&self, bookmark_id: i64) -> ApiResult<()> {
        let form = vec![("bookmark_id".to_string(), bookmark_id.to_string())];
        let response = self.post_form("/api/1/bookmarks/delete", &form, ACCEPT_JSON)?;
        ensure_ok(&response)
    }

    /// Stars a bookmark.
    pub fn star(&self, bookmark_id: i64) -> ApiResult<Bookmark> {
        self.bookmark_mutation("/api/1/bookmarks/star", bookmark_id)
    }

    /// Removes the star from a bookmark.
    pub fn unstar(&self, bookmark_id: i64) -> ApiResult<Bookmark> {
        self.bookmark_mutation("/api/1/bookmarks/unstar", bookmark_id)
    }

    /// Moves a bookmark to the archive.
    pub fn archive(&self, bookmark_id: i64) -> ApiResult<Bookmark> {
        self.bookmark_mutation("/api/1/bookmarks/archive", bookmark_id)
    }

    /// Moves a bookmark back out of the archive.
    pub fn unarchive(&self, bookmark_id: i64) -> ApiResult<Bookmark> {
        self.bookmark_mutation("/api/1/bookmarks/unarchive", bookmark_id)
    }

    /// Moves a bookmark into a folder.
    pub fn move_bookmark(&self, bookmark_id: i64, folder_id: &str) -> ApiResult<Bookmark> {
        let form = vec![
            ("bookmark_id".to_string(), bookmark_id.to_string()),
            ("folder_id".to_string(), folder_id.to_string()),
        ];
        let response = self.post_form("/api/1/bookmarks/move", &form, ACCEPT_JSON)?;
        ensure_ok(&response)?;
        first_record(&response.body)
    }

    /// Fetches the processed article HTML for a bookmark.
    pub fn get_text(&self, bookmark_id: i64) -> ApiResult<Vec<u8>> {
        let form = vec![("bookmark_id".to_string(), bookmark_id.to_string())];
        let response = self.post_form("/api/1/bookmarks/get_text", &form, "text/html")?;
        if !(200..300).contains(&response.status) {
            ensure_ok(&response)?;
            return Err(ApiError::Http {
                status: response.status,
                body: String::new(),
            });
        }
        Ok(response.body)
    }

    /// Lists all folders.
    pub fn list_folders(&self) -> ApiResult<Vec<Folder>> {
        let response = self.post_form("/api/1/folders/list", &[], ACCEPT_JSON)?;
        ensure_ok(&response)?;
        all_records(&response.body)
    }

    /// Creates a folder.
    pub fn add_folder(&self, title: &str) -> ApiResult<Folder> {
        let form = vec![("title".to_string(), title.to_string())];
        let response = self.post_form("/api/1/folders/add", &form, ACCEPT_JSON)?;
        ensure_ok(&response)?;
        first_record(&response.body)
    }

    /// Deletes a folder; its bookmarks move back to the default folder.
    pub fn delete_folder(&self, folder_id: i64) -> ApiResult<()> {
        let form = vec![("folder_id".to_string(), folder_id.to_string())];
        let response = self.post_form("/api/1/folders/delete", &form, ACCEPT_JSON)?;
        ensure_ok(&response)
    }

    /// Reorders folders; `order` is `folder_id:position` pairs joined
    /// with commas.
    pub fn set_folder_order(&self, order: &str) -> ApiResult<Vec<Folder>> {
        let form = vec![("order".to_string(), order.to_string())];
        let response = self.post_form("/api/1/folders/set_order", &form, ACCEPT_JSON)?;
        ensure_ok(&response)?;
        all_records(&response.body)
    }

    /// Lists highlights for a bookmark.
    pub fn list_highlights(&self, bookmark_id: i64) -> ApiResult<Vec<Highlight>> {
        let path = format!("/api/1.1/bookmarks/{bookmark_id}/highlights");
        let response = self.post_form(&path, &[], ACCEPT_JSON)?;
        ensure_ok(&response)?;
        all_records(&response.body)
    }

    /// Creates a highlight; `position < 0` lets the server place it.
    pub fn create_highlight(
        &self,
        bookmark_id: i64,
        text: &str,
        position: i64,
    ) -> ApiResult<Highlight> {
        let path = format!("/api/1.1/bookmarks/{bookmark_id}/highlight");
        let mut form = vec![("text".to_string(), text.to_string())];
        if position >= 0 {
            form.push(("position".to_string(), position.to_string()));
        }
        let response = self.post_form(&path, &form, ACCEPT_JSON)?;
        ensure_ok(&response)?;
        first_record(&response.body)
    }

    /// Deletes a highlight.
    pub fn delete_highlight(&self, highlight_id: i64) -> ApiResult<()> {
        let path = format!("/api/1.1/highlights/{highlight_id}/delete");
        let response = self.post_form(&path, &[], ACCEPT_JSON)?;
        ensure_ok(&response)
    }

    fn bookmark_mutation(&self, path: &str, bookmark_id: i64) -> ApiResult<Bookmark> {
        let form = vec![("bookmark_id".to_string(), bookmark_id.to_string())];
        let response = self.post_form(path, &form, ACCEPT_JSON)?;
        ensure_ok(&response)?;
        first_record(&response.body)
    }
}

/// Decodes the first element of a JSON array body.
fn first_record<T: serde::de::DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    let items = decode_array(body)?;
    let first = items
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Decode("empty response".into()))?;
    serde_json::from_value(first).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Decodes every element of a JSON array body.
fn all_records<T: serde::de::DeserializeOwned>(body: &[u8]) -> ApiResult<Vec<T>> {
    let items = decode_array(body)?;
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|e| ApiError::Decode(e.to_string())))
        .collect()
}

/// Shortest decimal rendering of a progress value, e.g. `0.5`, `1`.
fn format_progress(progress: f64) -> String {
    format!("{progress}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl Scripted {
        fn new(bodies: Vec<(u16, &str)>) -> Self {
            Self {
                responses: Mutex::new(
                    bodies
                        .into_iter()
                        .map(|(status, body)| HttpResponse {
                            status,
                            headers: Vec::new(),
                            body: body.as_bytes().to_vec(),
                        })
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpBackend for Scripted {
        fn post(
            &self,
            url: &str,
            _headers: &[(String, String)],
            body: &str,
        ) -> ApiResult<HttpResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::Network("script exhausted".into()))
        }
    }

    fn client(bodies: Vec<(u16, &str)>) -> Client<Scripted> {
        Client::with_backend(
            "https://api.example.com",
            "ck",
            "cs",
            Some(Token::new("tok", "sec")),
            Scripted::new(bodies),
        )
    }

    #[test]
    fn xauth_parses_token_pair() {
        let c = client(vec![(200, "oauth_token=abc&oauth_token_secret=def")]);
        let token = c.xauth_access_token("user@example.com", "hunter2").unwrap();
        assert_eq!(token.key, "abc");
        assert_eq!(token.secret, "def");

        let requests = c.backend().requests.lock().unwrap();
        let (url, body) = &requests[0];
        assert_eq!(url, "https://api.example.com/api/1/oauth/access_token");
        assert!(body.contains("x_auth_mode=client_auth"));
    }

    #[test]
    fn xauth_missing_secret_is_decode_error() {
        let c = client(vec![(200, "oauth_token=abc")]);
        let err = c.xauth_access_token("u", "p").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn verify_credentials_decodes_user() {
        let c = client(vec![(200, r#"[{"type":"user","user_id":7,"username":"ada"}]"#)]);
        let user = c.verify_credentials().unwrap();
        assert_eq!(user.user_id.0, 7);
        assert_eq!(user.username, "ada");
    }

    #[test]
    fn add_bookmark_serializes_tags_as_json() {
        let c = client(vec![(200, r#"[{"type":"bookmark","bookmark_id":1}]"#)]);
        let req = AddBookmarkRequest {
            url: "https://example.com/a".into(),
            tags: vec!["news".into(), " ".into(), "tech".into()],
            resolve_final_url: true,
            ..Default::default()
        };
        c.add_bookmark(&req).unwrap();

        let requests = c.backend().requests.lock().unwrap();
        let (_, body) = &requests[0];
        assert!(body.contains("resolve_final_url=1"));
        // Blank tag entries are dropped; the rest travel as a JSON array.
        assert!(body.contains("tags=%5B%7B%22name%22%3A%22news%22%7D%2C%7B%22name%22%3A%22tech%22%7D%5D"));
    }

    #[test]
    fn private_source_without_content_fails_client_side() {
        let c = client(vec![]);
        let req = AddBookmarkRequest {
            private_source: "newsletter".into(),
            ..Default::default()
        };
        let err = c.add_bookmark(&req).unwrap_err();
        assert_eq!(err.service_code(), Some(CODE_PRIVATE_REQUIRES_CONTENT));
        assert!(c.backend().requests.lock().unwrap().is_empty());
    }

    #[test]
    fn list_bookmarks_sends_only_set_fields() {
        let c = client(vec![(200, r#"{"bookmarks":[]}"#)]);
        let opts = ListOptions {
            limit: 25,
            have: "5:abc".into(),
            ..Default::default()
        };
        c.list_bookmarks(&opts).unwrap();

        let requests = c.backend().requests.lock().unwrap();
        let (_, body) = &requests[0];
        assert!(body.contains("limit=25"));
        assert!(body.contains("have=5%3Aabc"));
        assert!(!body.contains("folder_id"));
        assert!(!body.contains("tag="));
    }

    #[test]
    fn get_text_returns_html_and_maps_errors() {
        let c = client(vec![(200, "<html>hi</html>")]);
        assert_eq!(c.get_text(1).unwrap(), b"<html>hi</html>");

        let c = client(vec![(
            400,
            r#"[{"type":"error","error_code":1241,"message":"bad id"}]"#,
        )]);
        let err = c.get_text(1).unwrap_err();
        assert_eq!(err.service_code(), Some(1241));
    }

    #[test]
    fn folder_and_highlight_paths() {
        let c = client(vec![
            (200, "[]"),
            (200, r#"[{"type":"highlight","highlight_id":9}]"#),
            (200, "[]"),
        ]);
        c.list_highlights(42).unwrap();
        c.create_highlight(42, "quote", 3).unwrap();
        c.delete_highlight(9).unwrap();

        let requests = c.backend().requests.lock().unwrap();
        assert!(requests[0].0.ends_with("/api/1.1/bookmarks/42/highlights"));
        assert!(requests[1].0.ends_with("/api/1.1/bookmarks/42/highlight"));
        assert!(requests[1].1.contains("position=3"));
        assert!(requests[2].0.ends_with("/api/1.1/highlights/9/delete"));
    }

    #[test]
    fn progress_formatting_is_shortest_decimal() {
        assert_eq!(format_progress(0.5), "0.5");
        assert_eq!(format_progress(1.0), "1");
        assert_eq!(format_progress(0.0), "0");
    }

    #[test]
    fn update_read_progress_sends_all_fields() {
        let c = client(vec![(200, r#"[{"type":"bookmark","bookmark_id":1,"progress":0.5}]"#)]);
        let b = c.update_read_progress(1, 0.5, 1_700_000_000).unwrap();
        assert_eq!(b.progress.0, 0.5);

        let requests = c.backend().requests.lock().unwrap();
        let (_, body) = &requests[0];
        assert!(body.contains("bookmark_id=1"));
        assert!(body.contains("progress=0.5"));
        assert!(body.contains("progress_timestamp=1700000000"));
    }
}
