use raindump::api::RaindropApi;
use raindump::client::{ApiRequest, ApiResponse, ResilientClient, RetryPolicy, Sleeper, Transport};
use raindump::export::{BOOKMARKS_FILE, COLLECTIONS_FILE};
use raindump::pipeline::{self, RunOptions};
use raindump::{ExportError, Result};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Canned API: each path answers from its queue, the last answer repeats
struct FakeRaindrop {
    routes: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
}

impl FakeRaindrop {
    fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
        }
    }

    fn route(self, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back((status, body.to_string()));
        self
    }
}

impl Transport for FakeRaindrop {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut routes = self.routes.lock().unwrap();
        let (status, body) = match routes.get_mut(&request.path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => (404, String::new()),
        };
        Ok(ApiResponse {
            status,
            url: format!("http://fake{}", request.path),
            body,
        })
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

fn api(transport: FakeRaindrop) -> RaindropApi<FakeRaindrop, NoSleep> {
    let policy = RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(1),
        rate_limit_cooldown: Duration::from_millis(1),
        request_delay: Duration::ZERO,
    };
    RaindropApi::new(ResilientClient::with_sleeper(transport, NoSleep, policy))
}

fn hierarchy_routes() -> FakeRaindrop {
    FakeRaindrop::new()
        .route("/collections", 200, r#"{"result":true,"items":[{"_id":1,"title":"A"}]}"#)
        .route(
            "/collections/childrens",
            200,
            r#"{"result":true,"items":[
                {"_id":2,"title":"B","parent":{"$id":1}},
                {"_id":3,"title":"C","parent":{"$id":2}}
            ]}"#,
        )
        .route(
            "/user",
            200,
            r#"{"result":true,"user":{"groups":[{"title":"G","collections":[1]}]}}"#,
        )
}

#[test]
fn test_export_resolves_paths_and_dedups() {
    let transport = hierarchy_routes()
        .route(
            "/raindrops/1/export.csv",
            200,
            "id,title,url\n10,Rust,https://rust-lang.org\n",
        )
        .route("/raindrops/2/export.csv", 500, "")
        .route(
            "/raindrops/2/export.csv",
            200,
            "id,title,url\n10,Rust,https://rust-lang.org\n20,\"Docs, std\",https://doc.rust-lang.org\n",
        )
        .route("/raindrops/3/export.csv", 404, "");
    let api = api(transport);
    let out = TempDir::new().unwrap();

    let mut total = 0;
    let mut processed = 0;
    let summary = pipeline::run_export(
        &api,
        &RunOptions::new(out.path()),
        |n| total = n,
        |_| processed += 1,
    )
    .unwrap();

    assert_eq!(total, 3);
    assert_eq!(processed, 3);
    assert_eq!(summary.collections_written, 3);
    assert_eq!(summary.bookmarks_written, 2);
    assert_eq!(summary.duplicates, 1);
    assert!(summary.is_clean());

    let collections = fs::read_to_string(out.path().join(COLLECTIONS_FILE)).unwrap();
    let lines: Vec<&str> = collections.lines().collect();
    assert_eq!(
        lines,
        vec![
            "id,title,parentId,collectionPath,fullPath,rootCollection,group",
            "1,A,,A,G / A,A,G",
            "2,B,1,A / B,G / A / B,A,G",
            "3,C,2,A / B / C,G / A / B / C,A,G",
        ]
    );

    let bookmarks = fs::read_to_string(out.path().join(BOOKMARKS_FILE)).unwrap();
    let lines: Vec<&str> = bookmarks.lines().collect();
    assert_eq!(
        lines,
        vec![
            "id,title,url,collection_id,collection_title,full_path,root_collection,group",
            "10,Rust,https://rust-lang.org,1,A,G / A,A,G",
            "20,\"Docs, std\",https://doc.rust-lang.org,2,B,G / A / B,A,G",
        ]
    );
}

#[test]
fn test_failing_collection_does_not_stop_the_run() {
    let transport = hierarchy_routes()
        .route("/raindrops/1/export.csv", 503, "")
        .route("/raindrops/2/export.csv", 403, "forbidden")
        .route("/raindrops/3/export.csv", 200, "id,title\n30,Only\n");
    let out = TempDir::new().unwrap();

    let summary =
        pipeline::run_export(&api(transport), &RunOptions::new(out.path()), |_| {}, |_| {})
            .unwrap();

    assert_eq!(summary.bookmarks_written, 1);
    assert_eq!(summary.failures.len(), 2);
    assert!(matches!(
        summary.failures[0].error,
        ExportError::RetriesExhausted { attempts: 3, .. }
    ));
    assert_eq!(summary.failures[1].error.status(), Some(403));
}

#[test]
fn test_empty_account_writes_no_bookmarks_file() {
    let transport = hierarchy_routes();
    let out = TempDir::new().unwrap();

    let summary =
        pipeline::run_export(&api(transport), &RunOptions::new(out.path()), |_| {}, |_| {})
            .unwrap();

    assert_eq!(summary.bookmarks_written, 0);
    assert!(summary.bookmarks_path.is_none());
    assert!(out.path().join(COLLECTIONS_FILE).exists());
    assert!(!out.path().join(BOOKMARKS_FILE).exists());
}

#[test]
fn test_unauthorized_discovery_is_fatal() {
    let transport = FakeRaindrop::new().route("/collections", 401, "");
    let out = TempDir::new().unwrap();

    let result = pipeline::run_export(&api(transport), &RunOptions::new(out.path()), |_| {}, |_| {});
    assert!(matches!(result, Err(ExportError::Auth)));
    assert!(!out.path().join(COLLECTIONS_FILE).exists());
}

#[test]
fn test_exhausted_discovery_is_fatal() {
    let transport = FakeRaindrop::new()
        .route("/collections", 200, r#"{"items":[]}"#)
        .route("/collections/childrens", 502, "");
    let out = TempDir::new().unwrap();

    let result = pipeline::run_export(&api(transport), &RunOptions::new(out.path()), |_| {}, |_| {});
    assert!(matches!(result, Err(ExportError::RetriesExhausted { .. })));
}
