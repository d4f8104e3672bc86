//! In-process FileShare server for integration tests.
//!
//! Computes statistics the same way the real server does (median is the
//! upper-middle element, averages use integer division, timestamps in ms).

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::{Multipart, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fileshare_client::config::Config;
use fileshare_client::controller::ViewController;
use fileshare_client::token::TokenManager;
use fileshare_client::types::FileRecord;
use fileshare_client::util::DateDisplay;
use fileshare_client::{ApiClient, MemoryPage};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub struct StoredFile {
    pub record: FileRecord,
    pub content: Vec<u8>,
}

#[derive(Default)]
pub struct ServerState {
    pub origin: String,
    pub files: Vec<StoredFile>,
    pub requests: Vec<String>,
    pub fail_list: bool,
    pub fail_stats: bool,
    pub fail_upload: bool,
    pub require_auth: bool,
    pub list_delay: Option<Duration>,
    pub abort_downloads: bool,
    pub issued_tokens: Vec<String>,
    next_id: u64,
}

pub type Shared = Arc<Mutex<ServerState>>;

pub struct TestServer {
    pub base_url: Url,
    pub state: Shared,
}

impl TestServer {
    pub fn seed(&self, name: &str, content: &[u8], downloads: u64, created: i64) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let token = format!("seed{}", state.next_id);
        state.files.push(StoredFile {
            record: FileRecord {
                token: token.clone(),
                name: name.to_string(),
                size: content.len() as u64,
                downloads,
                created,
                last_downloaded: 0,
            },
            content: content.to_vec(),
        });
        token
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count_requests(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }

    pub fn update(&self, f: impl FnOnce(&mut ServerState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn downloads_of(&self, token: &str) -> Option<u64> {
        let state = self.state.lock().unwrap();
        state
            .files
            .iter()
            .find(|f| f.record.token == token)
            .map(|f| f.record.downloads)
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::with_client(reqwest::Client::new(), self.base_url.clone(), None)
    }

    pub fn api_as(&self, username: &str) -> ApiClient {
        let client = reqwest::Client::new();
        let tokens = TokenManager::new(
            client.clone(),
            self.base_url.join("/api/auth").unwrap(),
            Some(username.to_string()),
            None,
        );
        ApiClient::with_client(client, self.base_url.clone(), Some(Arc::new(tokens)))
    }

    pub fn controller(&self, page: MemoryPage) -> ViewController<MemoryPage> {
        controller_with(self.api(), page)
    }
}

pub fn controller_with(api: ApiClient, page: MemoryPage) -> ViewController<MemoryPage> {
    ViewController::new(api, page, &Config::default())
        .with_settle_delay(Duration::ZERO)
        .with_dates(DateDisplay::utc())
}

pub async fn spawn() -> TestServer {
    let state: Shared = Arc::new(Mutex::new(ServerState::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    state.lock().unwrap().origin = format!("http://{}", addr);

    let app = Router::new()
        .route("/api/files", get(list_files))
        .route("/api/file-stats", get(file_stats))
        .route("/api/stats", get(basic_stats))
        .route("/api/upload", post(upload))
        .route("/api/delete/:token", delete(delete_file))
        .route("/api/auth", post(auth))
        .route("/d/:token", get(download))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
        state,
    }
}

async fn record_request(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let line = format!("{} {}", req.method(), req.uri().path());
    state.lock().unwrap().requests.push(line);
    next.run(req).await
}

fn authorized(state: &ServerState, headers: &HeaderMap) -> bool {
    if !state.require_auth {
        return true;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| state.issued_tokens.iter().any(|t| t == token))
        .unwrap_or(false)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

async fn list_files(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let delay = state.lock().unwrap().list_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_list {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Failed to get files list"})))
            .into_response();
    }
    let files: Vec<&FileRecord> = state.files.iter().map(|f| &f.record).collect();
    Json(json!({ "files": files })).into_response()
}

fn extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
        _ => "unknown".to_string(),
    }
}

fn median(mut values: Vec<u64>) -> u64 {
    values.sort_unstable();
    values.get(values.len() / 2).copied().unwrap_or(0)
}

async fn file_stats(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_stats {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let records: Vec<&FileRecord> = state.files.iter().map(|f| &f.record).collect();
    let count = records.len() as u64;
    let sizes: Vec<u64> = records.iter().map(|r| r.size).collect();
    let downloads: Vec<u64> = records.iter().map(|r| r.downloads).collect();
    let total_size: u64 = sizes.iter().sum();
    let total_downloads: u64 = downloads.iter().sum();
    let now = now_millis();
    let ages: Vec<u64> = records
        .iter()
        .map(|r| ((now - r.created).max(0) / 1000) as u64)
        .collect();

    let mut formats: HashMap<String, (u64, u64)> = HashMap::new();
    for record in &records {
        let entry = formats.entry(extension(&record.name)).or_default();
        entry.0 += 1;
        entry.1 += record.size;
    }
    let mut formats: Vec<(String, (u64, u64))> = formats.into_iter().collect();
    formats.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(&b.0)));

    let body = json!({
        "totalFiles": count,
        "totalSize": total_size,
        "totalDownloads": total_downloads,
        "sizeStats": {
            "max": sizes.iter().max().copied().unwrap_or(0),
            "min": sizes.iter().min().copied().unwrap_or(0),
            "median": median(sizes.clone()),
            "average": if count == 0 { 0 } else { total_size / count },
        },
        "downloadStats": {
            "max": downloads.iter().max().copied().unwrap_or(0),
            "min": downloads.iter().min().copied().unwrap_or(0),
            "median": median(downloads.clone()),
            "average": if count == 0 { 0 } else { total_downloads / count },
        },
        "timeStats": {
            "oldest": records.iter().map(|r| r.created).min().unwrap_or(0),
            "newest": records.iter().map(|r| r.created).max().unwrap_or(0),
            "medianAge": median(ages),
        },
        "formatStats": formats
            .into_iter()
            .map(|(format, (count, size))| json!({"format": format, "count": count, "size": size}))
            .collect::<Vec<Value>>(),
    });
    Json(body).into_response()
}

async fn basic_stats(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "totalFiles": state.files.len(),
        "totalBytes": state.files.iter().map(|f| f.record.size).sum::<u64>(),
        "totalDownloads": state.files.iter().map(|f| f.record.downloads).sum::<u64>(),
    }))
    .into_response()
}

async fn upload(State(state): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    {
        let state = state.lock().unwrap();
        if !authorized(&state, &headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if state.fail_upload {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let mut uploaded: Option<(String, Vec<u8>)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let Ok(data) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        uploaded = Some((name, data.to_vec()));
    }

    let Some((name, content)) = uploaded.filter(|(name, _)| !name.is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "file part not found"}))).into_response();
    };

    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let token = format!("up{}", state.next_id);
    let url = format!("{}/d/{}", state.origin, token);
    state.files.push(StoredFile {
        record: FileRecord {
            token: token.clone(),
            name,
            size: content.len() as u64,
            downloads: 0,
            created: now_millis(),
            last_downloaded: 0,
        },
        content,
    });

    Json(json!({ "token": token, "url": url })).into_response()
}

async fn delete_file(State(state): State<Shared>, Path(token): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    let before = state.files.len();
    state.files.retain(|f| f.record.token != token);
    if state.files.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "File not found"}))).into_response();
    }
    Json(json!({ "success": true })).into_response()
}

async fn auth(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let Some(username) = body.get("username").and_then(Value::as_str).map(str::trim) else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Username is required"}))).into_response();
    };
    if username.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Username is required"}))).into_response();
    }

    let mut state = state.lock().unwrap();
    let token = format!("session-{}-{}", username, state.issued_tokens.len() + 1);
    state.issued_tokens.push(token.clone());
    Json(json!({ "token": token, "username": username })).into_response()
}

fn encode_filename(name: &str) -> String {
    if name.is_ascii() {
        name.replace('"', "\\\"")
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(name.as_bytes()))
    }
}

async fn download(State(state): State<Shared>, Path(token): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    let abort = state.abort_downloads;
    let Some(file) = state.files.iter_mut().find(|f| f.record.token == token) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    file.record.downloads += 1;
    file.record.last_downloaded = now_millis();

    let disposition = format!("attachment; filename=\"{}\"", encode_filename(&file.record.name));

    if abort {
        // 先发送一部分内容，然后断开连接
        let head = Bytes::copy_from_slice(&file.content[..file.content.len() / 2]);
        let body = stream::once(async move { Ok::<_, io::Error>(head) }).chain(stream::once(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(io::Error::new(io::ErrorKind::ConnectionAborted, "aborted"))
        }));
        return (
            [(header::CONTENT_DISPOSITION, disposition)],
            Body::from_stream(body),
        )
            .into_response();
    }

    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.content.clone(),
    )
        .into_response()
}
