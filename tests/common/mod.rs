//! In-process mock of the query-engine backend.
//!
//! Serves the same routes as the real service on an ephemeral port and
//! records what it receives. Behaviour is picked by the request content:
//!
//! - connect: strings containing `wrong` get a 400 with `detail`,
//!   `crash` gets a bare 500.
//! - query: the query text selects a canned payload (see [`query_payload`]).

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedFile {
    pub filename: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub connection_strings: Vec<String>,
    pub uploads: Vec<Vec<ReceivedFile>>,
    pub queries: Vec<Value>,
}

pub type Shared = Arc<Mutex<Recorded>>;

pub struct MockBackend {
    pub base_url: String,
    pub recorded: Shared,
}

impl MockBackend {
    pub fn connection_strings(&self) -> Vec<String> {
        self.recorded.lock().unwrap().connection_strings.clone()
    }

    pub fn uploads(&self) -> Vec<Vec<ReceivedFile>> {
        self.recorded.lock().unwrap().uploads.clone()
    }

    pub fn queries(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().queries.clone()
    }
}

pub async fn spawn_backend() -> MockBackend {
    let recorded: Shared = Arc::default();

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/api/connect-database", post(handle_connect))
        .route("/api/upload-documents", post(handle_upload))
        .route("/api/query", post(handle_query))
        .route("/api/query/history", get(handle_history))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{}", addr),
        recorded,
    }
}

/// A base URL nothing is listening on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn handle_root() -> Json<Value> {
    Json(json!({ "message": "AI Query Engine Backend is running!" }))
}

async fn handle_connect(State(recorded): State<Shared>, mut multipart: Multipart) -> Response {
    let mut connection_string = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("connection_string") {
            connection_string = Some(field.text().await.unwrap());
        }
    }
    let Some(cs) = connection_string else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "connection_string is required");
    };
    recorded.lock().unwrap().connection_strings.push(cs.clone());

    if cs.contains("crash") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }
    if cs.contains("wrong") {
        return detail(
            StatusCode::BAD_REQUEST,
            "(psycopg2.OperationalError) password authentication failed for user \"u\"",
        );
    }

    Json(json!({
        "message": "Database schema discovered successfully",
        "schema": {
            "tables": [
                { "name": "employees", "columns": [{ "name": "id" }, { "name": "name" }, { "name": "dept" }] }
            ]
        }
    }))
    .into_response()
}

async fn handle_upload(State(recorded): State<Shared>, mut multipart: Multipart) -> Response {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let size = field.bytes().await.unwrap().len();
        files.push(ReceivedFile {
            filename,
            content_type,
            size,
        });
    }
    recorded.lock().unwrap().uploads.push(files.clone());

    if files.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "No files were uploaded.");
    }
    if files.iter().any(|f| f.filename.contains("corrupt")) {
        return detail(StatusCode::BAD_REQUEST, "Could not parse corrupt.pdf");
    }

    let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
    Json(json!({
        "status": "success",
        "processed_files": names,
        "total_documents_processed": files.len(),
        "total_chunks_indexed": files.len() * 3
    }))
    .into_response()
}

async fn handle_query(State(recorded): State<Shared>, Json(body): Json<Value>) -> Response {
    recorded.lock().unwrap().queries.push(body.clone());
    let text = body["query"].as_str().unwrap_or_default();
    query_payload(text)
}

/// Canned answers keyed by query text.
pub fn query_payload(text: &str) -> Response {
    match text {
        "hybrid" => Json(json!({
            "query": text,
            "query_type": "HYBRID",
            "sql": "SELECT name, dept FROM employees LIMIT 200",
            "sql_result": { "rows": [
                { "name": "Ada", "dept": "Engineering" },
                { "name": "Grace", "dept": null }
            ], "elapsed_seconds": 0.002 },
            "document_result": { "results": [
                { "doc_id": "cv_ada.pdf_0", "filename": "cv_ada.pdf", "chunk": "Rust\n  and Python", "distance": 0.81234 },
                { "doc_id": "cv_grace.pdf_3", "filename": "cv_grace.pdf", "chunk": "COBOL", "distance": 0.2 }
            ], "elapsed_seconds": 0.01 },
            "metrics": { "timestamp": 1700000000.0 },
            "error": null,
            "_cache_hit": false
        }))
        .into_response(),
        "cached" => Json(json!({
            "query_type": "SQL",
            "sql_result": { "rows": [] },
            "document_result": null,
            "_cache_hit": true
        }))
        .into_response(),
        "not connected" => detail(
            StatusCode::BAD_REQUEST,
            "Database not connected. Call /connect-database first.",
        ),
        "validation" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "query"], "msg": "field required" }] })),
        )
            .into_response(),
        "explode" => Json(json!({ "error": "Processing failed: division by zero" })).into_response(),
        "garbage" => (StatusCode::OK, "<html>oops</html>").into_response(),
        _ => Json(json!({
            "query_type": "DOCUMENT",
            "document_result": { "results": [], "elapsed_seconds": 0.0, "note": "No indexed documents." }
        }))
        .into_response(),
    }
}

async fn handle_history(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(50);
    let history = vec![
        json!({ "query": "hybrid", "cached": false, "time": 1700000000.0, "type": "HYBRID" }),
        json!({ "query": "cached", "cached": true, "time": 1699999000.0 }),
    ];
    Json(json!({ "history": history.into_iter().take(limit).collect::<Vec<_>>() }))
}
