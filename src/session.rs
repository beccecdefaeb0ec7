//! Request orchestration.
//!
//! A [`Session`] is one running client instance. It owns three independent
//! [`OperationSlot`]s and routes each backend call's outcome into exactly
//! one of them:
//!
//! | Entry point | Slot payload | On failure |
//! |-------------|--------------|------------|
//! | [`Session::connect`] | discovered schema | schema cleared |
//! | [`Session::upload`] | [`UploadSummary`] | summary cleared |
//! | [`Session::query`] | [`ResultModel`] | result left unset |
//!
//! All entry points take `&self`, so different operations can be awaited
//! concurrently (`tokio::join!`). No slot lock is held across an `.await`.
//! Every error is converted into slot state here; callers get back a
//! status snapshot, never a `Result`.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::backend::{Backend, FileSet};
use crate::codec;
use crate::config::QueryConfig;
use crate::error::RequestError;
use crate::models::{HistoryEntry, QueryRequest, ResultModel, UploadSummary};
use crate::status::{Begin, Operation, OperationSlot, OperationStatus};

const CONNECT_SUCCESS: &str = "Successfully connected and discovered schema!";
const EMPTY_QUERY: &str = "Please enter a query.";

/// Everything the view layer needs, captured at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub connect: OperationStatus,
    pub upload: OperationStatus,
    pub query: OperationStatus,
    pub schema: Option<Value>,
    pub last_upload: Option<UploadSummary>,
    pub result: Option<ResultModel>,
}

pub struct Session<B: Backend> {
    backend: Arc<B>,
    options: QueryConfig,
    connect: OperationSlot<Value>,
    upload: OperationSlot<UploadSummary>,
    query: OperationSlot<ResultModel>,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B, options: QueryConfig) -> Self {
        Self::with_shared_backend(Arc::new(backend), options)
    }

    pub fn with_shared_backend(backend: Arc<B>, options: QueryConfig) -> Self {
        Self {
            backend,
            options,
            connect: OperationSlot::new(Operation::Connect),
            upload: OperationSlot::new(Operation::Upload),
            query: OperationSlot::new(Operation::Query),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ============ connect ============

    /// Register a database and fetch its schema.
    ///
    /// The connection string is percent-encoded before it is sent. A failed
    /// attempt clears any schema from an earlier successful connect.
    pub async fn connect(&self, raw: &str) -> OperationStatus {
        let ticket = self.connect.begin(Begin::default());

        if codec::needs_encoding(raw) {
            tracing::debug!("escaping '@' in connection string credentials");
        }
        let encoded = codec::encode_connection_string(raw);

        match self.backend.connect_database(&encoded).await {
            Ok(response) => {
                ticket.succeed(CONNECT_SUCCESS, response.schema);
            }
            Err(err) => {
                ticket.fail(err.status_message(Operation::Connect));
            }
        }
        self.connect.status()
    }

    pub fn connect_status(&self) -> OperationStatus {
        self.connect.status()
    }

    /// Schema from the most recent successful connect, if still valid.
    pub fn schema(&self) -> Option<Value> {
        self.connect.value()
    }

    // ============ upload ============

    /// Upload documents for indexing in a single request.
    ///
    /// Returns `None` without touching any state when `files` is empty.
    pub async fn upload(&self, files: &FileSet) -> Option<OperationStatus> {
        if files.is_empty() {
            tracing::debug!("upload skipped: no files");
            return None;
        }

        let ticket = self
            .upload
            .begin(Begin::with_note(format!("Uploading {} file(s)...", files.len())));

        match self.backend.upload_documents(files).await {
            Ok(summary) => {
                let message = format!(
                    "Success! Processed {} file(s) and indexed {} chunks.",
                    summary.total_documents_processed, summary.total_chunks_indexed
                );
                ticket.succeed(message, summary);
            }
            Err(err) => {
                ticket.fail(err.status_message(Operation::Upload));
            }
        }
        Some(self.upload.status())
    }

    pub fn upload_status(&self) -> OperationStatus {
        self.upload.status()
    }

    pub fn last_upload(&self) -> Option<UploadSummary> {
        self.upload.value()
    }

    // ============ query ============

    /// Ask a natural-language question.
    ///
    /// Blank input fails locally with no request. Otherwise the previous
    /// result is cleared at dispatch and replaced only by a complete,
    /// successfully normalized answer.
    pub async fn query(&self, text: &str) -> OperationStatus {
        let ticket = self.query.begin(Begin::clearing());

        if text.trim().is_empty() {
            ticket.fail(EMPTY_QUERY);
            return self.query.status();
        }

        let request = self.build_query_request(text);
        let outcome = self
            .backend
            .query(&request)
            .await
            .map_err(|err| err.status_message(Operation::Query))
            .and_then(ResultModel::from_payload);

        match outcome {
            Ok(model) => {
                let message = format!(
                    "Query processed as {}.",
                    model.query_type.as_deref().unwrap_or("N/A")
                );
                ticket.succeed(message, model);
            }
            Err(message) => {
                ticket.fail(message);
            }
        }
        self.query.status()
    }

    pub fn query_status(&self) -> OperationStatus {
        self.query.status()
    }

    pub fn result(&self) -> Option<ResultModel> {
        self.query.value()
    }

    fn build_query_request(&self, text: &str) -> QueryRequest {
        let hash = if self.options.send_schema_hash {
            self.schema().map(|schema| schema_hash(&schema))
        } else {
            None
        };
        QueryRequest {
            query: text.to_string(),
            top_k_docs: Some(self.options.top_k_docs),
            schema_hash: hash,
        }
    }

    // ============ read-only helpers ============

    /// Recent queries recorded by the backend, newest first.
    pub async fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, RequestError> {
        self.backend.history(limit).await
    }

    /// Backend banner message.
    pub async fn health(&self) -> Result<String, RequestError> {
        self.backend.health().await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connect: self.connect.status(),
            upload: self.upload.status(),
            query: self.query.status(),
            schema: self.connect.value(),
            last_upload: self.upload.value(),
            result: self.query.value(),
        }
    }
}

/// SHA-256 hex digest of a schema's JSON form.
pub fn schema_hash(schema: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(schema.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
