//! Wire types for the backend API and the normalized query result.
//!
//! The query endpoint answers with a loosely shaped JSON object: a
//! `sql_result` with rows, a `document_result` with chunks, both, or
//! neither, plus an optional `_cache_hit` flag. [`QueryPayload`] mirrors
//! that object as sent; [`ResultModel`] is the normalized form the rest of
//! the crate works with, where "section not applicable" and "section
//! applicable but empty" are different types rather than field checks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============ Connect / upload ============

/// Response body of `POST /api/connect-database`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    pub schema: Value,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body of `POST /api/upload-documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub total_documents_processed: u64,
    pub total_chunks_indexed: u64,
    #[serde(default)]
    pub processed_files: Vec<String>,
}

// ============ Query ============

/// JSON body of `POST /api/query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k_docs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_hash: Option<String>,
}

/// Query response exactly as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryPayload {
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(rename = "_cache_hit", default)]
    pub cache_hit: Option<bool>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub sql_result: Option<SqlResultPayload>,
    #[serde(default)]
    pub document_result: Option<DocumentResultPayload>,
    /// Processing failures are reported here with a 200 status.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SqlResultPayload {
    #[serde(default)]
    pub rows: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentResultPayload {
    #[serde(default)]
    pub results: Option<Vec<DocChunk>>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
}

/// A matching document chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocChunk {
    pub doc_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub chunk: String,
    pub distance: f64,
}

/// One result row: column name to scalar, in wire order.
pub type Row = Map<String, Value>;

/// Whether the answer came from the backend's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// The backend did not report a cache flag.
    #[default]
    Unknown,
    Hit,
    Miss,
}

impl From<Option<bool>> for CacheStatus {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            None => CacheStatus::Unknown,
            Some(true) => CacheStatus::Hit,
            Some(false) => CacheStatus::Miss,
        }
    }
}

/// Structured (SQL) part of an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SqlSection {
    /// Query ran; `rows` may be empty.
    Rows {
        rows: Vec<Row>,
        #[serde(skip_serializing_if = "Option::is_none")]
        elapsed_seconds: Option<f64>,
    },
    /// SQL generation or execution failed on the backend.
    Failed { error: String },
}

/// Unstructured (document) part of an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSection {
    /// In backend order; may be empty.
    pub results: Vec<DocChunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
}

/// Which result sections apply to this answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultSections {
    None,
    Sql { sql: SqlSection },
    Documents { documents: DocumentSection },
    Hybrid { sql: SqlSection, documents: DocumentSection },
}

impl ResultSections {
    fn from_parts(sql: Option<SqlSection>, documents: Option<DocumentSection>) -> Self {
        match (sql, documents) {
            (None, None) => ResultSections::None,
            (Some(sql), None) => ResultSections::Sql { sql },
            (None, Some(documents)) => ResultSections::Documents { documents },
            (Some(sql), Some(documents)) => ResultSections::Hybrid { sql, documents },
        }
    }

    pub fn sql(&self) -> Option<&SqlSection> {
        match self {
            ResultSections::Sql { sql } | ResultSections::Hybrid { sql, .. } => Some(sql),
            _ => None,
        }
    }

    pub fn documents(&self) -> Option<&DocumentSection> {
        match self {
            ResultSections::Documents { documents }
            | ResultSections::Hybrid { documents, .. } => Some(documents),
            _ => None,
        }
    }
}

/// Normalized answer to a natural-language query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultModel {
    pub query_type: Option<String>,
    pub cache: CacheStatus,
    /// SQL the backend generated for the question, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_sql: Option<String>,
    pub sections: ResultSections,
}

impl ResultModel {
    /// Normalize a raw payload.
    ///
    /// A payload-level `error` is returned as `Err` so the caller can treat
    /// it like any other backend failure.
    pub fn from_payload(payload: QueryPayload) -> Result<Self, String> {
        if let Some(error) = payload.error.filter(|e| !e.trim().is_empty()) {
            return Err(error);
        }

        let sql = payload.sql_result.and_then(|result| match (result.rows, result.error) {
            (Some(rows), _) => Some(SqlSection::Rows {
                rows,
                elapsed_seconds: result.elapsed_seconds,
            }),
            (None, Some(error)) => Some(SqlSection::Failed { error }),
            (None, None) => None,
        });

        let documents = payload.document_result.and_then(|result| {
            result.results.map(|results| DocumentSection {
                results,
                note: result.note,
                elapsed_seconds: result.elapsed_seconds,
            })
        });

        Ok(ResultModel {
            query_type: payload.query_type,
            cache: payload.cache_hit.into(),
            generated_sql: payload.sql.filter(|s| !s.trim().is_empty()),
            sections: ResultSections::from_parts(sql, documents),
        })
    }
}

// ============ History / health ============

/// One entry of `GET /api/query/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    #[serde(default)]
    pub cached: bool,
    /// Unix timestamp in seconds.
    pub time: f64,
    #[serde(rename = "type", default)]
    pub query_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Error body the backend sends with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// The detail text, if the backend sent a plain string.
    pub fn message(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(Value::as_str)
            .filter(|d| !d.trim().is_empty())
    }
}
