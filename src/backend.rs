//! The backend boundary.
//!
//! [`Backend`] is the seam between request orchestration and transport.
//! [`HttpBackend`] is the production implementation over `reqwest`; tests
//! substitute in-memory fakes.
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/api/connect-database` | multipart `connection_string` |
//! | `POST` | `/api/upload-documents` | multipart `files` (repeated) |
//! | `POST` | `/api/query` | JSON [`QueryRequest`] |
//! | `GET`  | `/api/query/history?limit=N` | none |
//! | `GET`  | `/` | none |
//!
//! Non-2xx responses are mapped through [`ErrorBody`]: a string `detail`
//! becomes [`RequestError::Application`], anything else
//! [`RequestError::Http`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::RequestError;
use crate::models::{
    ConnectResponse, ErrorBody, HealthResponse, HistoryEntry, HistoryResponse, QueryPayload,
    QueryRequest, UploadSummary,
};

/// Transport for the three operations plus read-only helpers.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send an already-encoded connection string; returns the discovered schema.
    async fn connect_database(&self, connection_string: &str)
        -> Result<ConnectResponse, RequestError>;

    async fn upload_documents(&self, files: &FileSet) -> Result<UploadSummary, RequestError>;

    async fn query(&self, request: &QueryRequest) -> Result<QueryPayload, RequestError>;

    async fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, RequestError>;

    async fn health(&self) -> Result<String, RequestError>;
}

// ============ Files ============

/// Supported upload types, matched on lowercase extension.
const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// MIME type for a supported document, or `None` if the type is not accepted.
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ACCEPTED_TYPES
        .iter()
        .find(|(accepted, _)| *accepted == ext)
        .map(|(_, mime)| *mime)
}

/// A document to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub mime: &'static str,
    pub source: FileSource,
}

#[derive(Debug, Clone)]
pub enum FileSource {
    /// Read from disk when the request is built.
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl UploadFile {
    pub fn from_bytes(filename: impl Into<String>, mime: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime,
            source: FileSource::Bytes(bytes),
        }
    }

    async fn read(&self) -> Result<Vec<u8>, RequestError> {
        match &self.source {
            FileSource::Bytes(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| RequestError::File {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

/// The set of documents for one upload request.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    files: Vec<UploadFile>,
}

impl FileSet {
    pub fn new(files: Vec<UploadFile>) -> Self {
        Self { files }
    }

    /// Build a set from paths, skipping unsupported file types.
    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let Some(mime) = mime_for(path) else {
                tracing::warn!(path = %path.display(), "skipping unsupported file type (expected pdf, docx or txt)");
                continue;
            };
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            files.push(UploadFile {
                filename,
                mime,
                source: FileSource::Path(path.to_path_buf()),
            });
        }
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    /// Read every file and bundle them into one multipart form.
    pub async fn to_form(&self) -> Result<Form, RequestError> {
        let mut form = Form::new();
        for file in &self.files {
            let bytes = file.read().await?;
            let part = Part::bytes(bytes)
                .file_name(file.filename.clone())
                .mime_str(file.mime)?;
            form = form.part("files", part);
        }
        Ok(form)
    }
}

// ============ HTTP ============

/// [`Backend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        // Keep any path prefix when joining endpoint paths.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder =
            Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RequestError> {
        self.base_url.join(path.trim_start_matches('/')).map_err(|e| {
            RequestError::Validation(format!("invalid backend URL for {}: {}", path, e))
        })
    }
}

/// Decode a success body, or map an error status to [`RequestError`].
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        return Ok(serde_json::from_slice(&body)?);
    }

    let detail = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message().map(str::to_string));

    match detail {
        Some(detail) => Err(RequestError::Application { status, detail }),
        None => Err(RequestError::Http { status }),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn connect_database(
        &self,
        connection_string: &str,
    ) -> Result<ConnectResponse, RequestError> {
        let form = Form::new().text("connection_string", connection_string.to_string());
        let response = self
            .client
            .post(self.endpoint("/api/connect-database")?)
            .multipart(form)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn upload_documents(&self, files: &FileSet) -> Result<UploadSummary, RequestError> {
        let form = files.to_form().await?;
        let response = self
            .client
            .post(self.endpoint("/api/upload-documents")?)
            .multipart(form)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryPayload, RequestError> {
        let response = self
            .client
            .post(self.endpoint("/api/query")?)
            .json(request)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, RequestError> {
        let response = self
            .client
            .get(self.endpoint("/api/query/history")?)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let body: HistoryResponse = parse_response(response).await?;
        Ok(body.history)
    }

    async fn health(&self) -> Result<String, RequestError> {
        let response = self.client.get(self.endpoint("/")?).send().await?;
        let body: HealthResponse = parse_response(response).await?;
        Ok(body.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_accepted_types() {
        assert_eq!(mime_for(Path::new("a/report.PDF")), Some("application/pdf"));
        assert_eq!(mime_for(Path::new("notes.txt")), Some("text/plain"));
        assert!(mime_for(Path::new("cv.docx")).unwrap().contains("wordprocessingml"));
        assert_eq!(mime_for(Path::new("image.png")), None);
        assert_eq!(mime_for(Path::new("README")), None);
    }

    #[test]
    fn test_from_paths_skips_unsupported() {
        let set = FileSet::from_paths(["a.pdf", "b.exe", "dir/c.txt", "noext"]);
        let names: Vec<&str> = set.files().iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "c.txt"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_from_paths_all_unsupported_is_empty() {
        let set = FileSet::from_paths(["x.png", "y.zip"]);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_to_form_reports_missing_file() {
        let set = FileSet::from_paths(["/definitely/not/here.pdf"]);
        let err = set.to_form().await.unwrap_err();
        assert!(matches!(err, RequestError::File { .. }));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://localhost:8000".to_string(),
            ..BackendConfig::default()
        })
        .unwrap();
        assert_eq!(
            backend.endpoint("/api/query").unwrap().as_str(),
            "http://localhost:8000/api/query"
        );
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "https://gateway.example.com/nlq".to_string(),
            ..BackendConfig::default()
        })
        .unwrap();
        assert_eq!(
            backend.endpoint("/api/upload-documents").unwrap().as_str(),
            "https://gateway.example.com/nlq/api/upload-documents"
        );
        assert_eq!(
            backend.endpoint("/").unwrap().as_str(),
            "https://gateway.example.com/nlq/"
        );
    }
}
