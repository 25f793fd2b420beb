//! Request and response envelopes
//!
//! [`RequestEnvelope`] is the transport-neutral view extractors read from:
//! named text fields plus uploaded files spooled to a per-request temp dir.
//! The spool lives as long as the envelope, so file paths handed to the
//! prediction function stay valid for the whole pipeline.

use axum::extract::{Form, Multipart, Request};
use axum::{Json, RequestExt};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::{Error, Result};

/// One uploaded file, already spooled to disk.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Multipart field name the file arrived under
    pub field: String,
    /// Client-supplied file name (sanitized before spooling)
    pub file_name: String,
    /// Spooled location on the server
    pub path: PathBuf,
}

/// Read-only view of an inbound request.
#[derive(Debug, Default)]
pub struct RequestEnvelope {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
    spool: Option<TempDir>,
}

impl RequestEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Uploaded files in the order they appeared in the request body.
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Build an envelope from an axum request.
    ///
    /// Accepts `multipart/form-data` (fields and files),
    /// `application/x-www-form-urlencoded` (fields), and `application/json`
    /// (top-level object entries become fields).
    pub async fn from_request(req: Request, upload_dir: Option<&Path>) -> Result<Self> {
        let content_type = req
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = req
                .extract::<Multipart, _>()
                .await
                .map_err(|e| Error::Decode(format!("invalid multipart payload: {e}")))?;
            return Self::from_multipart(multipart, upload_dir).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = req
                .extract::<Form<HashMap<String, String>>, _>()
                .await
                .map_err(|e| Error::Decode(format!("invalid form payload: {e}")))?;
            let mut envelope = Self::new();
            envelope.fields = fields;
            return Ok(envelope);
        }

        if content_type.starts_with("application/json") {
            let Json(payload) = req
                .extract::<Json<Value>, _>()
                .await
                .map_err(|e| Error::Decode(format!("invalid JSON payload: {e}")))?;
            let Value::Object(entries) = payload else {
                return Err(Error::Decode("expected a JSON object body".to_string()));
            };
            let mut envelope = Self::new();
            for (name, value) in entries {
                match value {
                    Value::String(text) => envelope.insert_field(name, text),
                    other => envelope.insert_field(name, other.to_string()),
                }
            }
            return Ok(envelope);
        }

        Err(Error::Decode(format!(
            "unsupported content type `{content_type}`; expected multipart/form-data, \
             application/x-www-form-urlencoded or application/json"
        )))
    }

    async fn from_multipart(mut multipart: Multipart, upload_dir: Option<&Path>) -> Result<Self> {
        let mut envelope = Self::new();
        let mut index = 0usize;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::Decode(format!("failed reading multipart field: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(raw_name) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await.map_err(|e| {
                    Error::Decode(format!("failed reading multipart file `{name}`: {e}"))
                })?;
                let spool = envelope.spool_dir(upload_dir)?;
                let file_name = safe_file_name(&raw_name, index);
                let path = spool.join(format!("{index:03}-{file_name}"));
                tokio::fs::write(&path, &bytes).await?;
                envelope.push_file(UploadedFile {
                    field: name,
                    file_name,
                    path,
                });
                index += 1;
            } else {
                let text = field.text().await.map_err(|e| {
                    Error::Decode(format!("failed reading multipart field `{name}`: {e}"))
                })?;
                envelope.insert_field(name, text);
            }
        }

        Ok(envelope)
    }

    fn spool_dir(&mut self, upload_dir: Option<&Path>) -> Result<&Path> {
        if self.spool.is_none() {
            let dir = match upload_dir {
                Some(base) => tempfile::tempdir_in(base)?,
                None => tempfile::tempdir()?,
            };
            self.spool = Some(dir);
        }
        // populated above
        Ok(self.spool.as_ref().unwrap().path())
    }
}

/// Strip any path components from a client-supplied file name.
fn safe_file_name(raw: &str, index: usize) -> String {
    Path::new(raw)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("upload-{index}"))
}

/// Per-request response payload: an insertion-ordered mapping built by the
/// registrar from wrapped codec output. Key collisions are rejected rather
/// than overwritten.
#[derive(Debug, Default)]
pub struct ResponsePayload {
    map: serde_json::Map<String, Value>,
}

impl ResponsePayload {
    pub fn insert(&mut self, key: &str, value: Value) -> Result<()> {
        if self.map.contains_key(key) {
            return Err(Error::Config(format!(
                "response key `{key}` written twice in one response"
            )));
        }
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.map)
    }
}
