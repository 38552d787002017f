use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    error::ServerRejection,
    protocol::{CaptionResponse, FALLBACK_MIME_TYPE, GENERATE_CAPTION_PATH, UPLOAD_FIELD_NAME},
};
use tracing::{debug, info};
use url::Url;

pub mod controller;
pub mod error;

pub use controller::{
    CaptionJob, Completion, MessageSlot, PreviewHost, SelectedFile, SubmitOutcome,
    UploadController, GENERIC_FAILURE_MESSAGE, MISSING_FILE_MESSAGE, UNREADABLE_FILE_MESSAGE,
};
pub use error::CaptionError;

/// One image as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait CaptionService: Send + Sync {
    async fn generate_caption(&self, upload: ImageUpload) -> Result<String, CaptionError>;
}

/// Resolves the full caption endpoint from a base url. A base that already
/// points at the caption path is kept as-is.
pub fn caption_endpoint(base_url: &str) -> Result<Url, CaptionError> {
    let invalid = |reason: String| CaptionError::InvalidEndpoint {
        url: base_url.to_string(),
        reason,
    };

    let mut url = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    let caption_segment = GENERATE_CAPTION_PATH.trim_start_matches('/');
    let already_targets_caption = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        == Some(caption_segment);
    if !already_targets_caption {
        url.path_segments_mut()
            .map_err(|()| invalid("url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(caption_segment);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

pub struct HttpCaptionClient {
    http: Client,
    endpoint: Url,
}

impl HttpCaptionClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    /// `timeout` of `None` leaves requests unbounded.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = caption_endpoint(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build caption http client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_form(upload: ImageUpload) -> Result<Form, CaptionError> {
        let mime_type = upload
            .mime_type
            .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename.clone())
            .mime_str(&mime_type)
            .map_err(|source| CaptionError::InvalidUpload {
                filename: upload.filename,
                source,
            })?;
        Ok(Form::new().part(UPLOAD_FIELD_NAME, part))
    }
}

#[async_trait]
impl CaptionService for HttpCaptionClient {
    async fn generate_caption(&self, upload: ImageUpload) -> Result<String, CaptionError> {
        info!(
            endpoint = %self.endpoint,
            filename = %upload.filename,
            size_bytes = upload.bytes.len(),
            "uploading image for captioning"
        );
        let form = Self::build_form(upload)?;

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(CaptionError::Transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(CaptionError::Transport)?;
        debug!(status = status.as_u16(), body_len = body.len(), "caption endpoint responded");

        if !status.is_success() {
            return Err(ServerRejection::from_response(status.as_u16(), &body).into());
        }
        parse_caption(&body)
    }
}

/// Pulls the caption out of a success body. An empty caption means "no
/// caption" and is rejected like a missing field.
pub fn parse_caption(body: &[u8]) -> Result<String, CaptionError> {
    let response: CaptionResponse = serde_json::from_slice(body)
        .map_err(|e| CaptionError::MalformedPayload(e.to_string()))?;
    if response.caption.trim().is_empty() {
        return Err(CaptionError::MalformedPayload(
            "caption field is empty".to_string(),
        ));
    }
    Ok(response.caption)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
