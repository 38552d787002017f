use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => Self::Validation,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

/// Error body the captioning endpoint sends with 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{code:?} ({status}): {}", detail.as_deref().unwrap_or("no detail"))]
pub struct ServerRejection {
    pub status: u16,
    pub code: ErrorCode,
    pub detail: Option<String>,
}

impl ServerRejection {
    /// Builds a rejection from a non-success status and its raw body. The body
    /// is only mined for the `error` field; anything else is dropped.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<ApiError>(body)
            .ok()
            .map(|api| api.error)
            .filter(|detail| !detail.trim().is_empty());
        Self {
            status,
            code: ErrorCode::from_status(status),
            detail,
        }
    }
}
