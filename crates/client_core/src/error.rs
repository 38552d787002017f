use shared::error::ServerRejection;
use thiserror::Error;

/// Everything that can go wrong between handing an image to the caption
/// endpoint and reading a caption back. The controller collapses all of these
/// into one user-facing message; the variants exist for logs and tests.
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("invalid caption endpoint url '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("could not build upload for '{filename}': {source}")]
    InvalidUpload {
        filename: String,
        source: reqwest::Error,
    },
    #[error("caption endpoint unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("caption worker unavailable: {0}")]
    WorkerUnavailable(String),
    #[error("caption endpoint rejected the upload: {0}")]
    Status(#[from] ServerRejection),
    #[error("malformed caption payload: {0}")]
    MalformedPayload(String),
}

impl CaptionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(rejection) => Some(rejection.status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::WorkerUnavailable(_))
    }
}
