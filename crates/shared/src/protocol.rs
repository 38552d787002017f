use serde::{Deserialize, Serialize};

pub const GENERATE_CAPTION_PATH: &str = "/generate-caption";
pub const UPLOAD_FIELD_NAME: &str = "file";
pub const DEFAULT_ENDPOINT_BASE: &str = "http://127.0.0.1:5000";
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Success body of `POST /generate-caption`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
}
