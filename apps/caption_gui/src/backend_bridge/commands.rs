//! Commands queued from the UI to the caption worker.

use client_core::{CaptionJob, ImageUpload};
use shared::domain::RequestSeq;

pub enum BackendCommand {
    GenerateCaption { seq: RequestSeq, upload: ImageUpload },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerateCaption { .. } => "generate_caption",
        }
    }
}

impl From<CaptionJob> for BackendCommand {
    fn from(job: CaptionJob) -> Self {
        Self::GenerateCaption {
            seq: job.seq,
            upload: job.upload,
        }
    }
}
