//! Upload lifecycle for a single image-to-caption request.
//!
//! The controller is a plain synchronous state machine. It never performs I/O
//! itself: `submit` hands back a [`CaptionJob`] for the caller to run against a
//! [`CaptionService`](crate::CaptionService), and the result is fed back in via
//! [`UploadController::complete`]. Local resources (file bytes, previews) are
//! reached only through the injected [`PreviewHost`].

use anyhow::Result;
use shared::domain::{RequestSeq, RequestState};
use tracing::{debug, info, warn};

use crate::{error::CaptionError, ImageUpload};

pub const MISSING_FILE_MESSAGE: &str = "Please select an image to upload.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Error generating caption. Please try again.";
pub const UNREADABLE_FILE_MESSAGE: &str = "Could not read the selected image.";

/// An image the user picked, fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    fn to_upload(&self) -> ImageUpload {
        ImageUpload {
            filename: self.name.clone(),
            mime_type: self.mime_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// Local capabilities the controller needs from its environment.
pub trait PreviewHost {
    /// Whatever the selection surface hands over: a path, dropped bytes, ...
    type Handle;
    /// A live, revocable preview resource.
    type Preview;

    fn acquire_file(&mut self, handle: &Self::Handle) -> Result<SelectedFile>;
    fn create_preview(&mut self, file: &SelectedFile) -> Result<Self::Preview>;
    fn revoke_preview(&mut self, preview: Self::Preview);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Caption(String),
    Error(&'static str),
}

/// The single message area: a caption, an error, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSlot<'a> {
    Empty,
    Caption(&'a str),
    Error(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionJob {
    pub seq: RequestSeq,
    pub upload: ImageUpload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Dispatched(CaptionJob),
    MissingFile,
    AlreadySubmitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(RequestState),
    Stale,
}

pub struct UploadController<H: PreviewHost> {
    host: H,
    selected: Option<SelectedFile>,
    preview: Option<H::Preview>,
    state: RequestState,
    outcome: Option<Outcome>,
    last_seq: RequestSeq,
    in_flight: Option<RequestSeq>,
}

impl<H: PreviewHost> UploadController<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            selected: None,
            preview: None,
            state: RequestState::Idle,
            outcome: None,
            last_seq: RequestSeq(0),
            in_flight: None,
        }
    }

    /// Replaces the selection. `None` leaves everything untouched.
    ///
    /// A file that cannot be read keeps the previous selection and shows
    /// [`UNREADABLE_FILE_MESSAGE`]; the cause is returned for logging.
    pub fn select_file(&mut self, handle: Option<&H::Handle>) -> Result<()> {
        let Some(handle) = handle else {
            return Ok(());
        };

        let file = match self.host.acquire_file(handle) {
            Ok(file) => file,
            Err(err) => {
                self.outcome = Some(Outcome::Error(UNREADABLE_FILE_MESSAGE));
                return Err(err.context("failed to acquire selected image"));
            }
        };

        if let Some(previous) = self.preview.take() {
            self.host.revoke_preview(previous);
        }
        self.preview = match self.host.create_preview(&file) {
            Ok(preview) => Some(preview),
            Err(err) => {
                warn!(file = %file.name, "preview unavailable: {err:#}");
                None
            }
        };

        if let Some(orphaned) = self.in_flight.take() {
            debug!(seq = orphaned.0, "selection replaced while submitting; response will be ignored");
        }
        info!(file = %file.name, size_bytes = file.bytes.len(), "image selected");
        self.selected = Some(file);
        self.outcome = None;
        self.state = RequestState::Idle;
        Ok(())
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if self.state.is_submitting() {
            return SubmitOutcome::AlreadySubmitting;
        }
        let Some(file) = &self.selected else {
            self.outcome = Some(Outcome::Error(MISSING_FILE_MESSAGE));
            return SubmitOutcome::MissingFile;
        };

        let upload = file.to_upload();
        self.last_seq = self.last_seq.next();
        let seq = self.last_seq;
        self.in_flight = Some(seq);
        self.state = RequestState::Submitting;
        self.outcome = None;
        info!(seq = seq.0, file = %upload.filename, "caption submission started");
        SubmitOutcome::Dispatched(CaptionJob { seq, upload })
    }

    /// Applies the result of job `seq`. Anything but the latest in-flight job
    /// is dropped.
    pub fn complete(&mut self, seq: RequestSeq, result: Result<String, CaptionError>) -> Completion {
        if self.in_flight != Some(seq) {
            debug!(seq = seq.0, "ignoring stale caption response");
            return Completion::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(caption) => {
                info!(seq = seq.0, "caption received");
                self.outcome = Some(Outcome::Caption(caption));
                self.state = RequestState::Succeeded;
            }
            Err(err) => {
                warn!(seq = seq.0, "caption request failed: {err}");
                self.outcome = Some(Outcome::Error(GENERIC_FAILURE_MESSAGE));
                self.state = RequestState::Failed;
            }
        }
        Completion::Applied(self.state)
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && !self.state.is_submitting()
    }

    pub fn message(&self) -> MessageSlot<'_> {
        match &self.outcome {
            None => MessageSlot::Empty,
            Some(Outcome::Caption(caption)) => MessageSlot::Caption(caption),
            Some(Outcome::Error(message)) => MessageSlot::Error(message),
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self.message() {
            MessageSlot::Caption(caption) => Some(caption),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.message() {
            MessageSlot::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&H::Preview> {
        self.preview.as_ref()
    }

    pub fn in_flight(&self) -> Option<RequestSeq> {
        self.in_flight
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: PreviewHost> Drop for UploadController<H> {
    fn drop(&mut self) {
        if let Some(preview) = self.preview.take() {
            self.host.revoke_preview(preview);
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
