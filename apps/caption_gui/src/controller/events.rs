//! Worker-to-UI events and error modeling for the desktop front end.

use client_core::CaptionError;
use shared::domain::RequestSeq;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    CaptionFinished {
        seq: RequestSeq,
        result: Result<String, CaptionError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Selection,
    Caption,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("unsupported")
            || message_lower.contains("not an image")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("unreachable")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    /// One-line text for the status bar.
    pub fn status_line(&self) -> String {
        match self.context {
            UiErrorContext::BackendStartup => format!(
                "Caption worker failed to start ({}): {}",
                err_label(self.category),
                self.message
            ),
            UiErrorContext::Selection | UiErrorContext::Caption => {
                format!("{} error: {}", err_label(self.category), self.message)
            }
        }
    }
}
