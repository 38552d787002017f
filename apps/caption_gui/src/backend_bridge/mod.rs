//! Bridge between the UI thread and the caption worker thread.

pub mod commands;
pub mod runtime;
