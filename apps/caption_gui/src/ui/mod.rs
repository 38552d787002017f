//! UI layer: the caption window and its image preview host.

pub mod app;
pub mod preview;

pub use app::{CaptionApp, APP_TITLE};
