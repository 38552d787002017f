//! Controller layer: UI events and command dispatch toward the caption worker.

pub mod events;
pub mod orchestration;
