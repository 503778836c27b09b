//! Usecase layer: application workflows + events.

pub mod editor;
pub mod event;
pub mod history;
pub mod stats;
pub mod validate;
