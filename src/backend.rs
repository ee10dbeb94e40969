//! The scanning backend: one scan round at a time (scan, convert, upload),
//! with its state and last failure readable by every UI.
//!
//! Physical UIs receive [`UiMessage`]s through the [`Ui`] trait; the web UI
//! and the pollers read [`Backend::status`].

mod service;
mod state;
pub(crate) mod tools;
mod ui;
mod upload;

pub use service::Backend;
pub use state::ScanState;
pub use tools::{ScanTools, SCANIMAGE_FEEDER_EMPTY};
pub use ui::{LogUi, Tone, Ui, UiMessage, UiSet};
pub use upload::Uploader;
