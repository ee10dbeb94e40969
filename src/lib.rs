//! Press a button, get a scanned document in Google Drive.
//!
//! `autoscan` drives a document scanner attached to a small Linux box: a
//! [`backend::Backend`] runs scan rounds, the [`web`] UI and the physical
//! UIs in [`hardware`] start them, and the [`status`] pollers follow their
//! progress through `api/status`.

pub mod backend;
pub mod config;
pub mod drive;
pub mod hardware;
pub mod logging;
pub mod status;
pub mod types;
pub mod web;

pub use types::AutoscanError;
