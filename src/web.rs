//! Web UI: HTML pages, the scan trigger, and the `api/status` endpoint the
//! pollers read.

mod pages;
mod routes;

pub use routes::{bind, routes, ScanRequest};
