use thiserror::Error;

use crate::backend::ScanState;

#[derive(Debug, Error)]
pub enum AutoscanError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Status(String),
    #[error("{0}")]
    Scan(String),
    #[error("drive error: {0}")]
    Drive(String),
    #[error("oauth error: {0}")]
    OAuth(String),
    #[error("web server error: {0}")]
    Web(String),
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("state not idle, can't start scan now. state: {0}")]
    Busy(ScanState),
}
