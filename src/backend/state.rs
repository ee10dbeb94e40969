use std::fmt;

use serde::Serialize;

/// What the backend is doing.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
    Converting,
    Uploading,
}

impl ScanState {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanState::Idle => "IDLE",
            ScanState::Scanning => "SCANNING",
            ScanState::Converting => "CONVERTING",
            ScanState::Uploading => "UPLOADING",
        }
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
