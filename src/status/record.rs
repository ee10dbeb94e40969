use serde::{Deserialize, Serialize};

/// `State` value reported while no scan is in progress.
pub const IDLE_STATE: &str = "IDLE";

/// Snapshot served by `api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(rename = "State")]
    pub state: String,

    /// Empty when the last round succeeded.
    #[serde(rename = "LastFail", default)]
    pub last_fail: String,
}

impl StatusRecord {
    pub fn new(state: impl Into<String>, last_fail: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            last_fail: last_fail.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(IDLE_STATE, "")
    }

    pub fn is_idle(&self) -> bool {
        self.state == IDLE_STATE
    }

    pub fn last_failure(&self) -> Option<&str> {
        if self.last_fail.is_empty() {
            None
        } else {
            Some(self.last_fail.as_str())
        }
    }
}
