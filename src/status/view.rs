use std::fmt;

use serde::Serialize;

use super::record::StatusRecord;

/// Display style classes applied to the status area.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Msg,
    Success,
    Fail,
    Active,
}

impl StatusClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::Msg => "msg",
            StatusClass::Success => "success",
            StatusClass::Fail => "fail",
            StatusClass::Active => "active",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text and class list for one rendering of the status area.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub text: String,
    pub classes: Vec<StatusClass>,
}

impl StatusView {
    pub fn render(record: &StatusRecord) -> Self {
        if !record.is_idle() {
            return Self::new(format!("{}...", record.state), StatusClass::Active);
        }

        match record.last_failure() {
            Some(reason) => Self::new(format!("Last scan FAILED: {reason}"), StatusClass::Fail),
            None => Self::new("Last scan succeeded", StatusClass::Success),
        }
    }

    fn new(text: impl Into<String>, style: StatusClass) -> Self {
        Self {
            text: text.into(),
            classes: vec![StatusClass::Msg, style],
        }
    }

    pub fn has_class(&self, class: StatusClass) -> bool {
        self.classes.contains(&class)
    }

    /// Space separated, as it would appear in a `class` attribute.
    pub fn class_list(&self) -> String {
        self.classes
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_without_failure_is_success() {
        let view = StatusView::render(&StatusRecord::new("IDLE", ""));
        assert_eq!(view.text, "Last scan succeeded");
        assert!(view.has_class(StatusClass::Success));
        assert!(!view.has_class(StatusClass::Active));
        assert_eq!(view.class_list(), "msg success");
    }

    #[test]
    fn idle_with_failure_shows_reason() {
        let view = StatusView::render(&StatusRecord::new("IDLE", "disk full"));
        assert_eq!(view.text, "Last scan FAILED: disk full");
        assert!(view.has_class(StatusClass::Fail));
        assert!(!view.has_class(StatusClass::Success));
    }

    #[test]
    fn any_other_state_is_in_progress() {
        for state in ["SCANNING", "CONVERTING", "UPLOADING", "SOMETHING_NEW"] {
            let view = StatusView::render(&StatusRecord::new(state, "stale failure"));
            assert_eq!(view.text, format!("{state}..."));
            assert_eq!(view.class_list(), "msg active");
        }
    }
}
