use std::io::{self, Stdout, Write};

use tracing::warn;

use super::surface::{ControlSurface, StatusDisplay};
use super::view::StatusView;

/// Prints scan control availability whenever it changes.
pub struct TerminalControls<W = Stdout> {
    out: W,
    enabled: Option<bool>,
}

impl TerminalControls<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalControls<W> {
    pub fn new(out: W) -> Self {
        Self { out, enabled: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ControlSurface for TerminalControls<W> {
    fn set_controls_enabled(&mut self, enabled: bool) {
        if self.enabled == Some(enabled) {
            return;
        }
        self.enabled = Some(enabled);
        let label = if enabled { "enabled" } else { "disabled" };
        if let Err(err) = writeln!(self.out, "scan buttons {label}") {
            warn!(error = %err, "Failed to write control state");
        }
    }
}

/// Prints the rendered status line whenever it changes.
pub struct TerminalDisplay<W = Stdout> {
    out: W,
    last: Option<StatusView>,
}

impl TerminalDisplay<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn format_line(view: &StatusView) -> String {
        format!("[{}] {}", view.class_list(), view.text)
    }
}

impl<W: Write + Send> StatusDisplay for TerminalDisplay<W> {
    fn show(&mut self, view: &StatusView) {
        if self.last.as_ref() == Some(view) {
            return;
        }
        if let Err(err) = writeln!(self.out, "{}", Self::format_line(view)) {
            warn!(error = %err, "Failed to write status line");
        }
        self.last = Some(view.clone());
    }
}
