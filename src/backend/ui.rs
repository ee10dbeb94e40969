use std::sync::Arc;

use tracing::info;

/// Overall tone of a message, mapped to colours by physical UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Idle,
    Active,
    Failed,
}

/// A two-line message for physical UIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiMessage {
    pub tone: Tone,
    pub headline: String,
    pub detail: String,
}

impl UiMessage {
    pub fn new(tone: Tone, headline: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            tone,
            headline: headline.into(),
            detail: detail.into(),
        }
    }

    pub fn idle(headline: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Tone::Idle, headline, detail)
    }

    pub fn active(headline: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Tone::Active, headline, detail)
    }

    pub fn failed(headline: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Tone::Failed, headline, detail)
    }
}

/// A physical UI for autoscan. Implementations must not block.
pub trait Ui: Send + Sync {
    fn show(&self, message: &UiMessage);
}

/// Writes UI messages to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogUi;

impl Ui for LogUi {
    fn show(&self, message: &UiMessage) {
        info!(
            tone = ?message.tone,
            headline = %message.headline,
            detail = %message.detail,
            "UI message"
        );
    }
}

/// Fans every message out to all sinks.
#[derive(Default, Clone)]
pub struct UiSet {
    sinks: Vec<Arc<dyn Ui>>,
}

impl UiSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Arc<dyn Ui>) {
        self.sinks.push(sink);
    }

    pub fn with(mut self, sink: Arc<dyn Ui>) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Ui for UiSet {
    fn show(&self, message: &UiMessage) {
        for sink in &self.sinks {
            sink.show(message);
        }
    }
}
