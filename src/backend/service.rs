use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::status::StatusRecord;
use crate::types::AutoscanError;

use super::state::ScanState;
use super::tools::ScanTools;
use super::ui::{Ui, UiMessage};
use super::upload::Uploader;

/// Runs scan rounds and tracks their outcome.
pub struct Backend {
    tools: ScanTools,
    uploader: Arc<dyn Uploader>,
    ui: Arc<dyn Ui>,
    // Read by every UI, written by the running round.
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    state: ScanState,
    last_fail: Option<String>,
}

impl Backend {
    pub fn new(tools: ScanTools, uploader: Arc<dyn Uploader>, ui: Arc<dyn Ui>) -> Self {
        Self {
            tools,
            uploader,
            ui,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state and last failure. Both are meaningful at all times.
    pub fn status(&self) -> StatusRecord {
        let inner = self.inner();
        StatusRecord::new(
            inner.state.as_str(),
            inner.last_fail.clone().unwrap_or_default(),
        )
    }

    pub fn state(&self) -> ScanState {
        self.inner().state
    }

    pub fn announce(&self, message: &UiMessage) {
        self.ui.show(message);
    }

    /// Run one scan round (scan, convert, upload).
    /// If a round is already running, return `Busy` and do nothing.
    pub async fn run(&self, duplex: bool) -> Result<(), AutoscanError> {
        info!(duplex, "Scan run triggered");
        self.begin()?;

        let sides = if duplex { "Double sided" } else { "Single sided" };
        self.announce(&UiMessage::active("Scanning...", sides));

        let result = self.round(duplex).await;
        self.finish(result.as_ref().err());
        result
    }

    fn begin(&self) -> Result<(), AutoscanError> {
        let mut inner = self.inner();
        if inner.state != ScanState::Idle {
            return Err(AutoscanError::Busy(inner.state));
        }
        inner.state = ScanState::Scanning;
        inner.last_fail = None;
        Ok(())
    }

    fn enter(&self, state: ScanState, headline: &str) {
        self.inner().state = state;
        self.announce(&UiMessage::active(headline, ""));
    }

    async fn round(&self, duplex: bool) -> Result<(), AutoscanError> {
        let workdir = tempfile::Builder::new()
            .prefix("autoscan-")
            .tempdir()
            .map_err(|err| AutoscanError::Scan(format!("creating tempdir: {err}")))?;

        let result = self.process(duplex, workdir.path()).await;

        info!(path = %workdir.path().display(), "Deleting temp dir");
        if let Err(err) = workdir.close() {
            warn!(error = %err, "Failed to delete temp dir");
        }
        result
    }

    async fn process(&self, duplex: bool, dir: &Path) -> Result<(), AutoscanError> {
        self.tools.scan(duplex, dir).await?;

        self.enter(ScanState::Converting, "Converting...");
        let pages = self.tools.convert(dir).await?;
        info!(pages, "Converted pages");

        self.enter(ScanState::Uploading, "Uploading...");
        self.uploader.upload(dir).await
    }

    fn finish(&self, error: Option<&AutoscanError>) {
        let message = {
            let mut inner = self.inner();
            inner.state = ScanState::Idle;
            match error {
                Some(err) => {
                    warn!(error = %err, "Scan run failed");
                    let reason = err.to_string();
                    inner.last_fail = Some(reason.clone());
                    UiMessage::failed("Failed!", reason)
                }
                None => {
                    info!("Scan run succeeded");
                    UiMessage::idle("Ready", "Last scan succeeded")
                }
            }
        };
        self.announce(&message);
    }
}
