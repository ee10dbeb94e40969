use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::config::PollConfig;

use super::record::StatusRecord;
use super::surface::{ControlSurface, StatusDisplay, StatusSource};
use super::view::StatusView;

/// Delays between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub initial: Duration,
    pub controls: Duration,
    pub status_idle: Duration,
    pub status_active: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

impl From<&PollConfig> for PollSchedule {
    fn from(config: &PollConfig) -> Self {
        Self {
            initial: config.initial_delay(),
            controls: config.controls_interval(),
            status_idle: config.status_idle(),
            status_active: config.status_active(),
        }
    }
}

impl PollSchedule {
    /// Delay after a successful status fetch. Failed fetches use `status_idle`.
    pub fn next_status_delay(&self, record: &StatusRecord) -> Duration {
        if record.is_idle() {
            self.status_idle
        } else {
            self.status_active
        }
    }
}

/// Enables the scan controls while the server is idle, disables them otherwise.
pub struct ControlPoller<S, C> {
    source: S,
    surface: C,
    schedule: PollSchedule,
}

impl<S, C> ControlPoller<S, C>
where
    S: StatusSource,
    C: ControlSurface,
{
    pub fn new(source: S, surface: C, schedule: PollSchedule) -> Self {
        Self {
            source,
            surface,
            schedule,
        }
    }

    pub fn surface(&self) -> &C {
        &self.surface
    }

    /// Fetch once, update the controls, and return the delay before the next poll.
    pub async fn poll_once(&mut self) -> Duration {
        match self.source.fetch_status().await {
            Ok(record) => self.surface.set_controls_enabled(record.is_idle()),
            Err(err) => debug!(error = %err, "Control poll failed"),
        }
        self.schedule.controls
    }

    /// Poll until the task is dropped.
    pub async fn run(mut self) {
        sleep(self.schedule.initial).await;
        loop {
            let delay = self.poll_once().await;
            sleep(delay).await;
        }
    }
}

/// Renders the status record into a status display.
pub struct StatusPoller<S, D> {
    source: S,
    display: D,
    schedule: PollSchedule,
}

impl<S, D> StatusPoller<S, D>
where
    S: StatusSource,
    D: StatusDisplay,
{
    pub fn new(source: S, display: D, schedule: PollSchedule) -> Self {
        Self {
            source,
            display,
            schedule,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Fetch once, redraw, and return the delay before the next poll.
    /// Polls faster while a scan is in progress.
    pub async fn poll_once(&mut self) -> Duration {
        match self.source.fetch_status().await {
            Ok(record) => {
                self.display.show(&StatusView::render(&record));
                self.schedule.next_status_delay(&record)
            }
            Err(err) => {
                debug!(error = %err, "Status poll failed");
                self.schedule.status_idle
            }
        }
    }

    /// Poll until the task is dropped.
    pub async fn run(mut self) {
        sleep(self.schedule.initial).await;
        loop {
            let delay = self.poll_once().await;
            sleep(delay).await;
        }
    }
}
