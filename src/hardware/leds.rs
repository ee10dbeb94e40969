use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::backend::{Tone, Ui, UiMessage};

use super::gpio::OutputPin;

const BLINK_TICK: Duration = Duration::from_millis(500);
const COMMAND_BUFFER: usize = 16;

/// Commands for a bi-colour LED. `Blink` keeps the current colour and
/// toggles it; any colour command stops blinking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    Red,
    Green,
    Off,
    Blink,
    Shutdown,
}

/// Colour and blink phase of one LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedState {
    colour: LedMode,
    blink: bool,
    blink_on: bool,
}

impl Default for LedState {
    fn default() -> Self {
        Self {
            colour: LedMode::Green,
            blink: false,
            blink_on: false,
        }
    }
}

impl LedState {
    /// Apply a command. Returns false for `Shutdown`.
    pub fn apply(&mut self, mode: LedMode) -> bool {
        match mode {
            LedMode::Shutdown => return false,
            LedMode::Blink => self.blink = true,
            colour => {
                self.blink = false;
                self.colour = colour;
            }
        }
        true
    }

    /// Advance the blink phase and return the levels of pins A and B.
    pub fn tick(&mut self) -> (bool, bool) {
        self.blink_on = !self.blink_on;
        if self.blink && !self.blink_on {
            return (false, false);
        }
        match self.colour {
            LedMode::Red => (true, false),
            LedMode::Green => (false, true),
            _ => (false, false),
        }
    }
}

pub struct LedController;

impl LedController {
    /// Drive the LED on pins `a` and `b` from a background task until
    /// `Shutdown` is sent or every sender is dropped.
    pub fn spawn(a: OutputPin, b: OutputPin) -> (mpsc::Sender<LedMode>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = tokio::spawn(async move {
            let mut state = LedState::default();
            loop {
                tokio::select! {
                    _ = sleep(BLINK_TICK) => {}
                    command = rx.recv() => {
                        let Some(mode) = command else { break };
                        if !state.apply(mode) {
                            break;
                        }
                    }
                }
                let (level_a, level_b) = state.tick();
                for (pin, level) in [(&a, level_a), (&b, level_b)] {
                    if let Err(err) = pin.set(level).await {
                        debug!(pin = pin.number(), error = %err, "LED write failed");
                    }
                }
            }
            info!(pin_a = a.number(), pin_b = b.number(), "LED controller stopped");
        });
        (tx, handle)
    }

    /// Send `Shutdown` and wait for the controller task. Returns false if
    /// the task panicked or was cancelled.
    pub async fn stop(commands: mpsc::Sender<LedMode>, task: JoinHandle<()>) -> bool {
        if commands.send(LedMode::Shutdown).await.is_err() {
            debug!("LED controller already gone");
        }
        match task.await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "LED controller did not stop cleanly");
                false
            }
        }
    }
}

/// Shows the outcome of the last round on a progress LED.
#[derive(Debug, Clone)]
pub struct LedUi {
    progress: mpsc::Sender<LedMode>,
}

impl LedUi {
    pub fn new(progress: mpsc::Sender<LedMode>) -> Self {
        Self { progress }
    }

    pub fn mode_for(tone: Tone) -> LedMode {
        match tone {
            Tone::Idle => LedMode::Green,
            Tone::Active => LedMode::Blink,
            Tone::Failed => LedMode::Red,
        }
    }
}

impl Ui for LedUi {
    fn show(&self, message: &UiMessage) {
        if let Err(err) = self.progress.try_send(Self::mode_for(message.tone)) {
            debug!(error = %err, "Dropped LED update");
        }
    }
}
