use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::types::AutoscanError;

use super::gpio::{Gpio, InputPin};
use super::leds::LedMode;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const PRESS_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Scan single-sided pages.
    Single,
    /// Scan double-sided pages.
    Duplex,
    /// Acknowledge a failure; turns the progress LED green.
    Ack,
    /// Reboot. Only logged.
    Reboot,
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Button::Single => "SINGLE",
            Button::Duplex => "DUPLEX",
            Button::Ack => "ACK",
            Button::Reboot => "REBOOT",
        })
    }
}

/// Push buttons on GPIO input pins.
pub struct Buttons {
    pins: Vec<(Button, InputPin)>,
}

impl Buttons {
    /// Open the single, duplex, ack and reboot pins, in that order.
    pub async fn open(gpio: &Gpio, pins: [u32; 4]) -> Result<Self, AutoscanError> {
        let [single, duplex, ack, reboot] = pins;
        let mut opened = Vec::with_capacity(4);
        for (button, pin) in [
            (Button::Single, single),
            (Button::Duplex, duplex),
            (Button::Ack, ack),
            (Button::Reboot, reboot),
        ] {
            let input = gpio.input(pin).await.map_err(|err| {
                AutoscanError::Gpio(format!("opening {button} pin {pin}: {err}"))
            })?;
            opened.push((button, input));
        }
        Ok(Self { pins: opened })
    }

    /// Poll until a button reads pressed. Earlier buttons win ties.
    pub async fn wait_press(&self) -> Button {
        loop {
            sleep(POLL_INTERVAL).await;
            for (button, pin) in &self.pins {
                match pin.is_high().await {
                    Ok(true) => return *button,
                    Ok(false) => {}
                    Err(err) => debug!(%button, error = %err, "Button read failed"),
                }
            }
        }
    }

    /// Handle button presses forever.
    pub async fn run(self, backend: Arc<Backend>, progress: Option<mpsc::Sender<LedMode>>) {
        info!("Starting button reading loop");
        loop {
            let button = self.wait_press().await;
            info!(%button, "Button pressed");
            match button {
                Button::Single | Button::Duplex => {
                    if let Err(err) = backend.run(button == Button::Duplex).await {
                        warn!(%button, error = %err, "Scan from button failed");
                    }
                }
                Button::Ack => {
                    if let Some(progress) = &progress {
                        if progress.send(LedMode::Green).await.is_err() {
                            debug!("Progress LED controller has stopped");
                        }
                    }
                }
                Button::Reboot => {}
            }
            sleep(PRESS_COOLDOWN).await;
        }
    }
}
