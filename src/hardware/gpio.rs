use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::types::AutoscanError;

pub const GPIO_BASE_PATH: &str = "/sys/class/gpio";

const SETTLE_STEP: Duration = Duration::from_millis(50);
const SETTLE_LIMIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The sysfs GPIO interface rooted at `base` (normally `/sys/class/gpio`).
#[derive(Debug, Clone)]
pub struct Gpio {
    base: PathBuf,
}

impl Gpio {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.base.join(format!("gpio{pin}"))
    }

    /// Export `pin` and wait for udev to create its `direction` and `value`
    /// files.
    pub async fn export(&self, pin: u32) -> Result<(), AutoscanError> {
        let dir = self.pin_dir(pin);
        if exists(&dir.join("value")).await {
            debug!(pin, "GPIO pin already exported");
        } else {
            fs::write(self.base.join("export"), format!("{pin}\n"))
                .await
                .map_err(|err| AutoscanError::Gpio(format!("export({pin}): {err}")))?;
        }

        let deadline = Instant::now() + SETTLE_LIMIT;
        loop {
            if exists(&dir.join("direction")).await && exists(&dir.join("value")).await {
                return Ok(());
            }
            if Instant::now() > deadline {
                return Err(AutoscanError::Gpio(format!(
                    "export({pin}): {} did not appear",
                    dir.display()
                )));
            }
            sleep(SETTLE_STEP).await;
        }
    }

    /// Write the pin direction, retrying while the file is not yet writable,
    /// then wait until the kernel reports it back.
    pub async fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), AutoscanError> {
        let path = self.pin_dir(pin).join("direction");
        let deadline = Instant::now() + SETTLE_LIMIT;
        loop {
            match fs::write(&path, format!("{direction}\n")).await {
                Ok(()) => break,
                Err(err) if Instant::now() > deadline => {
                    return Err(AutoscanError::Gpio(format!(
                        "setDirection({pin}, {direction}): {err}"
                    )));
                }
                Err(err) => {
                    debug!(pin, error = %err, "GPIO direction not writable yet");
                    sleep(SETTLE_STEP).await;
                }
            }
        }

        loop {
            let current = fs::read_to_string(&path).await.map_err(|err| {
                AutoscanError::Gpio(format!("setDirection({pin}, {direction}): {err}"))
            })?;
            if current.trim_end() == direction.as_str() {
                return Ok(());
            }
            if Instant::now() > deadline {
                return Err(AutoscanError::Gpio(format!(
                    "setDirection({pin}, {direction}): direction is still {:?}",
                    current.trim_end()
                )));
            }
            sleep(SETTLE_STEP).await;
        }
    }

    pub async fn input(&self, pin: u32) -> Result<InputPin, AutoscanError> {
        self.export(pin).await?;
        self.set_direction(pin, Direction::In).await?;
        Ok(InputPin {
            pin,
            value: self.pin_dir(pin).join("value"),
        })
    }

    pub async fn output(&self, pin: u32) -> Result<OutputPin, AutoscanError> {
        self.export(pin).await?;
        self.set_direction(pin, Direction::Out).await?;
        Ok(OutputPin {
            pin,
            value: self.pin_dir(pin).join("value"),
        })
    }
}

async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

#[derive(Debug, Clone)]
pub struct InputPin {
    pin: u32,
    value: PathBuf,
}

impl InputPin {
    pub fn number(&self) -> u32 {
        self.pin
    }

    /// A pin reading `1` is pressed.
    pub async fn is_high(&self) -> Result<bool, AutoscanError> {
        let value = fs::read_to_string(&self.value)
            .await
            .map_err(|err| AutoscanError::Gpio(format!("reading pin {}: {err}", self.pin)))?;
        Ok(value.starts_with('1'))
    }
}

#[derive(Debug, Clone)]
pub struct OutputPin {
    pin: u32,
    value: PathBuf,
}

impl OutputPin {
    pub fn number(&self) -> u32 {
        self.pin
    }

    pub async fn set(&self, high: bool) -> Result<(), AutoscanError> {
        let level = if high { "1\n" } else { "0\n" };
        fs::write(&self.value, level)
            .await
            .map_err(|err| AutoscanError::Gpio(format!("writing pin {}: {err}", self.pin)))
    }
}
