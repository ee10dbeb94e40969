use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the autoscan service and its clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    #[serde(default = "default_scanimage")]
    pub scanimage: String,

    #[serde(default = "default_convert")]
    pub convert: String,

    /// Base URL used by `watch`, `status` and `scan`.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub gpio: GpioConfig,

    #[serde(default)]
    pub lcd: LcdConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: None,
            credentials_path: default_credentials_path(),
            scanimage: default_scanimage(),
            convert: default_convert(),
            server_url: default_server_url(),
            poll: PollConfig::default(),
            gpio: GpioConfig::default(),
            lcd: LcdConfig::default(),
        }
    }
}

/// Poller cadence, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_controls_interval_ms")]
    pub controls_interval_ms: u64,

    #[serde(default = "default_status_idle_ms")]
    pub status_idle_ms: u64,

    #[serde(default = "default_status_active_ms")]
    pub status_active_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            controls_interval_ms: default_controls_interval_ms(),
            status_idle_ms: default_status_idle_ms(),
            status_active_ms: default_status_active_ms(),
        }
    }
}

impl PollConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn controls_interval(&self) -> Duration {
        Duration::from_millis(self.controls_interval_ms)
    }

    pub fn status_idle(&self) -> Duration {
        Duration::from_millis(self.status_idle_ms)
    }

    pub fn status_active(&self) -> Duration {
        Duration::from_millis(self.status_active_ms)
    }
}

/// Raspberry Pi GPIO wiring. Pin numbers are sysfs GPIO numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpioConfig {
    #[serde(default = "default_gpio_base_path")]
    pub base_path: PathBuf,

    #[serde(default)]
    pub use_buttons: bool,

    #[serde(default)]
    pub use_leds: bool,

    #[serde(default = "default_pin_single")]
    pub pin_single: u32,

    #[serde(default = "default_pin_duplex")]
    pub pin_duplex: u32,

    #[serde(default = "default_pin_ack")]
    pub pin_ack: u32,

    #[serde(default = "default_pin_reboot")]
    pub pin_reboot: u32,

    /// Status LED, blinks while the service is running.
    #[serde(default = "default_pin_led1")]
    pub pin_led1: [u32; 2],

    /// Progress LED, shows the last result or blinks while scanning.
    #[serde(default = "default_pin_led2")]
    pub pin_led2: [u32; 2],
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            base_path: default_gpio_base_path(),
            use_buttons: false,
            use_leds: false,
            pin_single: default_pin_single(),
            pin_duplex: default_pin_duplex(),
            pin_ack: default_pin_ack(),
            pin_reboot: default_pin_reboot(),
            pin_led1: default_pin_led1(),
            pin_led2: default_pin_led2(),
        }
    }
}

impl GpioConfig {
    pub fn button_pins(&self) -> [u32; 4] {
        [self.pin_single, self.pin_duplex, self.pin_ack, self.pin_reboot]
    }
}

/// Adafruit 16x2 LCD plate, driven through a helper process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LcdConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_lcd_binary")]
    pub binary: PathBuf,
}

impl Default for LcdConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            binary: default_lcd_binary(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(".autoscan")
}

fn default_scanimage() -> String {
    "scanimage".to_string()
}

fn default_convert() -> String {
    "convert".to_string()
}

fn default_server_url() -> String {
    "http://127.0.0.1:8080/".to_string()
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_controls_interval_ms() -> u64 {
    1000
}

fn default_status_idle_ms() -> u64 {
    1000
}

fn default_status_active_ms() -> u64 {
    500
}

fn default_gpio_base_path() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_pin_single() -> u32 {
    5
}

fn default_pin_duplex() -> u32 {
    6
}

fn default_pin_ack() -> u32 {
    24
}

fn default_pin_reboot() -> u32 {
    25
}

fn default_pin_led1() -> [u32; 2] {
    [27, 23]
}

fn default_pin_led2() -> [u32; 2] {
    [17, 22]
}

fn default_lcd_binary() -> PathBuf {
    PathBuf::from("/opt/autoscan/bin/lcd.py")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.poll.initial_delay(), Duration::from_millis(100));
        assert_eq!(config.poll.controls_interval(), Duration::from_millis(1000));
        assert_eq!(config.poll.status_idle(), Duration::from_millis(1000));
        assert_eq!(config.poll.status_active(), Duration::from_millis(500));
        assert_eq!(config.gpio.button_pins(), [5, 6, 24, 25]);
        assert!(!config.lcd.enabled);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"poll": {"status_active_ms": 250}, "gpio": {"use_leds": true, "pin_led2": [4, 18]}}"#,
        )
        .unwrap();
        assert_eq!(config.poll.status_active_ms, 250);
        assert_eq!(config.poll.status_idle_ms, 1000);
        assert!(config.gpio.use_leds);
        assert_eq!(config.gpio.pin_led1, [27, 23]);
        assert_eq!(config.gpio.pin_led2, [4, 18]);
    }
}
