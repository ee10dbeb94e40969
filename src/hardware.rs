//! Physical UIs for a scanner box: sysfs GPIO buttons and bi-colour LEDs,
//! and the Adafruit 16x2 LCD plate.

mod buttons;
mod gpio;
mod lcd;
mod leds;

pub use buttons::{Button, Buttons};
pub use gpio::{Direction, Gpio, InputPin, OutputPin, GPIO_BASE_PATH};
pub use lcd::{lcd_line, Lcd, LcdKeys, LcdUi};
pub use leds::{LedController, LedMode, LedState, LedUi};
