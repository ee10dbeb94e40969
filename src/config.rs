mod credentials;
mod loader;
mod paths;
mod types;

pub use credentials::DriveCredentials;
pub use paths::{get_config_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
pub use types::{Config, GpioConfig, LcdConfig, PollConfig};
