use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "autoscan.json";
pub const CONFIG_ENV_VAR: &str = "AUTOSCAN_CONFIG";

/// Resolve the path of autoscan.json.
///
/// An explicit path wins, then `AUTOSCAN_CONFIG`, then the install root
/// (parent of the directory holding the executable), then the working directory.
pub fn get_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(value) = env::var(CONFIG_ENV_VAR) {
        if !value.trim().is_empty() {
            return PathBuf::from(value.trim());
        }
    }

    // Executable is at: install_root/bin/autoscan
    // Config should be at: install_root/autoscan.json
    if let Ok(exe_path) = env::current_exe() {
        debug!(path = %exe_path.display(), "Executable path detected");
        if let Some(install_root) = exe_path.parent().and_then(Path::parent) {
            let candidate = install_root.join(CONFIG_FILE_NAME);
            debug!(path = %candidate.display(), "Looking for config");
            if candidate.exists() {
                return candidate;
            }
        }
    }

    PathBuf::from(CONFIG_FILE_NAME)
}
