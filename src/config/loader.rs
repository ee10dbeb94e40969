use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::types::AutoscanError;

use super::{paths, Config};

impl Config {
    /// Load configuration from autoscan.json.
    /// Falls back to defaults if the file doesn't exist or can't be parsed
    pub async fn load(explicit: Option<&Path>) -> Self {
        let config_path = paths::get_config_path(explicit);
        match Self::load_from(&config_path).await {
            Ok(config) => {
                info!(
                    path = %config_path.display(),
                    listen = %config.listen,
                    "Loaded configuration"
                );
                config
            }
            Err(err) => {
                warn!(error = %err, "Failed to load configuration, using defaults");
                Self::default()
            }
        }
    }

    pub async fn load_from(config_path: &Path) -> Result<Self, AutoscanError> {
        if !config_path.exists() {
            warn!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path).await.map_err(|err| {
            AutoscanError::Config(format!(
                "Failed to read {}: {err}",
                config_path.display()
            ))
        })?;

        serde_json::from_str(&contents).map_err(|err| {
            AutoscanError::Config(format!(
                "Failed to parse {}: {err}",
                config_path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(config.scanimage, "scanimage");
    }

    #[tokio::test]
    async fn invalid_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autoscan.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).await.unwrap_err();
        assert!(matches!(err, AutoscanError::Config(_)));

        // The lenient entry point swallows the error.
        let config = Config::load(Some(&path)).await;
        assert_eq!(config.listen, "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn reads_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autoscan.json");
        std::fs::write(
            &path,
            r#"{"listen": "127.0.0.1:9000", "scanimage": "/usr/local/bin/scanimage-wrap"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.scanimage, "/usr/local/bin/scanimage-wrap");
        assert_eq!(config.convert, "convert");
    }
}
