use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::types::AutoscanError;

/// Google Drive credentials, stored as four lines:
/// client id, client secret, refresh token, parent folder id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub parent_folder: String,
}

impl DriveCredentials {
    pub fn parse(contents: &str) -> Result<Self, AutoscanError> {
        let trimmed = contents.trim_matches(|c| c == '\n' || c == '\r' || c == ' ');
        let lines: Vec<&str> = trimmed.splitn(4, '\n').map(str::trim).collect();
        let &[client_id, client_secret, refresh_token, parent_folder] = lines.as_slice() else {
            return Err(AutoscanError::Config(format!(
                "credentials file has {} lines, expected 4",
                lines.len()
            )));
        };

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
            parent_folder: parent_folder.to_string(),
        })
    }

    pub async fn load(path: &Path) -> Result<Self, AutoscanError> {
        let contents = fs::read_to_string(path).await.map_err(|err| {
            AutoscanError::Config(format!(
                "Failed to read credentials {}: {err}",
                path.display()
            ))
        })?;
        Self::parse(&contents)
    }

    pub fn to_file_contents(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n",
            self.client_id, self.client_secret, self.refresh_token, self.parent_folder
        )
    }

    /// Write the credentials readable by the owner only.
    pub async fn save(&self, path: &Path) -> Result<(), AutoscanError> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await?;
        file.write_all(self.to_file_contents().as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
