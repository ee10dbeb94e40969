use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat};
use tokio::fs;
use tracing::info;

use crate::backend::Uploader;
use crate::types::AutoscanError;

use super::client::{DriveClient, FileMetadata, ParentReference};

const PAGE_MIME_TYPE: &str = "image/jpeg";

/// Uploads each scan round into its own timestamped Drive folder.
pub struct DriveUploader {
    client: DriveClient,
    parent_folder: String,
}

impl DriveUploader {
    pub fn new(client: DriveClient, parent_folder: impl Into<String>) -> Self {
        Self {
            client,
            parent_folder: parent_folder.into(),
        }
    }

    pub fn folder_title(now: DateTime<Local>) -> String {
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn page_metadata(folder: &str, folder_title: &str, file_name: &str) -> FileMetadata {
        FileMetadata {
            title: format!("Scan {folder_title} {file_name}"),
            description: Some(format!("Scanned by autoscan on {folder_title}")),
            parents: vec![ParentReference {
                id: folder.to_string(),
            }],
            mime_type: PAGE_MIME_TYPE.to_string(),
        }
    }
}

#[async_trait]
impl Uploader for DriveUploader {
    async fn upload(&self, dir: &Path) -> Result<(), AutoscanError> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|err| AutoscanError::Drive(format!("readDir({}): {err}", dir.display())))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        let title = Self::folder_title(Local::now());
        let folder = self
            .client
            .create_folder(&title, &self.parent_folder)
            .await
            .map_err(|err| AutoscanError::Drive(format!("creating Drive folder: {err}")))?;

        for path in &files {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let metadata = Self::page_metadata(&folder.id, &title, &file_name);
            info!(file = %file_name, title = %metadata.title, "Uploading");
            self.client
                .upload_file(path, &metadata)
                .await
                .map_err(|err| {
                    AutoscanError::Drive(format!(
                        "uploading {} as {:?}: {err}",
                        path.display(),
                        metadata.title
                    ))
                })?;
        }

        Ok(())
    }
}
