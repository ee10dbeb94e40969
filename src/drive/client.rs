use std::path::Path;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

use crate::config::DriveCredentials;
use crate::types::AutoscanError;

use super::oauth::{OAuthApp, TokenSource};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/";
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const UPLOAD_BOUNDARY: &str = "autoscan-part-boundary";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentReference {
    pub id: String,
}

/// Metadata for a Drive v2 `files.insert`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parents: Vec<ParentReference>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Minimal Drive v2 REST client.
pub struct DriveClient {
    http: Client,
    tokens: TokenSource,
    api_base: String,
}

impl DriveClient {
    pub fn new(tokens: TokenSource, http: Client) -> Self {
        Self {
            http,
            tokens,
            api_base: DRIVE_API_BASE.to_string(),
        }
    }

    /// Point the client at another server, e.g. a test double.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, AutoscanError> {
        Ok(Url::parse(&self.api_base)?.join(path)?)
    }

    /// Build a client from stored credentials and check that the refresh
    /// token still works.
    pub async fn connect(credentials: &DriveCredentials) -> Result<Self, AutoscanError> {
        let http = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(AutoscanError::Http)?;
        let app = OAuthApp::new(&credentials.client_id, &credentials.client_secret);
        let tokens = TokenSource::new(app, &credentials.refresh_token, http.clone());
        tokens.access_token().await?;
        info!("Connected to Google Drive");
        Ok(Self::new(tokens, http))
    }

    pub async fn create_folder(
        &self,
        title: &str,
        parent_id: &str,
    ) -> Result<DriveFile, AutoscanError> {
        let metadata = FileMetadata {
            title: title.to_string(),
            description: None,
            parents: vec![ParentReference {
                id: parent_id.to_string(),
            }],
            mime_type: FOLDER_MIME_TYPE.to_string(),
        };
        let url = self.endpoint("drive/v2/files")?;
        let request = self.http.post(url).json(&metadata);
        self.send_json("files.insert", request).await
    }

    /// Upload one file with its metadata in a single multipart request.
    pub async fn upload_file(
        &self,
        path: &Path,
        metadata: &FileMetadata,
    ) -> Result<DriveFile, AutoscanError> {
        let data = fs::read(path).await?;
        let metadata_json = serde_json::to_string(metadata)?;
        let body = related_body(UPLOAD_BOUNDARY, &metadata_json, &metadata.mime_type, &data);

        let mut url = self.endpoint("upload/drive/v2/files")?;
        url.query_pairs_mut().append_pair("uploadType", "multipart");
        debug!(path = %path.display(), bytes = data.len(), "Uploading file");

        let request = self
            .http
            .post(url)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={UPLOAD_BOUNDARY}"),
            )
            .body(body);
        self.send_json("files.insert (media)", request).await
    }

    async fn send_json<T>(&self, call: &str, request: RequestBuilder) -> Result<T, AutoscanError>
    where
        T: DeserializeOwned,
    {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(AutoscanError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AutoscanError::Drive(format!(
                "{call} returned {status}: {}",
                body.trim()
            )));
        }

        response.json::<T>().await.map_err(AutoscanError::Http)
    }
}

/// Body for `uploadType=multipart`: a JSON metadata part followed by the media part.
fn related_body(boundary: &str, metadata_json: &str, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + metadata_json.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata_json}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
pub(crate) mod testing {
    use reqwest::Client;

    use super::DriveClient;
    use crate::drive::oauth::{OAuthApp, TokenSource};

    /// A client whose token and API calls go to `server`.
    pub async fn client_for(server: &mut mockito::ServerGuard) -> DriveClient {
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "ya29.test", "expires_in": 3600}"#)
            .create_async()
            .await;
        let app = OAuthApp {
            token_url: format!("{}/token", server.url()),
            ..OAuthApp::new("id", "secret")
        };
        let tokens = TokenSource::new(app, "refresh", Client::new());
        DriveClient::new(tokens, Client::new()).with_api_base(format!("{}/", server.url()))
    }
}
