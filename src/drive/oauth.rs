use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::types::AutoscanError;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";
/// Out-of-band redirect: the consent page shows the code for pasting.
pub const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens are refreshed this long before Google says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// An installed-application OAuth2 client.
#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl OAuthApp {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Consent page asking for offline Drive access.
    pub fn authorize_url(&self) -> Result<Url, AutoscanError> {
        Ok(Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", OOB_REDIRECT),
                ("response_type", "code"),
                ("scope", DRIVE_SCOPE),
                ("access_type", "offline"),
            ],
        )?)
    }

    pub async fn exchange_code(
        &self,
        http: &Client,
        code: &str,
    ) -> Result<TokenResponse, AutoscanError> {
        self.token_request(
            http,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", OOB_REDIRECT),
            ],
        )
        .await
    }

    pub async fn refresh(
        &self,
        http: &Client,
        refresh_token: &str,
    ) -> Result<TokenResponse, AutoscanError> {
        self.token_request(
            http,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        )
        .await
    }

    async fn token_request(
        &self,
        http: &Client,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, AutoscanError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        form.extend_from_slice(params);

        let response = http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(AutoscanError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AutoscanError::OAuth(format!(
                "token endpoint returned {status}: {}",
                body.trim()
            )));
        }

        response.json().await.map_err(AutoscanError::Http)
    }
}

struct CachedToken {
    access_token: String,
    refresh_at: Option<Instant>,
}

/// Hands out access tokens, refreshing them from a long-lived refresh token.
pub struct TokenSource {
    app: OAuthApp,
    refresh_token: String,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(app: OAuthApp, refresh_token: impl Into<String>, http: Client) -> Self {
        Self {
            app,
            refresh_token: refresh_token.into(),
            http,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, AutoscanError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            let fresh = token
                .refresh_at
                .map(|at| Instant::now() < at)
                .unwrap_or(true);
            if fresh {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Refreshing Drive access token");
        let response = self.app.refresh(&self.http, &self.refresh_token).await?;
        let refresh_at = response
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN));
        let access_token = response.access_token.clone();
        *cached = Some(CachedToken {
            access_token: response.access_token,
            refresh_at,
        });
        Ok(access_token)
    }
}
