use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::types::AutoscanError;

use super::record::StatusRecord;
use super::surface::StatusSource;

/// Relative path of the status endpoint, resolved against the base URL.
pub const STATUS_PATH: &str = "api/status";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// HTTP client for a running autoscan server.
#[derive(Clone)]
pub struct StatusClient {
    http: Client,
    base_url: Url,
}

impl StatusClient {
    pub fn new(base_url: &str) -> Result<Self, AutoscanError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(AutoscanError::Http)?;

        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` the way a browser resolves a relative link on the page
    /// at the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, AutoscanError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn status(&self) -> Result<StatusRecord, AutoscanError> {
        self.get_json(STATUS_PATH).await
    }

    /// Ask the server to start a scan round.
    pub async fn trigger_scan(&self, duplex: bool) -> Result<(), AutoscanError> {
        let url = self.endpoint("scan")?;
        let field = if duplex { "double" } else { "single" };
        let response = self
            .http
            .post(url)
            .form(&[(field, "1")])
            .send()
            .await
            .map_err(AutoscanError::Http)?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            debug!(%status, duplex, "Scan requested");
            return Ok(());
        }

        Err(AutoscanError::Status(format!("scan returned {status}")))
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, AutoscanError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(AutoscanError::Http)?;

        if !response.status().is_success() {
            return Err(AutoscanError::Status(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }

        response.json::<T>().await.map_err(AutoscanError::Http)
    }
}

#[async_trait]
impl StatusSource for StatusClient {
    async fn fetch_status(&self) -> Result<StatusRecord, AutoscanError> {
        self.status().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::status::{
        ControlPoller, ControlSurface, PollSchedule, StatusDisplay, StatusPoller, StatusView,
    };

    #[derive(Clone, Default)]
    struct Screen {
        views: Arc<Mutex<Vec<StatusView>>>,
        controls: Arc<Mutex<Vec<bool>>>,
    }

    impl StatusDisplay for Screen {
        fn show(&mut self, view: &StatusView) {
            self.views.lock().unwrap().push(view.clone());
        }
    }

    impl ControlSurface for Screen {
        fn set_controls_enabled(&mut self, enabled: bool) {
            self.controls.lock().unwrap().push(enabled);
        }
    }

    async fn server_answering(status: usize, body: &str) -> mockito::ServerGuard {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/status")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        server
    }

    /// A failed fetch must leave the page alone and retry on the idle interval.
    async fn assert_pollers_back_off(server: &mockito::ServerGuard) {
        let client = StatusClient::new(&format!("{}/", server.url())).unwrap();
        let screen = Screen::default();
        let schedule = PollSchedule::default();

        let mut status = StatusPoller::new(client.clone(), screen.clone(), schedule);
        assert_eq!(status.poll_once().await, Duration::from_millis(1000));
        let mut controls = ControlPoller::new(client, screen.clone(), schedule);
        assert_eq!(controls.poll_once().await, Duration::from_millis(1000));

        assert!(screen.views.lock().unwrap().is_empty());
        assert!(screen.controls.lock().unwrap().is_empty());
    }

    #[test]
    fn status_path_is_relative_to_the_page() {
        let client = StatusClient::new("http://scanner.local:8080/autoscan/").unwrap();
        assert_eq!(
            client.endpoint(STATUS_PATH).unwrap().as_str(),
            "http://scanner.local:8080/autoscan/api/status"
        );

        let client = StatusClient::new("http://scanner.local:8080/status").unwrap();
        assert_eq!(
            client.endpoint(STATUS_PATH).unwrap().as_str(),
            "http://scanner.local:8080/api/status"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            StatusClient::new("not a url"),
            Err(AutoscanError::Url(_))
        ));
    }

    #[tokio::test]
    async fn status_reads_wire_record() {
        let server = server_answering(200, r#"{"State": "SCANNING", "LastFail": ""}"#).await;
        let client = StatusClient::new(&format!("{}/", server.url())).unwrap();

        let record = client.status().await.unwrap();
        assert!(!record.is_idle());

        let screen = Screen::default();
        let mut poller = StatusPoller::new(client, screen.clone(), PollSchedule::default());
        assert_eq!(poller.poll_once().await, Duration::from_millis(500));
        assert_eq!(screen.views.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = server_answering(200, "{not json").await;
        let client = StatusClient::new(&format!("{}/", server.url())).unwrap();

        assert!(matches!(client.status().await, Err(AutoscanError::Http(_))));
        assert_pollers_back_off(&server).await;
    }

    #[tokio::test]
    async fn server_error_is_reported_with_path() {
        let server = server_answering(500, "boom").await;
        let client = StatusClient::new(&format!("{}/", server.url())).unwrap();

        let err = client.status().await.unwrap_err();
        assert!(matches!(err, AutoscanError::Status(_)));
        assert!(err.to_string().contains("api/status returned 500"), "{err}");
        assert_pollers_back_off(&server).await;
    }
}
