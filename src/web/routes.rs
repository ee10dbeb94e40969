use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use include_dir::{include_dir, Dir};
use tracing::{info, warn};
use warp::filters::BoxedFilter;
use warp::http::header::{CONTENT_TYPE, LOCATION};
use warp::http::StatusCode;
use warp::path::Tail;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::backend::Backend;
use crate::types::AutoscanError;

use super::pages;

const FORM_LIMIT: u64 = 16 * 1024;

/// Which button a `/scan` form carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRequest {
    Single,
    Double,
}

impl ScanRequest {
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, &'static str> {
        let set = |key: &str| form.contains_key(key);
        match (set("single"), set("double")) {
            (true, true) => Err("both 'double' and 'single' set. Which button was pressed?"),
            (false, false) => Err("neither 'double' or 'single' set. Which button was pressed?"),
            (true, false) => Ok(Self::Single),
            (false, true) => Ok(Self::Double),
        }
    }

    pub fn duplex(self) -> bool {
        self == Self::Double
    }
}

fn with_backend(
    backend: Arc<Backend>,
) -> impl Filter<Extract = (Arc<Backend>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || backend.clone())
}

// Built-in page assets, overridable file by file through `static_dir`.
static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/web/static");

fn content_type(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("html") => "text/html; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn embedded_asset(tail: Tail) -> Result<Response, Rejection> {
    let path = tail.as_str();
    match ASSETS.get_file(path) {
        Some(file) => Ok(warp::reply::with_header(
            file.contents(),
            CONTENT_TYPE,
            content_type(path),
        )
        .into_response()),
        None => Err(warp::reject::not_found()),
    }
}

fn static_files(static_dir: Option<PathBuf>) -> BoxedFilter<(Response,)> {
    let embedded = warp::path("static")
        .and(warp::path::tail())
        .and_then(embedded_asset);
    match static_dir {
        Some(dir) => warp::path("static")
            .and(warp::fs::dir(dir))
            .map(|file: warp::fs::File| file.into_response())
            .or(embedded)
            .unify()
            .boxed(),
        None => embedded.boxed(),
    }
}

/// Every route served by `autoscan serve`.
pub fn routes(
    backend: Arc<Backend>,
    static_dir: Option<PathBuf>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone + Send + Sync + 'static {
    let root = warp::path::end()
        .and(warp::get())
        .and(with_backend(backend.clone()))
        .map(|backend: Arc<Backend>| warp::reply::html(pages::root(&backend.status())));

    let status_page = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_backend(backend.clone()))
        .map(|backend: Arc<Backend>| warp::reply::html(pages::status(&backend.status())));

    let api_status = warp::path!("api" / "status")
        .and(warp::get())
        .and(with_backend(backend.clone()))
        .map(|backend: Arc<Backend>| warp::reply::json(&backend.status()));

    let scan_query = warp::get().and(warp::query::<HashMap<String, String>>());
    let scan_form = warp::post()
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form::<HashMap<String, String>>());
    let scan = warp::path("scan")
        .and(warp::path::end())
        .and(scan_query.or(scan_form).unify())
        .and(with_backend(backend))
        .map(start_scan);

    root.or(status_page)
        .or(api_status)
        .or(scan)
        .or(static_files(static_dir))
        .with(warp::log::custom(|info| {
            info!(
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                elapsed_ms = info.elapsed().as_millis() as u64,
                "HTTP request"
            );
        }))
}

fn start_scan(form: HashMap<String, String>, backend: Arc<Backend>) -> Response {
    let request = match ScanRequest::from_form(&form) {
        Ok(request) => request,
        Err(message) => {
            warn!(%message, "Rejected scan request");
            return warp::reply::with_status(
                warp::reply::html(pages::scan_error(message)),
                StatusCode::BAD_REQUEST,
            )
            .into_response();
        }
    };

    tokio::spawn(async move {
        if let Err(err) = backend.run(request.duplex()).await {
            warn!(error = %err, "Scan from web request failed");
        }
    });

    warp::reply::with_header(
        warp::reply::with_status(warp::reply(), StatusCode::FOUND),
        LOCATION,
        "/status",
    )
    .into_response()
}

/// Bind the web server and return the bound address and the future that
/// serves until `shutdown` resolves.
pub fn bind<F>(
    backend: Arc<Backend>,
    static_dir: Option<PathBuf>,
    addr: SocketAddr,
    shutdown: F,
) -> Result<(SocketAddr, impl Future<Output = ()>), AutoscanError>
where
    F: Future<Output = ()> + Send + 'static,
{
    warp::serve(routes(backend, static_dir))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|err| AutoscanError::Web(format!("binding {addr}: {err}")))
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::{LogUi, ScanTools, Uploader};
    use crate::status::StatusRecord;

    struct NoUpload;

    #[async_trait]
    impl Uploader for NoUpload {
        async fn upload(&self, _dir: &Path) -> Result<(), AutoscanError> {
            Ok(())
        }
    }

    fn backend() -> Arc<Backend> {
        let tools = ScanTools::new("/nonexistent/scanimage", "/nonexistent/convert");
        Arc::new(Backend::new(tools, Arc::new(NoUpload), Arc::new(LogUi)))
    }

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn scan_request_needs_exactly_one_button() {
        assert_eq!(
            ScanRequest::from_form(&form(&[("single", "1")])),
            Ok(ScanRequest::Single)
        );
        assert!(ScanRequest::from_form(&form(&[("double", "1")]))
            .unwrap()
            .duplex());
        assert!(ScanRequest::from_form(&form(&[("single", "1"), ("double", "1")]))
            .unwrap_err()
            .starts_with("both"));
        assert!(ScanRequest::from_form(&form(&[("other", "1")]))
            .unwrap_err()
            .starts_with("neither"));
    }

    #[test]
    fn scan_request_only_needs_the_key() {
        assert_eq!(
            ScanRequest::from_form(&form(&[("single", "")])),
            Ok(ScanRequest::Single)
        );
        assert_eq!(
            ScanRequest::from_form(&form(&[("double", "")])),
            Ok(ScanRequest::Double)
        );
        assert!(ScanRequest::from_form(&form(&[("single", ""), ("double", "")]))
            .unwrap_err()
            .starts_with("both"));
    }

    #[tokio::test]
    async fn api_status_serves_wire_record() {
        let filter = routes(backend(), None);
        let response = warp::test::request()
            .path("/api/status")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let record: StatusRecord = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(record, StatusRecord::idle());
        let raw: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(raw["State"], "IDLE");
        assert_eq!(raw["LastFail"], "");
    }

    #[tokio::test]
    async fn root_page_has_scan_buttons_and_status() {
        let filter = routes(backend(), None);
        let response = warp::test::request().path("/").reply(&filter).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert_eq!(body.matches("class=\"scan-button\"").count(), 2);
        assert!(body.contains("id=\"status-div\""));
    }

    #[tokio::test]
    async fn scan_with_both_buttons_is_rejected() {
        let backend = backend();
        let filter = routes(backend.clone(), None);
        let response = warp::test::request()
            .path("/scan?single=1&double=1")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(body.contains("both &#39;double&#39; and &#39;single&#39; set"));
        assert_eq!(backend.status(), StatusRecord::idle());
    }

    #[tokio::test]
    async fn scan_without_button_is_rejected() {
        let filter = routes(backend(), None);
        let response = warp::test::request()
            .method("POST")
            .path("/scan")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scan_form_starts_round_and_redirects() {
        let backend = backend();
        let filter = routes(backend.clone(), None);
        let response = warp::test::request()
            .method("POST")
            .path("/scan")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("double=1")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/status");

        // The fake scanimage path does not exist, so the round fails quickly.
        for _ in 0..200 {
            if !backend.status().last_fail.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let status = backend.status();
        assert!(status.is_idle());
        assert!(status.last_fail.starts_with("scanning failed"), "{status:?}");
    }

    #[tokio::test]
    async fn page_scripts_are_built_in() {
        let filter = routes(backend(), None);
        for page in ["/", "/status"] {
            let response = warp::test::request().path(page).reply(&filter).await;
            let body = String::from_utf8(response.body().to_vec()).unwrap();
            let scripts: Vec<&str> = body
                .split("<script src=\"")
                .skip(1)
                .filter_map(|rest| rest.split('"').next())
                .collect();
            assert!(!scripts.is_empty(), "{page} loads no scripts");

            for script in scripts {
                let response = warp::test::request().path(script).reply(&filter).await;
                assert_eq!(response.status(), StatusCode::OK, "{script}");
                assert_eq!(response.headers()[CONTENT_TYPE], "application/javascript");
                let source = String::from_utf8(response.body().to_vec()).unwrap();
                assert!(source.contains("api/status"), "{script}");
            }
        }

        let response = warp::test::request()
            .path("/static/style.css")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/css");
    }

    #[tokio::test]
    async fn status_script_polls_faster_while_active() {
        let filter = routes(backend(), None);
        let response = warp::test::request()
            .path("/static/status.js")
            .reply(&filter)
            .await;
        let source = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(source.contains("delay = 500"));
        assert!(source.contains("Last scan FAILED: "));
        assert!(source.contains("setTimeout(updateStatus, 100)"));
    }

    #[tokio::test]
    async fn configured_dir_overrides_built_in_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("status.js"), "poll();").unwrap();

        let filter = routes(backend(), Some(dir.path().to_path_buf()));
        let response = warp::test::request()
            .path("/static/status.js")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"poll();");

        // Files missing from the directory fall back to the built-in copy.
        let response = warp::test::request()
            .path("/static/root.js")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().starts_with(b"// Enables the scan buttons"));

        let response = warp::test::request()
            .path("/static/missing.js")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let filter = routes(backend(), None);
        let response = warp::test::request().path("/nope").reply(&filter).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
