//! A real server on a loopback port, followed by the status pollers.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};

use autoscan::backend::{Backend, LogUi, ScanTools, Uploader};
use autoscan::status::{
    ControlPoller, ControlSurface, PollSchedule, StatusClass, StatusClient, StatusDisplay,
    StatusPoller, StatusView,
};
use autoscan::{web, AutoscanError};

#[derive(Default)]
struct Gate(Option<Arc<Notify>>);

#[async_trait]
impl Uploader for Gate {
    async fn upload(&self, _dir: &Path) -> Result<(), AutoscanError> {
        if let Some(gate) = &self.0 {
            gate.notified().await;
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Controls(Arc<Mutex<Vec<bool>>>);

impl ControlSurface for Controls {
    fn set_controls_enabled(&mut self, enabled: bool) {
        self.0.lock().unwrap().push(enabled);
    }
}

#[derive(Clone, Default)]
struct Display(Arc<Mutex<Vec<StatusView>>>);

impl StatusDisplay for Display {
    fn show(&mut self, view: &StatusView) {
        self.0.lock().unwrap().push(view.clone());
    }
}

struct Server {
    url: String,
    _shutdown: oneshot::Sender<()>,
}

fn start(backend: Arc<Backend>) -> Server {
    let (tx, rx) = oneshot::channel::<()>();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let (bound, server) = web::bind(backend, None, addr, async {
        let _ = rx.await;
    })
    .unwrap();
    tokio::spawn(server);
    Server {
        url: format!("http://{bound}/"),
        _shutdown: tx,
    }
}

async fn wait_for(backend: &Backend, state: &str) {
    for _ in 0..500 {
        if backend.status().state == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("backend never reached {state}: {:?}", backend.status());
}

#[tokio::test]
async fn failed_round_is_rendered_and_controls_stay_enabled() {
    let tools = ScanTools::new("/nonexistent/scanimage", "/nonexistent/convert");
    let backend = Arc::new(Backend::new(tools, Arc::new(Gate::default()), Arc::new(LogUi)));
    let server = start(backend.clone());
    let client = Arc::new(StatusClient::new(&server.url).unwrap());

    let display = Display::default();
    let mut status = StatusPoller::new(client.clone(), display.clone(), PollSchedule::default());
    assert_eq!(status.poll_once().await, Duration::from_millis(1000));
    assert_eq!(display.0.lock().unwrap()[0].text, "Last scan succeeded");

    client.trigger_scan(false).await.unwrap();
    for _ in 0..500 {
        if !backend.status().last_fail.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    status.poll_once().await;
    let view = display.0.lock().unwrap().last().cloned().unwrap();
    assert!(
        view.text.starts_with("Last scan FAILED: scanning failed"),
        "{view:?}"
    );
    assert_eq!(view.classes, vec![StatusClass::Msg, StatusClass::Fail]);

    let controls = Controls::default();
    let mut poller = ControlPoller::new(client, controls.clone(), PollSchedule::default());
    poller.poll_once().await;
    assert_eq!(*controls.0.lock().unwrap(), vec![true]);
}

#[cfg(unix)]
#[tokio::test]
async fn active_round_disables_controls_and_speeds_up_status() {
    use std::os::unix::fs::PermissionsExt;

    let bin = tempfile::tempdir().unwrap();
    let write_script = |name: &str, body: &str| {
        let path = bin.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    };
    let scanimage = write_script("scanimage", "echo P6 > out1.pnm\nexit 7");
    let convert = write_script("convert", "cp \"$1\" \"$2\"");

    let gate = Arc::new(Notify::new());
    let backend = Arc::new(Backend::new(
        ScanTools::new(scanimage, convert),
        Arc::new(Gate(Some(gate.clone()))),
        Arc::new(LogUi),
    ));
    let server = start(backend.clone());
    let client = Arc::new(StatusClient::new(&server.url).unwrap());

    client.trigger_scan(true).await.unwrap();
    wait_for(&backend, "UPLOADING").await;

    let controls = Controls::default();
    let mut control_poller =
        ControlPoller::new(client.clone(), controls.clone(), PollSchedule::default());
    assert_eq!(control_poller.poll_once().await, Duration::from_millis(1000));

    let display = Display::default();
    let mut status = StatusPoller::new(client.clone(), display.clone(), PollSchedule::default());
    assert_eq!(status.poll_once().await, Duration::from_millis(500));
    let view = display.0.lock().unwrap().last().cloned().unwrap();
    assert_eq!(view.text, "UPLOADING...");
    assert!(view.has_class(StatusClass::Active));

    // A second trigger while busy is accepted by the web UI but starts nothing.
    client.trigger_scan(false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.status().state, "UPLOADING");

    gate.notify_one();
    wait_for(&backend, "IDLE").await;
    control_poller.poll_once().await;
    assert_eq!(*controls.0.lock().unwrap(), vec![false, true]);
    assert_eq!(backend.status().last_fail, "");
}
