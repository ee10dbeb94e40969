use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backend::{Backend, Tone, Ui, UiMessage};
use crate::types::AutoscanError;

/// One helper input line: `r|g|b|headline|detail`.
pub fn lcd_line(message: &UiMessage) -> String {
    let colours = match message.tone {
        Tone::Failed => "1|0|0",
        Tone::Idle => "0|1|0",
        Tone::Active => "0|0|1",
    };
    format!(
        "{colours}|{}|{}\n",
        field(&message.headline),
        field(&message.detail)
    )
}

// The helper splits on '|' and reads one line per message.
fn field(text: &str) -> String {
    text.replace(['|', '\n', '\r'], " ")
}

/// The Adafruit 16x2 LCD plate, driven by a helper process that takes
/// messages on stdin and prints key names on stdout.
pub struct Lcd;

impl Lcd {
    pub fn spawn(binary: &Path) -> Result<(LcdUi, LcdKeys), AutoscanError> {
        let mut child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                AutoscanError::Config(format!("starting lcd binary {}: {err}", binary.display()))
            })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AutoscanError::Config("lcd helper has no stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AutoscanError::Config("lcd helper has no stdout".to_string()))?;
        info!(binary = %binary.display(), "Started LCD helper");

        let ui = LcdUi::spawn_writer(stdin);
        let keys = LcdKeys::new(stdout, ui.clone()).with_child(child);
        Ok((ui, keys))
    }
}

/// Sends messages to the LCD without blocking the caller.
#[derive(Debug, Clone)]
pub struct LcdUi {
    lines: mpsc::UnboundedSender<String>,
}

impl LcdUi {
    /// Forward every message to `writer` from a background task.
    pub fn spawn_writer<W>(mut writer: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                let written = async {
                    writer.write_all(line.as_bytes()).await?;
                    writer.flush().await
                };
                if let Err(err) = written.await {
                    warn!(error = %err, "Writing to LCD failed");
                    break;
                }
            }
        });
        Self { lines: tx }
    }
}

impl Ui for LcdUi {
    fn show(&self, message: &UiMessage) {
        if self.lines.send(lcd_line(message)).is_err() {
            debug!("LCD writer has stopped");
        }
    }
}

/// Key presses reported by the LCD helper.
pub struct LcdKeys<R = ChildStdout> {
    lines: Lines<BufReader<R>>,
    ui: LcdUi,
    child: Option<Child>,
}

impl<R> LcdKeys<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, ui: LcdUi) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            ui,
            child: None,
        }
    }

    fn with_child(mut self, child: Child) -> Self {
        self.child = Some(child);
        self
    }

    /// Handle keys until the helper goes away.
    pub async fn run(mut self, backend: Arc<Backend>) -> Result<(), AutoscanError> {
        while let Some(line) = self.lines.next_line().await? {
            self.handle_key(line.trim(), &backend).await;
        }
        if let Some(child) = self.child.as_mut() {
            let status = child.wait().await?;
            return Err(AutoscanError::Config(format!("lcd helper exited: {status}")));
        }
        Err(AutoscanError::Config("lcd helper closed its output".to_string()))
    }

    async fn handle_key(&self, key: &str, backend: &Backend) {
        match key {
            "SELECT" | "RIGHT" => {
                info!(key, "LCD key pressed");
                if let Err(err) = backend.run(key == "RIGHT").await {
                    warn!(key, error = %err, "Scan from LCD failed");
                }
            }
            "UP" => self.ui.show(&UiMessage::idle("Autoscan ready", "")),
            "" => {}
            other => debug!(key = other, "Ignoring LCD key"),
        }
    }
}
