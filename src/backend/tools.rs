//! External programs driven by a scan round.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::fs;
use tokio::process::Command;
use tracing::{info, warn};

use crate::types::AutoscanError;

/// scanimage exits with this status once the document feeder runs empty,
/// which is how a successful batch scan ends.
pub const SCANIMAGE_FEEDER_EMPTY: i32 = 7;

const SCAN_EXTENSION: &str = "pnm";
const OUTPUT_EXTENSION: &str = "jpg";

/// Paths to SANE `scanimage` and ImageMagick `convert`.
#[derive(Debug, Clone)]
pub struct ScanTools {
    pub scanimage: PathBuf,
    pub convert: PathBuf,
}

impl ScanTools {
    pub fn new(scanimage: impl Into<PathBuf>, convert: impl Into<PathBuf>) -> Self {
        Self {
            scanimage: scanimage.into(),
            convert: convert.into(),
        }
    }

    pub fn scan_args(duplex: bool) -> Vec<&'static str> {
        let source = if duplex { "ADF Duplex" } else { "ADF Front" };
        vec![
            "--format",
            "PNM",
            "--resolution",
            "300",
            "--mode",
            "Color",
            "-b",
            "--source",
            source,
        ]
    }

    /// Batch-scan every page in the feeder into `dir` as PNM files.
    pub async fn scan(&self, duplex: bool, dir: &Path) -> Result<(), AutoscanError> {
        info!(duplex, "Starting scan");
        let output = Command::new(&self.scanimage)
            .args(Self::scan_args(duplex))
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| AutoscanError::Scan(format!("scanning failed: {err}")))?;

        match output.status.code() {
            Some(SCANIMAGE_FEEDER_EMPTY) => {
                info!("Scan finished successfully");
                Ok(())
            }
            Some(0) => {
                warn!("That's odd, expected eventual exit status 7, not 0");
                Ok(())
            }
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                Err(AutoscanError::Scan(if stderr.is_empty() {
                    format!("scanning failed: {}", output.status)
                } else {
                    format!("scanning failed: {}: {}", output.status, stderr)
                }))
            }
        }
    }

    /// Convert every PNM page in `dir` to JPEG, removing the originals.
    /// Returns the number of pages converted.
    pub async fn convert(&self, dir: &Path) -> Result<usize, AutoscanError> {
        let pages = list_with_extension(dir, SCAN_EXTENSION).await?;
        if pages.is_empty() {
            return Err(AutoscanError::Scan("zero pages scanned".to_string()));
        }

        for input in &pages {
            let output_path = input.with_extension(OUTPUT_EXTENSION);
            info!(input = %input.display(), output = %output_path.display(), "Running convert");

            let output = Command::new(&self.convert)
                .arg(input)
                .arg(&output_path)
                .current_dir(dir)
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|err| {
                    AutoscanError::Scan(format!(
                        "running {:?} on {}: {err}",
                        self.convert,
                        input.display()
                    ))
                })?;

            if !output.status.success() {
                return Err(AutoscanError::Scan(format!(
                    "running {:?} on {}: {}. Stderr: {:?}",
                    self.convert,
                    input.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }

            fs::remove_file(input).await.map_err(|err| {
                AutoscanError::Scan(format!(
                    "deleting pnm ({}) after convert: {err}",
                    input.display()
                ))
            })?;
        }

        Ok(pages.len())
    }
}

/// Files in `dir` with the given extension, sorted by name.
pub(crate) async fn list_with_extension(
    dir: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>, AutoscanError> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
