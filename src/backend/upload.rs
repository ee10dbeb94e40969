use std::path::Path;

use async_trait::async_trait;

use crate::types::AutoscanError;

/// Final step of a scan round: ship every file in `dir` somewhere durable.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, dir: &Path) -> Result<(), AutoscanError>;
}
