use async_trait::async_trait;

use crate::types::AutoscanError;

use super::record::StatusRecord;
use super::view::StatusView;

/// Where the pollers get their status record from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> Result<StatusRecord, AutoscanError>;
}

/// The set of scan controls a control poller toggles.
pub trait ControlSurface: Send {
    fn set_controls_enabled(&mut self, enabled: bool);
}

/// The status area a status poller redraws.
pub trait StatusDisplay: Send {
    fn show(&mut self, view: &StatusView);
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for std::sync::Arc<T> {
    async fn fetch_status(&self) -> Result<StatusRecord, AutoscanError> {
        (**self).fetch_status().await
    }
}
