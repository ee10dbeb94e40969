//! Status record polling: the `api/status` wire record, how it is rendered,
//! and the two self-rescheduling pollers that keep a UI in sync with it.

mod client;
mod poller;
mod record;
mod surface;
mod terminal;
mod view;

pub use client::{StatusClient, STATUS_PATH};
pub use poller::{ControlPoller, PollSchedule, StatusPoller};
pub use record::{StatusRecord, IDLE_STATE};
pub use surface::{ControlSurface, StatusDisplay, StatusSource};
pub use terminal::{TerminalControls, TerminalDisplay};
pub use view::{StatusClass, StatusView};
