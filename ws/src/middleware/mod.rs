//! Middlewares installed on window stores
//!
//! Chain order, as assembled by [`configure_store`](crate::window::configure_store):
//!
//! 1. [`ExportState`] - hands the active instance's state to an export sink
//! 2. [`ApiBridge`] - turns background port messages into actions
//! 3. [`WindowSync`] - keeps instances in step with the background store
//! 4. [`InstanceSelector`] - popup and unset windows only; picks the tab's instance

mod api;
mod export;
mod instance_selector;
mod window_sync;

pub use api::{ApiBridge, Port, PortMessage, port};
pub use export::{CollectingExportSink, ExportSink, ExportState, LogExportSink};
pub use instance_selector::{FixedTab, InstanceSelector, TabLocator};
pub use window_sync::WindowSync;
