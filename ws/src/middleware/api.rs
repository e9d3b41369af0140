//! Request/response bridge to the background process

use std::sync::{Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::state::{StoreState, WindowStoreAction};
use crate::store::{Middleware, Next, StoreResult};
use crate::window::WindowStore;

/// Message arriving from the background over a window's port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortMessage {
    /// Something changed in the background store
    Update,
    /// The background has no monitored instance for this window
    NotAvailable,
}

/// Receiving end of a window port
pub type Port = mpsc::UnboundedReceiver<PortMessage>;

/// Create a connected port pair
pub fn port() -> (mpsc::UnboundedSender<PortMessage>, Port) {
    mpsc::unbounded_channel()
}

/// Pumps port messages into the store as actions
///
/// The pump task holds only a weak store handle and ends when either the
/// port closes or the store is dropped.
pub struct ApiBridge {
    port: Mutex<Option<Port>>,
}

impl ApiBridge {
    pub fn new(port: Port) -> Self {
        Self {
            port: Mutex::new(Some(port)),
        }
    }

    /// Bridge with no port; actions just pass through
    pub fn detached() -> Self {
        Self { port: Mutex::new(None) }
    }
}

impl Middleware<StoreState, WindowStoreAction> for ApiBridge {
    fn name(&self) -> &'static str {
        "api"
    }

    fn attach(&self, store: &WindowStore) {
        let Some(mut port) = self.port.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            debug!("ApiBridge::attach: no port, running detached");
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!("ApiBridge::attach: no tokio runtime, port messages will not be delivered");
            return;
        };

        let store = store.downgrade();
        runtime.spawn(async move {
            debug!("ApiBridge: port pump started");
            while let Some(message) = port.recv().await {
                let action = match message {
                    PortMessage::Update => WindowStoreAction::EmptyUpdateState,
                    PortMessage::NotAvailable => WindowStoreAction::Na,
                };
                debug!(?message, "ApiBridge: port message");
                if let Err(e) = store.dispatch(action) {
                    debug!(error = %e, "ApiBridge: dispatch failed, stopping pump");
                    break;
                }
            }
            debug!("ApiBridge: port pump finished");
        });
    }

    fn handle(
        &self,
        _store: &WindowStore,
        action: WindowStoreAction,
        next: Next<'_, StoreState, WindowStoreAction>,
    ) -> StoreResult<()> {
        next.run(action)
    }
}
