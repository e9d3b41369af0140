//! State export

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::state::{StoreState, WindowStoreAction};
use crate::store::{Middleware, Next, StoreError, StoreResult};
use crate::window::WindowStore;

/// Receives exported instance state
pub trait ExportSink: Send + Sync {
    fn export(&self, instance_id: &str, payload: String);
}

/// Sink that only logs what would have been exported
#[derive(Debug, Default)]
pub struct LogExportSink;

impl ExportSink for LogExportSink {
    fn export(&self, instance_id: &str, payload: String) {
        info!(%instance_id, bytes = payload.len(), "Exported instance state");
    }
}

/// Sink that keeps every export in memory
#[derive(Debug, Default)]
pub struct CollectingExportSink {
    exports: Mutex<Vec<(String, String)>>,
}

impl CollectingExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(instance_id, payload)` pairs, oldest first
    pub fn exports(&self) -> Vec<(String, String)> {
        self.exports.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ExportSink for CollectingExportSink {
    fn export(&self, instance_id: &str, payload: String) {
        self.exports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((instance_id.to_string(), payload));
    }
}

/// On `Export`, serializes the active instance's recorded state to the sink
pub struct ExportState {
    sink: Arc<dyn ExportSink>,
}

impl ExportState {
    pub fn new(sink: Arc<dyn ExportSink>) -> Self {
        Self { sink }
    }
}

impl Middleware<StoreState, WindowStoreAction> for ExportState {
    fn name(&self) -> &'static str {
        "export_state"
    }

    fn handle(
        &self,
        store: &WindowStore,
        action: WindowStoreAction,
        next: Next<'_, StoreState, WindowStoreAction>,
    ) -> StoreResult<()> {
        if action == WindowStoreAction::Export {
            let exported = store.read(|state| {
                let instance_id = state.instances.active().to_string();
                state
                    .instances
                    .states
                    .get(&instance_id)
                    .map(|recorded| (instance_id, serde_json::to_string_pretty(recorded)))
            });
            match exported {
                Some((instance_id, Ok(payload))) => self.sink.export(&instance_id, payload),
                Some((_, Err(e))) => {
                    return Err(StoreError::Middleware {
                        name: self.name(),
                        reason: e.to_string(),
                    });
                }
                None => debug!("ExportState::handle: no recorded state for active instance"),
            }
        }
        next.run(action)
    }
}
