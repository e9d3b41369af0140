//! Cross-window synchronization through the background store

use tracing::debug;

use crate::background::{BackgroundAction, BackgroundStore, RelayedAction};
use crate::state::{ExpandedUpdateState, StoreState, WindowStoreAction};
use crate::store::{Middleware, Next, StoreResult};
use crate::window::WindowStore;

/// Keeps a window store in step with the background store
///
/// - `EmptyUpdateState` is expanded with the background's current instances.
/// - `LiftedAction` and `TogglePersist` are relayed to the background, tagged
///   with the window's active instance and its connection id.
///
/// Every action still continues down the chain.
pub struct WindowSync {
    base: BackgroundStore,
}

impl WindowSync {
    pub fn new(base: BackgroundStore) -> Self {
        Self { base }
    }

    fn relay(&self, relayed: RelayedAction) -> StoreResult<()> {
        debug!(?relayed, "WindowSync::relay: called");
        self.base.dispatch(BackgroundAction::Relay(relayed))
    }
}

impl Middleware<StoreState, WindowStoreAction> for WindowSync {
    fn name(&self) -> &'static str {
        "window_sync"
    }

    fn handle(
        &self,
        store: &WindowStore,
        action: WindowStoreAction,
        next: Next<'_, StoreState, WindowStoreAction>,
    ) -> StoreResult<()> {
        match action {
            WindowStoreAction::EmptyUpdateState => {
                let instances = self.base.read(|base| base.instances.clone());
                next.run(WindowStoreAction::UpdateState(ExpandedUpdateState {
                    request: None,
                    instances,
                }))
            }
            WindowStoreAction::LiftedAction(mut lifted) => {
                let (instance_id, connection_id) = store.read(|state| {
                    (
                        state.instances.active().to_string(),
                        state.instances.active_connection_id().map(str::to_string),
                    )
                });
                lifted.instance_id = Some(instance_id);
                lifted.connection_id = connection_id;
                self.relay(RelayedAction::Lifted(lifted.clone()))?;
                next.run(WindowStoreAction::LiftedAction(lifted))
            }
            WindowStoreAction::TogglePersist => {
                let (instance_id, connection_id) = store.read(|state| {
                    (
                        state.instances.active().to_string(),
                        state.instances.active_connection_id().map(str::to_string),
                    )
                });
                self.relay(RelayedAction::TogglePersist {
                    instance_id,
                    connection_id,
                })?;
                next.run(WindowStoreAction::TogglePersist)
            }
            other => next.run(other),
        }
    }
}
