//! Background store - the extension-wide store window stores sync against
//!
//! It owns the authoritative instance map and receives monitor actions that
//! windows relay towards inspected pages.

use tracing::debug;

use crate::state::{InstancesState, LiftedAction};
use crate::store::{Passthrough, Store};

/// Relayed actions kept for inspection
pub const RELAY_LOG_CAPACITY: usize = 256;

/// Action relayed from a window to the background
#[derive(Debug, Clone, PartialEq)]
pub enum RelayedAction {
    Lifted(LiftedAction),
    TogglePersist {
        instance_id: String,
        connection_id: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundState {
    pub instances: InstancesState,
    /// Most recent relayed actions, oldest first
    pub relayed: Vec<RelayedAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundAction {
    UpdateInstances(InstancesState),
    Relay(RelayedAction),
}

pub type BackgroundStore = Store<BackgroundState, BackgroundAction>;

pub fn background_reducer(state: &BackgroundState, action: &BackgroundAction) -> BackgroundState {
    let mut next = state.clone();
    match action {
        BackgroundAction::UpdateInstances(instances) => {
            next.instances = instances.clone();
        }
        BackgroundAction::Relay(relayed) => {
            next.relayed.push(relayed.clone());
            if next.relayed.len() > RELAY_LOG_CAPACITY {
                let excess = next.relayed.len() - RELAY_LOG_CAPACITY;
                next.relayed.drain(..excess);
            }
        }
    }
    next
}

/// Background store with no middleware
pub fn create_background_store(instances: InstancesState) -> BackgroundStore {
    debug!(current = %instances.current, "create_background_store: called");
    Store::create(
        background_reducer,
        BackgroundState {
            instances,
            relayed: Vec::new(),
        },
        &Passthrough,
    )
}
