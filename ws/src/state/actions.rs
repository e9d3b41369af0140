//! Actions understood by the window store

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persist::{PersistAction, RehydratePayload};

use super::types::{ConnectionState, InstancesState, Notification, ThemeState};

/// State update carrying the full instance map from the background store
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedUpdateState {
    /// Originating request, when the update answers one
    pub request: Option<Value>,
    pub instances: InstancesState,
}

/// Monitor action targeting the inspected page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiftedAction {
    pub message: String,
    pub action: Option<Value>,
    /// Filled in by window sync before relaying
    pub instance_id: Option<String>,
    pub connection_id: Option<String>,
}

impl LiftedAction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Every action a window store reduces
#[derive(Debug, Clone, PartialEq)]
pub enum WindowStoreAction {
    /// Open the monitor socket
    ConnectRequest,
    SocketConnected { id: String, channel: Option<String> },
    SocketDisconnected,
    SocketError(String),
    /// Replace connection settings
    Reconnect(ConnectionState),
    /// Background reported a change; instances not attached yet
    EmptyUpdateState,
    UpdateState(ExpandedUpdateState),
    /// Background has nothing for this window
    Na,
    SelectInstance(String),
    LiftedAction(LiftedAction),
    TogglePersist,
    ToggleSync,
    Export,
    ChangeSection(String),
    ChangeTheme(ThemeState),
    ShowNotification(Notification),
    ClearNotification,
    Rehydrate(RehydratePayload),
}

impl WindowStoreAction {
    /// Short name for logs
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::ConnectRequest => "CONNECT_REQUEST",
            Self::SocketConnected { .. } => "SOCKET_CONNECTED",
            Self::SocketDisconnected => "SOCKET_DISCONNECTED",
            Self::SocketError(_) => "SOCKET_ERROR",
            Self::Reconnect(_) => "RECONNECT",
            Self::EmptyUpdateState | Self::UpdateState(_) => "UPDATE_STATE",
            Self::Na => "NA",
            Self::SelectInstance(_) => "SELECT_INSTANCE",
            Self::LiftedAction(_) => "LIFTED_ACTION",
            Self::TogglePersist => "TOGGLE_PERSIST",
            Self::ToggleSync => "TOGGLE_SYNC",
            Self::Export => "EXPORT",
            Self::ChangeSection(_) => "CHANGE_SECTION",
            Self::ChangeTheme(_) => "CHANGE_THEME",
            Self::ShowNotification(_) => "SHOW_NOTIFICATION",
            Self::ClearNotification => "CLEAR_NOTIFICATION",
            Self::Rehydrate(_) => "persist/REHYDRATE",
        }
    }
}

impl PersistAction for WindowStoreAction {
    fn rehydrate(payload: RehydratePayload) -> Self {
        Self::Rehydrate(payload)
    }

    fn rehydrate_payload(&self) -> Option<&RehydratePayload> {
        match self {
            Self::Rehydrate(payload) => Some(payload),
            _ => None,
        }
    }
}
