//! Window state tree

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Browser tab identifier
pub type TabId = u64;

/// Full state of one window store
///
/// Top-level field names are the keys the persistence layer works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreState {
    pub section: String,
    pub theme: ThemeState,
    pub connection: ConnectionState,
    pub socket: SocketState,
    pub monitor: MonitorState,
    pub instances: InstancesState,
    pub notification: Option<Notification>,
    pub state_tree_settings: StateTreeSettings,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            section: "Actions".to_string(),
            theme: ThemeState::default(),
            connection: ConnectionState::default(),
            socket: SocketState::default(),
            monitor: MonitorState::default(),
            instances: InstancesState::default(),
            notification: None,
            state_tree_settings: StateTreeSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPreference {
    #[default]
    Auto,
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeState {
    pub theme: String,
    pub color_preference: ColorPreference,
}

impl Default for ThemeState {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            color_preference: ColorPreference::Auto,
        }
    }
}

/// How the window reaches a remote monitor server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// User turned connecting off; no automatic connect on startup
    Disabled,
    #[default]
    Remotedev,
    Custom,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Remotedev => "remotedev",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "remotedev" => Ok(Self::Remotedev),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown connection type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    pub hostname: String,
    pub port: u16,
    pub secure: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 8000,
            secure: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionState {
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub options: ConnectionOptions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketStatus {
    #[default]
    Closed,
    Connecting,
    Open,
}

/// Live socket handle data; never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocketState {
    pub id: Option<String>,
    pub channel: Option<String>,
    pub socket_state: SocketStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorState {
    pub selected: String,
    pub slider_is_open: bool,
    pub dispatcher_is_open: bool,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            selected: "InspectorMonitor".to_string(),
            slider_is_open: true,
            dispatcher_is_open: false,
        }
    }
}

/// Per-instance metadata reported by the inspected page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceOptions {
    pub name: String,
    pub connection_id: String,
}

/// Known monitored instances; runtime-only, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstancesState {
    /// Instance that reported last, or `default`
    pub current: String,
    /// Instance the user (or the selector) picked
    pub selected: Option<String>,
    pub sync: bool,
    pub persisted: bool,
    /// Tab id -> instance ids living in that tab
    pub connections: BTreeMap<TabId, Vec<String>>,
    pub options: BTreeMap<String, InstanceOptions>,
    /// Last recorded lifted state per instance
    pub states: BTreeMap<String, Value>,
}

impl InstancesState {
    pub const DEFAULT_INSTANCE: &'static str = "default";

    /// Selected instance, falling back to the current one
    pub fn active(&self) -> &str {
        self.selected.as_deref().unwrap_or(&self.current)
    }

    /// Connection id of the active instance, if it is known
    pub fn active_connection_id(&self) -> Option<&str> {
        self.options.get(self.active()).map(|o| o.connection_id.as_str())
    }
}

impl Default for InstancesState {
    fn default() -> Self {
        Self {
            current: Self::DEFAULT_INSTANCE.to_string(),
            selected: None,
            sync: false,
            persisted: false,
            connections: BTreeMap::new(),
            options: BTreeMap::new(),
            states: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateTreeSettings {
    pub sort_alphabetically: bool,
    pub disable_collection: bool,
}
