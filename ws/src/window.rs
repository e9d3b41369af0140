//! Window store factory
//!
//! Builds the persisted, middleware-enhanced store for one extension window
//! (devtools panel, popup, or a docked window) and starts its persistor.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::background::BackgroundStore;
use crate::debug::ActionLogEnhancer;
use crate::middleware::{ApiBridge, ExportSink, ExportState, FixedTab, InstanceSelector, LogExportSink, Port, TabLocator, WindowSync};
use crate::persist::{DEFAULT_VERSION, PersistConfig, PersistedReducer, Persistor, Storage, persist_store};
use crate::state::{ConnectionType, StoreState, WindowStoreAction, window_reducer};
use crate::store::{Middleware, Passthrough, Store, StoreEnhancer, apply_middleware, compose};

/// Namespace key shared by every window of the extension
pub const PERSIST_KEY: &str = "redux-devtools";

/// Top-level fields holding runtime-only data
pub const PERSIST_BLACKLIST: [&str; 2] = ["instances", "socket"];

pub type WindowStore = Store<StoreState, WindowStoreAction>;

/// Error for an unrecognized window position
#[derive(Debug, Error)]
#[error("Unknown window position: '{0}'")]
pub struct PositionError(pub String);

/// Which surface a window store serves, taken from the page's location hash
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WindowPosition {
    /// No hash; the devtools panel
    #[default]
    Unset,
    Popup,
    Left,
    Right,
    Bottom,
    Panel,
}

impl WindowPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Popup => "#popup",
            Self::Left => "#left",
            Self::Right => "#right",
            Self::Bottom => "#bottom",
            Self::Panel => "#panel",
        }
    }

    /// Surfaces that work out the current tab's instance themselves
    pub fn selects_instance(&self) -> bool {
        matches!(self, Self::Unset | Self::Popup)
    }
}

impl fmt::Display for WindowPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("(unset)"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for WindowPosition {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::Unset),
            "#popup" => Ok(Self::Popup),
            "#left" => Ok(Self::Left),
            "#right" => Ok(Self::Right),
            "#bottom" => Ok(Self::Bottom),
            "#panel" => Ok(Self::Panel),
            other => Err(PositionError(other.to_string())),
        }
    }
}

/// How the store is composed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Middleware only
    #[default]
    Production,
    /// Middleware plus the debug enhancer, when one is given
    Development,
}

/// Collaborators and switches for [`configure_store`]
pub struct StoreOptions {
    pub build_mode: BuildMode,
    /// Only used in development builds
    pub debug_enhancer: Option<Arc<dyn StoreEnhancer<StoreState, WindowStoreAction>>>,
    pub storage: Arc<dyn Storage>,
    pub persist_version: u32,
    pub tabs: Arc<dyn TabLocator>,
    pub port: Option<Port>,
    pub export_sink: Arc<dyn ExportSink>,
}

impl StoreOptions {
    /// Production options persisting to `storage`, with no port and no known tab
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            build_mode: BuildMode::Production,
            debug_enhancer: None,
            storage,
            persist_version: DEFAULT_VERSION,
            tabs: Arc::new(FixedTab(None)),
            port: None,
            export_sink: Arc::new(LogExportSink),
        }
    }

    pub fn with_build_mode(mut self, build_mode: BuildMode) -> Self {
        self.build_mode = build_mode;
        self
    }

    pub fn with_debug_enhancer(mut self, enhancer: Arc<dyn StoreEnhancer<StoreState, WindowStoreAction>>) -> Self {
        self.debug_enhancer = Some(enhancer);
        self
    }

    /// Development build with an [`ActionLogEnhancer`]
    pub fn with_action_log(self, enhancer: ActionLogEnhancer) -> Self {
        self.with_build_mode(BuildMode::Development)
            .with_debug_enhancer(Arc::new(enhancer))
    }

    pub fn with_persist_version(mut self, version: u32) -> Self {
        self.persist_version = version;
        self
    }

    pub fn with_tabs(mut self, tabs: Arc<dyn TabLocator>) -> Self {
        self.tabs = tabs;
        self
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_export_sink(mut self, sink: Arc<dyn ExportSink>) -> Self {
        self.export_sink = sink;
        self
    }
}

/// A window store and its persistor
pub struct ConfiguredStore {
    pub store: WindowStore,
    pub persistor: Persistor,
}

/// Build the store for a window at `position`, synced against `base_store`
///
/// Returns immediately. Once stored state has been rehydrated, a single
/// `ConnectRequest` is dispatched unless the connection is disabled.
/// Must be called inside a tokio runtime.
pub fn configure_store(base_store: &BackgroundStore, position: WindowPosition, options: StoreOptions) -> ConfiguredStore {
    debug!(%position, build_mode = ?options.build_mode, "configure_store: called");

    let api = match options.port {
        Some(port) => ApiBridge::new(port),
        None => ApiBridge::detached(),
    };
    let mut middlewares: Vec<Arc<dyn Middleware<StoreState, WindowStoreAction>>> = vec![
        Arc::new(ExportState::new(options.export_sink)),
        Arc::new(api),
        Arc::new(WindowSync::new(base_store.clone())),
    ];
    if position.selects_instance() {
        middlewares.push(Arc::new(InstanceSelector::new(options.tabs)));
    }

    let enhancer: Arc<dyn StoreEnhancer<StoreState, WindowStoreAction>> = match options.build_mode {
        BuildMode::Production => Arc::new(apply_middleware(middlewares)),
        BuildMode::Development => {
            let debug_enhancer = options.debug_enhancer.unwrap_or_else(|| Arc::new(Passthrough));
            let stages: Vec<Arc<dyn StoreEnhancer<StoreState, WindowStoreAction>>> =
                vec![Arc::new(apply_middleware(middlewares)), debug_enhancer];
            Arc::new(compose(stages))
        }
    };

    let config = PersistConfig::new(PERSIST_KEY, options.storage)
        .with_blacklist(PERSIST_BLACKLIST)
        .with_version(options.persist_version);
    let reducer = PersistedReducer::<_, StoreState>::new(window_reducer, &config);
    let store = Store::create(reducer, StoreState::default(), enhancer.as_ref());

    let persistor = persist_store(&store, config, |store: &WindowStore| {
        let connection_type = store.read(|state| state.connection.connection_type);
        if connection_type == ConnectionType::Disabled {
            info!("Connection disabled, not connecting");
            return;
        }
        debug!(%connection_type, "configure_store: requesting connection");
        if let Err(e) = store.dispatch(WindowStoreAction::ConnectRequest) {
            warn!(error = %e, "configure_store: connect request failed");
        }
    });

    info!(%position, middlewares = ?store.middleware_names(), "Window store configured");
    ConfiguredStore { store, persistor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::create_background_store;
    use crate::persist::{MemoryStorage, PersistError, StorageError};
    use crate::state::{InstancesState, SocketStatus};
    use crate::store::StoreBuilder;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CONNECT: &str = "ConnectRequest";

    fn stored_connection(connection_type: &str) -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::with_item(
            "persist:redux-devtools",
            json!({
                "connection": {"type": connection_type},
                "_persist": {"version": 1, "rehydrated": true}
            })
            .to_string(),
        ))
    }

    /// Enhancer that counts how often it is asked to enhance
    struct CountingEnhancer(Arc<AtomicUsize>);

    impl StoreEnhancer<StoreState, WindowStoreAction> for CountingEnhancer {
        fn enhance(
            &self,
            builder: StoreBuilder<StoreState, WindowStoreAction>,
        ) -> StoreBuilder<StoreState, WindowStoreAction> {
            self.0.fetch_add(1, Ordering::SeqCst);
            builder
        }
    }

    struct UnreadableStorage;

    #[async_trait]
    impl Storage for UnreadableStorage {
        async fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("corrupted".to_string()))
        }

        async fn set_item(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Ok(())
        }

        async fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_position_parse() {
        assert_eq!("".parse::<WindowPosition>().unwrap(), WindowPosition::Unset);
        assert_eq!("#popup".parse::<WindowPosition>().unwrap(), WindowPosition::Popup);
        assert_eq!("#bottom".parse::<WindowPosition>().unwrap(), WindowPosition::Bottom);
        assert!("#sidebar".parse::<WindowPosition>().is_err());
        assert!("popup".parse::<WindowPosition>().is_err());
    }

    #[test]
    fn test_position_round_trips_through_str() {
        for position in [
            WindowPosition::Unset,
            WindowPosition::Popup,
            WindowPosition::Left,
            WindowPosition::Right,
            WindowPosition::Bottom,
            WindowPosition::Panel,
        ] {
            assert_eq!(position.as_str().parse::<WindowPosition>().unwrap(), position);
        }
    }

    #[tokio::test]
    async fn test_instance_selector_only_for_unset_and_popup() {
        let base = create_background_store(InstancesState::default());
        for (position, expected) in [
            (WindowPosition::Unset, true),
            (WindowPosition::Popup, true),
            (WindowPosition::Left, false),
            (WindowPosition::Right, false),
            (WindowPosition::Bottom, false),
            (WindowPosition::Panel, false),
        ] {
            let configured = configure_store(&base, position, StoreOptions::new(Arc::new(MemoryStorage::new())));
            let names = configured.store.middleware_names();
            assert_eq!(names.contains(&"instance_selector"), expected, "position {position}");
        }
    }

    #[tokio::test]
    async fn test_two_positions_differ_only_by_selector() {
        let base = create_background_store(InstancesState::default());
        let popup = configure_store(&base, WindowPosition::Popup, StoreOptions::new(Arc::new(MemoryStorage::new())));
        let left = configure_store(&base, WindowPosition::Left, StoreOptions::new(Arc::new(MemoryStorage::new())));

        assert_eq!(
            popup.store.middleware_names(),
            vec!["export_state", "api", "window_sync", "instance_selector"]
        );
        assert_eq!(left.store.middleware_names(), vec!["export_state", "api", "window_sync"]);

        popup.persistor.ready().await.unwrap();
        left.persistor.ready().await.unwrap();
        popup
            .store
            .dispatch(WindowStoreAction::ChangeSection("Diff".to_string()))
            .unwrap();
        assert_eq!(left.store.state().section, "Actions");
    }

    #[tokio::test]
    async fn test_connects_once_when_not_disabled() {
        let base = create_background_store(InstancesState::default());
        let enhancer = ActionLogEnhancer::new();
        let log = enhancer.log();
        let options = StoreOptions::new(stored_connection("custom")).with_action_log(enhancer);

        let configured = configure_store(&base, WindowPosition::Left, options);
        configured.persistor.ready().await.unwrap();

        assert_eq!(log.count(CONNECT), 1);
        let state = configured.store.state();
        assert_eq!(state.connection.connection_type, ConnectionType::Custom);
        assert_eq!(state.socket.socket_state, SocketStatus::Connecting);
    }

    #[tokio::test]
    async fn test_no_connect_when_disabled() {
        let base = create_background_store(InstancesState::default());
        let enhancer = ActionLogEnhancer::new();
        let log = enhancer.log();
        let options = StoreOptions::new(stored_connection("disabled")).with_action_log(enhancer);

        let configured = configure_store(&base, WindowPosition::Popup, options);
        configured.persistor.ready().await.unwrap();

        assert_eq!(log.count(CONNECT), 0);
        assert_eq!(configured.store.state().socket.socket_state, SocketStatus::Closed);
    }

    #[tokio::test]
    async fn test_disabled_survives_mistyped_sibling_field() {
        let base = create_background_store(InstancesState::default());
        let storage = Arc::new(MemoryStorage::with_item(
            "persist:redux-devtools",
            json!({
                "connection": {"type": "disabled"},
                "theme": "dark",
                "_persist": {"version": 1, "rehydrated": true}
            })
            .to_string(),
        ));
        let enhancer = ActionLogEnhancer::new();
        let log = enhancer.log();
        let options = StoreOptions::new(storage.clone()).with_action_log(enhancer);

        let configured = configure_store(&base, WindowPosition::Unset, options);
        configured.persistor.ready().await.unwrap();
        configured.persistor.flush().await.unwrap();

        assert_eq!(log.count(CONNECT), 0);
        assert_eq!(configured.store.state().connection.connection_type, ConnectionType::Disabled);
        let blob = storage.get_item("persist:redux-devtools").await.unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(stored["connection"]["type"], "disabled");
        assert_eq!(stored["theme"]["theme"], "default");
    }

    #[tokio::test]
    async fn test_empty_storage_connects_once() {
        let base = create_background_store(InstancesState::default());
        let enhancer = ActionLogEnhancer::new();
        let log = enhancer.log();
        let options = StoreOptions::new(Arc::new(MemoryStorage::new())).with_action_log(enhancer);

        let configured = configure_store(&base, "".parse().unwrap(), options);
        configured.persistor.ready().await.unwrap();
        configured.persistor.flush().await.unwrap();

        assert_eq!(log.count(CONNECT), 1);
        assert_eq!(configured.store.state().socket.socket_state, SocketStatus::Connecting);
    }

    #[tokio::test]
    async fn test_production_never_invokes_debug_enhancer() {
        let base = create_background_store(InstancesState::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let options = StoreOptions::new(Arc::new(MemoryStorage::new()))
            .with_build_mode(BuildMode::Production)
            .with_debug_enhancer(Arc::new(CountingEnhancer(calls.clone())));

        let configured = configure_store(&base, WindowPosition::Unset, options);
        configured.persistor.ready().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_development_invokes_debug_enhancer_once() {
        let base = create_background_store(InstancesState::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let options = StoreOptions::new(Arc::new(MemoryStorage::new()))
            .with_build_mode(BuildMode::Development)
            .with_debug_enhancer(Arc::new(CountingEnhancer(calls.clone())));

        let configured = configure_store(&base, WindowPosition::Unset, options);
        configured.persistor.ready().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_development_without_enhancer_still_builds() {
        let base = create_background_store(InstancesState::default());
        let options = StoreOptions::new(Arc::new(MemoryStorage::new())).with_build_mode(BuildMode::Development);

        let configured = configure_store(&base, WindowPosition::Bottom, options);
        configured.persistor.ready().await.unwrap();

        assert_eq!(configured.store.middleware_names().len(), 3);
    }

    #[tokio::test]
    async fn test_unreadable_storage_skips_connect() {
        let base = create_background_store(InstancesState::default());
        let enhancer = ActionLogEnhancer::new();
        let log = enhancer.log();
        let options = StoreOptions::new(Arc::new(UnreadableStorage)).with_action_log(enhancer);

        let configured = configure_store(&base, WindowPosition::Unset, options);
        let result = configured.persistor.ready().await;

        assert!(matches!(result, Err(PersistError::Rehydrate(_))));
        assert_eq!(log.count(CONNECT), 0);
        assert_eq!(configured.store.state(), StoreState::default());
    }
}
