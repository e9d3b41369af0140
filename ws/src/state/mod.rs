//! Window state: the state tree, its actions, and the root reducer

mod actions;
mod reducer;
mod types;

pub use actions::{ExpandedUpdateState, LiftedAction, WindowStoreAction};
pub use reducer::window_reducer;
pub use types::{
    ColorPreference, ConnectionOptions, ConnectionState, ConnectionType, InstanceOptions, InstancesState, MonitorState,
    Notification, NotificationType, SocketState, SocketStatus, StateTreeSettings, StoreState, TabId, ThemeState,
};
