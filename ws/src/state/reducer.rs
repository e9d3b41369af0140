//! Root reducer for a window store

use super::actions::WindowStoreAction;
use super::types::{Notification, NotificationType, SocketStatus, StoreState};

/// Apply one action to the window state
pub fn window_reducer(state: &StoreState, action: &WindowStoreAction) -> StoreState {
    let mut next = state.clone();
    match action {
        WindowStoreAction::ConnectRequest => {
            next.socket.socket_state = SocketStatus::Connecting;
            next.socket.error = None;
        }
        WindowStoreAction::SocketConnected { id, channel } => {
            next.socket.id = Some(id.clone());
            next.socket.channel = channel.clone();
            next.socket.socket_state = SocketStatus::Open;
            next.socket.error = None;
        }
        WindowStoreAction::SocketDisconnected => {
            next.socket.socket_state = SocketStatus::Closed;
            next.socket.id = None;
            next.socket.channel = None;
        }
        WindowStoreAction::SocketError(error) => {
            next.socket.socket_state = SocketStatus::Closed;
            next.socket.error = Some(error.clone());
            next.notification = Some(Notification {
                notification_type: NotificationType::Error,
                message: error.clone(),
            });
        }
        WindowStoreAction::Reconnect(connection) => {
            next.connection = connection.clone();
        }
        WindowStoreAction::UpdateState(update) => {
            next.instances = update.instances.clone();
        }
        WindowStoreAction::SelectInstance(id) => {
            next.instances.selected = Some(id.clone());
        }
        WindowStoreAction::TogglePersist => {
            next.instances.persisted = !next.instances.persisted;
        }
        WindowStoreAction::ToggleSync => {
            next.instances.sync = !next.instances.sync;
        }
        WindowStoreAction::ChangeSection(section) => {
            next.section = section.clone();
        }
        WindowStoreAction::ChangeTheme(theme) => {
            next.theme = theme.clone();
        }
        WindowStoreAction::ShowNotification(notification) => {
            next.notification = Some(notification.clone());
        }
        WindowStoreAction::ClearNotification => {
            next.notification = None;
        }
        // Handled by middleware or the persistence wrapper
        WindowStoreAction::EmptyUpdateState
        | WindowStoreAction::Na
        | WindowStoreAction::LiftedAction(_)
        | WindowStoreAction::Export
        | WindowStoreAction::Rehydrate(_) => {}
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ConnectionState, ConnectionType, ExpandedUpdateState, InstancesState};

    #[test]
    fn test_connect_request_marks_socket_connecting() {
        let mut state = StoreState::default();
        state.socket.error = Some("boom".to_string());

        let next = window_reducer(&state, &WindowStoreAction::ConnectRequest);

        assert_eq!(next.socket.socket_state, SocketStatus::Connecting);
        assert_eq!(next.socket.error, None);
    }

    #[test]
    fn test_socket_lifecycle() {
        let state = StoreState::default();
        let state = window_reducer(
            &state,
            &WindowStoreAction::SocketConnected {
                id: "s1".to_string(),
                channel: Some("respond".to_string()),
            },
        );
        assert_eq!(state.socket.socket_state, SocketStatus::Open);
        assert_eq!(state.socket.id.as_deref(), Some("s1"));

        let state = window_reducer(&state, &WindowStoreAction::SocketDisconnected);
        assert_eq!(state.socket.socket_state, SocketStatus::Closed);
        assert_eq!(state.socket.id, None);
    }

    #[test]
    fn test_socket_error_raises_notification() {
        let next = window_reducer(&StoreState::default(), &WindowStoreAction::SocketError("refused".to_string()));
        assert_eq!(next.socket.error.as_deref(), Some("refused"));
        let notification = next.notification.unwrap();
        assert_eq!(notification.notification_type, NotificationType::Error);
        assert_eq!(notification.message, "refused");
    }

    #[test]
    fn test_reconnect_replaces_connection() {
        let connection = ConnectionState {
            connection_type: ConnectionType::Disabled,
            ..Default::default()
        };
        let next = window_reducer(&StoreState::default(), &WindowStoreAction::Reconnect(connection.clone()));
        assert_eq!(next.connection, connection);
    }

    #[test]
    fn test_update_state_replaces_instances() {
        let instances = InstancesState {
            current: "i1".to_string(),
            ..Default::default()
        };
        let next = window_reducer(
            &StoreState::default(),
            &WindowStoreAction::UpdateState(ExpandedUpdateState {
                request: None,
                instances: instances.clone(),
            }),
        );
        assert_eq!(next.instances, instances);
    }

    #[test]
    fn test_empty_update_state_is_ignored() {
        let state = StoreState::default();
        assert_eq!(window_reducer(&state, &WindowStoreAction::EmptyUpdateState), state);
    }

    #[test]
    fn test_select_and_toggles() {
        let state = window_reducer(&StoreState::default(), &WindowStoreAction::SelectInstance("i2".to_string()));
        assert_eq!(state.instances.selected.as_deref(), Some("i2"));

        let state = window_reducer(&state, &WindowStoreAction::TogglePersist);
        assert!(state.instances.persisted);
        let state = window_reducer(&state, &WindowStoreAction::ToggleSync);
        assert!(state.instances.sync);
        let state = window_reducer(&state, &WindowStoreAction::TogglePersist);
        assert!(!state.instances.persisted);
    }

    #[test]
    fn test_section_and_notifications() {
        let state = window_reducer(&StoreState::default(), &WindowStoreAction::ChangeSection("Diff".to_string()));
        assert_eq!(state.section, "Diff");

        let state = window_reducer(
            &state,
            &WindowStoreAction::ShowNotification(Notification {
                notification_type: NotificationType::Info,
                message: "hello".to_string(),
            }),
        );
        assert!(state.notification.is_some());

        let state = window_reducer(&state, &WindowStoreAction::ClearNotification);
        assert!(state.notification.is_none());
    }
}
