//! Current-tab instance selection

use std::sync::Arc;

use tracing::debug;

use crate::state::{InstancesState, StoreState, TabId, WindowStoreAction};
use crate::store::{Middleware, Next, StoreResult};
use crate::window::WindowStore;

/// Tells which browser tab the window is looking at
pub trait TabLocator: Send + Sync {
    fn current_tab_id(&self) -> Option<TabId>;
}

/// Locator with a known answer, e.g. the inspected tab of a devtools panel
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTab(pub Option<TabId>);

impl TabLocator for FixedTab {
    fn current_tab_id(&self) -> Option<TabId> {
        self.0
    }
}

/// After each instances update, selects the single instance living in the
/// current tab
pub struct InstanceSelector {
    tabs: Arc<dyn TabLocator>,
}

impl InstanceSelector {
    pub fn new(tabs: Arc<dyn TabLocator>) -> Self {
        Self { tabs }
    }

    fn pick(instances: &InstancesState, tab_id: TabId) -> Option<String> {
        if instances.current == InstancesState::DEFAULT_INSTANCE {
            return None;
        }
        match instances.connections.get(&tab_id).map(Vec::as_slice) {
            Some([only]) => Some(only.clone()),
            _ => None,
        }
    }
}

impl Middleware<StoreState, WindowStoreAction> for InstanceSelector {
    fn name(&self) -> &'static str {
        "instance_selector"
    }

    fn handle(
        &self,
        store: &WindowStore,
        action: WindowStoreAction,
        next: Next<'_, StoreState, WindowStoreAction>,
    ) -> StoreResult<()> {
        let is_update = matches!(action, WindowStoreAction::UpdateState(_));
        next.run(action)?;
        if !is_update {
            return Ok(());
        }

        let Some(tab_id) = self.tabs.current_tab_id() else {
            debug!("InstanceSelector::handle: no current tab");
            return Ok(());
        };
        match store.read(|state| Self::pick(&state.instances, tab_id)) {
            Some(instance_id) => {
                debug!(%instance_id, tab_id, "InstanceSelector::handle: selecting instance");
                next.run(WindowStoreAction::SelectInstance(instance_id))
            }
            None => Ok(()),
        }
    }
}
