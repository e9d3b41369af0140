//! Reducer wrapper that folds stored state back in on rehydration

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::config::{PersistAction, PersistConfig, StateFilter};
use crate::store::Reducer;

/// Wraps a reducer so `Rehydrate` actions merge stored fields into state
///
/// Merging is one level deep: each stored top-level field replaces the
/// current one wholesale. Blacklisted, unknown, and metadata fields are ignored,
/// and so is any field whose stored value no longer decodes.
pub struct PersistedReducer<R, S> {
    inner: R,
    key: String,
    filter: StateFilter,
    _state: PhantomData<fn() -> S>,
}

impl<R, S> PersistedReducer<R, S> {
    pub fn new(inner: R, config: &PersistConfig) -> Self {
        Self {
            inner,
            key: config.key.clone(),
            filter: config.filter(),
            _state: PhantomData,
        }
    }
}

impl<R, S> PersistedReducer<R, S>
where
    S: Serialize + DeserializeOwned + Clone,
{
    fn merge(&self, state: &S, stored: &serde_json::Map<String, Value>) -> S {
        let mut current = match serde_json::to_value(state) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                warn!("PersistedReducer::merge: state is not an object, skipping rehydrate");
                return state.clone();
            }
            Err(e) => {
                warn!(error = %e, "PersistedReducer::merge: failed to serialize state");
                return state.clone();
            }
        };

        // Fields are taken one at a time, so a value that no longer fits the
        // state layout only loses itself
        let mut merged = state.clone();
        for (field, value) in self.filter.inbound(stored) {
            if !current.contains_key(&field) {
                debug!(%field, "PersistedReducer::merge: unknown field, skipping");
                continue;
            }
            let previous = current.insert(field.clone(), value);
            match serde_json::from_value::<S>(Value::Object(current.clone())) {
                Ok(next) => {
                    debug!(%field, "PersistedReducer::merge: restoring field");
                    merged = next;
                }
                Err(e) => {
                    warn!(%field, error = %e, "PersistedReducer::merge: stored field does not fit, skipping");
                    if let Some(previous) = previous {
                        current.insert(field, previous);
                    }
                }
            }
        }
        merged
    }
}

impl<R, S, A> Reducer<S, A> for PersistedReducer<R, S>
where
    R: Reducer<S, A>,
    S: Serialize + DeserializeOwned + Clone,
    A: PersistAction,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        let next = self.inner.reduce(state, action);
        match action.rehydrate_payload() {
            Some(payload) if payload.key == self.key => match &payload.state {
                Some(stored) => self.merge(&next, stored),
                None => next,
            },
            _ => next,
        }
    }
}
