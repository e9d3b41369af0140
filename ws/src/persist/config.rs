//! Persistence configuration and the persisted-slice filter

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::error::{PersistError, PersistResult};
use super::storage::Storage;

/// Prefix prepended to the namespace key in storage
pub const KEY_PREFIX: &str = "persist:";

/// Metadata field stored next to the persisted slice
pub const META_FIELD: &str = "_persist";

/// Default version of the persisted layout
pub const DEFAULT_VERSION: u32 = 1;

/// Action payload carrying what was read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct RehydratePayload {
    /// Namespace key the payload belongs to
    pub key: String,
    /// Stored top-level fields; `None` when nothing usable was stored
    pub state: Option<Map<String, Value>>,
}

/// Actions that can carry a rehydration payload
pub trait PersistAction: Sized {
    fn rehydrate(payload: RehydratePayload) -> Self;

    fn rehydrate_payload(&self) -> Option<&RehydratePayload>;
}

/// Where and what to persist
#[derive(Clone)]
pub struct PersistConfig {
    /// Namespace key
    pub key: String,
    /// Top-level fields never written to storage
    pub blacklist: Vec<String>,
    pub version: u32,
    pub storage: Arc<dyn Storage>,
}

impl PersistConfig {
    pub fn new(key: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        Self {
            key: key.into(),
            blacklist: Vec::new(),
            version: DEFAULT_VERSION,
            storage,
        }
    }

    pub fn with_blacklist<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Full key used in storage
    pub fn storage_key(&self) -> String {
        format!("{KEY_PREFIX}{}", self.key)
    }

    pub fn filter(&self) -> StateFilter {
        StateFilter {
            blacklist: self.blacklist.clone(),
            version: self.version,
        }
    }
}

impl std::fmt::Debug for PersistConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistConfig")
            .field("key", &self.key)
            .field("blacklist", &self.blacklist)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Decides which top-level fields cross the storage boundary
#[derive(Debug, Clone)]
pub struct StateFilter {
    blacklist: Vec<String>,
    version: u32,
}

impl StateFilter {
    pub fn is_blacklisted(&self, field: &str) -> bool {
        self.blacklist.iter().any(|f| f == field)
    }

    /// Slice of `state` to write, tagged with layout metadata
    pub fn outbound<S: Serialize>(&self, state: &S) -> PersistResult<Map<String, Value>> {
        let Value::Object(fields) = serde_json::to_value(state)? else {
            return Err(PersistError::InvalidState("top level must be an object".to_string()));
        };
        let mut slice: Map<String, Value> = fields.into_iter().filter(|(k, _)| !self.is_blacklisted(k)).collect();
        slice.insert(
            META_FIELD.to_string(),
            json!({ "version": self.version, "rehydrated": true }),
        );
        Ok(slice)
    }

    /// Fields of a stored slice that may flow back into state
    pub fn inbound(&self, stored: &Map<String, Value>) -> Map<String, Value> {
        stored
            .iter()
            .filter(|(k, _)| k.as_str() != META_FIELD && !self.is_blacklisted(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Whether a stored slice was written with this layout version
    ///
    /// Slices without metadata are accepted.
    pub fn version_matches(&self, stored: &Map<String, Value>) -> bool {
        match stored.get(META_FIELD).and_then(|meta| meta.get("version")).and_then(Value::as_u64) {
            Some(version) => version == u64::from(self.version),
            None => true,
        }
    }
}
