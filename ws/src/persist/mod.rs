//! State persistence
//!
//! Three pieces work together:
//!
//! - a [`Storage`] adapter holding one JSON blob per namespace key,
//! - [`PersistedReducer`], which merges a stored blob back into state when a
//!   rehydrate action arrives,
//! - [`persist_store`], which reads the blob, dispatches the rehydrate action,
//!   reports completion through a [`Persistor`], and writes every later state
//!   change back, minus blacklisted fields.
//!
//! ```text
//! storage ──get_item──▶ Rehydrate ──▶ PersistedReducer ──▶ state
//!    ▲                                                      │
//!    └──────── set_item ◀── writer actor ◀── subscribe ─────┘
//! ```

mod config;
mod error;
mod persistor;
mod reducer;
mod storage;

pub use config::{DEFAULT_VERSION, KEY_PREFIX, META_FIELD, PersistAction, PersistConfig, RehydratePayload, StateFilter};
pub use error::{PersistError, PersistResult, StorageError};
pub use persistor::{PersistStatus, Persistor, persist_store};
pub use reducer::PersistedReducer;
pub use storage::{FileStorage, MemoryStorage, Storage};
