//! WindowStore - persisted state stores for devtools extension windows
//!
//! Every extension window (the devtools panel, the popup, docked windows) gets
//! its own store. Stores share a background store for instance data, persist
//! user preferences across restarts, and reconnect to the monitor server once
//! stored state has been restored.
//!
//! # Architecture
//!
//! ```text
//!                    ┌────────────────────┐
//!  port messages ──▶ │  window store      │ ──relay──▶ background store
//!                    │  export ▸ api ▸    │ ◀─instances─┘
//!                    │  sync ▸ selector   │
//!                    └─────────┬──────────┘
//!                              │ write-through (minus instances, socket)
//!                              ▼
//!                    storage: persist:redux-devtools
//! ```
//!
//! # Example
//!
//! ```ignore
//! use windowstore::{configure_store, create_background_store, StoreOptions};
//!
//! let base = create_background_store(Default::default());
//! let configured = configure_store(&base, "#popup".parse()?, StoreOptions::new(storage));
//! configured.persistor.ready().await?;
//! ```

pub mod background;
pub mod cli;
pub mod config;
pub mod debug;
pub mod middleware;
pub mod persist;
pub mod state;
pub mod store;
pub mod window;

pub use background::{BackgroundStore, create_background_store};
pub use persist::{FileStorage, MemoryStorage, PersistConfig, PersistError, Persistor, Storage};
pub use state::{StoreState, WindowStoreAction};
pub use store::{Store, StoreError};
pub use window::{BuildMode, ConfiguredStore, StoreOptions, WindowPosition, WindowStore, configure_store};
