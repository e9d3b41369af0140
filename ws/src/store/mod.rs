//! Generic state container with a middleware pipeline
//!
//! A [`Store`] owns one state value. Actions enter through [`Store::dispatch`],
//! travel through the middleware chain in order, and finally reach the reducer.
//! Enhancers shape the store before it is built (adding middleware or monitors).
//!
//! ```text
//! dispatch(action)
//!      │
//!      ▼
//! ┌──────────┐   next   ┌──────────┐   next        ┌─────────┐
//! │ mw[0]    │ ───────▶ │ mw[1]    │ ───────▶ ...▶ │ reducer │
//! └──────────┘          └──────────┘               └─────────┘
//!                                                       │
//!                                          monitors, then subscribers
//! ```

mod container;
mod enhancer;
mod error;

pub use container::{Middleware, Monitor, Next, Reducer, Store, StoreBuilder, WeakStore};
pub use enhancer::{ApplyMiddleware, Compose, Passthrough, StoreEnhancer, apply_middleware, compose};
pub use error::{StoreError, StoreResult};
