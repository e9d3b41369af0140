//! Store enhancers
//!
//! An enhancer receives the [`StoreBuilder`] before the store exists and returns
//! it augmented: more middleware, extra monitors, or nothing at all.

use std::sync::Arc;

use tracing::debug;

use super::container::{Middleware, StoreBuilder};

/// Augments store creation
pub trait StoreEnhancer<S, A>: Send + Sync {
    fn enhance(&self, builder: StoreBuilder<S, A>) -> StoreBuilder<S, A>;
}

/// Enhancer that installs a fixed middleware chain
pub struct ApplyMiddleware<S, A> {
    middlewares: Vec<Arc<dyn Middleware<S, A>>>,
}

/// Build an enhancer from an ordered list of middleware
pub fn apply_middleware<S, A>(middlewares: Vec<Arc<dyn Middleware<S, A>>>) -> ApplyMiddleware<S, A> {
    ApplyMiddleware { middlewares }
}

impl<S, A> StoreEnhancer<S, A> for ApplyMiddleware<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    fn enhance(&self, builder: StoreBuilder<S, A>) -> StoreBuilder<S, A> {
        debug!(count = self.middlewares.len(), "ApplyMiddleware::enhance: called");
        self.middlewares
            .iter()
            .fold(builder, |builder, middleware| builder.middleware(Arc::clone(middleware)))
    }
}

/// Several enhancers applied one after another, first to last
pub struct Compose<S, A> {
    enhancers: Vec<Arc<dyn StoreEnhancer<S, A>>>,
}

pub fn compose<S, A>(enhancers: Vec<Arc<dyn StoreEnhancer<S, A>>>) -> Compose<S, A> {
    Compose { enhancers }
}

impl<S, A> StoreEnhancer<S, A> for Compose<S, A>
where
    S: Send + Sync,
    A: Send,
{
    fn enhance(&self, builder: StoreBuilder<S, A>) -> StoreBuilder<S, A> {
        self.enhancers
            .iter()
            .fold(builder, |builder, enhancer| enhancer.enhance(builder))
    }
}

/// Enhancer that changes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl<S, A> StoreEnhancer<S, A> for Passthrough {
    fn enhance(&self, builder: StoreBuilder<S, A>) -> StoreBuilder<S, A> {
        builder
    }
}
