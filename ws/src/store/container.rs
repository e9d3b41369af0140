//! Store, builder, and the traits plugged into them

use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::debug;

use super::enhancer::StoreEnhancer;
use super::error::{StoreError, StoreResult};

type Subscriber<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Pure state transition
///
/// Any `Fn(&S, &A) -> S` closure or function is a reducer.
pub trait Reducer<S, A>: Send + Sync {
    fn reduce(&self, state: &S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> S + Send + Sync,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        self(state, action)
    }
}

/// Interceptor in the dispatch pipeline
///
/// A middleware receives every dispatched action before the reducer does. It may
/// forward it unchanged, forward a different action, forward several, or swallow it.
pub trait Middleware<S, A>: Send + Sync {
    /// Stable name, used for logging and chain inspection
    fn name(&self) -> &'static str;

    /// Called once, right after the store is built
    fn attach(&self, _store: &Store<S, A>) {}

    /// Handle an action; `next` continues down the chain
    fn handle(&self, store: &Store<S, A>, action: A, next: Next<'_, S, A>) -> StoreResult<()>;
}

/// Observer of every reduction, installed by enhancers
pub trait Monitor<S, A>: Send + Sync {
    fn observe(&self, action: &A, state: &S);
}

/// Continuation handed to a middleware
pub struct Next<'a, S, A> {
    store: &'a Store<S, A>,
    index: usize,
}

impl<S, A> Clone for Next<'_, S, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, A> Copy for Next<'_, S, A> {}

impl<S, A> Next<'_, S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Pass an action to the rest of the chain
    pub fn run(&self, action: A) -> StoreResult<()> {
        self.store.dispatch_from(self.index, action)
    }
}

/// Everything a store is made of, before it exists
///
/// Enhancers receive and return a builder.
pub struct StoreBuilder<S, A> {
    reducer: Arc<dyn Reducer<S, A>>,
    preloaded: S,
    middlewares: Vec<Arc<dyn Middleware<S, A>>>,
    monitors: Vec<Arc<dyn Monitor<S, A>>>,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub fn new(reducer: impl Reducer<S, A> + 'static, preloaded: S) -> Self {
        Self {
            reducer: Arc::new(reducer),
            preloaded,
            middlewares: Vec::new(),
            monitors: Vec::new(),
        }
    }

    /// Append a middleware to the end of the chain
    pub fn middleware(mut self, middleware: Arc<dyn Middleware<S, A>>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Install a monitor
    pub fn monitor(mut self, monitor: Arc<dyn Monitor<S, A>>) -> Self {
        self.monitors.push(monitor);
        self
    }

    /// Build the store and attach every middleware to it
    pub fn build(self) -> Store<S, A> {
        let store = Store {
            inner: Arc::new(StoreInner {
                state: RwLock::new(self.preloaded),
                reducer: self.reducer,
                middlewares: self.middlewares,
                monitors: self.monitors,
                subscribers: RwLock::new(Vec::new()),
            }),
        };
        for middleware in &store.inner.middlewares {
            debug!(middleware = middleware.name(), "StoreBuilder::build: attaching middleware");
            middleware.attach(&store);
        }
        store
    }
}

struct StoreInner<S, A> {
    state: RwLock<S>,
    reducer: Arc<dyn Reducer<S, A>>,
    middlewares: Vec<Arc<dyn Middleware<S, A>>>,
    monitors: Vec<Arc<dyn Monitor<S, A>>>,
    subscribers: RwLock<Vec<Subscriber<S>>>,
}

/// Thread-safe state container
///
/// Cloning a store yields another handle to the same state.
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a store, letting `enhancer` shape it first
    pub fn create(
        reducer: impl Reducer<S, A> + 'static,
        preloaded: S,
        enhancer: &dyn StoreEnhancer<S, A>,
    ) -> Self {
        enhancer.enhance(StoreBuilder::new(reducer, preloaded)).build()
    }

    /// Clone of the current state
    pub fn state(&self) -> S {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Read the state in place
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.inner.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&*state)
    }

    /// Send an action through the full middleware chain
    pub fn dispatch(&self, action: A) -> StoreResult<()> {
        self.dispatch_from(0, action)
    }

    /// Register a callback invoked with the new state after every reduction
    ///
    /// Callbacks may dispatch; the nested reduction notifies before the outer
    /// notification loop continues.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }

    /// Names of the middlewares, in chain order
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.inner.middlewares.iter().map(|m| m.name()).collect()
    }

    /// Handle that does not keep the store alive
    pub fn downgrade(&self) -> WeakStore<S, A> {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn dispatch_from(&self, index: usize, action: A) -> StoreResult<()> {
        match self.inner.middlewares.get(index) {
            Some(middleware) => middleware.handle(self, action, Next { store: self, index: index + 1 }),
            None => {
                self.reduce(action);
                Ok(())
            }
        }
    }

    fn reduce(&self, action: A) {
        let snapshot = {
            let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = self.inner.reducer.reduce(&*state, &action);
            state.clone()
        };

        for monitor in &self.inner.monitors {
            monitor.observe(&action, &snapshot);
        }

        let subscribers = self.inner.subscribers.read().unwrap_or_else(PoisonError::into_inner).clone();
        for subscriber in &subscribers {
            subscriber(&snapshot);
        }
    }
}

/// Weak store handle, held by background tasks
pub struct WeakStore<S, A> {
    inner: Weak<StoreInner<S, A>>,
}

impl<S, A> Clone for WeakStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S, A> WeakStore<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub fn upgrade(&self) -> Option<Store<S, A>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }

    /// Dispatch if the store is still alive
    pub fn dispatch(&self, action: A) -> StoreResult<()> {
        self.upgrade().ok_or(StoreError::Dropped)?.dispatch(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Passthrough;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Add(i64),
        Double,
    }

    fn counter(state: &i64, action: &Op) -> i64 {
        match action {
            Op::Add(n) => state + n,
            Op::Double => state * 2,
        }
    }

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware<i64, Op> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&self, _store: &Store<i64, Op>, action: Op, next: Next<'_, i64, Op>) -> StoreResult<()> {
            self.seen.lock().unwrap().push(format!("{}:{:?}", self.name, action));
            next.run(action)
        }
    }

    /// Turns every Add into Add followed by Double
    struct Doubler;

    impl Middleware<i64, Op> for Doubler {
        fn name(&self) -> &'static str {
            "doubler"
        }

        fn handle(&self, _store: &Store<i64, Op>, action: Op, next: Next<'_, i64, Op>) -> StoreResult<()> {
            let is_add = matches!(action, Op::Add(_));
            next.run(action)?;
            if is_add {
                next.run(Op::Double)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_without_middleware() {
        let store = Store::create(counter, 1, &Passthrough);
        store.dispatch(Op::Add(4)).unwrap();
        assert_eq!(store.state(), 5);
        store.dispatch(Op::Double).unwrap();
        assert_eq!(store.read(|s| *s), 10);
    }

    #[test]
    fn test_middleware_runs_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = StoreBuilder::new(counter, 0)
            .middleware(Arc::new(Recorder {
                name: "first",
                seen: seen.clone(),
            }))
            .middleware(Arc::new(Recorder {
                name: "second",
                seen: seen.clone(),
            }))
            .build();

        store.dispatch(Op::Add(1)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["first:Add(1)", "second:Add(1)"]);
        assert_eq!(store.middleware_names(), vec!["first", "second"]);
    }

    #[test]
    fn test_next_can_run_more_than_once() {
        let store = StoreBuilder::new(counter, 0).middleware(Arc::new(Doubler)).build();
        store.dispatch(Op::Add(3)).unwrap();
        assert_eq!(store.state(), 6);
    }

    #[test]
    fn test_subscribers_see_new_state() {
        let store = Store::create(counter, 0, &Passthrough);
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(0));

        let calls_clone = calls.clone();
        let last_clone = last.clone();
        store.subscribe(move |state| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            *last_clone.lock().unwrap() = *state;
        });

        store.dispatch(Op::Add(2)).unwrap();
        store.dispatch(Op::Add(3)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*last.lock().unwrap(), 5);
    }

    #[test]
    fn test_subscriber_may_dispatch() {
        let store = Store::create(counter, 0, &Passthrough);
        let weak = store.downgrade();
        store.subscribe(move |state| {
            if *state == 1 {
                weak.dispatch(Op::Add(10)).unwrap();
            }
        });

        store.dispatch(Op::Add(1)).unwrap();
        assert_eq!(store.state(), 11);
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::create(counter, 0, &Passthrough);
        let other = store.clone();
        other.dispatch(Op::Add(7)).unwrap();
        assert_eq!(store.state(), 7);
    }

    #[test]
    fn test_weak_store_after_drop() {
        let store = Store::create(counter, 0, &Passthrough);
        let weak = store.downgrade();
        assert!(weak.upgrade().is_some());

        drop(store);

        assert!(weak.upgrade().is_none());
        assert!(matches!(weak.dispatch(Op::Add(1)), Err(StoreError::Dropped)));
    }
}
