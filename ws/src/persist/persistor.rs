//! Persistor - rehydrates a store once, then writes its state through
//!
//! State changes only mark the store dirty. A writer actor owns the storage
//! handle and reads the store's current state when it writes, so the last
//! write always reflects the newest state no matter how notifications
//! interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::config::{PersistAction, PersistConfig, RehydratePayload, StateFilter};
use super::error::{PersistError, PersistResult, StorageError};
use super::storage::Storage;
use crate::store::{Store, WeakStore};

/// Rehydration progress of a persistor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// Storage read still in flight
    Pending,
    /// Stored state merged (or nothing was stored)
    Rehydrated,
    /// Storage could not be read; the store kept its initial state
    Failed(String),
}

/// Commands for the writer actor
#[derive(Debug)]
enum WriterCommand {
    /// State changed since the last write
    Dirty,
    Flush {
        reply: oneshot::Sender<PersistResult<()>>,
    },
    Purge {
        reply: oneshot::Sender<PersistResult<()>>,
    },
}

/// Sending half of the writer channel, coalescing dirty signals
#[derive(Clone)]
struct DirtySignal {
    tx: mpsc::UnboundedSender<WriterCommand>,
    pending: Arc<AtomicBool>,
}

impl DirtySignal {
    fn mark(&self) {
        // One queued signal covers every change until the writer picks it up
        if self.pending.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.tx.send(WriterCommand::Dirty).is_err() {
            debug!("DirtySignal::mark: writer gone, dropping write");
        }
    }
}

/// Handle to a running persistence session
#[derive(Clone)]
pub struct Persistor {
    key: String,
    status_rx: watch::Receiver<PersistStatus>,
    tx: mpsc::UnboundedSender<WriterCommand>,
    paused: Arc<AtomicBool>,
}

/// Start persisting `store` with `config`
///
/// Returns at once. Rehydration runs on a spawned task; when it succeeds,
/// `on_rehydrated` is invoked exactly once with the store, and only then does
/// [`Persistor::ready`] resolve. On failure the callback is dropped unused.
/// From the moment rehydration finishes, every state change is written through.
///
/// Must be called inside a tokio runtime.
pub fn persist_store<S, A, F>(store: &Store<S, A>, config: PersistConfig, on_rehydrated: F) -> Persistor
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    A: PersistAction + Send + 'static,
    F: FnOnce(&Store<S, A>) + Send + 'static,
{
    let storage_key = config.storage_key();
    debug!(%storage_key, version = config.version, "persist_store: called");

    let (status_tx, status_rx) = watch::channel(PersistStatus::Pending);
    let (tx, rx) = mpsc::unbounded_channel();
    let paused = Arc::new(AtomicBool::new(false));
    let writes_enabled = Arc::new(AtomicBool::new(false));
    let dirty = DirtySignal {
        tx: tx.clone(),
        pending: Arc::new(AtomicBool::new(false)),
    };

    // Write-through on every state change once rehydration is over
    {
        let dirty = dirty.clone();
        let paused = paused.clone();
        let writes_enabled = writes_enabled.clone();
        store.subscribe(move |_: &S| {
            if !writes_enabled.load(Ordering::SeqCst) || paused.load(Ordering::SeqCst) {
                return;
            }
            dirty.mark();
        });
    }

    let writer = Writer {
        store: store.downgrade(),
        filter: config.filter(),
        storage: config.storage.clone(),
        storage_key: storage_key.clone(),
        paused: paused.clone(),
        pending: dirty.pending.clone(),
        last_error: None,
    };
    tokio::spawn(writer.run(rx));

    let session = RehydrateSession {
        store: store.clone(),
        config,
        writes_enabled,
        paused: paused.clone(),
        dirty,
        status_tx,
    };
    tokio::spawn(session.run(on_rehydrated));

    Persistor {
        key: storage_key,
        status_rx,
        tx,
        paused,
    }
}

struct RehydrateSession<S, A> {
    store: Store<S, A>,
    config: PersistConfig,
    writes_enabled: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    dirty: DirtySignal,
    status_tx: watch::Sender<PersistStatus>,
}

impl<S, A> RehydrateSession<S, A>
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    A: PersistAction + Send + 'static,
{
    async fn run<F>(self, on_rehydrated: F)
    where
        F: FnOnce(&Store<S, A>) + Send + 'static,
    {
        let outcome = match self.load().await {
            Ok(stored) => self.dispatch_rehydrate(stored),
            Err(e) => {
                warn!(error = %e, key = %self.config.key, "RehydrateSession::run: storage read failed, keeping initial state");
                // Nothing restored, but the store still sees the rehydrate
                if let Err(dispatch_err) = self.dispatch_rehydrate(None) {
                    warn!(error = %dispatch_err, "RehydrateSession::run: empty rehydrate failed");
                }
                Err(e)
            }
        };

        // Initial write replaces whatever was stored, including unreadable blobs
        self.writes_enabled.store(true, Ordering::SeqCst);
        if !self.paused.load(Ordering::SeqCst) {
            self.dirty.mark();
        }

        let status = match outcome {
            Ok(()) => {
                info!(key = %self.config.key, "Rehydration complete");
                on_rehydrated(&self.store);
                PersistStatus::Rehydrated
            }
            Err(e) => PersistStatus::Failed(e.to_string()),
        };
        // No receivers left is fine; nobody is waiting
        let _ = self.status_tx.send(status);
    }

    async fn load(&self) -> PersistResult<Option<Map<String, Value>>> {
        let storage_key = self.config.storage_key();
        let Some(raw) = self.config.storage.get_item(&storage_key).await? else {
            debug!(%storage_key, "RehydrateSession::load: nothing stored");
            return Ok(None);
        };

        let stored: Map<String, Value> = serde_json::from_str(&raw)?;
        if !self.config.filter().version_matches(&stored) {
            info!(%storage_key, "Stored state has a different version, discarding");
            return Ok(None);
        }
        Ok(Some(stored))
    }

    fn dispatch_rehydrate(&self, stored: Option<Map<String, Value>>) -> PersistResult<()> {
        debug!(restored = stored.is_some(), "RehydrateSession::dispatch_rehydrate: called");
        self.store.dispatch(A::rehydrate(RehydratePayload {
            key: self.config.key.clone(),
            state: stored,
        }))?;
        Ok(())
    }
}

/// Writer actor; holds the store weakly so it never keeps it alive
struct Writer<S, A> {
    store: WeakStore<S, A>,
    filter: StateFilter,
    storage: Arc<dyn Storage>,
    storage_key: String,
    paused: Arc<AtomicBool>,
    pending: Arc<AtomicBool>,
    last_error: Option<StorageError>,
}

impl<S, A> Writer<S, A>
where
    S: Serialize + Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<WriterCommand>) {
        debug!(storage_key = %self.storage_key, "Writer::run: started");

        while let Some(command) = rx.recv().await {
            match command {
                WriterCommand::Dirty => self.write_current().await,
                WriterCommand::Flush { reply } => {
                    let result = match self.last_error.take() {
                        Some(e) => Err(PersistError::Storage(e)),
                        None => Ok(()),
                    };
                    let _ = reply.send(result);
                }
                WriterCommand::Purge { reply } => {
                    let result = self
                        .storage
                        .remove_item(&self.storage_key)
                        .await
                        .map_err(PersistError::from);
                    let _ = reply.send(result);
                }
            }
        }
        debug!(storage_key = %self.storage_key, "Writer::run: all handles dropped, exiting");
    }

    async fn write_current(&mut self) {
        // Cleared before reading, so later changes queue a new signal
        self.pending.store(false, Ordering::SeqCst);
        if self.paused.load(Ordering::SeqCst) {
            debug!("Writer::write_current: paused, skipping");
            return;
        }
        let Some(store) = self.store.upgrade() else {
            debug!("Writer::write_current: store dropped, skipping");
            return;
        };

        let serialized = match store
            .read(|state| self.filter.outbound(state))
            .and_then(|slice| Ok(serde_json::to_string(&slice)?))
        {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(error = %e, "Writer::write_current: failed to encode state");
                return;
            }
        };
        drop(store);

        if let Err(e) = self.storage.set_item(&self.storage_key, serialized).await {
            warn!(error = %e, storage_key = %self.storage_key, "Writer::write_current: write failed");
            self.last_error = Some(e);
        }
    }
}

impl Persistor {
    /// Storage key this persistor writes to
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn status(&self) -> PersistStatus {
        self.status_rx.borrow().clone()
    }

    /// Resolve once rehydration has finished, with its outcome
    pub async fn ready(&self) -> PersistResult<()> {
        let mut rx = self.status_rx.clone();
        let status = rx
            .wait_for(|status| *status != PersistStatus::Pending)
            .await
            .map_err(|_| PersistError::ChannelError)?
            .clone();
        match status {
            PersistStatus::Failed(reason) => Err(PersistError::Rehydrate(reason)),
            _ => Ok(()),
        }
    }

    /// Stop writing state changes
    pub fn pause(&self) {
        debug!(key = %self.key, "Persistor::pause: called");
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resume writing; the next state change is written in full
    pub fn resume(&self) {
        debug!(key = %self.key, "Persistor::resume: called");
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Wait until every queued write has reached storage
    ///
    /// Reports the last write failure since the previous flush, if any.
    pub async fn flush(&self) -> PersistResult<()> {
        debug!(key = %self.key, "Persistor::flush: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(WriterCommand::Flush { reply: reply_tx })
            .map_err(|_| PersistError::ChannelError)?;
        reply_rx.await.map_err(|_| PersistError::ChannelError)?
    }

    /// Remove persisted state; later changes are written again unless paused
    pub async fn purge(&self) -> PersistResult<()> {
        debug!(key = %self.key, "Persistor::purge: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(WriterCommand::Purge { reply: reply_tx })
            .map_err(|_| PersistError::ChannelError)?;
        reply_rx.await.map_err(|_| PersistError::ChannelError)?
    }
}
