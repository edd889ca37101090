//! # Sync Bridge
//!
//! Adapts a [`ChangeFeed`](crate::feed::ChangeFeed) to the [`EntryStore`] and
//! republishes the store as snapshots.
//!
//! ```text
//!   feed ──batch──▶ FeedSink ──▶ SyncBridge ──▶ EntryStore
//!                                    │
//!                                    └──▶ on_snapshot(Arc<Snapshot>)  (once per batch)
//!                                    └──▶ on_error(&FeedError)
//! ```
//!
//! ## Event handling
//!
//! The feed is treated as authoritative and tolerant of redelivery:
//!
//! | Event      | Store call                                   | Id already known          | Id unknown        |
//! |------------|----------------------------------------------|---------------------------|-------------------|
//! | `Added`    | `add_entry`                                  | replace with the payload  | insert            |
//! | `Modified` | `update_entry` with the full payload         | update (may move day)     | insert            |
//! | `Removed`  | `remove_entry`                               | remove                    | ignored           |
//!
//! A payload that cannot be normalized is skipped and reported through
//! `on_error`; the rest of its batch still applies.
//!
//! ## Subscription lifetime
//!
//! A bridge carries at most one live [`Subscription`]. Subscribing again closes
//! the previous one. Once [`Subscription::unsubscribe`] returns, no sink of that
//! subscription mutates the store again: batch application and unsubscribing
//! take the same lock. Feed errors never clear the store and never close the
//! subscription.

use crate::error::DiaryError;
use crate::feed::{ChangeEvent, ChangeKind, FeedError};
use crate::grouper::Snapshot;
use crate::model::{EntryId, EntryPatch};
use crate::store::{EntryStore, SharedStore};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

type SnapshotCallback = Arc<dyn Fn(Arc<Snapshot>) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&FeedError) + Send + Sync>;

struct Listener {
    generation: u64,
    on_snapshot: SnapshotCallback,
    on_error: ErrorCallback,
}

#[derive(Default)]
struct BridgeState {
    last_generation: u64,
    listener: Option<Listener>,
}

impl BridgeState {
    fn callbacks(&self, generation: u64) -> Option<(SnapshotCallback, ErrorCallback)> {
        self.listener
            .as_ref()
            .filter(|l| l.generation == generation)
            .map(|l| (l.on_snapshot.clone(), l.on_error.clone()))
    }
}

fn lock_state(state: &Mutex<BridgeState>) -> MutexGuard<'_, BridgeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of handing something to a [`FeedSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// The subscription is gone; the feed should stop delivering to this sink.
    Closed,
}

pub struct SyncBridge {
    store: SharedStore,
    state: Arc<Mutex<BridgeState>>,
}

impl SyncBridge {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(BridgeState::default())),
        }
    }

    /// Registers the snapshot and error callbacks and opens the bridge to a feed.
    ///
    /// Hand [`Subscription::sink`] to the feed afterwards.
    pub fn subscribe<S, E>(&self, on_snapshot: S, on_error: E) -> Subscription
    where
        S: Fn(Arc<Snapshot>) + Send + Sync + 'static,
        E: Fn(&FeedError) + Send + Sync + 'static,
    {
        let mut state = lock_state(&self.state);
        state.last_generation += 1;
        let generation = state.last_generation;
        if state.listener.is_some() {
            debug!(generation, "replacing previous subscription");
        }
        state.listener = Some(Listener {
            generation,
            on_snapshot: Arc::new(on_snapshot),
            on_error: Arc::new(on_error),
        });

        Subscription {
            sink: FeedSink {
                state: self.state.clone(),
                store: self.store.clone(),
                generation,
            },
        }
    }

    pub fn is_subscribed(&self) -> bool {
        lock_state(&self.state).listener.is_some()
    }
}

/// Handle returned by [`SyncBridge::subscribe`]. Dropping it unsubscribes.
pub struct Subscription {
    sink: FeedSink,
}

impl Subscription {
    pub fn sink(&self) -> FeedSink {
        self.sink.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.sink.is_closed()
    }

    /// Stops delivery. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        let mut state = lock_state(&self.sink.state);
        let ours = state
            .listener
            .as_ref()
            .is_some_and(|l| l.generation == self.sink.generation);
        if ours {
            state.listener = None;
            debug!(generation = self.sink.generation, "unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("generation", &self.sink.generation)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Inlet a feed pushes batches into. Cheap to clone.
#[derive(Clone)]
pub struct FeedSink {
    state: Arc<Mutex<BridgeState>>,
    store: SharedStore,
    generation: u64,
}

impl FeedSink {
    /// Applies a batch and publishes one snapshot for it.
    pub fn deliver(&self, batch: Vec<ChangeEvent>) -> Delivery {
        let state = lock_state(&self.state);
        let Some((on_snapshot, on_error)) = state.callbacks(self.generation) else {
            debug!(events = batch.len(), "dropping batch for closed subscription");
            return Delivery::Closed;
        };

        let (snapshot, rejected) = self.store.write(|store| {
            let rejected = apply_batch(store, batch);
            (store.snapshot(), rejected)
        });
        drop(state);

        on_snapshot(snapshot);
        for error in &rejected {
            on_error(error);
        }
        Delivery::Accepted
    }

    /// Reports a feed failure. The store and the last snapshot are left as they are.
    pub fn fail(&self, error: FeedError) -> Delivery {
        let Some((_, on_error)) = lock_state(&self.state).callbacks(self.generation) else {
            return Delivery::Closed;
        };
        warn!(%error, "change feed failed");
        on_error(&error);
        Delivery::Accepted
    }

    pub fn is_closed(&self) -> bool {
        lock_state(&self.state)
            .callbacks(self.generation)
            .is_none()
    }
}

impl fmt::Debug for FeedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

fn apply_batch(store: &mut EntryStore, batch: Vec<ChangeEvent>) -> Vec<FeedError> {
    let zone = store.grouper().zone();
    let mut rejected = Vec::new();
    let size = batch.len();

    for event in batch {
        let id = EntryId::new(event.doc.id.clone());

        if event.kind == ChangeKind::Removed {
            match store.remove_entry(&id) {
                Ok(_) => {}
                Err(DiaryError::NotFound(_)) => debug!(%id, "removal of unknown entry ignored"),
                Err(e) => rejected.push(FeedError::malformed(id.as_str(), e)),
            }
            continue;
        }

        let entry = match event.doc.normalize(&zone) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(%error, "skipping malformed feed event");
                rejected.push(error);
                continue;
            }
        };

        let applied = if store.contains(&id) {
            match event.kind {
                ChangeKind::Modified => store
                    .update_entry(&id, &EntryPatch::replacing_with(&entry))
                    .map(|_| ()),
                _ => match store.add_entry(entry.clone()) {
                    Err(DiaryError::DuplicateId(_)) => store.replace_entry(entry).map(|_| ()),
                    other => other.map(|_| ()),
                },
            }
        } else {
            store.add_entry(entry).map(|_| ())
        };

        if let Err(e) = applied {
            warn!(%id, error = %e, "feed event rejected by store");
            rejected.push(FeedError::malformed(id.as_str(), e));
        }
    }

    debug!(
        events = size,
        rejected = rejected.len(),
        entries = store.len(),
        "applied feed batch"
    );
    rejected
}
