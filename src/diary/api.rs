//! # API Facade
//!
//! [`DiaryApi`] is the single entry point a presentation layer talks to. It
//! owns the wiring: one [`SharedStore`], the [`SyncBridge`] subscription that
//! keeps it current, the backend that writes and feeds entries, and the
//! [`ViewModel`] that pages and filters what is shown.
//!
//! Methods dispatch to `commands::*` and return [`CmdResult`]. Nothing here
//! prints or formats for a terminal.
//!
//! ## Feed errors
//!
//! Errors reported by the feed never fail a command. They are collected by the
//! subscription's error callback and attached as warnings to the next result,
//! while the store keeps serving the last good snapshot.
//!
//! ## Generic over the backend
//!
//! - CLI: `DiaryApi<JsonFileFeed>`
//! - Tests and embedding: `DiaryApi<MemoryFeed>`

use crate::commands;
use crate::error::Result;
use crate::feed::{ChangeFeed, EntryWriter, FeedError};
use crate::grouper::{DateGrouper, Snapshot};
use crate::model::{EntryDraft, EntryPatch};
use crate::store::{EntryStore, SharedStore};
use crate::sync::{Subscription, SyncBridge};
use crate::view_model::ViewModel;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

type FeedErrors = Arc<Mutex<Vec<FeedError>>>;

pub struct DiaryApi<B: EntryWriter + ChangeFeed> {
    backend: B,
    store: SharedStore,
    view: ViewModel,
    subscription: Subscription,
    feed_errors: FeedErrors,
    paths: commands::DiaryPaths,
}

impl<B: EntryWriter + ChangeFeed> DiaryApi<B> {
    /// Subscribes a fresh store to `backend` and backfills it.
    ///
    /// A backend that fails to attach leaves the diary empty; the failure shows
    /// up as a warning on the first command result.
    pub fn connect(mut backend: B, grouper: DateGrouper, paths: commands::DiaryPaths) -> Self {
        let store = SharedStore::new(EntryStore::new(grouper));
        let bridge = SyncBridge::new(store.clone());
        let feed_errors: FeedErrors = Arc::default();

        let sink_errors = feed_errors.clone();
        let subscription = bridge.subscribe(
            |snapshot: Arc<Snapshot>| {
                debug!(
                    days = snapshot.len(),
                    entries = snapshot.entry_count(),
                    "snapshot published"
                );
            },
            move |error: &FeedError| {
                sink_errors
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(error.clone());
            },
        );

        if let Err(e) = backend.attach(subscription.sink()) {
            warn!(error = %e, "feed failed to attach");
            feed_errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(e);
        }
        info!(entries = store.read(|s| s.len()), "diary connected");

        Self {
            backend,
            view: ViewModel::new(store.clone()),
            store,
            subscription,
            feed_errors,
            paths,
        }
    }

    pub fn add_entry(&mut self, draft: EntryDraft) -> Result<commands::CmdResult> {
        let result = commands::add::run(&mut self.backend, &self.store, draft);
        self.finish(result)
    }

    pub fn edit_entry(&mut self, selector: &str, patch: &EntryPatch) -> Result<commands::CmdResult> {
        let result = commands::edit::run(&mut self.backend, &self.store, selector, patch);
        self.finish(result)
    }

    pub fn delete_entries<I: AsRef<str>>(&mut self, selectors: &[I]) -> Result<commands::CmdResult> {
        let result = commands::delete::run(&mut self.backend, &self.store, selectors);
        self.finish(result)
    }

    pub fn show<I: AsRef<str>>(&self, selectors: &[I]) -> Result<commands::CmdResult> {
        let result = commands::view::run(&self.store, selectors);
        self.finish(result)
    }

    pub fn list(&mut self, offset: usize, limit: usize) -> Result<commands::CmdResult> {
        let result = commands::list::run(&mut self.view, offset, limit);
        self.finish(result)
    }

    pub fn search(&mut self, term: &str, offset: usize, limit: usize) -> Result<commands::CmdResult> {
        let result = commands::search::run(&mut self.view, term, offset, limit);
        self.finish(result)
    }

    pub fn config(&self, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&self.paths, action)
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stops applying feed events. The store keeps its last state.
    pub fn disconnect(&self) {
        self.subscription.unsubscribe();
    }

    fn finish(&self, result: Result<commands::CmdResult>) -> Result<commands::CmdResult> {
        let mut result = result?;
        let errors = std::mem::take(
            &mut *self
                .feed_errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for error in errors {
            result.add_message(CmdMessage::warning(error.to_string()));
        }
        Ok(result)
    }
}

pub use crate::commands::config::ConfigAction;
pub use commands::{CmdMessage, CmdResult, DiaryPaths, MessageLevel};
