//! Search filtering and day-window pagination over the store's snapshot.
//!
//! The view model never mutates the store. It remembers the last filtered
//! snapshot together with the store version and search term that produced it;
//! a mismatch on either one rebuilds the filtered view on the next read.

use crate::grouper::{DayBucket, Snapshot};
use crate::store::SharedStore;
use std::sync::Arc;
use tracing::debug;

/// The slice of day buckets a presentation layer should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWindow {
    pub buckets: Vec<DayBucket>,
    pub offset: usize,
    /// Buckets in the filtered snapshot, across all windows.
    pub total: usize,
    pub has_more: bool,
}

impl VisibleWindow {
    /// Offset to pass for the following "load more" call.
    pub fn next_offset(&self) -> usize {
        self.offset + self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(DayBucket::len).sum()
    }
}

#[derive(Debug)]
struct Filtered {
    version: u64,
    term: String,
    snapshot: Arc<Snapshot>,
}

#[derive(Debug)]
pub struct ViewModel {
    store: SharedStore,
    term: String,
    cache: Option<Filtered>,
}

impl ViewModel {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            term: String::new(),
            cache: None,
        }
    }

    /// Sets the search term. Surrounding whitespace is ignored; a blank term shows everything.
    pub fn set_search_term(&mut self, term: impl AsRef<str>) {
        self.term = term.as_ref().trim().to_lowercase();
    }

    pub fn clear_search(&mut self) {
        self.term.clear();
    }

    pub fn search_term(&self) -> &str {
        &self.term
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// The filtered snapshot, rebuilt only when the store or the term changed.
    pub fn filtered(&mut self) -> Arc<Snapshot> {
        let (version, snapshot) = self.store.versioned_snapshot();
        if let Some(cached) = &self.cache {
            if cached.version == version && cached.term == self.term {
                return cached.snapshot.clone();
            }
        }

        let filtered = if self.term.is_empty() {
            snapshot
        } else {
            Arc::new(filter_buckets(&snapshot, &self.term))
        };
        debug!(
            version,
            term = %self.term,
            buckets = filtered.len(),
            "view recomputed"
        );
        self.cache = Some(Filtered {
            version,
            term: self.term.clone(),
            snapshot: filtered.clone(),
        });
        filtered
    }

    /// Up to `limit` buckets starting at `offset`, newest day first.
    ///
    /// A window always spans at least one day, so `next_offset` advances
    /// whenever `has_more` is set.
    pub fn visible_window(&mut self, offset: usize, limit: usize) -> VisibleWindow {
        let filtered = self.filtered();
        let total = filtered.len();
        let start = offset.min(total);
        let end = start.saturating_add(limit.max(1)).min(total);

        VisibleWindow {
            buckets: filtered.buckets()[start..end].to_vec(),
            offset: start,
            total,
            has_more: end < total,
        }
    }
}

fn filter_buckets(snapshot: &Snapshot, term: &str) -> Snapshot {
    let kept = snapshot
        .iter()
        .filter(|bucket| bucket_matches(bucket, term))
        .cloned()
        .collect();
    Snapshot::from_buckets(kept)
}

fn bucket_matches(bucket: &DayBucket, term: &str) -> bool {
    if bucket.day.to_string().contains(term) || bucket.day.label().to_lowercase().contains(term) {
        return true;
    }
    bucket
        .entries
        .iter()
        .any(|e| e.content.to_lowercase().contains(term))
}
