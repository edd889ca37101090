//! # Entry Store
//!
//! [`EntryStore`] owns the canonical collection of diary entries. It keeps a
//! per-day index next to the entries so a [`Snapshot`] can be materialized by
//! walking the days in order, without regrouping everything.
//!
//! ## Consistency
//!
//! Every mutation takes `&mut self` and either completes or leaves the store
//! untouched: a date change removes the entry from its old day and inserts it
//! into the new one inside the same call, so no snapshot ever shows the entry
//! in two days or in none. Days that lose their last entry are dropped.
//!
//! Snapshots are built lazily, cached until the next mutation and handed out as
//! `Arc<Snapshot>`; callers never see the store's internal maps.
//!
//! ## Sharing
//!
//! The sync bridge and local edit paths share one store through
//! [`SharedStore`]. Each access holds the lock for a single call, so mutations
//! are applied one at a time and readers only ever observe complete states.

use crate::error::{DiaryError, Result};
use crate::grouper::{DateGrouper, DayBucket, DayKey, Snapshot};
use crate::model::{Entry, EntryId, EntryPatch};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

mod shared;

pub use shared::SharedStore;

/// Position of an entry inside its day, ascending.
type DaySlot = (DateTime<Utc>, EntryId);

/// What `add_entry` did with the entry it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    /// An identical entry was already present; nothing changed.
    Unchanged,
}

#[derive(Debug, Default)]
pub struct EntryStore {
    grouper: DateGrouper,
    entries: HashMap<EntryId, Entry>,
    days: BTreeMap<DayKey, BTreeSet<DaySlot>>,
    version: u64,
    snapshot: OnceCell<Arc<Snapshot>>,
}

impl EntryStore {
    pub fn new(grouper: DateGrouper) -> Self {
        Self {
            grouper,
            ..Self::default()
        }
    }

    pub fn grouper(&self) -> &DateGrouper {
        &self.grouper
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntryId> {
        self.entries.keys()
    }

    /// Bumped on every state change, never on no-ops.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Inserts a new entry.
    ///
    /// Redelivering an entry that is already stored byte for byte is accepted
    /// and changes nothing. Reusing an id for a different payload is a
    /// [`DiaryError::DuplicateId`].
    pub fn add_entry(&mut self, entry: Entry) -> Result<AddOutcome> {
        entry.validate()?;

        if let Some(existing) = self.entries.get(&entry.id) {
            if existing == &entry {
                debug!(id = %entry.id, "entry redelivered unchanged");
                return Ok(AddOutcome::Unchanged);
            }
            return Err(DiaryError::DuplicateId(entry.id));
        }

        debug!(id = %entry.id, day = %self.grouper.day_key(&entry.created_at), "adding entry");
        self.attach(entry);
        self.touch();
        Ok(AddOutcome::Inserted)
    }

    /// Applies `patch` to an existing entry and returns the updated entry.
    ///
    /// The patched entry is validated before anything changes. If its
    /// timestamp lands on another calendar day it moves buckets in one step.
    pub fn update_entry(&mut self, id: &EntryId, patch: &EntryPatch) -> Result<Entry> {
        let current = self
            .entries
            .get(id)
            .ok_or_else(|| DiaryError::NotFound(id.clone()))?;

        let updated = patch.apply_to(current);
        updated.validate()?;

        if &updated == current {
            return Ok(updated);
        }

        debug!(
            id = %id,
            from = %self.grouper.day_key(&current.created_at),
            to = %self.grouper.day_key(&updated.created_at),
            "updating entry"
        );
        self.detach(id);
        self.attach(updated.clone());
        self.touch();
        Ok(updated)
    }

    /// Stores `entry` whether or not its id is known, returning the entry it replaced.
    pub fn replace_entry(&mut self, entry: Entry) -> Result<Option<Entry>> {
        entry.validate()?;

        if self.entries.get(&entry.id) == Some(&entry) {
            return Ok(Some(entry));
        }

        debug!(id = %entry.id, "replacing entry");
        let previous = self.detach(&entry.id);
        self.attach(entry);
        self.touch();
        Ok(previous)
    }

    pub fn remove_entry(&mut self, id: &EntryId) -> Result<Entry> {
        let removed = self
            .detach(id)
            .ok_or_else(|| DiaryError::NotFound(id.clone()))?;
        debug!(id = %id, "removed entry");
        self.touch();
        Ok(removed)
    }

    /// Current state as an immutable snapshot, newest day first.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .get_or_init(|| Arc::new(self.materialize()))
            .clone()
    }

    fn materialize(&self) -> Snapshot {
        let newest_first = matches!(
            self.grouper.order(),
            crate::grouper::IntraDayOrder::NewestFirst
        );

        let buckets = self
            .days
            .iter()
            .rev()
            .map(|(day, slots)| {
                let lookup = |(_, id): &DaySlot| self.entries.get(id).cloned();
                let entries: Vec<Entry> = if newest_first {
                    slots.iter().rev().filter_map(lookup).collect()
                } else {
                    slots.iter().filter_map(lookup).collect()
                };
                DayBucket { day: *day, entries }
            })
            .collect();

        Snapshot::from_buckets(buckets)
    }

    fn attach(&mut self, entry: Entry) {
        let day = self.grouper.day_key(&entry.created_at);
        self.days
            .entry(day)
            .or_default()
            .insert((entry.created_at, entry.id.clone()));
        self.entries.insert(entry.id.clone(), entry);
    }

    fn detach(&mut self, id: &EntryId) -> Option<Entry> {
        let entry = self.entries.remove(id)?;
        let day = self.grouper.day_key(&entry.created_at);
        if let Some(slots) = self.days.get_mut(&day) {
            slots.remove(&(entry.created_at, entry.id.clone()));
            if slots.is_empty() {
                self.days.remove(&day);
            }
        }
        Some(entry)
    }

    fn touch(&mut self) {
        self.version += 1;
        self.snapshot = OnceCell::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouper::{DisplayZone, IntraDayOrder};
    use chrono::TimeZone;

    fn ts(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn entry(id: &str, d: u32, h: u32) -> Entry {
        Entry::new(id.into(), format!("entry {}", id), None, ts(d, h))
    }

    fn store_with_example() -> EntryStore {
        let mut store = EntryStore::new(DateGrouper::new(DisplayZone::Utc));
        store.add_entry(entry("1", 2, 10)).unwrap();
        store.add_entry(entry("2", 2, 18)).unwrap();
        store.add_entry(entry("3", 1, 9)).unwrap();
        store
    }

    fn layout(store: &EntryStore) -> Vec<(String, Vec<String>)> {
        store
            .snapshot()
            .iter()
            .map(|b| {
                (
                    b.day.to_string(),
                    b.entries.iter().map(|e| e.id.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn snapshot_is_grouped_and_sorted() {
        let store = store_with_example();
        assert_eq!(
            layout(&store),
            vec![
                ("2024-01-02".to_string(), vec!["2".to_string(), "1".to_string()]),
                ("2024-01-01".to_string(), vec!["3".to_string()]),
            ]
        );
    }

    #[test]
    fn snapshot_agrees_with_grouper() {
        for order in [IntraDayOrder::NewestFirst, IntraDayOrder::OldestFirst] {
            let grouper = DateGrouper::new(DisplayZone::Utc).with_order(order);
            let mut store = EntryStore::new(grouper);
            let entries = vec![
                entry("a", 3, 8),
                entry("b", 3, 8),
                entry("c", 1, 23),
                entry("d", 2, 0),
                entry("e", 3, 22),
            ];
            for e in &entries {
                store.add_entry(e.clone()).unwrap();
            }
            assert_eq!(*store.snapshot(), grouper.group(&entries));
        }
    }

    #[test]
    fn identical_redelivery_is_idempotent() {
        let mut store = store_with_example();
        let before = store.snapshot();
        let version = store.version();

        let outcome = store.add_entry(entry("1", 2, 10)).unwrap();

        assert_eq!(outcome, AddOutcome::Unchanged);
        assert_eq!(store.len(), 3);
        assert_eq!(store.version(), version);
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn differing_payload_with_same_id_is_rejected() {
        let mut store = store_with_example();
        let mut clash = entry("1", 2, 10);
        clash.content = "something else".into();

        let err = store.add_entry(clash).unwrap_err();
        assert!(matches!(err, DiaryError::DuplicateId(id) if id.as_str() == "1"));
        assert_eq!(store.get(&"1".into()).unwrap().content, "entry 1");
    }

    #[test]
    fn moving_an_entry_to_a_new_day() {
        let mut store = store_with_example();

        store
            .update_entry(&"2".into(), &EntryPatch::new().timestamp(ts(3, 9)))
            .unwrap();

        assert_eq!(
            layout(&store),
            vec![
                ("2024-01-03".to_string(), vec!["2".to_string()]),
                ("2024-01-02".to_string(), vec!["1".to_string()]),
                ("2024-01-01".to_string(), vec!["3".to_string()]),
            ]
        );
    }

    #[test]
    fn moving_the_last_entry_of_a_day_drops_that_day() {
        let mut store = store_with_example();
        store
            .update_entry(&"3".into(), &EntryPatch::new().timestamp(ts(2, 12)))
            .unwrap();

        assert_eq!(store.day_count(), 1);
        assert_eq!(store.snapshot().buckets()[0].ids(), vec!["2", "3", "1"]);
    }

    #[test]
    fn content_edit_keeps_position() {
        let mut store = store_with_example();
        let updated = store
            .update_entry(&"1".into(), &EntryPatch::new().content("rewritten"))
            .unwrap();

        assert_eq!(updated.content, "rewritten");
        assert_eq!(updated.created_at, ts(2, 10));
        let snapshot = store.snapshot();
        let (day, found) = snapshot.find(&"1".into()).unwrap();
        assert_eq!(day.to_string(), "2024-01-02");
        assert_eq!(found.content, "rewritten");
    }

    #[test]
    fn update_of_unknown_id_fails() {
        let mut store = store_with_example();
        let err = store
            .update_entry(&"nope".into(), &EntryPatch::new().content("x"))
            .unwrap_err();
        assert!(matches!(err, DiaryError::NotFound(_)));
    }

    #[test]
    fn invalid_update_leaves_entry_untouched() {
        let mut store = store_with_example();
        let version = store.version();

        let err = store
            .update_entry(&"1".into(), &EntryPatch::new().content(""))
            .unwrap_err();

        assert!(matches!(err, DiaryError::InvalidEntry(_)));
        assert_eq!(store.version(), version);
        assert_eq!(store.get(&"1".into()).unwrap().content, "entry 1");
    }

    #[test]
    fn removing_last_entry_drops_the_day() {
        let mut store = store_with_example();
        store.remove_entry(&"3".into()).unwrap();

        assert_eq!(store.day_count(), 1);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn removing_unknown_id_fails() {
        let mut store = store_with_example();
        assert!(matches!(
            store.remove_entry(&"ghost".into()),
            Err(DiaryError::NotFound(_))
        ));
    }

    #[test]
    fn rejects_empty_entries() {
        let mut store = EntryStore::new(DateGrouper::new(DisplayZone::Utc));
        let empty = Entry::new("e".into(), "", None, ts(1, 1));
        assert!(matches!(
            store.add_entry(empty),
            Err(DiaryError::InvalidEntry(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn replace_inserts_or_overwrites() {
        let mut store = store_with_example();

        let previous = store.replace_entry(entry("4", 5, 5)).unwrap();
        assert!(previous.is_none());

        let mut moved = entry("1", 4, 4);
        moved.content = "moved".into();
        let previous = store.replace_entry(moved).unwrap().unwrap();
        assert_eq!(previous.created_at, ts(2, 10));

        assert_eq!(
            store.snapshot().layout(),
            vec![
                ("2024-01-05".to_string(), vec!["4"]),
                ("2024-01-04".to_string(), vec!["1"]),
                ("2024-01-02".to_string(), vec!["2"]),
                ("2024-01-01".to_string(), vec!["3"]),
            ]
        );
    }

    #[test]
    fn snapshots_are_not_affected_by_later_mutations() {
        let mut store = store_with_example();
        let before = store.snapshot();

        store.remove_entry(&"1".into()).unwrap();

        assert_eq!(before.entry_count(), 3);
        assert_eq!(store.snapshot().entry_count(), 2);
    }
}
