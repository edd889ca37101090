use super::EntryStore;
use crate::grouper::Snapshot;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to the one [`EntryStore`] of a diary.
#[derive(Clone, Debug)]
pub struct SharedStore {
    inner: Arc<Mutex<EntryStore>>,
}

impl SharedStore {
    pub fn new(store: EntryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.lock().snapshot()
    }

    pub fn version(&self) -> u64 {
        self.lock().version()
    }

    /// Snapshot together with the version it was taken at.
    pub fn versioned_snapshot(&self) -> (u64, Arc<Snapshot>) {
        let store = self.lock();
        (store.version(), store.snapshot())
    }

    pub fn read<R>(&self, f: impl FnOnce(&EntryStore) -> R) -> R {
        f(&self.lock())
    }

    /// Runs one mutation to completion; no other access interleaves with it.
    pub fn write<R>(&self, f: impl FnOnce(&mut EntryStore) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, EntryStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<EntryStore> for SharedStore {
    fn from(store: EntryStore) -> Self {
        Self::new(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouper::{DateGrouper, DisplayZone};
    use crate::model::Entry;
    use chrono::{TimeZone, Utc};

    #[test]
    fn clones_share_state() {
        let store = SharedStore::new(EntryStore::new(DateGrouper::new(DisplayZone::Utc)));
        let other = store.clone();

        other
            .write(|s| {
                s.add_entry(Entry::new(
                    "a".into(),
                    "hello",
                    None,
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                ))
            })
            .unwrap();

        let (version, snapshot) = store.versioned_snapshot();
        assert_eq!(version, 1);
        assert_eq!(snapshot.entry_count(), 1);
        assert!(store.read(|s| s.contains(&"a".into())));
    }
}
