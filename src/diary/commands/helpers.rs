use crate::error::{DiaryError, Result};
use crate::model::{Entry, EntryId};
use crate::store::SharedStore;

/// Finds the entry a selector names: a full id, or a prefix shared by exactly one id.
pub fn resolve_entry(store: &SharedStore, selector: &str) -> Result<Entry> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(DiaryError::Api("Empty entry selector".to_string()));
    }

    store.read(|s| {
        if let Some(entry) = s.get(&EntryId::new(selector)) {
            return Ok(entry.clone());
        }

        let mut matches = s.ids().filter(|id| id.as_str().starts_with(selector));
        match (matches.next(), matches.next()) {
            (Some(id), None) => s
                .get(id)
                .cloned()
                .ok_or_else(|| DiaryError::NotFound(id.clone())),
            (Some(_), Some(_)) => Err(DiaryError::Api(format!(
                "Selector {} matches more than one entry",
                selector
            ))),
            (None, _) => Err(DiaryError::Api(format!("No entry matches {}", selector))),
        }
    })
}

/// Resolves every selector before anything is changed. Repeated entries are kept once.
pub fn resolve_entries<I: AsRef<str>>(store: &SharedStore, selectors: &[I]) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let entry = resolve_entry(store, selector.as_ref())?;
        if !entries.iter().any(|e| e.id == entry.id) {
            entries.push(entry);
        }
    }
    Ok(entries)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn seeded() -> SharedStore {
        let h = harness();
        h.store
            .write(|s| {
                s.add_entry(entry("abc123", "one", 1, 9))?;
                s.add_entry(entry("abd456", "two", 1, 10))?;
                s.add_entry(entry("xyz789", "three", 2, 9))
            })
            .unwrap();
        h.store
    }

    #[test]
    fn resolves_full_id_and_unique_prefix() {
        let store = seeded();
        assert_eq!(resolve_entry(&store, "abc123").unwrap().content, "one");
        assert_eq!(resolve_entry(&store, "xy").unwrap().content, "three");
        assert_eq!(resolve_entry(&store, "abd").unwrap().content, "two");
    }

    #[test]
    fn ambiguous_or_unknown_prefix_is_an_error() {
        let store = seeded();
        assert!(matches!(resolve_entry(&store, "ab"), Err(DiaryError::Api(_))));
        assert!(matches!(resolve_entry(&store, "q"), Err(DiaryError::Api(_))));
        assert!(matches!(resolve_entry(&store, " "), Err(DiaryError::Api(_))));
    }

    #[test]
    fn resolve_entries_dedups() {
        let store = seeded();
        let entries = resolve_entries(&store, &["abc", "abc123", "xyz"]).unwrap();
        assert_eq!(entries.len(), 2);
    }
}
