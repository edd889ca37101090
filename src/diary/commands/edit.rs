use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DiaryError, Result};
use crate::feed::EntryWriter;
use crate::model::EntryPatch;
use crate::store::SharedStore;

use super::helpers::resolve_entry;

/// Applies `patch` to the selected entry and writes the result.
///
/// The timestamp only changes when the patch sets one.
pub fn run<W: EntryWriter>(
    writer: &mut W,
    store: &SharedStore,
    selector: &str,
    patch: &EntryPatch,
) -> Result<CmdResult> {
    if patch.is_empty() {
        return Err(DiaryError::Api("Nothing to change".to_string()));
    }

    let current = resolve_entry(store, selector)?;
    let updated = patch.apply_to(&current);
    updated.validate()?;

    let mut result = CmdResult::default();
    if updated == current {
        result.add_message(CmdMessage::info(format!(
            "Entry {} is unchanged",
            current.id.short()
        )));
        return Ok(result.with_affected_entries(vec![current]));
    }

    writer.put(&updated)?;

    let (from, to) = store.read(|s| {
        let grouper = s.grouper();
        (
            grouper.day_key(&current.created_at),
            grouper.day_key(&updated.created_at),
        )
    });
    if from != to {
        result.add_message(CmdMessage::success(format!(
            "Entry {} moved from {} to {}",
            updated.id.short(),
            from.label(),
            to.label()
        )));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Entry updated ({})",
            updated.id.short()
        )));
    }
    Ok(result.with_affected_entries(vec![updated]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::testing::{entry, harness};
    use crate::feed::EntryWriter;
    use chrono::{TimeZone, Utc};

    #[test]
    fn edits_content_and_keeps_timestamp() {
        let mut h = harness();
        h.feed.put(&entry("e1", "draft", 2, 10)).unwrap();

        let result = run(&mut h.feed, &h.store, "e1", &EntryPatch::new().content("final")).unwrap();

        let stored = h.store.read(|s| s.get(&"e1".into()).cloned()).unwrap();
        assert_eq!(stored.content, "final");
        assert_eq!(stored.created_at, entry("e1", "", 2, 10).created_at);
        assert_eq!(result.affected_entries[0], stored);
    }

    #[test]
    fn moving_the_timestamp_moves_the_bucket() {
        let mut h = harness();
        h.feed.put(&entry("1", "a", 2, 10)).unwrap();
        h.feed.put(&entry("2", "b", 2, 18)).unwrap();

        let at = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
        let result = run(&mut h.feed, &h.store, "2", &EntryPatch::new().timestamp(at)).unwrap();

        assert!(result.messages[0].content.contains("moved"));
        assert_eq!(
            h.store.snapshot().layout(),
            vec![
                ("2024-01-03".to_string(), vec!["2"]),
                ("2024-01-02".to_string(), vec!["1"]),
            ]
        );
    }

    #[test]
    fn clearing_content_of_text_only_entry_fails() {
        let mut h = harness();
        h.feed.put(&entry("e1", "text", 2, 10)).unwrap();

        let err = run(&mut h.feed, &h.store, "e1", &EntryPatch::new().content("")).unwrap_err();
        assert!(matches!(err, DiaryError::InvalidEntry(_)));
        assert_eq!(h.feed.doc("e1").unwrap().content, "text");
    }

    #[test]
    fn empty_patch_is_rejected() {
        let mut h = harness();
        h.feed.put(&entry("e1", "text", 2, 10)).unwrap();
        assert!(matches!(
            run(&mut h.feed, &h.store, "e1", &EntryPatch::new()),
            Err(DiaryError::Api(_))
        ));
    }

    #[test]
    fn identical_patch_skips_the_write() {
        let mut h = harness();
        h.feed.put(&entry("e1", "text", 2, 10)).unwrap();
        h.feed.hold();

        let result = run(&mut h.feed, &h.store, "e1", &EntryPatch::new().content("text")).unwrap();
        assert!(result.messages[0].content.contains("unchanged"));
    }
}
