use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::feed::EntryWriter;
use crate::model::EntryDraft;
use crate::store::SharedStore;

pub fn run<W: EntryWriter>(
    writer: &mut W,
    store: &SharedStore,
    draft: EntryDraft,
) -> Result<CmdResult> {
    let entry = draft.into_entry()?;
    writer.put(&entry)?;

    let mut result = CmdResult::default();
    let day = store.read(|s| s.grouper().day_key(&entry.created_at));
    if store.read(|s| s.contains(&entry.id)) {
        result.add_message(CmdMessage::success(format!(
            "Entry added ({}) on {}",
            entry.id.short(),
            day.label()
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "Entry {} written, waiting for the feed to confirm it",
            entry.id.short()
        )));
    }
    Ok(result.with_affected_entries(vec![entry]))
}
