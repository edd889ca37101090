use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::feed::EntryWriter;
use crate::store::SharedStore;

use super::helpers::resolve_entries;

pub fn run<W: EntryWriter, I: AsRef<str>>(
    writer: &mut W,
    store: &SharedStore,
    selectors: &[I],
) -> Result<CmdResult> {
    let entries = resolve_entries(store, selectors)?;
    let mut result = CmdResult::default();

    for entry in entries {
        writer.delete(&entry.id)?;
        result.add_message(CmdMessage::success(format!(
            "Entry deleted ({})",
            entry.id.short()
        )));
        result.affected_entries.push(entry);
    }

    Ok(result)
}
