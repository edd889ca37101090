use crate::commands::CmdResult;
use crate::error::Result;
use crate::store::SharedStore;

use super::helpers::resolve_entries;

pub fn run<I: AsRef<str>>(store: &SharedStore, selectors: &[I]) -> Result<CmdResult> {
    let entries = resolve_entries(store, selectors)?;
    Ok(CmdResult::default().with_affected_entries(entries))
}
