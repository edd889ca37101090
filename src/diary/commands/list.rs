use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::view_model::ViewModel;

/// One page of days, newest first, ignoring any search term.
pub fn run(view: &mut ViewModel, offset: usize, limit: usize) -> Result<CmdResult> {
    view.clear_search();
    let window = view.visible_window(offset, limit);

    let mut result = CmdResult::default();
    if window.total == 0 {
        result.add_message(CmdMessage::info("No entries yet"));
    } else if window.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "Nothing past day {} of {}",
            offset, window.total
        )));
    }
    Ok(result.with_window(window))
}
