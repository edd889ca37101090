use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::view_model::ViewModel;

/// Days with at least one entry whose content or date matches `term`.
pub fn run(view: &mut ViewModel, term: &str, offset: usize, limit: usize) -> Result<CmdResult> {
    view.set_search_term(term);
    let window = view.visible_window(offset, limit);

    let mut result = CmdResult::default();
    if window.total == 0 {
        result.add_message(CmdMessage::info(format!(
            "No entries match \"{}\"",
            term.trim()
        )));
    }
    Ok(result.with_window(window))
}
