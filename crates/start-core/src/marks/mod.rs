//! Built-in mark types.

mod format;
mod link;

pub use format::{BOLD, ITALIC, STRIKE, UNDERLINE};
pub use link::LINK;

use start_engine::commands::toggle_mark;
use start_engine::{Attrs, Command};

use crate::content_type::{CommandError, MarkDefinition};

/// Built-in marks in registration (and therefore nesting) order.
pub fn builtin() -> Vec<MarkDefinition> {
    vec![BOLD, ITALIC, UNDERLINE, STRIKE, LINK]
}

/// The `toggle` command shared by every formatting mark.
pub(crate) fn toggle(name: &str) -> Result<Command, CommandError> {
    Ok(toggle_mark(name, Attrs::new()))
}
