//! Built-in extensions seeded into every editor.
//!
//! A caller extension with the same id replaces one of these in place.

mod placeholder;
mod shortcuts;

pub use placeholder::{PlaceholderExtension, PlaceholderOptions};
pub use shortcuts::{ShortcutsExtension, ShortcutsOptions};

use std::collections::BTreeMap;

use serde_json::Value;

use crate::CoreResult;
use crate::extension::{Extension, ExtensionOptions};

/// Ids of the built-in extensions, in seeding order.
pub const BUILTIN_IDS: [&str; 2] = [placeholder::ID, shortcuts::ID];

/// Builds the built-in extensions, applying per-id option overrides.
pub fn builtin(overrides: &BTreeMap<String, Value>) -> CoreResult<Vec<Box<dyn Extension>>> {
    for id in overrides.keys() {
        if !BUILTIN_IDS.contains(&id.as_str()) {
            tracing::debug!(id = %id, "options given for an extension that is not built in");
        }
    }
    let placeholder = PlaceholderOptions::merge(placeholder::ID, overrides.get(placeholder::ID))?;
    let shortcuts = ShortcutsOptions::merge(shortcuts::ID, overrides.get(shortcuts::ID))?;
    Ok(vec![
        Box::new(PlaceholderExtension::new(placeholder)),
        Box::new(ShortcutsExtension::new(shortcuts)),
    ])
}
