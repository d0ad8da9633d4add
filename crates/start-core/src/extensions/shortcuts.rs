use serde::{Deserialize, Serialize};
use start_engine::commands::toggle_mark;
use start_engine::{Attrs, Keymap, Plugin};

use crate::extension::{EditorId, Extension};
use crate::nodes::insert_hard_break;

pub(super) const ID: &str = "shortcuts";

/// Key chord for each mark the extension can bind.
const MARK_CHORDS: [(&str, &str); 4] = [
    ("bold", "Mod-b"),
    ("italic", "Mod-i"),
    ("underline", "Mod-u"),
    ("strike", "Mod-Shift-x"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutsOptions {
    /// Marks that get a toggle chord
    pub marks: Vec<String>,
    /// Bind Shift-Enter to a hard break
    pub hard_break: bool,
}

impl Default for ShortcutsOptions {
    fn default() -> Self {
        Self {
            marks: MARK_CHORDS.iter().map(|(mark, _)| mark.to_string()).collect(),
            hard_break: true,
        }
    }
}

/// Formatting key bindings.
#[derive(Debug, Default)]
pub struct ShortcutsExtension {
    options: ShortcutsOptions,
    editor: Option<EditorId>,
}

impl ShortcutsExtension {
    pub fn new(options: ShortcutsOptions) -> Self {
        Self {
            options,
            editor: None,
        }
    }

    fn keymap(&self) -> Keymap {
        let mut keymap = Keymap::new();
        for (mark, chord) in MARK_CHORDS {
            if self.options.marks.iter().any(|m| m == mark) {
                keymap = keymap.bind(chord, toggle_mark(mark, Attrs::new()));
            }
        }
        for unknown in self
            .options
            .marks
            .iter()
            .filter(|m| !MARK_CHORDS.iter().any(|(mark, _)| *mark == m.as_str()))
        {
            tracing::debug!(mark = %unknown, "no shortcut for mark");
        }
        if self.options.hard_break {
            keymap = keymap.bind("Shift-Enter", insert_hard_break());
        }
        keymap
    }
}

impl Extension for ShortcutsExtension {
    fn id(&self) -> &str {
        ID
    }

    fn bind(&mut self, editor: EditorId) {
        self.editor = Some(editor);
    }

    fn editor(&self) -> Option<EditorId> {
        self.editor
    }

    fn plugins(&self) -> Vec<Plugin> {
        vec![Plugin::new(ID).with_keymap(self.keymap())]
    }
}
