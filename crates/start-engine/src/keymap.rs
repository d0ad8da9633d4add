//! Key bindings.
//!
//! Bindings are written the ProseMirror way: `Mod-b`, `Shift-Enter`,
//! `Mod-Shift-z`. `Mod` is Cmd on macOS and Ctrl elsewhere. Chords are
//! normalized so that `Shift-Mod-z` and `Mod-Shift-z` name the same binding.

use std::fmt;

use crate::ordered_map::OrderedMap;
use crate::plugin::{Command, Dispatch};
use crate::state::EditorState;

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool, // Cmd on macOS, Win on Windows
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.meta
    }

    fn set_mod(&mut self) {
        if cfg!(target_os = "macos") {
            self.meta = true;
        } else {
            self.ctrl = true;
        }
    }
}

/// A normalized key chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: String,
    pub mods: Modifiers,
}

impl KeyChord {
    /// Parses a chord like `Mod-Shift-z`. Returns `None` for an empty key.
    pub fn parse(s: &str) -> Option<Self> {
        // A trailing "-" is the minus key itself ("Mod--").
        let (mods_part, key) = match s.strip_suffix("--") {
            Some(rest) => (rest, "-"),
            None => match s.rsplit_once('-') {
                Some((mods, key)) => (mods, key),
                None => ("", s),
            },
        };
        if key.is_empty() {
            return None;
        }

        let mut mods = Modifiers::NONE;
        for part in mods_part.split('-').filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "mod" => mods.set_mod(),
                "ctrl" | "control" | "c" => mods.ctrl = true,
                "alt" | "option" | "a" => mods.alt = true,
                "shift" | "s" => mods.shift = true,
                "meta" | "cmd" | "m" => mods.meta = true,
                _ => return None,
            }
        }

        let key = if key.chars().count() == 1 {
            key.to_lowercase()
        } else {
            normalize_named_key(key)
        };
        Some(Self { key, mods })
    }
}

fn normalize_named_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "enter" | "return" => "Enter".to_string(),
        "backspace" | "bs" => "Backspace".to_string(),
        "delete" | "del" => "Delete".to_string(),
        "escape" | "esc" => "Escape".to_string(),
        "tab" => "Tab".to_string(),
        "space" => " ".to_string(),
        "arrowup" | "up" => "ArrowUp".to_string(),
        "arrowdown" | "down" => "ArrowDown".to_string(),
        "arrowleft" | "left" => "ArrowLeft".to_string(),
        "arrowright" | "right" => "ArrowRight".to_string(),
        _ => key.to_string(),
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.mods.alt {
            parts.push("Alt");
        }
        if self.mods.ctrl {
            parts.push("Ctrl");
        }
        if self.mods.meta {
            parts.push("Meta");
        }
        if self.mods.shift {
            parts.push("Shift");
        }
        parts.push(&self.key);
        write!(f, "{}", parts.join("-"))
    }
}

/// Ordered set of key bindings.
#[derive(Clone, Default)]
pub struct Keymap {
    bindings: OrderedMap<Command>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `chord` to `command`. An unparsable chord is ignored with a
    /// warning.
    pub fn bind(mut self, chord: &str, command: Command) -> Self {
        match KeyChord::parse(chord) {
            Some(parsed) => {
                self.bindings.insert(parsed.to_string(), command);
            }
            None => tracing::warn!(chord, "ignoring unparsable key binding"),
        }
        self
    }

    pub fn get(&self, chord: &str) -> Option<&Command> {
        let parsed = KeyChord::parse(chord)?;
        self.bindings.get(&parsed.to_string())
    }

    /// Runs the command bound to `chord`. Returns true if it applied.
    pub fn handle(&self, chord: &str, state: &EditorState, dispatch: Dispatch<'_>) -> bool {
        match self.get(chord) {
            Some(command) => command(state, Some(dispatch)),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Normalized chords in binding order.
    pub fn chords(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys()
    }
}
