//! Behavior extensions (plugins) and the command contract.
//!
//! A [`Command`] inspects a state and, when given a dispatch sink, produces
//! transactions. Calling it without a sink asks whether it *would* apply.
//! Plugins bundle the props the view consults, in plugin-list order:
//! the first plugin that handles an event wins.

use std::fmt;
use std::rc::Rc;

use crate::history::HistoryOptions;
use crate::keymap::Keymap;
use crate::state::{EditorState, Transaction};

/// Sink that receives the transactions a command produces.
pub type Dispatch<'a> = &'a mut dyn FnMut(Transaction);

/// A state-transition function.
pub type Command = Rc<dyn Fn(&EditorState, Option<Dispatch<'_>>) -> bool>;

/// Wraps a plain function or closure as a [`Command`].
pub fn command(f: impl Fn(&EditorState, Option<Dispatch<'_>>) -> bool + 'static) -> Command {
    Rc::new(f)
}

/// Handles typed text before the default insertion. Returns true if handled.
pub type TextInputHandler = Rc<dyn Fn(&EditorState, &str, Dispatch<'_>) -> bool>;

/// Computes extra attributes for the editable element.
pub type AttributesFn = Rc<dyn Fn(&EditorState) -> Vec<(String, String)>>;

/// Identifies a plugin in the plugin list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginKey(String);

impl PluginKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a plugin contributes to the view.
#[derive(Clone, Default)]
pub struct PluginProps {
    pub handle_text_input: Option<TextInputHandler>,
    pub keymap: Option<Keymap>,
    pub attributes: Option<AttributesFn>,
    /// Present on the undo history plugin only.
    pub history: Option<HistoryOptions>,
}

/// An engine-native behavior extension.
#[derive(Clone)]
pub struct Plugin {
    key: PluginKey,
    props: PluginProps,
}

impl Plugin {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: PluginKey::new(key),
            props: PluginProps::default(),
        }
    }

    pub fn key(&self) -> &PluginKey {
        &self.key
    }

    pub fn props(&self) -> &PluginProps {
        &self.props
    }

    pub fn with_props(mut self, props: PluginProps) -> Self {
        self.props = props;
        self
    }

    pub fn handle_text_input(
        mut self,
        f: impl Fn(&EditorState, &str, Dispatch<'_>) -> bool + 'static,
    ) -> Self {
        self.props.handle_text_input = Some(Rc::new(f));
        self
    }

    pub fn attributes(mut self, f: impl Fn(&EditorState) -> Vec<(String, String)> + 'static) -> Self {
        self.props.attributes = Some(Rc::new(f));
        self
    }

    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.props.keymap = Some(keymap);
        self
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("key", &self.key)
            .field("text_input", &self.props.handle_text_input.is_some())
            .field("keymap", &self.props.keymap.as_ref().map(Keymap::len))
            .field("attributes", &self.props.attributes.is_some())
            .field("history", &self.props.history)
            .finish()
    }
}

/// A plugin that binds keys to commands.
pub fn keymap(bindings: Keymap) -> Plugin {
    Plugin::new("keymap").with_keymap(bindings)
}

/// Drop position indicator. Painting it is the host renderer's job; the
/// plugin marks the behavior as active.
pub fn drop_cursor() -> Plugin {
    Plugin::new("dropCursor")
}

/// Cursor for positions no text selection can reach (between blocks).
pub fn gap_cursor() -> Plugin {
    Plugin::new("gapCursor")
}
