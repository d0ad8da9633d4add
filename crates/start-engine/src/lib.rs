//! # Start Engine
//!
//! The structured document engine the editor is layered on.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        EditorView                         │
//! │   props ── plugins (keymaps, input rules, attributes)     │
//! │      │                                                    │
//! │  ┌───┴────────────┐   apply(tr)   ┌────────────────────┐  │
//! │  │  EditorState   │ ────────────▶ │  EditorState (new) │  │
//! │  │ schema, doc,   │               └────────────────────┘  │
//! │  │ selection,     │                                       │
//! │  │ history        │ ◀── Transaction (replace steps)       │
//! │  └────────────────┘                                       │
//! │      │ render                                             │
//! │  ┌───┴────────────┐                                       │
//! │  │  HostDocument  │  markup ◀── serialize / parse ──▶ Node │
//! │  └────────────────┘                                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine knows nothing about concrete content types. It is handed an
//! already assembled [`Schema`] and an ordered plugin list and works only
//! with those.
//!
//! ## Threading
//!
//! Everything here is single-threaded. Host elements are `Rc<RefCell<_>>`
//! handles and commands/plugins are `Rc` closures.

pub mod commands;
pub mod dom;
pub mod history;
pub mod input_rules;
pub mod keymap;
pub mod markup;
pub mod model;
pub mod ordered_map;
pub mod plugin;
pub mod schema;
mod selector;
pub mod state;
pub mod view;

pub use dom::{ElementRef, HostDocument};
pub use history::{History, HistoryOptions, history, redo, undo};
pub use input_rules::{Captures, InputRule, input_rules};
pub use keymap::{KeyChord, Keymap, Modifiers};
pub use markup::{parse_markup, serialize_fragment, serialize_node};
pub use model::{Attrs, Mark, Node};
pub use ordered_map::OrderedMap;
pub use plugin::{
    Command, Dispatch, Plugin, PluginKey, PluginProps, command, drop_cursor, gap_cursor, keymap,
};
pub use schema::{
    AttrSpec, ContentExpr, DomOutput, MarkSpec, MarkType, MarkupElement, NodeSpec, NodeType,
    ParseRule, Schema, SchemaSpec,
};
pub use state::{EditorState, Selection, StateConfig, Step, Transaction};
pub use view::{DirectEditorProps, EditorView};

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur inside the engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Invalid content expression {expr:?}: {reason}")]
    InvalidContentExpr { expr: String, reason: String },

    #[error("Schema is missing the required node type: {0}")]
    MissingNode(String),

    #[error("No value supplied for required attribute {attr:?} of {node}")]
    MissingAttr { node: String, attr: String },

    #[error("Invalid content for node {node}: {reason}")]
    InvalidContent { node: String, reason: String },

    #[error("Invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("No node at path {0:?}")]
    InvalidPath(Vec<usize>),

    #[error("Node type {0} cannot be serialized to markup")]
    NotSerializable(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::InvalidJson(err.to_string())
    }
}
