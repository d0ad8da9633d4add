//! # Start Core
//!
//! The composition layer of the editor: it turns independently defined
//! content types and extensions into one schema, one command table and one
//! ordered plugin list, then drives the engine's state lifecycle.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Editor                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │ ContentTypes │─▶│    Schema    │  │ ExtensionRegistry│  │
//! │  │ nodes, marks │  │  (assembled) │  │ seeds + callers  │  │
//! │  └──────┬───────┘  └──────┬───────┘  └────────┬─────────┘  │
//! │         │                 │                   │            │
//! │  ┌──────┴───────┐  ┌──────┴───────────────────┴─────────┐  │
//! │  │ CommandTable │  │   State lifecycle (plugin order)   │  │
//! │  └──────────────┘  └──────────────────┬─────────────────┘  │
//! │                                       │                    │
//! │                        start_engine::EditorView            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the caller's thread. The [`Editor`] is `!Send`: host
//! elements and engine plugins are reference counted, not shared.

pub mod command;
pub mod config;
pub mod content_type;
pub mod editor;
pub mod event;
pub mod extension;
pub mod extensions;
pub mod marks;
pub mod nodes;
pub mod registry;
pub mod schema;
pub mod state;
pub mod style;

pub use command::{CommandTable, GuardedCommand};
pub use config::{Config, ConfigError};
pub use content_type::{
    CommandError, CommandFactory, ContentKind, ContentType, ContentTypes, MarkDefinition,
    NodeDefinition,
};
pub use editor::{Editor, EditorOptions, MountTarget};
pub use event::{EditorEvent, EditorEvents, EventBus};
pub use extension::{EditorId, Extension, ExtensionContext, ExtensionOptions};
pub use registry::{ExtensionFailure, ExtensionRegistry};
pub use schema::assemble_schema;
pub use state::{Content, build_state, compose_plugins};
pub use style::{StyleObject, obj_to_style_string, style_string_to_obj};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Duplicate {kind} type name: {name}")]
    SchemaConflict { kind: ContentKind, name: String },

    #[error("Already has an extension with id {0:?}")]
    DuplicateExtensionId(String),

    #[error("Mount target not found: {0}")]
    MountTargetNotFound(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Command not found: {content_type}.{command}")]
    CommandNotFound {
        content_type: String,
        command: String,
    },

    #[error("Command failed: {0}")]
    Command(#[from] CommandError),

    #[error("Extension {id:?} failed")]
    Extension {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{} extension(s) failed to tear down", .0.len())]
    Teardown(Vec<ExtensionFailure>),

    #[error("Invalid options for extension {id:?}: {reason}")]
    InvalidOptions { id: String, reason: String },

    #[error("Editor has been destroyed")]
    Destroyed,

    #[error("Engine error: {0}")]
    Engine(#[from] start_engine::EngineError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
