//! Content-type definitions.
//!
//! A content type is a node or mark type that carries its schema fragment,
//! a set of named commands and the engine plugins it needs. Nodes and marks
//! live in separate lists because their schema namespaces are independent.

use std::fmt;

use serde_json::Value;
use start_engine::{Command, MarkSpec, NodeSpec, OrderedMap, Plugin};

use crate::style::StyleObject;

/// Errors raised while turning invocation arguments into a command
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("{command}: missing argument {index}")]
    MissingArgument { command: String, index: usize },

    #[error("{command}: {reason}")]
    InvalidArgument { command: String, reason: String },
}

/// Builds an engine command from the arguments a caller forwards to it.
pub type CommandFactory = fn(&[Value]) -> Result<Command, CommandError>;

/// Which schema namespace a content type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Node,
    Mark,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Node => write!(f, "node"),
            ContentKind::Mark => write!(f, "mark"),
        }
    }
}

/// The capabilities shared by node and mark definitions.
pub trait ContentType {
    fn name(&self) -> &str;

    fn kind(&self) -> ContentKind;

    /// Named commands, in the order they are exposed.
    fn commands(&self) -> OrderedMap<CommandFactory>;

    /// Engine plugins contributed to every editor using this type.
    fn plugins(&self) -> Vec<Plugin>;
}

/// A node type definition.
#[derive(Clone, Copy)]
pub struct NodeDefinition {
    pub name: &'static str,
    /// Builds the schema fragment. The argument is the configured default
    /// style for this type, if any.
    pub spec: fn(Option<&StyleObject>) -> NodeSpec,
    pub commands: fn() -> OrderedMap<CommandFactory>,
    pub plugins: fn() -> Vec<Plugin>,
}

impl ContentType for NodeDefinition {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Node
    }

    fn commands(&self) -> OrderedMap<CommandFactory> {
        (self.commands)()
    }

    fn plugins(&self) -> Vec<Plugin> {
        (self.plugins)()
    }
}

impl fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A mark type definition.
#[derive(Clone, Copy)]
pub struct MarkDefinition {
    pub name: &'static str,
    pub spec: fn() -> MarkSpec,
    pub commands: fn() -> OrderedMap<CommandFactory>,
    pub plugins: fn() -> Vec<Plugin>,
}

impl ContentType for MarkDefinition {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Mark
    }

    fn commands(&self) -> OrderedMap<CommandFactory> {
        (self.commands)()
    }

    fn plugins(&self) -> Vec<Plugin> {
        (self.plugins)()
    }
}

impl fmt::Debug for MarkDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The node and mark definitions an editor is assembled from, in
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    nodes: Vec<NodeDefinition>,
    marks: Vec<MarkDefinition>,
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in nodes and marks.
    pub fn builtin() -> Self {
        Self {
            nodes: crate::nodes::builtin(),
            marks: crate::marks::builtin(),
        }
    }

    pub fn with_node(mut self, node: NodeDefinition) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_mark(mut self, mark: MarkDefinition) -> Self {
        self.marks.push(mark);
        self
    }

    pub fn nodes(&self) -> &[NodeDefinition] {
        &self.nodes
    }

    pub fn marks(&self) -> &[MarkDefinition] {
        &self.marks
    }

    /// Every definition, nodes first.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ContentType> {
        self.nodes
            .iter()
            .map(|n| n as &dyn ContentType)
            .chain(self.marks.iter().map(|m| m as &dyn ContentType))
    }
}

/// Definition helper for types without commands.
pub fn no_commands() -> OrderedMap<CommandFactory> {
    OrderedMap::new()
}

/// Definition helper for types without plugins.
pub fn no_plugins() -> Vec<Plugin> {
    Vec::new()
}

/// Reads argument `index` as an integer. `None` if it was not supplied.
pub fn arg_u64(command: &str, args: &[Value], index: usize) -> Result<Option<u64>, CommandError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| CommandError::InvalidArgument {
            command: command.to_string(),
            reason: format!("argument {index} must be a non-negative integer, got {v}"),
        }),
    }
}

/// Reads argument `index` as a string; it must be present.
pub fn arg_str<'a>(command: &str, args: &'a [Value], index: usize) -> Result<&'a str, CommandError> {
    match args.get(index) {
        None | Some(Value::Null) => Err(CommandError::MissingArgument {
            command: command.to_string(),
            index,
        }),
        Some(v) => v.as_str().ok_or_else(|| CommandError::InvalidArgument {
            command: command.to_string(),
            reason: format!("argument {index} must be a string, got {v}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_order() {
        let types = ContentTypes::builtin();
        let names: Vec<_> = types.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names[0], "paragraph");
        assert!(names.iter().position(|n| n == "hardBreak") < names.iter().position(|n| n == "bold"));
        assert_eq!(types.iter().filter(|t| t.kind() == ContentKind::Mark).count(), types.marks().len());
    }

    #[test]
    fn test_argument_helpers() {
        let args = [json!(3), json!("x")];
        assert_eq!(arg_u64("c", &args, 0), Ok(Some(3)));
        assert_eq!(arg_u64("c", &args, 5), Ok(None));
        assert!(matches!(arg_u64("c", &args, 1), Err(CommandError::InvalidArgument { .. })));
        assert_eq!(arg_str("c", &args, 1), Ok("x"));
        assert_eq!(
            arg_str("c", &args, 2),
            Err(CommandError::MissingArgument { command: "c".into(), index: 2 })
        );
    }
}
