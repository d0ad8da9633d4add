//! Command table: content type name -> command name -> guarded command.

use serde_json::Value;
use start_engine::{EditorView, OrderedMap};

use crate::content_type::{CommandError, CommandFactory, ContentTypes};

/// A content-type command wrapped with the editability guard.
#[derive(Debug, Clone)]
pub struct GuardedCommand {
    content_type: String,
    name: String,
    factory: CommandFactory,
}

impl GuardedCommand {
    pub fn new(content_type: impl Into<String>, name: impl Into<String>, factory: CommandFactory) -> Self {
        Self {
            content_type: content_type.into(),
            name: name.into(),
            factory,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the command against the view's current state.
    ///
    /// Returns `Ok(false)` without touching the view when it is not editable.
    /// Otherwise the surface is focused and the command's own result is
    /// returned. Argument errors are propagated.
    pub fn invoke(&self, view: &mut EditorView, args: &[Value]) -> Result<bool, CommandError> {
        if !view.editable() {
            tracing::debug!(
                content_type = %self.content_type,
                command = %self.name,
                "command ignored, view is not editable"
            );
            return Ok(false);
        }
        view.focus();
        let command = (self.factory)(args)?;
        Ok(view.run(&command))
    }
}

/// Namespaced commands of every content type, in schema order.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    table: OrderedMap<OrderedMap<GuardedCommand>>,
}

impl CommandTable {
    pub fn build(content_types: &ContentTypes) -> Self {
        let mut table = OrderedMap::new();
        for ty in content_types.iter() {
            let commands: OrderedMap<GuardedCommand> = ty
                .commands()
                .iter()
                .map(|(name, factory)| (name, GuardedCommand::new(ty.name(), name, *factory)))
                .collect();
            table.insert(ty.name(), commands);
        }
        Self { table }
    }

    pub fn get(&self, content_type: &str, command: &str) -> Option<&GuardedCommand> {
        self.table.get(content_type)?.get(command)
    }

    /// Content type names that have an entry, including those without
    /// commands.
    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.table.keys()
    }

    pub fn commands(&self, content_type: &str) -> Option<&OrderedMap<GuardedCommand>> {
        self.table.get(content_type)
    }

    /// Total number of commands.
    pub fn len(&self) -> usize {
        self.table.values().map(OrderedMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
