use start_engine::commands::insert_node;
use start_engine::{Attrs, DomOutput, NodeSpec, OrderedMap, ParseRule, command};

use crate::content_type::{CommandFactory, NodeDefinition, no_plugins};
use crate::style::StyleObject;

pub const HARD_BREAK: NodeDefinition = NodeDefinition {
    name: "hardBreak",
    spec,
    commands,
    plugins: no_plugins,
};

fn spec(_: Option<&StyleObject>) -> NodeSpec {
    NodeSpec::new()
        .group("inline")
        .inline()
        .selectable(false)
        .parse(ParseRule::tag("br"))
        .to_dom(|_| DomOutput::leaf("br"))
}

/// Inserts a line break at the cursor.
pub(crate) fn insert_hard_break() -> start_engine::Command {
    command(|state, dispatch| match state.schema().node("hardBreak", &Attrs::new(), Vec::new()) {
        Ok(node) => insert_node(node)(state, dispatch),
        Err(e) => {
            tracing::debug!("insertHardBreak: {}", e);
            false
        }
    })
}

fn commands() -> OrderedMap<CommandFactory> {
    let mut commands: OrderedMap<CommandFactory> = OrderedMap::new();
    commands.add_to_end("insertHardBreak", |_| Ok(insert_hard_break()));
    commands
}
