//! Flex layout containers.
//!
//! A `flexBox` holds one or more `flexItem` columns, each of which holds
//! ordinary blocks. The box is exported with `display: flex` regardless of
//! its stored style.

use serde_json::Value;
use start_engine::commands::insert_node;
use start_engine::{
    Attrs, Command, DomOutput, EngineResult, Node, NodeSpec, OrderedMap, ParseRule, Schema, command,
};

use crate::content_type::{CommandError, CommandFactory, NodeDefinition, arg_u64, no_commands, no_plugins};
use crate::style::{StyleObject, obj_to_style_string, style_from_value};

use super::{parse_style, style_attr, with_style};

const MAX_COLUMNS: u64 = 6;

pub const FLEX_BOX: NodeDefinition = NodeDefinition {
    name: "flexBox",
    spec: flex_box_spec,
    commands,
    plugins: no_plugins,
};

pub const FLEX_ITEM: NodeDefinition = NodeDefinition {
    name: "flexItem",
    spec: flex_item_spec,
    commands: no_commands,
    plugins: no_plugins,
};

fn flex_box_spec(default_style: Option<&StyleObject>) -> NodeSpec {
    let class_defaults = default_style.cloned().unwrap_or_default();
    let any_defaults = class_defaults.clone();
    NodeSpec::new()
        .content("flexItem+")
        .group("block")
        .attr("style", style_attr(default_style))
        .parse(
            ParseRule::tag(".start-editor-flex_box")
                .attrs(move |el| Some(parse_style(el, &class_defaults))),
        )
        .parse(ParseRule::tag("div,section").attrs(move |el| {
            let display = el.style_property("display")?;
            (display == "flex").then(|| parse_style(el, &any_defaults))
        }))
        .to_dom(|node| {
            let mut style = style_from_value(node.attr("style"));
            style.insert("display".into(), "flex".into());
            DomOutput::new("div")
                .attr("style", obj_to_style_string(&style))
                .attr("class", "start-editor-node start-editor-flex_box")
        })
}

fn flex_item_spec(default_style: Option<&StyleObject>) -> NodeSpec {
    let defaults = default_style.cloned().unwrap_or_default();
    NodeSpec::new()
        .content("block+")
        .attr("style", style_attr(default_style))
        .parse(
            ParseRule::tag(".start-editor-flex_item").attrs(move |el| Some(parse_style(el, &defaults))),
        )
        .to_dom(|node| {
            with_style(DomOutput::new("div"), node)
                .attr("class", "start-editor-node start-editor-flex_item")
        })
}

/// A flex box with `columns` items, each holding an empty default block.
pub fn flex_box_node(schema: &Schema, columns: usize) -> EngineResult<Node> {
    let items = (0..columns.max(1))
        .map(|_| {
            let block = schema.create_and_fill("paragraph")?;
            schema.node("flexItem", &Attrs::new(), vec![block])
        })
        .collect::<EngineResult<Vec<_>>>()?;
    schema.node("flexBox", &Attrs::new(), items)
}

fn insert_flex_box(args: &[Value]) -> Result<Command, CommandError> {
    let columns = arg_u64("insertFlexBox", args, 0)?.unwrap_or(2);
    if !(1..=MAX_COLUMNS).contains(&columns) {
        return Err(CommandError::InvalidArgument {
            command: "insertFlexBox".into(),
            reason: format!("columns must be between 1 and {MAX_COLUMNS}, got {columns}"),
        });
    }
    Ok(command(move |state, dispatch| {
        match flex_box_node(state.schema(), columns as usize) {
            Ok(node) => insert_node(node)(state, dispatch),
            Err(e) => {
                tracing::debug!("insertFlexBox: {}", e);
                false
            }
        }
    }))
}

fn commands() -> OrderedMap<CommandFactory> {
    let mut commands: OrderedMap<CommandFactory> = OrderedMap::new();
    commands.add_to_end("insertFlexBox", insert_flex_box);
    commands
}
