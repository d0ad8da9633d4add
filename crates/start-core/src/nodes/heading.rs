//! Section headings, levels 1 through 6.

use serde_json::{Value, json};
use start_engine::commands::{set_block_type, toggle_block_type};
use start_engine::input_rules::{input_rules, textblock_type_input_rule};
use start_engine::{Attrs, AttrSpec, Command, DomOutput, Node, NodeSpec, OrderedMap, ParseRule, Plugin};

use crate::content_type::{CommandError, CommandFactory, NodeDefinition, arg_u64};
use crate::style::StyleObject;

use super::{parse_style, pattern, style_attr, with_style};

const MAX_LEVEL: u64 = 6;

pub const HEADING: NodeDefinition = NodeDefinition {
    name: "heading",
    spec,
    commands,
    plugins,
};

fn level_attrs(level: u64) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("level".into(), json!(level));
    attrs
}

fn node_level(node: &Node) -> u64 {
    node.attr("level")
        .and_then(Value::as_u64)
        .unwrap_or(1)
        .clamp(1, MAX_LEVEL)
}

fn spec(default_style: Option<&StyleObject>) -> NodeSpec {
    let mut spec = NodeSpec::new()
        .content("inline*")
        .group("block")
        .attr("level", AttrSpec::with_default(1))
        .attr("style", style_attr(default_style));
    for level in 1..=MAX_LEVEL {
        let defaults = default_style.cloned().unwrap_or_default();
        spec = spec.parse(ParseRule::tag(format!("h{level}")).attrs(move |el| {
            let mut attrs = parse_style(el, &defaults);
            attrs.extend(level_attrs(level));
            Some(attrs)
        }));
    }
    spec.to_dom(|node| with_style(DomOutput::new(format!("h{}", node_level(node))), node))
}

fn level_arg(command: &str, args: &[Value]) -> Result<u64, CommandError> {
    let level = arg_u64(command, args, 0)?.unwrap_or(1);
    if !(1..=MAX_LEVEL).contains(&level) {
        return Err(CommandError::InvalidArgument {
            command: command.to_string(),
            reason: format!("heading level must be between 1 and {MAX_LEVEL}, got {level}"),
        });
    }
    Ok(level)
}

fn set_heading(args: &[Value]) -> Result<Command, CommandError> {
    let level = level_arg("setHeading", args)?;
    Ok(set_block_type("heading", level_attrs(level)))
}

fn toggle_heading(args: &[Value]) -> Result<Command, CommandError> {
    let level = level_arg("toggleHeading", args)?;
    Ok(toggle_block_type("heading", level_attrs(level)))
}

fn commands() -> OrderedMap<CommandFactory> {
    let mut commands: OrderedMap<CommandFactory> = OrderedMap::new();
    commands.add_to_end("setHeading", set_heading);
    commands.add_to_end("toggleHeading", toggle_heading);
    commands
}

/// `# ` through `###### ` at the start of a textblock.
fn plugins() -> Vec<Plugin> {
    let Some(re) = pattern(r"^(#{1,6})\s$") else {
        return Vec::new();
    };
    let rule = textblock_type_input_rule(re, "heading", |caps| {
        let level = caps
            .get(1)
            .and_then(|c| c.as_deref())
            .map_or(1, |hashes| hashes.len() as u64);
        level_attrs(level)
    });
    vec![input_rules(vec![rule])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_validation() {
        assert_eq!(level_arg("setHeading", &[]), Ok(1));
        assert_eq!(level_arg("setHeading", &[json!(6)]), Ok(6));
        assert!(level_arg("setHeading", &[json!(0)]).is_err());
        assert!(level_arg("setHeading", &[json!("two")]).is_err());
    }

    #[test]
    fn test_to_dom_clamps_level() {
        let spec = spec(None);
        let to_dom = spec.to_dom.clone().unwrap();
        let node = Node::element("heading", level_attrs(9), Vec::new());
        assert_eq!(to_dom(&node).tag, "h6");
    }
}
