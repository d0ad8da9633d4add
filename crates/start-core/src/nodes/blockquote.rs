use start_engine::commands::wrap_in;
use start_engine::input_rules::{input_rules, wrapping_input_rule};
use start_engine::{Attrs, DomOutput, NodeSpec, OrderedMap, ParseRule, Plugin};

use crate::content_type::{CommandFactory, NodeDefinition};
use crate::style::StyleObject;

use super::pattern;

pub const BLOCKQUOTE: NodeDefinition = NodeDefinition {
    name: "blockquote",
    spec,
    commands,
    plugins,
};

fn spec(_: Option<&StyleObject>) -> NodeSpec {
    NodeSpec::new()
        .content("block+")
        .group("block")
        .parse(ParseRule::tag("blockquote"))
        .to_dom(|_| DomOutput::new("blockquote"))
}

fn commands() -> OrderedMap<CommandFactory> {
    let mut commands: OrderedMap<CommandFactory> = OrderedMap::new();
    commands.add_to_end("wrapInBlockquote", |_| Ok(wrap_in("blockquote", Attrs::new())));
    commands
}

fn plugins() -> Vec<Plugin> {
    pattern(r"^>\s$")
        .map(|re| vec![input_rules(vec![wrapping_input_rule(re, "blockquote")])])
        .unwrap_or_default()
}
