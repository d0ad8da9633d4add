use start_engine::commands::set_block_type;
use start_engine::{Attrs, DomOutput, NodeSpec, OrderedMap, ParseRule};

use crate::content_type::{CommandFactory, NodeDefinition, no_plugins};
use crate::style::StyleObject;

use super::{parse_style, style_attr, with_style};

pub const PARAGRAPH: NodeDefinition = NodeDefinition {
    name: "paragraph",
    spec,
    commands,
    plugins: no_plugins,
};

fn spec(default_style: Option<&StyleObject>) -> NodeSpec {
    let defaults = default_style.cloned().unwrap_or_default();
    NodeSpec::new()
        .content("inline*")
        .group("block")
        .attr("style", style_attr(default_style))
        .parse(ParseRule::tag("p").attrs(move |el| Some(parse_style(el, &defaults))))
        .to_dom(|node| with_style(DomOutput::new("p"), node))
}

fn commands() -> OrderedMap<CommandFactory> {
    let mut commands: OrderedMap<CommandFactory> = OrderedMap::new();
    commands.add_to_end("setParagraph", |_| Ok(set_block_type("paragraph", Attrs::new())));
    commands
}
