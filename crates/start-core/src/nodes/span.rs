//! Inline styled spans.
//!
//! Besides its own `span.start-editor-span` markup, `span` claims the
//! formatting tags that no mark type is registered for, keeping their inline
//! style.

use start_engine::{AttrSpec, DomOutput, NodeSpec, ParseRule};

use crate::content_type::{NodeDefinition, no_commands, no_plugins};
use crate::style::{StyleObject, obj_to_style_string, style_from_value};

use super::parse_style;

const TAGS: [&str; 9] = ["s", "strike", "del", "strong", "b", "i", "em", "u", "span.start-editor-span"];

pub const SPAN: NodeDefinition = NodeDefinition {
    name: "span",
    spec,
    commands: no_commands,
    plugins: no_plugins,
};

fn spec(_: Option<&StyleObject>) -> NodeSpec {
    let mut spec = NodeSpec::new()
        .content("text*")
        .group("inline")
        .inline()
        .selectable(false)
        .attr("style", AttrSpec::with_default(serde_json::json!({})));
    for tag in TAGS {
        spec = spec.parse(ParseRule::tag(tag).attrs(|el| Some(parse_style(el, &StyleObject::new()))));
    }
    spec.to_dom(|node| {
        DomOutput::new("span")
            .attr("style", obj_to_style_string(&style_from_value(node.attr("style"))))
            .attr("class", "start-editor-node-node start-editor-span")
    })
}
