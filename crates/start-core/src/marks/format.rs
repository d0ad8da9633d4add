//! Character formatting marks.

use start_engine::input_rules::{input_rules, mark_input_rule};
use start_engine::{DomOutput, MarkSpec, OrderedMap, ParseRule, Plugin};

use crate::content_type::{CommandFactory, MarkDefinition, no_plugins};
use crate::nodes::pattern;

use super::toggle;

pub const BOLD: MarkDefinition = MarkDefinition {
    name: "bold",
    spec: || tags_spec(&["strong", "b"], "strong"),
    commands: || single("toggle", |_| toggle("bold")),
    plugins: bold_rules,
};

pub const ITALIC: MarkDefinition = MarkDefinition {
    name: "italic",
    spec: || tags_spec(&["em", "i"], "em"),
    commands: || single("toggle", |_| toggle("italic")),
    plugins: italic_rules,
};

pub const UNDERLINE: MarkDefinition = MarkDefinition {
    name: "underline",
    spec: || tags_spec(&["u"], "u"),
    commands: || single("toggle", |_| toggle("underline")),
    plugins: no_plugins,
};

pub const STRIKE: MarkDefinition = MarkDefinition {
    name: "strike",
    spec: || tags_spec(&["s", "strike", "del"], "s"),
    commands: || single("toggle", |_| toggle("strike")),
    plugins: no_plugins,
};

fn tags_spec(tags: &[&str], output: &'static str) -> MarkSpec {
    tags.iter()
        .fold(MarkSpec::new(), |spec, tag| spec.parse(ParseRule::tag(*tag)))
        .to_dom(move |_| DomOutput::new(output))
}

fn single(name: &str, factory: CommandFactory) -> OrderedMap<CommandFactory> {
    let mut commands = OrderedMap::new();
    commands.add_to_end(name, factory);
    commands
}

/// `**text**`
fn bold_rules() -> Vec<Plugin> {
    pattern(r"\*\*([^*]+)\*\*$")
        .map(|re| vec![input_rules(vec![mark_input_rule(re, "bold")])])
        .unwrap_or_default()
}

/// `*text*`, not preceded by another `*`
fn italic_rules() -> Vec<Plugin> {
    pattern(r"(^|[^*])\*([^*]+)\*$")
        .map(|re| vec![input_rules(vec![mark_input_rule(re, "italic")])])
        .unwrap_or_default()
}
