use serde_json::{Value, json};
use start_engine::commands::{add_mark, remove_mark, toggle_mark};
use start_engine::{Attrs, AttrSpec, Command, DomOutput, MarkSpec, OrderedMap, ParseRule};

use crate::content_type::{CommandError, CommandFactory, MarkDefinition, arg_str, no_plugins};

pub const LINK: MarkDefinition = MarkDefinition {
    name: "link",
    spec,
    commands,
    plugins: no_plugins,
};

fn spec() -> MarkSpec {
    MarkSpec::new()
        .attr("href", AttrSpec::required())
        .inclusive(false)
        .parse(ParseRule::tag("a[href]").attrs(|el| {
            let mut attrs = Attrs::new();
            attrs.insert("href".into(), json!(el.attr("href")?));
            Some(attrs)
        }))
        .to_dom(|mark| {
            let href = mark.attr("href").and_then(Value::as_str).unwrap_or_default();
            DomOutput::new("a").attr("href", href)
        })
}

fn set_link(args: &[Value]) -> Result<Command, CommandError> {
    let href = arg_str("setLink", args, 0)?;
    if href.trim().is_empty() {
        return Err(CommandError::InvalidArgument {
            command: "setLink".into(),
            reason: "href must not be empty".into(),
        });
    }
    let mut attrs = Attrs::new();
    attrs.insert("href".into(), json!(href));
    Ok(add_mark("link", attrs))
}

fn commands() -> OrderedMap<CommandFactory> {
    let mut commands: OrderedMap<CommandFactory> = OrderedMap::new();
    commands.add_to_end("toggle", |args| {
        let href = arg_str("toggle", args, 0)?;
        let mut attrs = Attrs::new();
        attrs.insert("href".into(), json!(href));
        Ok(toggle_mark("link", attrs))
    });
    commands.add_to_end("setLink", set_link);
    commands.add_to_end("unsetLink", |_| Ok(remove_mark("link")));
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_link_requires_href() {
        assert!(matches!(set_link(&[]), Err(CommandError::MissingArgument { .. })));
        assert!(matches!(set_link(&[json!(" ")]), Err(CommandError::InvalidArgument { .. })));
        assert!(set_link(&[json!("https://example.com")]).is_ok());
    }

    #[test]
    fn test_anchor_without_href_is_not_a_link() {
        let rule = &spec().parse_dom[0];
        assert!(rule.matches(&start_engine::MarkupElement::new("a", vec![])).is_none());
    }
}
