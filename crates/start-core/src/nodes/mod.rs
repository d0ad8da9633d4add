//! Built-in node types.

mod blockquote;
mod flex_box;
mod hard_break;
mod heading;
mod paragraph;
mod span;

pub use blockquote::BLOCKQUOTE;
pub use flex_box::{FLEX_BOX, FLEX_ITEM};
pub use hard_break::HARD_BREAK;
pub use heading::HEADING;
pub use paragraph::PARAGRAPH;
pub use span::SPAN;

pub(crate) use hard_break::insert_hard_break;

use regex::Regex;
use start_engine::{Attrs, AttrSpec, DomOutput, MarkupElement, Node};

use crate::content_type::NodeDefinition;
use crate::style::{StyleObject, obj_to_style_string, style_from_value, style_string_to_obj, style_to_value};

/// Built-in nodes in registration order. `paragraph` comes first so that it
/// is the default textblock.
pub fn builtin() -> Vec<NodeDefinition> {
    vec![PARAGRAPH, HEADING, BLOCKQUOTE, FLEX_BOX, FLEX_ITEM, SPAN, HARD_BREAK]
}

/// `style` attribute spec defaulting to the configured style.
pub(crate) fn style_attr(default: Option<&StyleObject>) -> AttrSpec {
    AttrSpec::with_default(style_to_value(&default.cloned().unwrap_or_default()))
}

/// Attributes holding the element's inline style merged over `default`.
pub(crate) fn parse_style(el: &MarkupElement, default: &StyleObject) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert(
        "style".into(),
        style_to_value(&style_string_to_obj(el.style(), default)),
    );
    attrs
}

/// Adds the node's `style` attribute to `dom` when it is not empty.
pub(crate) fn with_style(dom: DomOutput, node: &Node) -> DomOutput {
    let style = obj_to_style_string(&style_from_value(node.attr("style")));
    if style.is_empty() {
        dom
    } else {
        dom.attr("style", style)
    }
}

/// Compiles a built-in input rule pattern.
pub(crate) fn pattern(src: &str) -> Option<Regex> {
    match Regex::new(src) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern = src, "invalid input rule pattern: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_style_skips_empty() {
        let node = Node::element("paragraph", Attrs::new(), Vec::new());
        assert!(with_style(DomOutput::new("p"), &node).attrs.is_empty());
    }

    #[test]
    fn test_parse_style_merges_defaults() {
        let el = MarkupElement::new("p", vec![("style".into(), "color: red".into())]);
        let defaults = StyleObject::from([("fontSize".into(), "14px".into())]);
        let attrs = parse_style(&el, &defaults);
        assert_eq!(attrs["style"]["color"], "red");
        assert_eq!(attrs["style"]["fontSize"], "14px");
    }
}
