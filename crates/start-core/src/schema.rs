//! Schema assembly.
//!
//! The assembled schema always starts with the reserved `doc` and `text`
//! node types, followed by the registered nodes and then the marks, each in
//! registration order. Order matters to the engine: the first matching parse
//! rule wins and the first textblock type is the default one.

use std::collections::BTreeMap;

use start_engine::{DomOutput, MarkSpec, NodeSpec, OrderedMap, Schema, SchemaSpec};

use crate::content_type::{ContentKind, ContentTypes};
use crate::style::{StyleObject, canvas_attributes};
use crate::{CoreError, CoreResult};

/// Names supplied by the assembler itself.
pub const RESERVED_NODES: [&str; 2] = ["doc", "text"];

fn doc_spec() -> NodeSpec {
    NodeSpec::new().content("block+").to_dom(|_| {
        canvas_attributes()
            .into_iter()
            .fold(DomOutput::new("div"), |dom, (k, v)| dom.attr(k, v))
    })
}

fn text_spec() -> NodeSpec {
    NodeSpec::new().group("inline")
}

/// Merges the content types into one schema.
///
/// `default_styles` maps a node type name to the style object its spec
/// factory receives. Fails with [`CoreError::SchemaConflict`] if a name is
/// used twice within the node or the mark namespace.
pub fn assemble_schema(
    content_types: &ContentTypes,
    default_styles: &BTreeMap<String, StyleObject>,
) -> CoreResult<Schema> {
    let mut nodes: OrderedMap<NodeSpec> = OrderedMap::new();
    nodes.add_to_end("doc", doc_spec());
    nodes.add_to_end("text", text_spec());

    for def in content_types.nodes() {
        if nodes.contains_key(def.name) {
            return Err(CoreError::SchemaConflict {
                kind: ContentKind::Node,
                name: def.name.to_string(),
            });
        }
        nodes.add_to_end(def.name, (def.spec)(default_styles.get(def.name)));
    }

    let mut marks: OrderedMap<MarkSpec> = OrderedMap::new();
    for def in content_types.marks() {
        if marks.contains_key(def.name) {
            return Err(CoreError::SchemaConflict {
                kind: ContentKind::Mark,
                name: def.name.to_string(),
            });
        }
        marks.add_to_end(def.name, (def.spec)());
    }

    tracing::debug!(nodes = nodes.len(), marks = marks.len(), "assembling schema");

    let schema = Schema::new(SchemaSpec {
        nodes,
        marks,
        top_node: None,
    })?;
    Ok(schema)
}
