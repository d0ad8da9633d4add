//! Document state lifecycle: building, replacing and reconfiguring the
//! engine state an editor runs on.

use std::rc::Rc;

use serde_json::Value;
use start_engine::commands::base_keymap;
use start_engine::{
    AttrSpec, EditorState, EditorView, HistoryOptions, Keymap, OrderedMap, Plugin, Schema,
    StateConfig, drop_cursor, gap_cursor, history, keymap, parse_markup, redo, undo,
};

use crate::content_type::ContentTypes;
use crate::registry::ExtensionRegistry;
use crate::{CoreError, CoreResult};

/// Document content handed to an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Markup such as `<p>hello</p>`.
    Markup(String),
    /// A serialized document tree (`{"type": "doc", "content": [...]}`),
    /// optionally wrapped as `{"doc": .., "selection": ..}`.
    Tree(Value),
}

impl Default for Content {
    fn default() -> Self {
        Content::Markup(String::new())
    }
}

impl From<&str> for Content {
    fn from(markup: &str) -> Self {
        Content::Markup(markup.to_string())
    }
}

impl From<String> for Content {
    fn from(markup: String) -> Self {
        Content::Markup(markup)
    }
}

impl From<Value> for Content {
    fn from(tree: Value) -> Self {
        Content::Tree(tree)
    }
}

/// Builds a fresh state (with empty history) for `content`.
pub fn build_state(content: &Content, schema: &Rc<Schema>, plugins: Vec<Plugin>) -> CoreResult<EditorState> {
    let config = StateConfig::new(Rc::clone(schema)).plugins(plugins);
    match content {
        Content::Markup(markup) => {
            let doc = parse_markup(schema, markup)
                .map_err(|e| CoreError::InvalidContent(e.to_string()))?;
            EditorState::create(config.doc(doc)).map_err(|e| CoreError::InvalidContent(e.to_string()))
        }
        Content::Tree(tree) => {
            let doc = tree.get("doc").unwrap_or(tree);
            validate_tree(schema, doc, true)?;
            EditorState::from_json(config, tree).map_err(|e| CoreError::InvalidContent(e.to_string()))
        }
    }
}

/// Walks a serialized tree and reports the first structural problem.
fn validate_tree(schema: &Schema, node: &Value, root: bool) -> CoreResult<()> {
    let invalid = |msg: String| Err(CoreError::InvalidContent(msg));

    let Some(obj) = node.as_object() else {
        return invalid(format!("expected a node object, got {node}"));
    };
    let Some(type_name) = obj.get("type").and_then(Value::as_str) else {
        return invalid("node without a \"type\"".to_string());
    };
    let top = schema.top_node_type().name();
    if root && type_name != top {
        return invalid(format!("root node must be {top:?}, got {type_name:?}"));
    }
    let Ok(node_type) = schema.node_type(type_name) else {
        return invalid(format!("unknown node type {type_name:?}"));
    };
    check_attrs(type_name, &node_type.spec().attrs, obj.get("attrs"))?;
    if type_name == "text" && !obj.get("text").is_some_and(Value::is_string) {
        return invalid("text node without text".to_string());
    }

    if let Some(marks) = obj.get("marks") {
        let Some(marks) = marks.as_array() else {
            return invalid(format!("marks of {type_name:?} must be a list"));
        };
        for mark in marks {
            let Some(name) = mark.get("type").and_then(Value::as_str) else {
                return invalid("mark without a \"type\"".to_string());
            };
            let Ok(mark_type) = schema.mark_type(name) else {
                return invalid(format!("unknown mark type {name:?}"));
            };
            check_attrs(name, &mark_type.spec().attrs, mark.get("attrs"))?;
        }
    }

    match obj.get("content") {
        None => Ok(()),
        Some(Value::Array(children)) => children
            .iter()
            .try_for_each(|child| validate_tree(schema, child, false)),
        Some(other) => invalid(format!("content of {type_name:?} must be a list, got {other}")),
    }
}

/// Required attributes must be present and non-null. A given value must have
/// the JSON kind of the declared default.
fn check_attrs(owner: &str, specs: &OrderedMap<AttrSpec>, given: Option<&Value>) -> CoreResult<()> {
    let empty = serde_json::Map::new();
    let given = match given {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(CoreError::InvalidContent(format!(
                "attrs of {owner:?} must be an object, got {other}"
            )));
        }
    };
    for (name, spec) in specs.iter() {
        match (given.get(name), &spec.default) {
            (None | Some(Value::Null), None) => {
                return Err(CoreError::InvalidContent(format!(
                    "{owner:?} is missing required attribute {name:?}"
                )));
            }
            (Some(value), Some(default)) if !default.is_null() && !same_kind(value, default) => {
                return Err(CoreError::InvalidContent(format!(
                    "attribute {name:?} of {owner:?} expects a value like {default}, got {value}"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Behaviors every editor carries ahead of content-type and extension
/// plugins.
pub fn baseline_plugins(history_options: HistoryOptions) -> Vec<Plugin> {
    let history_keys = Keymap::new()
        .bind("Mod-z", undo())
        .bind("Mod-y", redo())
        .bind("Mod-Shift-z", redo());
    vec![
        history(history_options),
        keymap(history_keys),
        keymap(base_keymap()),
        drop_cursor(),
        gap_cursor(),
    ]
}

/// The full plugin list: baseline, then content-type plugins in schema
/// order (nodes, then marks), then extension plugins in registry order.
pub fn compose_plugins(
    content_types: &ContentTypes,
    registry: &ExtensionRegistry,
    history_options: HistoryOptions,
) -> Vec<Plugin> {
    let mut plugins = baseline_plugins(history_options);
    plugins.extend(content_types.iter().flat_map(|ty| ty.plugins()));
    plugins.extend(registry.plugins());
    plugins
}

/// Swaps in a freshly built state for `content`. History starts over.
pub fn replace_content(
    view: &mut EditorView,
    content: &Content,
    schema: &Rc<Schema>,
    plugins: Vec<Plugin>,
) -> CoreResult<()> {
    let state = build_state(content, schema, plugins)?;
    view.update_state(state);
    Ok(())
}

/// Installs a new plugin list, keeping the document, selection and history.
pub fn reconfigure_plugins(view: &mut EditorView, plugins: Vec<Plugin>) {
    let state = view.state().reconfigure(plugins);
    view.update_state(state);
}
