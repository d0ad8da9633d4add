//! Editor state and transactions.
//!
//! An [`EditorState`] is a value: `apply` takes a [`Transaction`] and returns
//! the next state. Transactions record their edits as [`Step`]s, each of which
//! swaps one node in the tree and can be inverted for undo.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::history::{HISTORY_META, History};
use crate::model::{Attrs, Mark, Node};
use crate::plugin::Plugin;
use crate::schema::Schema;
use crate::{EngineError, EngineResult};

/// Meta key that keeps a transaction out of the undo history when `false`.
pub const ADD_TO_HISTORY: &str = "addToHistory";

/// A text selection inside one textblock.
///
/// `block` is the child-index path of the textblock from the document root;
/// `anchor` and `head` are inline offsets within it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub block: Vec<usize>,
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn cursor(block: Vec<usize>, offset: usize) -> Self {
        Self {
            block,
            anchor: offset,
            head: offset,
        }
    }

    pub fn range(block: Vec<usize>, anchor: usize, head: usize) -> Self {
        Self {
            block,
            anchor,
            head,
        }
    }

    /// Start of the first textblock in `doc`.
    pub fn at_start(doc: &Node, schema: &Schema) -> Self {
        let block = first_textblock(doc, schema).unwrap_or_default();
        Self::cursor(block, 0)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// This selection if it still points into a textblock of `doc`, with
    /// offsets clamped; otherwise the start of the document.
    fn resolve(&self, doc: &Node, schema: &Schema) -> Self {
        let in_textblock = doc
            .node_at(&self.block)
            .filter(|node| is_textblock(node, schema));
        match in_textblock {
            Some(block) => {
                let len = block.inline_len();
                Self::range(self.block.clone(), self.anchor.min(len), self.head.min(len))
            }
            None => Self::at_start(doc, schema),
        }
    }
}

fn is_textblock(node: &Node, schema: &Schema) -> bool {
    schema
        .node_type(node.type_name())
        .is_ok_and(|ty| ty.is_textblock())
}

/// Marks text typed at `offset` picks up: those of the preceding character,
/// minus non-inclusive marks that end there.
fn marks_for_insert(block: &Node, offset: usize, schema: &Schema) -> Vec<Mark> {
    let after: Vec<Mark> = block
        .inline_slice(offset, offset + 1)
        .first()
        .map(|n| n.marks().to_vec())
        .unwrap_or_default();
    block
        .marks_at(offset)
        .into_iter()
        .filter(|m| {
            schema.mark_type(m.type_name()).is_ok_and(|t| t.is_inclusive()) || after.contains(m)
        })
        .collect()
}

fn first_textblock(doc: &Node, schema: &Schema) -> Option<Vec<usize>> {
    doc.find_paths(&|node| is_textblock(node, schema))
        .into_iter()
        .next()
}

/// Replaces the node at `path` (`before`) with `after`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub path: Vec<usize>,
    pub before: Node,
    pub after: Node,
}

impl Step {
    pub fn apply(&self, doc: &Node) -> EngineResult<Node> {
        doc.replace_at(&self.path, self.after.clone())
    }

    pub fn invert(&self) -> Step {
        Step {
            path: self.path.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }
}

/// Configuration for [`EditorState::create`].
#[derive(Clone)]
pub struct StateConfig {
    pub schema: Rc<Schema>,
    /// Starting document. `None` creates the smallest valid document.
    pub doc: Option<Node>,
    pub selection: Option<Selection>,
    pub plugins: Vec<Plugin>,
}

impl StateConfig {
    pub fn new(schema: Rc<Schema>) -> Self {
        Self {
            schema,
            doc: None,
            selection: None,
            plugins: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: Node) -> Self {
        self.doc = Some(doc);
        self
    }

    pub fn plugins(mut self, plugins: Vec<Plugin>) -> Self {
        self.plugins = plugins;
        self
    }
}

/// An immutable snapshot of the editor.
#[derive(Clone)]
pub struct EditorState {
    schema: Rc<Schema>,
    doc: Node,
    selection: Selection,
    stored_marks: Option<Vec<Mark>>,
    plugins: Vec<Plugin>,
    history: Option<History>,
}

impl EditorState {
    /// Builds a state. A supplied document is validated against the schema.
    pub fn create(config: StateConfig) -> EngineResult<Self> {
        let schema = config.schema;
        let doc = match config.doc {
            Some(doc) => schema.check(&doc)?,
            None => schema.create_and_fill(schema.top_node_type().name())?,
        };
        if doc.type_name() != schema.top_node_type().name() {
            return Err(EngineError::InvalidContent {
                node: doc.type_name().to_string(),
                reason: format!("the document root must be {}", schema.top_node_type().name()),
            });
        }
        let selection = config
            .selection
            .unwrap_or_default()
            .resolve(&doc, &schema);
        let history = History::from_plugins(&config.plugins);

        Ok(Self {
            schema,
            doc,
            selection,
            stored_marks: None,
            plugins: config.plugins,
            history,
        })
    }

    /// Builds a state from serialized JSON: either `{ "doc": .., "selection": .. }`
    /// or a bare document node.
    pub fn from_json(config: StateConfig, json: &Value) -> EngineResult<Self> {
        let (doc_json, selection) = match json.get("doc") {
            Some(doc) => {
                let selection = json
                    .get("selection")
                    .map(|s| serde_json::from_value::<Selection>(s.clone()))
                    .transpose()?;
                (doc, selection)
            }
            None => (json, None),
        };
        let doc = config.schema.node_from_json(doc_json)?;
        Self::create(StateConfig {
            doc: Some(doc),
            selection,
            ..config
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "doc": self.doc,
            "selection": self.selection,
        })
    }

    /// The same document and selection with a new plugin list. Undo history
    /// survives if the new list still carries the history plugin.
    pub fn reconfigure(&self, plugins: Vec<Plugin>) -> Self {
        let history = match (&self.history, History::from_plugins(&plugins)) {
            (Some(existing), Some(fresh)) => Some(existing.with_options(fresh.options())),
            (None, fresh) => fresh,
            (Some(_), None) => None,
        };
        Self {
            plugins,
            history,
            ..self.clone()
        }
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    /// The textblock the selection sits in.
    pub fn selected_block(&self) -> Option<&Node> {
        self.doc.node_at(&self.selection.block)
    }

    /// Marks that typing at the cursor would apply.
    pub fn active_marks(&self) -> Vec<Mark> {
        if let Some(stored) = &self.stored_marks {
            return stored.clone();
        }
        self.selected_block()
            .map(|block| marks_for_insert(block, self.selection.from(), &self.schema))
            .unwrap_or_default()
    }

    /// True when the document is a single empty textblock.
    pub fn is_empty_doc(&self) -> bool {
        self.doc.child_count() == 1
            && self
                .doc
                .child(0)
                .is_some_and(|block| is_textblock(block, &self.schema) && block.child_count() == 0)
    }

    /// Starts a transaction on this state.
    pub fn tr(&self) -> Transaction {
        Transaction {
            schema: Rc::clone(&self.schema),
            before: self.doc.clone(),
            doc: self.doc.clone(),
            steps: Vec::new(),
            selection: self.selection.clone(),
            selection_set: false,
            stored_marks: self.stored_marks.clone(),
            stored_marks_set: false,
            meta: HashMap::new(),
            time: Instant::now(),
        }
    }

    /// Produces the state that results from `tr`.
    pub fn apply(&self, tr: Transaction) -> EditorState {
        let selection = tr.selection.resolve(&tr.doc, &self.schema);
        let stored_marks = if tr.stored_marks_set {
            tr.stored_marks.clone()
        } else if tr.doc_changed() || tr.selection_set {
            None
        } else {
            self.stored_marks.clone()
        };

        let history = self
            .history
            .as_ref()
            .map(|history| history.apply(&tr, &self.selection));

        tracing::trace!(steps = tr.steps.len(), "applied transaction");

        EditorState {
            schema: Rc::clone(&self.schema),
            doc: tr.doc,
            selection,
            stored_marks,
            plugins: self.plugins.clone(),
            history,
        }
    }
}

impl std::fmt::Debug for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorState")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

/// A batch of changes to a state.
#[derive(Clone)]
pub struct Transaction {
    schema: Rc<Schema>,
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    selection: Selection,
    selection_set: bool,
    stored_marks: Option<Vec<Mark>>,
    stored_marks_set: bool,
    meta: HashMap<String, Value>,
    time: Instant,
}

impl Transaction {
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// The document before this transaction.
    pub fn before(&self) -> &Node {
        &self.before
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn time(&self) -> Instant {
        self.time
    }

    /// Replaces the node at `path`. The new node is validated and must be
    /// allowed by its parent.
    pub fn replace_node(&mut self, path: &[usize], node: Node) -> EngineResult<&mut Self> {
        let before = self
            .doc
            .node_at(path)
            .cloned()
            .ok_or_else(|| EngineError::InvalidPath(path.to_vec()))?;
        let after = self.schema.check(&node)?;

        if let Some((_, parent_path)) = path.split_last() {
            let parent = self
                .doc
                .node_at(parent_path)
                .ok_or_else(|| EngineError::InvalidPath(parent_path.to_vec()))?;
            let parent_type = self.schema.node_type(parent.type_name())?;
            let child_type = self.schema.node_type(after.type_name())?;
            if !parent_type.allows(child_type) {
                return Err(EngineError::InvalidContent {
                    node: parent.type_name().to_string(),
                    reason: format!("{} is not allowed here", after.type_name()),
                });
            }
        }

        self.step(Step {
            path: path.to_vec(),
            before,
            after,
        })
    }

    /// Applies a step as-is.
    pub fn step(&mut self, step: Step) -> EngineResult<&mut Self> {
        self.doc = step.apply(&self.doc)?;
        self.steps.push(step);
        Ok(self)
    }

    /// Replaces the inline range `from..to` of the textblock at `block`.
    pub fn replace_inline(
        &mut self,
        block: &[usize],
        from: usize,
        to: usize,
        nodes: Vec<Node>,
    ) -> EngineResult<&mut Self> {
        let node = self.textblock(block)?;
        let replaced = node.replace_inline(from, to, nodes);
        self.replace_node(block, replaced)
    }

    /// Types `text` over the selection, using the active marks.
    pub fn insert_text(&mut self, text: &str) -> EngineResult<&mut Self> {
        let block = self.selection.block.clone();
        let (from, to) = (self.selection.from(), self.selection.to());
        let marks = match &self.stored_marks {
            Some(stored) => stored.clone(),
            None => marks_for_insert(self.textblock(&block)?, from, &self.schema),
        };
        let inserted = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text_node(text, marks)]
        };
        self.replace_inline(&block, from, to, inserted)?;
        let offset = from + text.chars().count();
        self.set_selection(Selection::cursor(block, offset));
        Ok(self)
    }

    /// Removes the selected content. A cursor is left alone.
    pub fn delete_selection(&mut self) -> EngineResult<&mut Self> {
        if self.selection.is_empty() {
            return Ok(self);
        }
        let block = self.selection.block.clone();
        let from = self.selection.from();
        self.replace_inline(&block, from, self.selection.to(), Vec::new())?;
        self.set_selection(Selection::cursor(block, from));
        Ok(self)
    }

    /// Changes the type of the node at `path`, keeping its content.
    pub fn set_node_type(
        &mut self,
        path: &[usize],
        type_name: &str,
        attrs: &Attrs,
    ) -> EngineResult<&mut Self> {
        let node = self
            .doc
            .node_at(path)
            .ok_or_else(|| EngineError::InvalidPath(path.to_vec()))?;
        let attrs = self.schema.node_type(type_name)?.compute_attrs(attrs)?;
        let retyped = node.with_type(type_name, attrs);
        self.replace_node(path, retyped)
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self.selection_set = true;
        self.stored_marks = None;
        self
    }

    pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
        self.stored_marks = marks;
        self.stored_marks_set = true;
        self
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// False when the transaction was marked to skip the undo history.
    pub fn add_to_history(&self) -> bool {
        self.get_meta(ADD_TO_HISTORY) != Some(&Value::Bool(false))
    }

    /// True for transactions produced by undo or redo.
    pub fn is_history_step(&self) -> bool {
        self.get_meta(HISTORY_META).is_some()
    }

    fn textblock(&self, path: &[usize]) -> EngineResult<&Node> {
        let node = self
            .doc
            .node_at(path)
            .ok_or_else(|| EngineError::InvalidPath(path.to_vec()))?;
        if is_textblock(node, &self.schema) {
            Ok(node)
        } else {
            Err(EngineError::InvalidContent {
                node: node.type_name().to_string(),
                reason: "selection is not inside a textblock".to_string(),
            })
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("steps", &self.steps.len())
            .field("selection", &self.selection)
            .field("meta", &self.meta)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::test_schema;

    fn state_with(json: Value) -> EditorState {
        EditorState::from_json(StateConfig::new(Rc::new(test_schema())), &json).unwrap()
    }

    fn hello() -> EditorState {
        state_with(json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [{ "type": "text", "text": "hello" }] },
                { "type": "paragraph" }
            ]
        }))
    }

    #[test]
    fn test_create_fills_empty_doc() {
        let state = EditorState::create(StateConfig::new(Rc::new(test_schema()))).unwrap();
        assert!(state.is_empty_doc());
        assert_eq!(state.selection(), &Selection::cursor(vec![0], 0));
    }

    #[test]
    fn test_create_rejects_wrong_root() {
        let schema = Rc::new(test_schema());
        let paragraph = schema.node("paragraph", &Attrs::new(), vec![]).unwrap();
        let result = EditorState::create(StateConfig::new(schema).doc(paragraph));
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_text_moves_cursor() {
        let state = hello();
        let mut tr = state.tr();
        tr.set_selection(Selection::cursor(vec![0], 5));
        tr.insert_text(" world").unwrap();
        let next = state.apply(tr);
        assert_eq!(next.doc().child(0).unwrap().text_content(), "hello world");
        assert_eq!(next.selection().head, 11);
        assert_eq!(state.doc().child(0).unwrap().text_content(), "hello");
    }

    #[test]
    fn test_insert_text_inherits_marks() {
        let state = state_with(json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": [
                { "type": "text", "text": "ab", "marks": [{ "type": "bold" }] }
            ]}]
        }));
        let mut tr = state.tr();
        tr.set_selection(Selection::cursor(vec![0], 2));
        tr.insert_text("c").unwrap();
        let next = state.apply(tr);
        let block = next.doc().child(0).unwrap();
        assert_eq!(block.child_count(), 1);
        assert_eq!(block.text_content(), "abc");
    }

    #[test]
    fn test_delete_selection() {
        let state = hello();
        let mut tr = state.tr();
        tr.set_selection(Selection::range(vec![0], 1, 4));
        tr.delete_selection().unwrap();
        let next = state.apply(tr);
        assert_eq!(next.doc().child(0).unwrap().text_content(), "ho");
        assert!(next.selection().is_empty());
    }

    #[test]
    fn test_replace_node_validates_placement() {
        let state = hello();
        let mut tr = state.tr();
        let text = Node::text_node("x", vec![]);
        assert!(tr.replace_node(&[0], text).is_err());
        assert!(!tr.doc_changed());
    }

    #[test]
    fn test_step_inversion_restores_doc() {
        let state = hello();
        let mut tr = state.tr();
        tr.set_node_type(&[0], "heading", &Attrs::new()).unwrap();
        let step = tr.steps()[0].clone();
        let changed = tr.doc().clone();
        assert_eq!(changed.child(0).unwrap().type_name(), "heading");
        assert_eq!(&step.invert().apply(&changed).unwrap(), state.doc());
    }

    #[test]
    fn test_selection_resolves_after_structural_change() {
        let state = hello();
        let mut tr = state.tr();
        tr.set_selection(Selection::cursor(vec![7], 3));
        let next = state.apply(tr);
        assert_eq!(next.selection(), &Selection::cursor(vec![0], 0));
    }

    #[test]
    fn test_json_roundtrip_keeps_selection() {
        let state = hello();
        let mut tr = state.tr();
        tr.set_selection(Selection::cursor(vec![0], 2));
        let next = state.apply(tr);
        let restored = EditorState::from_json(
            StateConfig::new(Rc::clone(next.schema())),
            &next.to_json(),
        )
        .unwrap();
        assert_eq!(restored.doc(), next.doc());
        assert_eq!(restored.selection(), next.selection());
    }

    #[test]
    fn test_meta_and_history_flag() {
        let state = hello();
        let mut tr = state.tr();
        assert!(tr.add_to_history());
        tr.set_meta(ADD_TO_HISTORY, false).set_meta("source", "paste");
        assert!(!tr.add_to_history());
        assert_eq!(tr.get_meta("source"), Some(&json!("paste")));
    }
}
