//! Document tree.
//!
//! A [`Node`] is an immutable value: every edit produces a new tree. The JSON
//! form (`type`, `attrs`, `content`, `text`, `marks`) is the serialized-tree
//! representation accepted by [`crate::EditorState::from_json`].
//!
//! ## Inline offsets
//!
//! Inside a textblock, positions are counted over its direct inline
//! children: every character of a text node counts one, every other inline
//! node counts one as a whole.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EngineError, EngineResult};

/// Node and mark attributes.
pub type Attrs = serde_json::Map<String, Value>;

/// Placeholder character used for non-text inline nodes in text views.
pub const OBJECT_REPLACEMENT: char = '\u{fffc}';

/// An inline formatting applied to a text range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    attrs: Attrs,
}

impl Mark {
    pub fn new(type_name: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            type_name: type_name.into(),
            attrs,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Adds this mark to `set`, replacing a mark of the same type and keeping
    /// the set ordered by `rank`.
    pub fn add_to_set(&self, set: &[Mark], rank: impl Fn(&str) -> usize) -> Vec<Mark> {
        let mut marks: Vec<Mark> = set
            .iter()
            .filter(|m| m.type_name != self.type_name)
            .cloned()
            .collect();
        let own = rank(&self.type_name);
        let idx = marks
            .iter()
            .position(|m| rank(&m.type_name) > own)
            .unwrap_or(marks.len());
        marks.insert(idx, self.clone());
        marks
    }

    /// Removes every mark of this mark's type from `set`.
    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter()
            .filter(|m| m.type_name != self.type_name)
            .cloned()
            .collect()
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|m| m == self)
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    marks: Vec<Mark>,
}

impl Node {
    /// Creates an element node. Attributes are taken as given; use
    /// [`crate::Schema::node`] to get defaults filled in and content checked.
    pub fn element(type_name: impl Into<String>, attrs: Attrs, content: Vec<Node>) -> Self {
        Self {
            type_name: type_name.into(),
            attrs,
            content,
            text: None,
            marks: Vec::new(),
        }
    }

    /// Creates a text node.
    pub fn text_node(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            type_name: "text".to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text.into()),
            marks,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.content.iter().map(Node::text_content).collect(),
        }
    }

    /// Size of this node as an inline child (see the module docs).
    pub fn inline_size(&self) -> usize {
        match &self.text {
            Some(text) => text.chars().count(),
            None => 1,
        }
    }

    /// Total inline length of this node's children.
    pub fn inline_len(&self) -> usize {
        self.content.iter().map(Node::inline_size).sum()
    }

    pub fn with_content(&self, content: Vec<Node>) -> Node {
        Node {
            content,
            ..self.clone()
        }
    }

    pub fn with_attrs(&self, attrs: Attrs) -> Node {
        Node {
            attrs,
            ..self.clone()
        }
    }

    pub fn with_type(&self, type_name: impl Into<String>, attrs: Attrs) -> Node {
        Node {
            type_name: type_name.into(),
            attrs,
            ..self.clone()
        }
    }

    pub fn with_marks(&self, marks: Vec<Mark>) -> Node {
        Node {
            marks,
            ..self.clone()
        }
    }

    pub(crate) fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    pub(crate) fn content_mut(&mut self) -> &mut Vec<Node> {
        &mut self.content
    }

    // ==================== Paths ====================

    /// Returns the descendant at `path` (child indices from this node).
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &idx| node.content.get(idx))
    }

    /// Returns a copy of this tree with the node at `path` replaced.
    pub fn replace_at(&self, path: &[usize], node: Node) -> EngineResult<Node> {
        let Some((&idx, rest)) = path.split_first() else {
            return Ok(node);
        };
        let child = self
            .content
            .get(idx)
            .ok_or_else(|| EngineError::InvalidPath(path.to_vec()))?;
        let replaced = child.replace_at(rest, node)?;
        let mut content = self.content.clone();
        content[idx] = replaced;
        Ok(self.with_content(content))
    }

    /// Depth-first paths of every node for which `pred` holds.
    pub fn find_paths(&self, pred: &impl Fn(&Node) -> bool) -> Vec<Vec<usize>> {
        let mut found = Vec::new();
        let mut path = Vec::new();
        self.collect_paths(pred, &mut path, &mut found);
        found
    }

    fn collect_paths(
        &self,
        pred: &impl Fn(&Node) -> bool,
        path: &mut Vec<usize>,
        found: &mut Vec<Vec<usize>>,
    ) {
        if pred(self) {
            found.push(path.clone());
        }
        for (idx, child) in self.content.iter().enumerate() {
            path.push(idx);
            child.collect_paths(pred, path, found);
            path.pop();
        }
    }

    // ==================== Inline content ====================

    /// Text of the inline range `from..to`; non-text inline nodes show up as
    /// [`OBJECT_REPLACEMENT`].
    pub fn text_between(&self, from: usize, to: usize) -> String {
        inline_slice(&self.content, from, to)
            .iter()
            .map(|n| match n.text() {
                Some(t) => t.to_string(),
                None => OBJECT_REPLACEMENT.to_string(),
            })
            .collect()
    }

    /// Inline children covering `from..to`, with text nodes cut to size.
    pub fn inline_slice(&self, from: usize, to: usize) -> Vec<Node> {
        inline_slice(&self.content, from, to)
    }

    /// Replaces the inline range `from..to` with `insert`.
    pub fn replace_inline(&self, from: usize, to: usize, insert: Vec<Node>) -> Node {
        let (left, rest) = split_inline(&self.content, from);
        let (_, right) = split_inline(&rest, to.saturating_sub(from));
        let mut content = left;
        content.extend(insert);
        content.extend(right);
        self.with_content(normalize_inline(content))
    }

    /// Applies `f` to every inline node inside `from..to`.
    pub fn map_inline(&self, from: usize, to: usize, f: impl Fn(&Node) -> Node) -> Node {
        let middle: Vec<Node> = inline_slice(&self.content, from, to)
            .iter()
            .map(f)
            .collect();
        self.replace_inline(from, to, middle)
    }

    /// Marks that apply at inline `offset` (those of the character before it,
    /// or after it at the start of the block).
    pub fn marks_at(&self, offset: usize) -> Vec<Mark> {
        let slice = if offset == 0 {
            inline_slice(&self.content, 0, 1)
        } else {
            inline_slice(&self.content, offset - 1, offset)
        };
        slice
            .first()
            .filter(|n| n.is_text())
            .map(|n| n.marks.clone())
            .unwrap_or_default()
    }

    /// Splits this node's inline content at `offset` into two nodes of the
    /// same type.
    pub fn split_inline_at(&self, offset: usize) -> (Node, Node) {
        let (left, right) = split_inline(&self.content, offset);
        (
            self.with_content(normalize_inline(left)),
            self.with_content(normalize_inline(right)),
        )
    }
}

/// Splits inline children at `offset`.
pub fn split_inline(children: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0;

    for child in children {
        let size = child.inline_size();
        if pos + size <= offset {
            left.push(child.clone());
        } else if pos >= offset {
            right.push(child.clone());
        } else if let Some(text) = child.text() {
            let cut = offset - pos;
            let byte = text
                .char_indices()
                .nth(cut)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            left.push(Node::text_node(&text[..byte], child.marks.clone()));
            right.push(Node::text_node(&text[byte..], child.marks.clone()));
        } else {
            right.push(child.clone());
        }
        pos += size;
    }

    (left, right)
}

fn inline_slice(children: &[Node], from: usize, to: usize) -> Vec<Node> {
    let (_, rest) = split_inline(children, from);
    let (middle, _) = split_inline(&rest, to.saturating_sub(from));
    normalize_inline(middle)
}

/// Drops empty text nodes and merges adjacent text nodes with equal marks.
pub fn normalize_inline(children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        if child.text().is_some_and(str::is_empty) {
            continue;
        }
        if let (Some(last), Some(text)) = (out.last_mut(), child.text()) {
            if last.is_text() && last.marks == child.marks {
                if let Some(existing) = last.text.as_mut() {
                    existing.push_str(text);
                }
                continue;
            }
        }
        out.push(child);
    }
    out
}
