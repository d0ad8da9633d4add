//! Schema: node and mark types governing valid document shape.
//!
//! A [`Schema`] is built once from a [`SchemaSpec`] whose node and mark
//! maps are already in their final order. That order matters:
//!
//! - markup parse rules are tried in schema order (marks before nodes),
//!   first match wins;
//! - when content must be created or wrapped, the first type (in schema
//!   order) that fits is chosen.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::model::{Attrs, Mark, Node};
use crate::ordered_map::OrderedMap;
use crate::selector::{self, Selectable};
use crate::{EngineError, EngineResult};

/// Declaration of a single attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrSpec {
    /// Value used when none is given. `None` makes the attribute required.
    pub default: Option<Value>,
}

impl AttrSpec {
    pub fn required() -> Self {
        Self { default: None }
    }

    pub fn with_default(value: impl Into<Value>) -> Self {
        Self {
            default: Some(value.into()),
        }
    }
}

/// A parsed markup element as seen by parse rules.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    tag: String,
    attrs: Vec<(String, String)>,
}

impl MarkupElement {
    pub fn new(tag: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The raw inline `style` attribute (empty when absent).
    pub fn style(&self) -> &str {
        self.attr("style").unwrap_or("")
    }

    /// Value of a single CSS property from the inline style.
    pub fn style_property(&self, name: &str) -> Option<String> {
        self.style().split(';').find_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            (key.trim().eq_ignore_ascii_case(name)).then(|| value.trim().to_string())
        })
    }

    pub fn matches(&self, selector: &str) -> bool {
        selector::matches(selector, self)
    }
}

impl Selectable for MarkupElement {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.attr(name).map(str::to_string)
    }
}

/// Computes attributes from a matched element. Returning `None` rejects the
/// match so later rules get a chance.
pub type GetAttrs = Rc<dyn Fn(&MarkupElement) -> Option<Attrs>>;

/// Describes how a markup element maps to a node or mark.
#[derive(Clone)]
pub struct ParseRule {
    pub tag: String,
    pub get_attrs: Option<GetAttrs>,
}

impl ParseRule {
    /// A rule matching `selector` with no attributes.
    pub fn tag(selector: impl Into<String>) -> Self {
        Self {
            tag: selector.into(),
            get_attrs: None,
        }
    }

    /// Sets the attribute computation.
    pub fn attrs(mut self, f: impl Fn(&MarkupElement) -> Option<Attrs> + 'static) -> Self {
        self.get_attrs = Some(Rc::new(f));
        self
    }

    /// Returns the attributes if `el` matches this rule.
    pub fn matches(&self, el: &MarkupElement) -> Option<Attrs> {
        if !el.matches(&self.tag) {
            return None;
        }
        match &self.get_attrs {
            Some(f) => f(el),
            None => Some(Attrs::new()),
        }
    }
}

impl fmt::Debug for ParseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseRule")
            .field("tag", &self.tag)
            .field("get_attrs", &self.get_attrs.is_some())
            .finish()
    }
}

/// Markup produced for a node or mark.
#[derive(Debug, Clone, PartialEq)]
pub struct DomOutput {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Whether children are rendered inside the element.
    pub hole: bool,
}

impl DomOutput {
    /// An element that wraps its content.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            hole: true,
        }
    }

    /// An element without content (`<br>`, `<img>`).
    pub fn leaf(tag: impl Into<String>) -> Self {
        Self {
            hole: false,
            ..Self::new(tag)
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }
}

pub type NodeToDom = Rc<dyn Fn(&Node) -> DomOutput>;
pub type MarkToDom = Rc<dyn Fn(&Mark) -> DomOutput>;

/// Schema fragment for a node type.
#[derive(Clone, Default)]
pub struct NodeSpec {
    pub content: Option<String>,
    pub group: Option<String>,
    pub inline: bool,
    pub atom: bool,
    pub selectable: Option<bool>,
    pub attrs: OrderedMap<AttrSpec>,
    pub parse_dom: Vec<ParseRule>,
    pub to_dom: Option<NodeToDom>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = Some(expr.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = Some(selectable);
        self
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttrSpec) -> Self {
        self.attrs.insert(name, spec);
        self
    }

    pub fn parse(mut self, rule: ParseRule) -> Self {
        self.parse_dom.push(rule);
        self
    }

    pub fn to_dom(mut self, f: impl Fn(&Node) -> DomOutput + 'static) -> Self {
        self.to_dom = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("content", &self.content)
            .field("group", &self.group)
            .field("inline", &self.inline)
            .field("attrs", &self.attrs.keys().collect::<Vec<_>>())
            .field("parse_dom", &self.parse_dom)
            .finish_non_exhaustive()
    }
}

/// Schema fragment for a mark type.
#[derive(Clone, Default)]
pub struct MarkSpec {
    pub attrs: OrderedMap<AttrSpec>,
    pub parse_dom: Vec<ParseRule>,
    pub to_dom: Option<MarkToDom>,
    /// Whether typing at the end of the mark extends it. Defaults to true.
    pub inclusive: Option<bool>,
}

impl MarkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttrSpec) -> Self {
        self.attrs.insert(name, spec);
        self
    }

    pub fn parse(mut self, rule: ParseRule) -> Self {
        self.parse_dom.push(rule);
        self
    }

    pub fn to_dom(mut self, f: impl Fn(&Mark) -> DomOutput + 'static) -> Self {
        self.to_dom = Some(Rc::new(f));
        self
    }

    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = Some(inclusive);
        self
    }
}

impl fmt::Debug for MarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkSpec")
            .field("attrs", &self.attrs.keys().collect::<Vec<_>>())
            .field("parse_dom", &self.parse_dom)
            .finish_non_exhaustive()
    }
}

// ==================== Content expressions ====================

#[derive(Debug, Clone, PartialEq)]
struct ContentTerm {
    alternatives: Vec<String>,
    min: usize,
    max: Option<usize>,
}

impl ContentTerm {
    fn allows(&self, ty: &NodeType) -> bool {
        self.alternatives.iter().any(|alt| ty.is_in(alt))
    }
}

/// A parsed content expression such as `block+`, `text*` or
/// `heading (paragraph | blockquote)*`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentExpr {
    terms: Vec<ContentTerm>,
}

impl ContentExpr {
    pub fn parse(src: &str) -> EngineResult<Self> {
        let invalid = |reason: &str| EngineError::InvalidContentExpr {
            expr: src.to_string(),
            reason: reason.to_string(),
        };

        let mut terms = Vec::new();
        let mut rest = src.trim();
        while !rest.is_empty() {
            let (alternatives, after) = if let Some(inner) = rest.strip_prefix('(') {
                let close = inner.find(')').ok_or_else(|| invalid("unclosed group"))?;
                let alts: Vec<String> = inner[..close]
                    .split('|')
                    .map(|a| a.trim().to_string())
                    .collect();
                if alts.iter().any(String::is_empty) {
                    return Err(invalid("empty alternative"));
                }
                (alts, &inner[close + 1..])
            } else {
                let end = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                if end == 0 {
                    return Err(invalid("expected a node or group name"));
                }
                (vec![rest[..end].to_string()], &rest[end..])
            };

            let (min, max, after) = match after.chars().next() {
                Some('*') => (0, None, &after[1..]),
                Some('+') => (1, None, &after[1..]),
                Some('?') => (0, Some(1), &after[1..]),
                _ => (1, Some(1), after),
            };
            terms.push(ContentTerm {
                alternatives,
                min,
                max,
            });
            rest = after.trim_start();
        }
        Ok(Self { terms })
    }

    /// True if the expression admits no content at all.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Names referenced by the expression.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .flat_map(|t| t.alternatives.iter().map(String::as_str))
    }

    /// True if `ty` may appear anywhere in this content.
    pub fn allows(&self, ty: &NodeType) -> bool {
        self.terms.iter().any(|t| t.allows(ty))
    }

    /// Checks a child sequence against the expression (greedy match).
    pub fn validate(&self, children: &[&NodeType]) -> bool {
        let mut idx = 0;
        for term in &self.terms {
            let mut count = 0;
            while idx < children.len()
                && term.max.is_none_or(|max| count < max)
                && term.allows(children[idx])
            {
                idx += 1;
                count += 1;
            }
            if count < term.min {
                return false;
            }
        }
        idx == children.len()
    }

    /// Alternatives of every term that requires at least one node.
    fn required(&self) -> impl Iterator<Item = (&[String], usize)> {
        self.terms
            .iter()
            .filter(|t| t.min > 0)
            .map(|t| (t.alternatives.as_slice(), t.min))
    }
}

// ==================== Types ====================

/// A node type of a built schema.
#[derive(Debug, Clone)]
pub struct NodeType {
    name: String,
    index: usize,
    groups: Vec<String>,
    content: ContentExpr,
    inline_content: bool,
    spec: NodeSpec,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of this type in the schema.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn content_expr(&self) -> &ContentExpr {
        &self.content
    }

    /// True if `name` is this type's name or one of its groups.
    pub fn is_in(&self, name: &str) -> bool {
        self.name == name || self.groups.iter().any(|g| g == name)
    }

    pub fn is_text(&self) -> bool {
        self.name == "text"
    }

    pub fn is_inline(&self) -> bool {
        self.spec.inline || self.is_text()
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.inline_content
    }

    pub fn inline_content(&self) -> bool {
        self.inline_content
    }

    pub fn is_leaf(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_atom(&self) -> bool {
        self.spec.atom || self.is_leaf()
    }

    /// True if nodes of type `child` may appear in this type's content.
    pub fn allows(&self, child: &NodeType) -> bool {
        self.content.allows(child)
    }

    /// Fills in defaults for missing attributes and drops undeclared ones.
    pub fn compute_attrs(&self, given: &Attrs) -> EngineResult<Attrs> {
        compute_attrs(&self.name, &self.spec.attrs, given)
    }
}

/// A mark type of a built schema.
#[derive(Debug, Clone)]
pub struct MarkType {
    name: String,
    rank: usize,
    spec: MarkSpec,
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.spec
    }

    pub fn compute_attrs(&self, given: &Attrs) -> EngineResult<Attrs> {
        compute_attrs(&self.name, &self.spec.attrs, given)
    }

    pub fn create(&self, attrs: &Attrs) -> EngineResult<Mark> {
        Ok(Mark::new(self.name.clone(), self.compute_attrs(attrs)?))
    }

    pub fn is_inclusive(&self) -> bool {
        self.spec.inclusive.unwrap_or(true)
    }
}

fn compute_attrs(owner: &str, specs: &OrderedMap<AttrSpec>, given: &Attrs) -> EngineResult<Attrs> {
    let mut attrs = Attrs::new();
    for (name, spec) in specs.iter() {
        let value = match given.get(name) {
            Some(v) => v.clone(),
            None => spec.default.clone().ok_or_else(|| EngineError::MissingAttr {
                node: owner.to_string(),
                attr: name.to_string(),
            })?,
        };
        attrs.insert(name.to_string(), value);
    }
    Ok(attrs)
}

/// Input to [`Schema::new`].
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    pub nodes: OrderedMap<NodeSpec>,
    pub marks: OrderedMap<MarkSpec>,
    /// Name of the root node type. Defaults to `doc`.
    pub top_node: Option<String>,
}

/// The merged set of node and mark types.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: OrderedMap<NodeType>,
    marks: OrderedMap<MarkType>,
    top_node: String,
}

impl Schema {
    pub fn new(spec: SchemaSpec) -> EngineResult<Self> {
        let top_node = spec.top_node.unwrap_or_else(|| "doc".to_string());

        let mut nodes = OrderedMap::new();
        for (index, (name, node_spec)) in spec.nodes.into_iter().enumerate() {
            let content = ContentExpr::parse(node_spec.content.as_deref().unwrap_or(""))?;
            let groups = node_spec
                .group
                .as_deref()
                .map(|g| g.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();
            nodes.insert(
                name.clone(),
                NodeType {
                    name,
                    index,
                    groups,
                    content,
                    inline_content: false,
                    spec: node_spec,
                },
            );
        }

        for required in [top_node.as_str(), "text"] {
            if !nodes.contains_key(required) {
                return Err(EngineError::MissingNode(required.to_string()));
            }
        }

        // Every referenced name must be a node or a group; compute whether
        // each type holds inline content once all types are known.
        let mut inline_flags = Vec::with_capacity(nodes.len());
        for ty in nodes.values() {
            let mut inline = false;
            for name in ty.content.names() {
                let members: Vec<&NodeType> = nodes.values().filter(|t| t.is_in(name)).collect();
                if members.is_empty() {
                    return Err(EngineError::InvalidContentExpr {
                        expr: ty.spec.content.clone().unwrap_or_default(),
                        reason: format!("no node type or group named {name:?}"),
                    });
                }
                inline |= members.iter().any(|t| t.is_inline());
            }
            inline_flags.push(inline);
        }
        for (ty, inline) in nodes.values_mut().zip(inline_flags) {
            ty.inline_content = inline;
        }

        let marks = spec
            .marks
            .into_iter()
            .enumerate()
            .map(|(rank, (name, spec))| {
                (
                    name.clone(),
                    MarkType {
                        name,
                        rank,
                        spec,
                    },
                )
            })
            .collect();

        Ok(Self {
            nodes,
            marks,
            top_node,
        })
    }

    pub fn node_type(&self, name: &str) -> EngineResult<&NodeType> {
        self.nodes
            .get(name)
            .ok_or_else(|| EngineError::UnknownNodeType(name.to_string()))
    }

    pub fn mark_type(&self, name: &str) -> EngineResult<&MarkType> {
        self.marks
            .get(name)
            .ok_or_else(|| EngineError::UnknownMarkType(name.to_string()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeType> {
        self.nodes.values()
    }

    pub fn marks(&self) -> impl Iterator<Item = &MarkType> {
        self.marks.values()
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().collect()
    }

    pub fn mark_names(&self) -> Vec<&str> {
        self.marks.keys().collect()
    }

    pub fn top_node_type(&self) -> &NodeType {
        // Presence is checked in `new`.
        self.nodes
            .get(&self.top_node)
            .unwrap_or_else(|| unreachable!("top node checked at construction"))
    }

    /// Rank of a mark type, used to keep mark sets ordered.
    pub fn mark_rank(&self, name: &str) -> usize {
        self.marks.get(name).map(|m| m.rank).unwrap_or(usize::MAX)
    }

    /// The first block type holding inline content.
    pub fn default_textblock(&self) -> Option<&NodeType> {
        self.nodes().find(|t| t.is_textblock())
    }

    /// The first type that may be placed in `parent`'s content and itself
    /// accepts `child`.
    pub fn find_wrapping(&self, parent: &NodeType, child: &NodeType) -> Option<&NodeType> {
        self.nodes()
            .find(|t| !t.is_text() && parent.allows(t) && t.allows(child))
    }

    /// Creates a node with defaults filled in and content checked.
    pub fn node(&self, type_name: &str, attrs: &Attrs, content: Vec<Node>) -> EngineResult<Node> {
        let ty = self.node_type(type_name)?;
        let node = Node::element(type_name, ty.compute_attrs(attrs)?, content);
        self.check_content(ty, &node)?;
        Ok(node)
    }

    /// Creates a text node.
    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> Node {
        Node::text_node(text, marks)
    }

    /// Creates a node of `type_name` with the minimum required content.
    pub fn create_and_fill(&self, type_name: &str) -> EngineResult<Node> {
        let ty = self.node_type(type_name)?;
        self.fill(ty, 0).ok_or_else(|| EngineError::InvalidContent {
            node: type_name.to_string(),
            reason: "required content cannot be generated".to_string(),
        })
    }

    fn fill(&self, ty: &NodeType, depth: usize) -> Option<Node> {
        if depth > 8 {
            return None;
        }
        let attrs = ty.compute_attrs(&Attrs::new()).ok()?;
        let mut content = Vec::new();
        for (alternatives, min) in ty.content.required() {
            let child = self
                .nodes()
                .filter(|t| !t.is_text() && alternatives.iter().any(|a| t.is_in(a)))
                .find_map(|t| self.fill(t, depth + 1))?;
            content.extend(std::iter::repeat_n(child, min));
        }
        Some(Node::element(ty.name.clone(), attrs, content))
    }

    /// Builds and validates a node from its JSON form.
    pub fn node_from_json(&self, json: &Value) -> EngineResult<Node> {
        let raw: Node = serde_json::from_value(json.clone())?;
        self.check(&raw)
    }

    /// Validates `node` recursively, returning it with attributes normalized.
    pub fn check(&self, node: &Node) -> EngineResult<Node> {
        let ty = self.node_type(node.type_name())?;
        let mut checked = node.clone();

        if ty.is_text() {
            if node.text().is_none_or(str::is_empty) {
                return Err(EngineError::InvalidContent {
                    node: "text".to_string(),
                    reason: "text nodes must carry non-empty text".to_string(),
                });
            }
        } else {
            *checked.attrs_mut() = ty.compute_attrs(node.attrs())?;
            let children = node
                .content()
                .iter()
                .map(|child| self.check(child))
                .collect::<EngineResult<Vec<_>>>()?;
            *checked.content_mut() = children;
            self.check_content(ty, &checked)?;
        }

        let marks = node
            .marks()
            .iter()
            .map(|m| self.mark_type(m.type_name())?.create(m.attrs()))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(checked.with_marks(marks))
    }

    fn check_content(&self, ty: &NodeType, node: &Node) -> EngineResult<()> {
        let child_types = node
            .content()
            .iter()
            .map(|c| self.node_type(c.type_name()))
            .collect::<EngineResult<Vec<_>>>()?;
        if ty.content.validate(&child_types) {
            Ok(())
        } else {
            Err(EngineError::InvalidContent {
                node: ty.name.clone(),
                reason: format!(
                    "[{}] does not match {:?}",
                    child_types.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "),
                    ty.spec.content.as_deref().unwrap_or("")
                ),
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Small schema used across the engine's tests.
    pub(crate) fn test_schema() -> Schema {
        let nodes: OrderedMap<NodeSpec> = [
            (
                "doc",
                NodeSpec::new()
                    .content("block+")
                    .to_dom(|_| DomOutput::new("div")),
            ),
            ("text", NodeSpec::new().group("inline")),
            (
                "paragraph",
                NodeSpec::new()
                    .content("inline*")
                    .group("block")
                    .parse(ParseRule::tag("p"))
                    .to_dom(|_| DomOutput::new("p")),
            ),
            (
                "heading",
                NodeSpec::new()
                    .content("inline*")
                    .group("block")
                    .attr("level", AttrSpec::with_default(1))
                    .parse(ParseRule::tag("h1").attrs(|_| {
                        let mut attrs = Attrs::new();
                        attrs.insert("level".into(), json!(1));
                        Some(attrs)
                    }))
                    .parse(ParseRule::tag("h2").attrs(|_| {
                        let mut attrs = Attrs::new();
                        attrs.insert("level".into(), json!(2));
                        Some(attrs)
                    }))
                    .to_dom(|node| {
                        let level = node.attr("level").and_then(Value::as_u64).unwrap_or(1);
                        DomOutput::new(format!("h{level}"))
                    }),
            ),
            (
                "blockquote",
                NodeSpec::new()
                    .content("block+")
                    .group("block")
                    .parse(ParseRule::tag("blockquote"))
                    .to_dom(|_| DomOutput::new("blockquote")),
            ),
            (
                "hardBreak",
                NodeSpec::new()
                    .group("inline")
                    .inline()
                    .parse(ParseRule::tag("br"))
                    .to_dom(|_| DomOutput::leaf("br")),
            ),
        ]
        .into_iter()
        .collect();

        let marks: OrderedMap<MarkSpec> = [
            (
                "bold",
                MarkSpec::new()
                    .parse(ParseRule::tag("strong, b"))
                    .to_dom(|_| DomOutput::new("strong")),
            ),
            (
                "italic",
                MarkSpec::new()
                    .parse(ParseRule::tag("em, i"))
                    .to_dom(|_| DomOutput::new("em")),
            ),
        ]
        .into_iter()
        .collect();

        Schema::new(SchemaSpec {
            nodes,
            marks,
            top_node: None,
        })
        .unwrap()
    }

    #[test]
    fn test_content_expr_parsing() {
        let expr = ContentExpr::parse("heading (paragraph | blockquote)* text?").unwrap();
        assert_eq!(
            expr.names().collect::<Vec<_>>(),
            vec!["heading", "paragraph", "blockquote", "text"]
        );
        assert!(ContentExpr::parse("(a | ").is_err());
        assert!(ContentExpr::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_type_classification() {
        let schema = test_schema();
        assert!(schema.node_type("paragraph").unwrap().is_textblock());
        assert!(!schema.node_type("blockquote").unwrap().is_textblock());
        assert!(schema.node_type("hardBreak").unwrap().is_inline());
        assert_eq!(schema.default_textblock().unwrap().name(), "paragraph");
    }

    #[test]
    fn test_create_and_fill_uses_schema_order() {
        let schema = test_schema();
        let doc = schema.create_and_fill("doc").unwrap();
        assert_eq!(doc.child_count(), 1);
        assert_eq!(doc.child(0).unwrap().type_name(), "paragraph");
    }

    #[test]
    fn test_unknown_content_reference_is_rejected() {
        let nodes: OrderedMap<NodeSpec> = [
            ("doc", NodeSpec::new().content("section+")),
            ("text", NodeSpec::new()),
        ]
        .into_iter()
        .collect();
        let err = Schema::new(SchemaSpec {
            nodes,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidContentExpr { .. }));
    }

    #[test]
    fn test_node_from_json_fills_defaults() {
        let schema = test_schema();
        let doc = schema
            .node_from_json(&json!({
                "type": "doc",
                "content": [{ "type": "heading", "content": [{ "type": "text", "text": "T" }] }]
            }))
            .unwrap();
        assert_eq!(doc.child(0).unwrap().attr("level"), Some(&json!(1)));
    }

    #[test]
    fn test_node_from_json_rejects_bad_trees() {
        let schema = test_schema();
        let unknown = json!({ "type": "doc", "content": [{ "type": "table" }] });
        assert!(matches!(
            schema.node_from_json(&unknown),
            Err(EngineError::UnknownNodeType(_))
        ));

        let misplaced = json!({ "type": "doc", "content": [{ "type": "text", "text": "x" }] });
        assert!(matches!(
            schema.node_from_json(&misplaced),
            Err(EngineError::InvalidContent { .. })
        ));

        let empty_text = json!({ "type": "paragraph", "content": [{ "type": "text", "text": "" }] });
        assert!(schema.node_from_json(&empty_text).is_err());
    }
}
