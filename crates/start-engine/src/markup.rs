//! Markup (HTML) to document tree and back.
//!
//! Parsing runs html5ever into an `RcDom`, then walks the `<body>` and maps
//! elements through the schema's parse rules:
//!
//! 1. mark rules are tried first, then node rules, each in schema order;
//!    first match wins;
//! 2. unmatched elements are transparent (their children are parsed in place);
//! 3. inline content that lands where only blocks are allowed is wrapped in
//!    the schema's default textblock, which is closed again at the next block.
//!
//! Serialization uses each type's `to_dom` and keeps marks open across
//! adjacent inline nodes that share them.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::model::{Attrs, Mark, Node, normalize_inline};
use crate::schema::{DomOutput, MarkupElement, NodeType, Schema};
use crate::{EngineError, EngineResult};

/// Elements that are never content.
const IGNORED_TAGS: &[&str] = &["script", "style", "template", "head", "title", "meta", "link"];

/// Elements that start a new block when unmatched.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "div", "dl", "dt", "dd", "fieldset", "figure", "footer",
    "form", "header", "li", "main", "nav", "ol", "pre", "section", "table", "tbody", "td", "tr",
    "th", "thead", "ul",
];

/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr"];

/// Parses `markup` into a document tree conforming to `schema`.
pub fn parse_markup(schema: &Schema, markup: &str) -> EngineResult<Node> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);
    let body = find_body(&dom.document)
        .ok_or_else(|| EngineError::InvalidContent {
            node: schema.top_node_type().name().to_string(),
            reason: "markup has no body".to_string(),
        })?;

    let mut parser = DomParser::new(schema);
    parser.add_children(&body)?;
    parser.finish()
}

fn find_body(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data {
        if &*name.local == "body" {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(find_body)
}

struct OpenNode {
    type_name: String,
    attrs: Attrs,
    content: Vec<Node>,
    /// Opened implicitly to hold stray inline content.
    auto: bool,
}

struct DomParser<'s> {
    schema: &'s Schema,
    open: Vec<OpenNode>,
    marks: Vec<Mark>,
}

impl<'s> DomParser<'s> {
    fn new(schema: &'s Schema) -> Self {
        let top = schema.top_node_type();
        Self {
            schema,
            open: vec![OpenNode {
                type_name: top.name().to_string(),
                attrs: Attrs::new(),
                content: Vec::new(),
                auto: false,
            }],
            marks: Vec::new(),
        }
    }

    fn top_type(&self) -> EngineResult<&'s NodeType> {
        let schema: &'s Schema = self.schema;
        let name = self
            .open
            .last()
            .map(|n| n.type_name.as_str())
            .unwrap_or_else(|| schema.top_node_type().name());
        schema.node_type(name)
    }

    fn add_children(&mut self, handle: &Handle) -> EngineResult<()> {
        for child in handle.children.borrow().iter() {
            self.add_dom(child)?;
        }
        Ok(())
    }

    fn add_dom(&mut self, handle: &Handle) -> EngineResult<()> {
        match &handle.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                self.add_text(&text)
            }
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.to_string();
                if IGNORED_TAGS.contains(&tag.as_str()) {
                    return Ok(());
                }
                let attrs = attrs
                    .borrow()
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                let el = MarkupElement::new(tag, attrs);
                self.add_element(&el, handle)
            }
            _ => Ok(()),
        }
    }

    fn add_text(&mut self, raw: &str) -> EngineResult<()> {
        let top = self.top_type()?;
        let collapsed = collapse_whitespace(raw);
        if collapsed.trim().is_empty() && !top.inline_content() {
            return Ok(());
        }
        if collapsed.is_empty() {
            return Ok(());
        }
        let text = self.schema.text(collapsed, self.marks.clone());
        self.insert(text)
    }

    fn add_element(&mut self, el: &MarkupElement, handle: &Handle) -> EngineResult<()> {
        // Mark rules take precedence over node rules.
        if let Some(mark) = self.match_mark(el)? {
            let saved = self.marks.clone();
            let schema = self.schema;
            let rank = |name: &str| schema.mark_rank(name);
            self.marks = mark.add_to_set(&self.marks, rank);
            self.add_children(handle)?;
            self.marks = saved;
            return Ok(());
        }

        if let Some((ty, attrs)) = self.match_node(el) {
            let attrs = ty.compute_attrs(&attrs)?;
            if ty.is_leaf() {
                return self.insert(Node::element(ty.name(), attrs, Vec::new()).with_marks(
                    if ty.is_inline() {
                        self.marks.clone()
                    } else {
                        Vec::new()
                    },
                ));
            }
            if !self.open_node(ty, attrs)? {
                return self.add_children(handle);
            }
            let depth = self.open.len();
            self.add_children(handle)?;
            while self.open.len() >= depth {
                self.close()?;
            }
            return Ok(());
        }

        let is_block = BLOCK_TAGS.contains(&el.tag());
        if is_block {
            self.close_auto()?;
        }
        self.add_children(handle)?;
        if is_block {
            self.close_auto()?;
        }
        Ok(())
    }

    fn match_node(&self, el: &MarkupElement) -> Option<(&'s NodeType, Attrs)> {
        let schema: &'s Schema = self.schema;
        schema.nodes().find_map(|ty| {
            ty.spec()
                .parse_dom
                .iter()
                .find_map(|rule| rule.matches(el))
                .map(|attrs| (ty, attrs))
        })
    }

    fn match_mark(&self, el: &MarkupElement) -> EngineResult<Option<Mark>> {
        for ty in self.schema.marks() {
            if let Some(attrs) = ty.spec().parse_dom.iter().find_map(|rule| rule.matches(el)) {
                return ty.create(&attrs).map(Some);
            }
        }
        Ok(None)
    }

    /// Makes room for a node of type `ty` at the current position by
    /// closing implicit wrappers or opening a default wrapper. Returns false
    /// if no placement exists.
    fn place(&mut self, ty: &NodeType) -> EngineResult<bool> {
        let schema: &'s Schema = self.schema;
        loop {
            let top = self.top_type()?;
            if top.allows(ty) {
                return Ok(true);
            }
            if self.open.last().is_some_and(|n| n.auto) {
                self.close()?;
                continue;
            }
            if ty.is_inline() && !top.inline_content() {
                if let Some(wrapper) = schema
                    .default_textblock()
                    .filter(|w| top.allows(w))
                    .or_else(|| schema.find_wrapping(top, ty))
                {
                    self.push_open(wrapper, true)?;
                    continue;
                }
            } else if let Some(wrapper) = schema.find_wrapping(top, ty) {
                self.push_open(wrapper, true)?;
                continue;
            }

            // Close explicit ancestors until one accepts the node.
            let depth = self.open.iter().rposition(|n| {
                schema
                    .node_type(&n.type_name)
                    .map(|t| t.allows(ty))
                    .unwrap_or(false)
            });
            match depth {
                Some(depth) => {
                    while self.open.len() > depth + 1 {
                        self.close()?;
                    }
                    return Ok(true);
                }
                None => return Ok(false),
            }
        }
    }

    fn push_open(&mut self, ty: &NodeType, auto: bool) -> EngineResult<()> {
        self.open.push(OpenNode {
            type_name: ty.name().to_string(),
            attrs: ty.compute_attrs(&Attrs::new())?,
            content: Vec::new(),
            auto,
        });
        Ok(())
    }

    fn open_node(&mut self, ty: &NodeType, attrs: Attrs) -> EngineResult<bool> {
        if !self.place(ty)? {
            tracing::warn!(node = ty.name(), "dropping node with no valid placement");
            return Ok(false);
        }
        self.open.push(OpenNode {
            type_name: ty.name().to_string(),
            attrs,
            content: Vec::new(),
            auto: false,
        });
        Ok(true)
    }

    fn insert(&mut self, node: Node) -> EngineResult<()> {
        let ty = self.schema.node_type(node.type_name())?;
        if !self.place(ty)? {
            tracing::warn!(node = ty.name(), "dropping content with no valid placement");
            return Ok(());
        }
        if let Some(top) = self.open.last_mut() {
            top.content.push(node);
        }
        Ok(())
    }

    fn close_auto(&mut self) -> EngineResult<()> {
        while self.open.len() > 1 && self.open.last().is_some_and(|n| n.auto) {
            self.close()?;
        }
        Ok(())
    }

    fn close(&mut self) -> EngineResult<()> {
        if self.open.len() <= 1 {
            return Ok(());
        }
        let Some(open) = self.open.pop() else {
            return Ok(());
        };
        let node = self.build(open)?;
        if let Some(parent) = self.open.last_mut() {
            parent.content.push(node);
        }
        Ok(())
    }

    fn build(&self, open: OpenNode) -> EngineResult<Node> {
        let ty = self.schema.node_type(&open.type_name)?;
        let content = match (ty.inline_content(), ty.is_block()) {
            (true, true) => trim_block_whitespace(normalize_inline(open.content)),
            (true, false) => normalize_inline(open.content),
            _ => open.content,
        };
        if content.is_empty() && !ty.content_expr().validate(&[]) {
            let filled = self.schema.create_and_fill(ty.name())?;
            return Ok(filled.with_attrs(open.attrs));
        }
        Ok(Node::element(ty.name(), open.attrs, content))
    }

    fn finish(mut self) -> EngineResult<Node> {
        while self.open.len() > 1 {
            self.close()?;
        }
        let root = self
            .open
            .pop()
            .ok_or_else(|| EngineError::MissingNode(self.schema.top_node_type().name().to_string()))?;
        let doc = self.build(root)?;
        self.schema.check(&doc)
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out
}

/// Trims leading and trailing whitespace of a textblock's inline content.
fn trim_block_whitespace(mut content: Vec<Node>) -> Vec<Node> {
    if let Some(first) = content.first() {
        if let Some(text) = first.text() {
            let trimmed = text.trim_start().to_string();
            content[0] = Node::text_node(trimmed, first.marks().to_vec());
        }
    }
    if let Some(last) = content.last() {
        if let Some(text) = last.text() {
            let trimmed = text.trim_end().to_string();
            let idx = content.len() - 1;
            content[idx] = Node::text_node(trimmed, last.marks().to_vec());
        }
    }
    normalize_inline(content)
}

// ==================== Serialization ====================

/// Serializes the children of `node` (typically the document).
pub fn serialize_fragment(schema: &Schema, node: &Node) -> EngineResult<String> {
    let mut out = String::new();
    write_children(schema, node, &mut out)?;
    Ok(out)
}

/// Serializes `node` itself, including its own element.
pub fn serialize_node(schema: &Schema, node: &Node) -> EngineResult<String> {
    let mut out = String::new();
    write_node(schema, node, &mut out)?;
    Ok(out)
}

fn write_children(schema: &Schema, node: &Node, out: &mut String) -> EngineResult<()> {
    let mut open_marks: Vec<(Mark, DomOutput)> = Vec::new();

    for child in node.content() {
        let marks = child.marks();
        let keep = open_marks
            .iter()
            .zip(marks)
            .take_while(|((open, _), mark)| open == *mark)
            .count();
        while open_marks.len() > keep {
            if let Some((_, dom)) = open_marks.pop() {
                write_close(&dom, out);
            }
        }
        for mark in &marks[keep..] {
            let dom = mark_dom(schema, mark)?;
            write_open(&dom, out);
            open_marks.push((mark.clone(), dom));
        }
        write_node(schema, child, out)?;
    }

    while let Some((_, dom)) = open_marks.pop() {
        write_close(&dom, out);
    }
    Ok(())
}

fn write_node(schema: &Schema, node: &Node, out: &mut String) -> EngineResult<()> {
    if let Some(text) = node.text() {
        out.push_str(&html_escape::encode_text(text));
        return Ok(());
    }
    let ty = schema.node_type(node.type_name())?;
    let to_dom = ty
        .spec()
        .to_dom
        .as_ref()
        .ok_or_else(|| EngineError::NotSerializable(ty.name().to_string()))?;
    let dom = to_dom(node);
    write_open(&dom, out);
    if dom.hole {
        write_children(schema, node, out)?;
    }
    write_close(&dom, out);
    Ok(())
}

fn mark_dom(schema: &Schema, mark: &Mark) -> EngineResult<DomOutput> {
    let ty = schema.mark_type(mark.type_name())?;
    let to_dom = ty
        .spec()
        .to_dom
        .as_ref()
        .ok_or_else(|| EngineError::NotSerializable(ty.name().to_string()))?;
    Ok(to_dom(mark))
}

fn write_open(dom: &DomOutput, out: &mut String) {
    out.push('<');
    out.push_str(&dom.tag);
    for (name, value) in &dom.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');
}

fn write_close(dom: &DomOutput, out: &mut String) {
    if VOID_TAGS.contains(&dom.tag.as_str()) {
        return;
    }
    out.push_str("</");
    out.push_str(&dom.tag);
    out.push('>');
}
