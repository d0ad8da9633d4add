//! Host element tree the editor is mounted into.
//!
//! This is the DOM-equivalent the view renders to: element handles with a
//! tag, attributes, a class list and children, plus a `HostDocument` rooted at
//! `<html><body>` for selector lookups. Rendered document content is stored
//! as a markup string on the element it was rendered into.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::selector::{self, Selectable};

#[derive(Default)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<ElementRef>,
    parent: Weak<RefCell<ElementData>>,
    inner_markup: String,
}

/// Shared handle to a host element.
#[derive(Clone)]
pub struct ElementRef(Rc<RefCell<ElementData>>);

impl ElementRef {
    /// Creates a detached element.
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(RefCell::new(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        })))
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn id(&self) -> Option<String> {
        self.attribute("id")
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let mut data = self.0.borrow_mut();
        match data.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => data.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        self.0.borrow_mut().attrs.retain(|(k, _)| k != name);
    }

    pub fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn add_class(&self, class: &str) {
        let mut classes = self.classes();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.set_attribute("class", &classes.join(" "));
        }
    }

    pub fn remove_class(&self, class: &str) {
        let classes: Vec<String> = self.classes().into_iter().filter(|c| c != class).collect();
        if classes.is_empty() {
            self.remove_attribute("class");
        } else {
            self.set_attribute("class", &classes.join(" "));
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    /// Appends `child`, detaching it from its previous parent first.
    pub fn append_child(&self, child: &ElementRef) {
        child.remove();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
    }

    /// Detaches this element from its parent.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            parent
                .0
                .borrow_mut()
                .children
                .retain(|c| !Rc::ptr_eq(&c.0, &self.0));
        }
        self.0.borrow_mut().parent = Weak::new();
    }

    pub fn parent(&self) -> Option<ElementRef> {
        self.0.borrow().parent.upgrade().map(ElementRef)
    }

    pub fn children(&self) -> Vec<ElementRef> {
        self.0.borrow().children.clone()
    }

    /// Markup rendered into this element.
    pub fn inner_markup(&self) -> String {
        self.0.borrow().inner_markup.clone()
    }

    pub fn set_inner_markup(&self, markup: String) {
        self.0.borrow_mut().inner_markup = markup;
    }

    pub fn matches(&self, selector: &str) -> bool {
        selector::matches(selector, self)
    }

    /// First descendant (pre-order) matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Option<ElementRef> {
        for child in self.children() {
            if child.matches(selector) {
                return Some(child);
            }
            if let Some(found) = child.query_selector(selector) {
                return Some(found);
            }
        }
        None
    }

    /// True if `other` is this element or one of its descendants.
    pub fn contains(&self, other: &ElementRef) -> bool {
        let mut current = Some(other.clone());
        while let Some(el) = current {
            if el.ptr_eq(self) {
                return true;
            }
            current = el.parent();
        }
        false
    }

    pub fn ptr_eq(&self, other: &ElementRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Selectable for ElementRef {
    fn tag_name(&self) -> String {
        self.tag()
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.attribute(name)
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("ElementRef")
            .field("tag", &data.tag)
            .field("attrs", &data.attrs)
            .field("children", &data.children.len())
            .finish()
    }
}

/// A host document: `<html>` with a `<body>`.
#[derive(Clone, Debug)]
pub struct HostDocument {
    root: ElementRef,
    body: ElementRef,
}

impl HostDocument {
    pub fn new() -> Self {
        let root = ElementRef::new("html");
        let body = ElementRef::new("body");
        root.append_child(&body);
        Self { root, body }
    }

    pub fn root(&self) -> &ElementRef {
        &self.root
    }

    pub fn body(&self) -> &ElementRef {
        &self.body
    }

    pub fn create_element(&self, tag: &str) -> ElementRef {
        ElementRef::new(tag)
    }

    pub fn query_selector(&self, selector: &str) -> Option<ElementRef> {
        if self.root.matches(selector) {
            return Some(self.root.clone());
        }
        self.root.query_selector(selector)
    }

    /// True if `el` is attached to this document.
    pub fn is_connected(&self, el: &ElementRef) -> bool {
        self.root.contains(el)
    }
}

impl Default for HostDocument {
    fn default() -> Self {
        Self::new()
    }
}
