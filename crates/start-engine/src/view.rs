//! The editor view.
//!
//! Owns the current state and the element it renders into. Every dispatched
//! transaction produces a new state and a re-render. Input (typed text,
//! key chords) is offered to plugins in plugin-list order before any default
//! handling.

use crate::dom::ElementRef;
use crate::markup::serialize_fragment;
use crate::plugin::Command;
use crate::state::{EditorState, Transaction};

/// Props passed directly to the view.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectEditorProps {
    pub editable: bool,
    /// Attributes for the editable element. `class` values are merged with
    /// classes contributed by plugins.
    pub attributes: Vec<(String, String)>,
}

impl Default for DirectEditorProps {
    fn default() -> Self {
        Self {
            editable: true,
            attributes: Vec::new(),
        }
    }
}

/// Renders an [`EditorState`] into a host element and routes input.
pub struct EditorView {
    dom: ElementRef,
    state: EditorState,
    props: DirectEditorProps,
    applied_attrs: Vec<String>,
    applied_classes: Vec<String>,
    focused: bool,
    destroyed: bool,
    render_count: usize,
}

impl EditorView {
    /// Creates a view over `mount` and renders the initial state.
    pub fn new(mount: ElementRef, state: EditorState, props: DirectEditorProps) -> Self {
        let mut view = Self {
            dom: mount,
            state,
            props,
            applied_attrs: Vec::new(),
            applied_classes: Vec::new(),
            focused: false,
            destroyed: false,
            render_count: 0,
        };
        view.render();
        view
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// The element the document is rendered into.
    pub fn dom(&self) -> &ElementRef {
        &self.dom
    }

    pub fn props(&self) -> &DirectEditorProps {
        &self.props
    }

    /// Applies `tr` and re-renders.
    pub fn dispatch(&mut self, tr: Transaction) {
        if self.destroyed {
            tracing::warn!("transaction dispatched to a destroyed view");
            return;
        }
        self.state = self.state.apply(tr);
        self.render();
    }

    /// Replaces the state wholesale.
    pub fn update_state(&mut self, state: EditorState) {
        if self.destroyed {
            return;
        }
        self.state = state;
        self.render();
    }

    pub fn set_props(&mut self, props: DirectEditorProps) {
        if self.destroyed {
            return;
        }
        self.props = props;
        self.render();
    }

    /// False once the view is destroyed.
    pub fn editable(&self) -> bool {
        !self.destroyed && self.props.editable
    }

    pub fn focus(&mut self) {
        if !self.destroyed {
            self.focused = true;
        }
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    /// Runs `command` against the current state, dispatching whatever it
    /// produces. Returns whether the command applied.
    pub fn run(&mut self, command: &Command) -> bool {
        let mut produced = Vec::new();
        let applied = command(&self.state, Some(&mut |tr| produced.push(tr)));
        for tr in produced {
            self.dispatch(tr);
        }
        applied
    }

    /// Offers typed text to plugins, then inserts it at the selection.
    pub fn handle_text_input(&mut self, text: &str) -> bool {
        if !self.editable() {
            return false;
        }

        let mut produced = Vec::new();
        let handled = self.state.plugins().iter().any(|plugin| {
            plugin
                .props()
                .handle_text_input
                .as_ref()
                .is_some_and(|handler| handler(&self.state, text, &mut |tr| produced.push(tr)))
        });
        if handled {
            for tr in produced {
                self.dispatch(tr);
            }
            return true;
        }

        let mut tr = self.state.tr();
        match tr.insert_text(text) {
            Ok(_) => {
                self.dispatch(tr);
                true
            }
            Err(err) => {
                tracing::debug!(%err, "text input not inserted");
                false
            }
        }
    }

    /// Offers a key chord (e.g. `Mod-b`) to plugin keymaps.
    pub fn handle_key(&mut self, chord: &str) -> bool {
        if !self.editable() {
            return false;
        }

        let mut produced = Vec::new();
        let handled = self.state.plugins().iter().any(|plugin| {
            plugin
                .props()
                .keymap
                .as_ref()
                .is_some_and(|keymap| keymap.handle(chord, &self.state, &mut |tr| produced.push(tr)))
        });
        for tr in produced {
            self.dispatch(tr);
        }
        handled
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// Clears the rendered content and stops accepting updates. Calling it
    /// again is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.clear_attributes();
        self.dom.remove_attribute("contenteditable");
        self.dom.set_inner_markup(String::new());
        self.focused = false;
        self.destroyed = true;
        tracing::debug!("view destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn render(&mut self) {
        match serialize_fragment(self.state.schema(), self.state.doc()) {
            Ok(markup) => self.dom.set_inner_markup(markup),
            Err(err) => tracing::error!(%err, "failed to render document"),
        }
        self.apply_attributes();
        self.dom
            .set_attribute("contenteditable", if self.props.editable { "true" } else { "false" });
        self.render_count += 1;
    }

    fn apply_attributes(&mut self) {
        self.clear_attributes();

        let mut attrs = self.props.attributes.clone();
        for plugin in self.state.plugins() {
            if let Some(f) = &plugin.props().attributes {
                attrs.extend(f(&self.state));
            }
        }

        for (name, value) in attrs {
            if name == "class" {
                for class in value.split_whitespace() {
                    if !self.dom.has_class(class) {
                        self.dom.add_class(class);
                        self.applied_classes.push(class.to_string());
                    }
                }
            } else {
                self.dom.set_attribute(&name, &value);
                self.applied_attrs.push(name);
            }
        }
    }

    fn clear_attributes(&mut self) {
        for name in self.applied_attrs.drain(..) {
            self.dom.remove_attribute(&name);
        }
        for class in self.applied_classes.drain(..) {
            self.dom.remove_class(&class);
        }
    }
}

impl std::fmt::Debug for EditorView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorView")
            .field("dom", &self.dom)
            .field("editable", &self.editable())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
