use serde::{Deserialize, Serialize};
use start_engine::Plugin;

use crate::extension::{EditorId, Extension};

pub(super) const ID: &str = "placeholder";

/// Class added to the canvas while the document is empty.
pub const EMPTY_CLASS: &str = "start-editor-empty";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderOptions {
    /// Shown while the document is empty. Nothing is shown when blank.
    pub text: String,
}

/// Marks the canvas with `data-placeholder` while the document is empty.
#[derive(Debug, Default)]
pub struct PlaceholderExtension {
    options: PlaceholderOptions,
    editor: Option<EditorId>,
}

impl PlaceholderExtension {
    pub fn new(options: PlaceholderOptions) -> Self {
        Self {
            options,
            editor: None,
        }
    }

    pub fn options(&self) -> &PlaceholderOptions {
        &self.options
    }
}

impl Extension for PlaceholderExtension {
    fn id(&self) -> &str {
        ID
    }

    fn bind(&mut self, editor: EditorId) {
        self.editor = Some(editor);
    }

    fn editor(&self) -> Option<EditorId> {
        self.editor
    }

    fn plugins(&self) -> Vec<Plugin> {
        let text = self.options.text.clone();
        if text.trim().is_empty() {
            return Vec::new();
        }
        vec![Plugin::new(ID).attributes(move |state| {
            if state.is_empty_doc() {
                vec![
                    ("data-placeholder".to_string(), text.clone()),
                    ("class".to_string(), EMPTY_CLASS.to_string()),
                ]
            } else {
                Vec::new()
            }
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    use start_engine::{DirectEditorProps, EditorState, EditorView, ElementRef, StateConfig};

    use crate::content_type::ContentTypes;
    use crate::schema::assemble_schema;

    #[test]
    fn test_attribute_follows_emptiness() {
        let ext = PlaceholderExtension::new(PlaceholderOptions { text: "Write...".into() });
        let schema = Rc::new(assemble_schema(&ContentTypes::builtin(), &BTreeMap::new()).unwrap());
        let state = EditorState::create(StateConfig::new(schema).plugins(ext.plugins())).unwrap();
        let surface = ElementRef::new("div");
        let mut view = EditorView::new(surface.clone(), state, DirectEditorProps::default());

        assert_eq!(surface.attribute("data-placeholder").as_deref(), Some("Write..."));
        assert!(surface.has_class(EMPTY_CLASS));

        view.handle_text_input("a");
        assert_eq!(surface.attribute("data-placeholder"), None);
        assert!(!surface.has_class(EMPTY_CLASS));
    }

    #[test]
    fn test_blank_text_adds_nothing() {
        assert!(PlaceholderExtension::default().plugins().is_empty());
    }
}
