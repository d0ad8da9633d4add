//! The editor facade.
//!
//! An [`Editor`] owns everything one editing surface needs: the assembled
//! schema, the command table, the extension registry and the engine view.
//! Its host elements form this hierarchy:
//!
//! ```text
//! div.start-editor              (container, appended to the mount target)
//! └── div.start-editor-wrap
//!     └── div.start-editor-shell
//!         └── div.start-editor-canvas   (editing surface, owned by the view)
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Value, json};
use start_engine::{
    DirectEditorProps, EditorState, EditorView, ElementRef, HistoryOptions, HostDocument, Schema,
    serialize_fragment,
};

use crate::command::CommandTable;
use crate::config::Config;
use crate::content_type::ContentTypes;
use crate::event::{EditorEvent, EditorEvents, EventBus};
use crate::extension::{EditorId, Extension, ExtensionContext};
use crate::extensions;
use crate::registry::ExtensionRegistry;
use crate::schema::assemble_schema;
use crate::state::{Content, build_state, compose_plugins, reconfigure_plugins, replace_content};
use crate::style::{StyleObject, canvas_attributes};
use crate::{CoreError, CoreResult};

pub const CONTAINER_CLASS: &str = "start-editor";
pub const WRAP_CLASS: &str = "start-editor-wrap";
pub const SHELL_CLASS: &str = "start-editor-shell";

/// Everything needed to construct an [`Editor`].
#[derive(Default)]
pub struct EditorOptions {
    /// Initial document
    pub content: Content,
    /// Default style object per node type
    pub default_styles: BTreeMap<String, StyleObject>,
    /// Caller extensions, registered after the built-ins
    pub plugins: Vec<Box<dyn Extension>>,
    /// Props forwarded to the view. Attributes are added to the canvas ones.
    pub props: DirectEditorProps,
    /// Host document to create elements in and resolve selectors against.
    /// A fresh one is created when absent.
    pub host: Option<HostDocument>,
    /// Content types to assemble. The built-ins when absent.
    pub content_types: Option<ContentTypes>,
    pub history: HistoryOptions,
    /// Option overrides for built-in extensions, keyed by id
    pub extension_options: BTreeMap<String, Value>,
    /// Bus to report lifecycle events on. A private one when absent.
    pub events: Option<EventBus>,
}

impl EditorOptions {
    pub fn new(content: impl Into<Content>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Options taken from a loaded [`Config`].
    pub fn from_config(config: &Config, content: impl Into<Content>) -> Self {
        let mut extension_options = config.extensions.clone();
        if let Some(text) = &config.editor.placeholder {
            let entry = extension_options
                .entry("placeholder".to_string())
                .or_insert_with(|| json!({}));
            if let Some(obj) = entry.as_object_mut() {
                obj.entry("text").or_insert_with(|| json!(text));
            }
        }
        Self {
            content: content.into(),
            default_styles: config.styles.clone(),
            props: DirectEditorProps {
                editable: config.editor.editable,
                ..Default::default()
            },
            history: config.editor.history_options(),
            extension_options,
            ..Default::default()
        }
    }

    pub fn with_extension(mut self, extension: impl Extension + 'static) -> Self {
        self.plugins.push(Box::new(extension));
        self
    }
}

/// Where to attach the editor.
#[derive(Debug, Clone)]
pub enum MountTarget {
    Element(ElementRef),
    /// Resolved with `query_selector` in the editor's host document
    Selector(String),
}

impl From<ElementRef> for MountTarget {
    fn from(el: ElementRef) -> Self {
        MountTarget::Element(el)
    }
}

impl From<&ElementRef> for MountTarget {
    fn from(el: &ElementRef) -> Self {
        MountTarget::Element(el.clone())
    }
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        MountTarget::Selector(selector.to_string())
    }
}

impl From<String> for MountTarget {
    fn from(selector: String) -> Self {
        MountTarget::Selector(selector)
    }
}

pub struct Editor {
    id: EditorId,
    host: HostDocument,
    container: ElementRef,
    surface: ElementRef,
    schema: Rc<Schema>,
    content_types: ContentTypes,
    commands: CommandTable,
    registry: ExtensionRegistry,
    view: EditorView,
    history: HistoryOptions,
    events: EventBus,
    mounted: bool,
    destroyed: bool,
}

impl Editor {
    /// Assembles the schema, commands and extensions and renders the
    /// initial content into a detached container.
    pub fn new(options: EditorOptions) -> CoreResult<Self> {
        let id = EditorId::new();
        let host = options.host.unwrap_or_default();
        let content_types = options.content_types.unwrap_or_else(ContentTypes::builtin);

        let schema = Rc::new(assemble_schema(&content_types, &options.default_styles)?);
        let commands = CommandTable::build(&content_types);

        let seeds = extensions::builtin(&options.extension_options)?;
        let mut registry = ExtensionRegistry::seeded(seeds, id);
        registry.register(options.plugins, id)?;

        let plugins = compose_plugins(&content_types, &registry, options.history);
        let state = build_state(&options.content, &schema, plugins)?;

        let container = host.create_element("div");
        container.add_class(CONTAINER_CLASS);
        let wrap = host.create_element("div");
        wrap.add_class(WRAP_CLASS);
        let shell = host.create_element("div");
        shell.add_class(SHELL_CLASS);
        let surface = host.create_element("div");
        container.append_child(&wrap);
        wrap.append_child(&shell);
        shell.append_child(&surface);

        let mut props = options.props;
        let mut attributes = canvas_attributes();
        attributes.append(&mut props.attributes);
        props.attributes = attributes;
        let view = EditorView::new(surface.clone(), state, props);

        tracing::info!(
            id = %id,
            nodes = schema.node_names().len(),
            marks = schema.mark_names().len(),
            extensions = registry.len(),
            "editor created"
        );

        Ok(Self {
            id,
            host,
            container,
            surface,
            schema,
            content_types,
            commands,
            registry,
            view,
            history: options.history,
            events: options.events.unwrap_or_default(),
            mounted: false,
            destroyed: false,
        })
    }

    fn ensure_alive(&self) -> CoreResult<()> {
        if self.destroyed {
            Err(CoreError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Appends the container to `target` and renders.
    ///
    /// Extensions are notified on the first successful mount only. An
    /// unresolvable target leaves the editor untouched.
    pub fn mount(&mut self, target: impl Into<MountTarget>) -> CoreResult<()> {
        self.ensure_alive()?;
        let parent = match target.into() {
            MountTarget::Element(el) => el,
            MountTarget::Selector(selector) => self
                .host
                .query_selector(&selector)
                .ok_or(CoreError::MountTargetNotFound(selector))?,
        };
        parent.append_child(&self.container);
        let tr = self.view.state().tr();
        self.view.dispatch(tr);

        if !self.mounted {
            self.mounted = true;
            let cx = ExtensionContext {
                editor: self.id,
                state: self.view.state(),
                container: &self.container,
            };
            self.registry.notify_mounted(&cx)?;
        }

        tracing::info!(id = %self.id, "editor mounted");
        self.events.emit(EditorEvent::Mounted(self.id));
        Ok(())
    }

    /// Tears down every extension, then releases the view.
    ///
    /// Extension failures do not stop the teardown; they are returned
    /// together once the view is released. Calling this again is a no-op.
    pub fn destroy(&mut self) -> CoreResult<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        let cx = ExtensionContext {
            editor: self.id,
            state: self.view.state(),
            container: &self.container,
        };
        let result = self.registry.teardown(&cx);
        self.view.destroy();

        tracing::info!(id = %self.id, "editor destroyed");
        self.events.emit(EditorEvent::Destroyed(self.id));
        result
    }

    /// The document content as markup.
    pub fn export_markup(&self) -> CoreResult<String> {
        Ok(serialize_fragment(&self.schema, self.view.state().doc())?)
    }

    /// The document as a serialized tree.
    pub fn export_json(&self) -> CoreResult<Value> {
        serde_json::to_value(self.view.state().doc())
            .map_err(|e| CoreError::Engine(start_engine::EngineError::from(e)))
    }

    /// Replaces the document. Undo history starts over.
    pub fn set_content(&mut self, content: impl Into<Content>) -> CoreResult<()> {
        self.ensure_alive()?;
        let plugins = self.view.state().plugins().to_vec();
        replace_content(&mut self.view, &content.into(), &self.schema, plugins)?;
        tracing::info!(id = %self.id, "content replaced");
        self.events.emit(EditorEvent::ContentReplaced(self.id));
        Ok(())
    }

    /// Registers more extensions and installs their plugins, keeping the
    /// document, selection and undo history. Returns the registered ids.
    ///
    /// Extensions added this way are not sent `mounted`.
    pub fn add_extensions(&mut self, extensions: Vec<Box<dyn Extension>>) -> CoreResult<Vec<String>> {
        self.ensure_alive()?;
        let ids = self.registry.register(extensions, self.id)?;
        let plugins = compose_plugins(&self.content_types, &self.registry, self.history);
        reconfigure_plugins(&mut self.view, plugins);
        tracing::debug!(id = %self.id, added = ?ids, "extensions added");
        self.events.emit(EditorEvent::ExtensionsAdded(self.id, ids.clone()));
        Ok(ids)
    }

    /// Runs `content_type.command` with `args`.
    ///
    /// `Ok(false)` when the surface is not editable (including after
    /// [`destroy`](Self::destroy)) or the command does not apply.
    pub fn exec(&mut self, content_type: &str, command: &str, args: &[Value]) -> CoreResult<bool> {
        let guarded = self
            .commands
            .get(content_type, command)
            .ok_or_else(|| CoreError::CommandNotFound {
                content_type: content_type.to_string(),
                command: command.to_string(),
            })?;
        Ok(guarded.invoke(&mut self.view, args)?)
    }

    pub fn set_editable(&mut self, editable: bool) -> CoreResult<()> {
        self.ensure_alive()?;
        let props = DirectEditorProps {
            editable,
            ..self.view.props().clone()
        };
        self.view.set_props(props);
        Ok(())
    }

    pub fn state(&self) -> &EditorState {
        self.view.state()
    }

    pub fn view(&self) -> &EditorView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut EditorView {
        &mut self.view
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// The outermost element, the one appended to the mount target.
    pub fn container(&self) -> &ElementRef {
        &self.container
    }

    /// The editing surface the view renders into.
    pub fn surface(&self) -> &ElementRef {
        &self.surface
    }

    pub fn host(&self) -> &HostDocument {
        &self.host
    }

    pub fn id(&self) -> EditorId {
        self.id
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// This editor's events, even when the bus is shared.
    pub fn events(&self) -> EditorEvents {
        self.events.subscribe_to(self.id)
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("id", &self.id)
            .field("extensions", &self.registry)
            .field("mounted", &self.mounted)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn editor(content: &str) -> Editor {
        Editor::new(EditorOptions::new(content)).unwrap()
    }

    #[test]
    fn test_container_hierarchy() {
        let editor = editor("<p>x</p>");
        let container = editor.container();
        assert!(container.has_class(CONTAINER_CLASS));
        let wrap = &container.children()[0];
        let shell = &wrap.children()[0];
        assert!(wrap.has_class(WRAP_CLASS));
        assert!(shell.has_class(SHELL_CLASS));
        assert!(shell.children()[0].ptr_eq(editor.surface()));
        assert!(editor.surface().has_class("start-editor-canvas"));
        assert!(editor.surface().attribute("style").is_some_and(|s| s.contains("font-family")));
        assert_eq!(editor.surface().inner_markup(), "<p>x</p>");
    }

    #[test]
    fn test_mount_into_host() {
        let host = HostDocument::new();
        let target = host.create_element("div");
        target.set_attribute("id", "app");
        host.body().append_child(&target);

        let mut editor = Editor::new(EditorOptions {
            host: Some(host.clone()),
            ..EditorOptions::new("<p>x</p>")
        })
        .unwrap();
        let renders = editor.view().render_count();
        editor.mount("#app").unwrap();
        assert!(editor.is_mounted());
        assert!(host.is_connected(editor.surface()));
        assert_eq!(editor.view().render_count(), renders + 1);
    }

    #[test]
    fn test_exec_unknown_command() {
        let mut editor = editor("<p>x</p>");
        assert!(matches!(
            editor.exec("paragraph", "explode", &[]),
            Err(CoreError::CommandNotFound { .. })
        ));
        assert!(editor.exec("heading", "setHeading", &[json!(2)]).unwrap());
        assert_eq!(editor.export_markup().unwrap(), "<h2>x</h2>");
    }

    #[test]
    fn test_set_editable_guards_commands() {
        let mut editor = editor("<p>x</p>");
        editor.set_editable(false).unwrap();
        assert_eq!(editor.surface().attribute("contenteditable").as_deref(), Some("false"));
        assert!(!editor.exec("blockquote", "wrapInBlockquote", &[]).unwrap());
    }

    #[test]
    fn test_from_config_threads_placeholder() {
        let mut config = Config::default();
        config.editor.placeholder = Some("Start typing".into());
        config.editor.editable = false;
        let editor = Editor::new(EditorOptions::from_config(&config, "")).unwrap();
        assert_eq!(
            editor.surface().attribute("data-placeholder").as_deref(),
            Some("Start typing")
        );
        assert!(!editor.view().editable());
    }

    #[test]
    fn test_operations_after_destroy() {
        let mut editor = editor("<p>x</p>");
        editor.destroy().unwrap();
        assert!(matches!(editor.set_content("<p>y</p>"), Err(CoreError::Destroyed)));
        assert!(matches!(editor.mount(ElementRef::new("div")), Err(CoreError::Destroyed)));
        assert!(!editor.exec("heading", "setHeading", &[]).unwrap());
    }
}
