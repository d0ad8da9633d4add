use std::cell::{Cell, RefCell};
use std::rc::Rc;

use regex::Regex;
use serde_json::json;
use start_core::{
    CoreError, Editor, EditorEvent, EditorId, EditorOptions, EventBus, Extension, ExtensionContext,
};
use start_engine::input_rules::{InputRule, input_rules};
use start_engine::{ElementRef, HostDocument, Plugin, Selection};

#[derive(Default)]
struct Calls {
    mounted: usize,
    destroyed: usize,
}

/// Test extension recording its lifecycle calls.
struct Recorder {
    id: String,
    editor: Option<EditorId>,
    calls: Rc<RefCell<Calls>>,
    plugins: fn() -> Vec<Plugin>,
    fail_mount: bool,
}

impl Recorder {
    fn new(id: &str, calls: &Rc<RefCell<Calls>>) -> Self {
        Self {
            id: id.to_string(),
            editor: None,
            calls: Rc::clone(calls),
            plugins: Vec::new,
            fail_mount: false,
        }
    }
}

impl Extension for Recorder {
    fn id(&self) -> &str {
        &self.id
    }

    fn bind(&mut self, editor: EditorId) {
        self.editor = Some(editor);
    }

    fn editor(&self) -> Option<EditorId> {
        self.editor
    }

    fn plugins(&self) -> Vec<Plugin> {
        (self.plugins)()
    }

    fn mounted(&mut self, cx: &ExtensionContext<'_>) -> anyhow::Result<()> {
        assert_eq!(Some(cx.editor), self.editor);
        if self.fail_mount {
            anyhow::bail!("refusing to mount");
        }
        self.calls.borrow_mut().mounted += 1;
        Ok(())
    }

    fn destroy(&mut self, _cx: &ExtensionContext<'_>) -> anyhow::Result<()> {
        self.calls.borrow_mut().destroyed += 1;
        Ok(())
    }
}

/// Counts canvas renders and records what `mounted` observed.
struct RenderWatch {
    editor: Option<EditorId>,
    renders: Rc<Cell<usize>>,
    seen: Rc<RefCell<Option<(bool, usize)>>>,
}

impl Extension for RenderWatch {
    fn id(&self) -> &str {
        "render-watch"
    }

    fn bind(&mut self, editor: EditorId) {
        self.editor = Some(editor);
    }

    fn editor(&self) -> Option<EditorId> {
        self.editor
    }

    fn plugins(&self) -> Vec<Plugin> {
        let renders = Rc::clone(&self.renders);
        vec![Plugin::new("render-watch").attributes(move |_| {
            renders.set(renders.get() + 1);
            Vec::new()
        })]
    }

    fn mounted(&mut self, cx: &ExtensionContext<'_>) -> anyhow::Result<()> {
        *self.seen.borrow_mut() = Some((cx.container.parent().is_some(), self.renders.get()));
        Ok(())
    }
}

/// `(c)` becomes `©`.
fn copyright_rule() -> Vec<Plugin> {
    let rule = InputRule::new(Regex::new(r"\(c\)$").unwrap(), |state, _, start, end| {
        let block = state.selection().block.clone();
        let mut tr = state.tr();
        tr.replace_inline(&block, start, end, vec![state.schema().text("©", Vec::new())])
            .ok()?;
        tr.set_selection(Selection::cursor(block, start + 1));
        Some(tr)
    });
    vec![input_rules(vec![rule])]
}

fn type_text(editor: &mut Editor, text: &str) {
    for ch in text.chars() {
        editor.view_mut().handle_text_input(&ch.to_string());
    }
}

fn plugin_keys(editor: &Editor) -> Vec<String> {
    editor
        .state()
        .plugins()
        .iter()
        .map(|p| p.key().to_string())
        .collect()
}

#[test]
fn test_non_editable_commands_leave_doc_unchanged() {
    let mut editor = Editor::new(EditorOptions::new("<p>hello</p>")).unwrap();
    editor.set_editable(false).unwrap();
    let before = editor.export_json().unwrap();

    let commands: Vec<(String, String)> = editor
        .commands()
        .content_types()
        .flat_map(|ty| {
            editor
                .commands()
                .commands(ty)
                .into_iter()
                .flat_map(|cmds| cmds.keys())
                .map(move |name| (ty.to_string(), name.to_string()))
        })
        .collect();
    assert!(commands.len() >= 10);

    for (ty, name) in &commands {
        let args = [json!(2), json!("https://example.com")];
        let args: &[_] = if name == "setLink" || ty == "link" { &args[1..] } else { &args[..1] };
        assert_eq!(editor.exec(ty, name, args).ok(), Some(false), "{ty}.{name}");
        assert_eq!(editor.export_json().unwrap(), before, "{ty}.{name}");
    }
}

#[test]
fn test_editable_command_applies_one_transition() {
    let mut editor = Editor::new(EditorOptions::new("<p>hello</p>")).unwrap();
    let renders = editor.view().render_count();
    assert!(editor.exec("heading", "toggleHeading", &[json!(1)]).unwrap());
    assert_eq!(editor.view().render_count(), renders + 1);
    assert_eq!(editor.export_markup().unwrap(), "<h1>hello</h1>");

    assert!(editor.exec("heading", "toggleHeading", &[json!(1)]).unwrap());
    assert_eq!(editor.export_markup().unwrap(), "<p>hello</p>");
}

#[test]
fn test_builtin_override_keeps_seed_position() {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let stock = Editor::new(EditorOptions::new("")).unwrap();
    let stock_keys = plugin_keys(&stock);
    let position = stock_keys.iter().position(|k| k == "shortcuts").unwrap();

    let mut custom = Recorder::new("shortcuts", &calls);
    custom.plugins = || vec![Plugin::new("custom-shortcuts")];
    let editor = Editor::new(EditorOptions::new("").with_extension(custom)).unwrap();
    let keys = plugin_keys(&editor);

    assert_eq!(keys.len(), stock_keys.len());
    assert_eq!(keys[position], "custom-shortcuts");
    assert!(!keys.iter().any(|k| k == "shortcuts"));
    assert!(!editor.extensions().is_builtin("shortcuts"));
    assert_eq!(editor.extensions().ids().collect::<Vec<_>>(), ["placeholder", "shortcuts"]);
}

#[test]
fn test_duplicate_custom_ids_are_rejected() {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let result = Editor::new(
        EditorOptions::new("")
            .with_extension(Recorder::new("analytics", &calls))
            .with_extension(Recorder::new("analytics", &calls)),
    );
    assert!(matches!(result, Err(CoreError::DuplicateExtensionId(ref id)) if id == "analytics"));

    let mut editor = Editor::new(EditorOptions::new("").with_extension(Recorder::new("analytics", &calls))).unwrap();
    let err = editor
        .add_extensions(vec![Box::new(Recorder::new("analytics", &calls))])
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateExtensionId(_)));
    assert_eq!(editor.extensions().len(), 3);
}

#[test]
fn test_set_content_then_export_roundtrips() {
    let mut editor = Editor::new(EditorOptions::new("")).unwrap();
    editor.set_content("<p>hello</p>").unwrap();
    assert_eq!(editor.export_markup().unwrap(), "<p>hello</p>");

    let markup = "<h2>Title</h2><blockquote><p>a <strong>b</strong> <a href=\"https://x.y\">c</a></p></blockquote>";
    editor.set_content(markup).unwrap();
    assert_eq!(editor.export_markup().unwrap(), markup);

    let tree = editor.export_json().unwrap();
    editor.set_content(tree.clone()).unwrap();
    assert_eq!(editor.export_json().unwrap(), tree);
}

#[test]
fn test_set_content_rejects_malformed_tree() {
    let mut editor = Editor::new(EditorOptions::new("<p>keep</p>")).unwrap();
    let err = editor
        .set_content(json!({ "type": "doc", "content": [{ "type": "widget" }] }))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidContent(_)));

    let err = editor
        .set_content(json!({ "type": "doc", "content": [{ "type": "heading", "attrs": { "level": "big" } }] }))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidContent(_)));
    assert_eq!(editor.export_markup().unwrap(), "<p>keep</p>");
}

#[test]
fn test_add_extensions_keeps_doc_and_history() {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut editor = Editor::new(EditorOptions::new("<p></p>")).unwrap();
    type_text(&mut editor, "ab");
    let doc_before = editor.export_json().unwrap();
    let undo_before = editor.state().history().map(|h| h.undo_depth());
    assert!(undo_before.is_some_and(|d| d > 0));

    let mut ext = Recorder::new("copyright", &calls);
    ext.plugins = copyright_rule;
    let ids = editor.add_extensions(vec![Box::new(ext)]).unwrap();
    assert_eq!(ids, ["copyright"]);
    assert_eq!(editor.export_json().unwrap(), doc_before);
    assert_eq!(editor.state().history().map(|h| h.undo_depth()), undo_before);

    type_text(&mut editor, " (c)");
    assert_eq!(editor.state().doc().text_content(), "ab ©");
}

#[test]
fn test_mount_missing_target_then_remount() {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let host = HostDocument::new();
    let mut editor = Editor::new(EditorOptions {
        host: Some(host.clone()),
        ..EditorOptions::new("<p>x</p>").with_extension(Recorder::new("rec", &calls))
    })
    .unwrap();

    let err = editor.mount("#missing").unwrap_err();
    assert!(matches!(err, CoreError::MountTargetNotFound(ref s) if s == "#missing"));
    assert!(!editor.is_mounted());
    assert_eq!(calls.borrow().mounted, 0);
    assert!(!host.is_connected(editor.container()));

    let target = host.create_element("section");
    target.set_attribute("id", "missing");
    host.body().append_child(&target);
    editor.mount("#missing").unwrap();
    assert!(host.is_connected(editor.surface()));
    assert_eq!(editor.view().state().doc().text_content(), "x");

    let other = ElementRef::new("div");
    editor.mount(&other).unwrap();
    assert!(editor.container().parent().is_some_and(|p| p.ptr_eq(&other)));
    assert!(target.children().is_empty());
    assert_eq!(calls.borrow().mounted, 1);
}

#[test]
fn test_mounted_runs_after_attach_and_render() {
    let renders = Rc::new(Cell::new(0));
    let seen = Rc::new(RefCell::new(None));
    let watch = RenderWatch {
        editor: None,
        renders: Rc::clone(&renders),
        seen: Rc::clone(&seen),
    };
    let mut editor = Editor::new(EditorOptions::new("<p>x</p>").with_extension(watch)).unwrap();
    let before = renders.get();
    let view_renders = editor.view().render_count();
    assert!(seen.borrow().is_none());

    editor.mount(ElementRef::new("div")).unwrap();

    let (attached, renders_at_mount) = (*seen.borrow()).expect("mounted was called");
    assert!(attached);
    assert!(renders_at_mount > before);
    assert_eq!(editor.view().render_count(), view_renders + 1);
}

#[test]
fn test_failing_mounted_propagates() {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut failing = Recorder::new("failing", &calls);
    failing.fail_mount = true;
    let mut editor = Editor::new(
        EditorOptions::new("<p>x</p>")
            .with_extension(failing)
            .with_extension(Recorder::new("later", &calls)),
    )
    .unwrap();

    let err = editor.mount(ElementRef::new("div")).unwrap_err();
    assert!(matches!(err, CoreError::Extension { ref id, .. } if id == "failing"));
    assert_eq!(calls.borrow().mounted, 0);
}

#[test]
fn test_destroy_twice_is_safe() {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut editor = Editor::new(EditorOptions::new("<p>x</p>").with_extension(Recorder::new("rec", &calls))).unwrap();
    let mut events = editor.subscribe();
    editor.mount(ElementRef::new("div")).unwrap();

    editor.destroy().unwrap();
    editor.destroy().unwrap();

    assert_eq!(calls.borrow().destroyed, 1);
    assert!(editor.is_destroyed());
    assert!(editor.view().is_destroyed());
    assert_eq!(editor.surface().inner_markup(), "");
    assert!(!editor.view_mut().handle_text_input("y"));
    assert!(matches!(editor.add_extensions(Vec::new()), Err(CoreError::Destroyed)));

    assert_eq!(events.try_recv().ok(), Some(EditorEvent::Mounted(editor.id())));
    assert_eq!(events.try_recv().ok(), Some(EditorEvent::Destroyed(editor.id())));
    assert!(events.try_recv().is_err());
}

#[test]
fn test_shared_bus_keeps_editors_apart() {
    let bus = EventBus::new();
    let shared = |markup: &str| EditorOptions {
        events: Some(bus.clone()),
        ..EditorOptions::new(markup)
    };
    let mut first = Editor::new(shared("<p>a</p>")).unwrap();
    let mut second = Editor::new(shared("<p>b</p>")).unwrap();
    let mut all = bus.subscribe();
    let mut first_events = first.events();

    second.mount(ElementRef::new("div")).unwrap();
    first.set_content("<p>c</p>").unwrap();
    first.destroy().unwrap();
    second.destroy().unwrap();

    assert_eq!(
        first_events.drain(),
        [EditorEvent::ContentReplaced(first.id()), EditorEvent::Destroyed(first.id())]
    );
    let mut seen = Vec::new();
    while let Ok(event) = all.try_recv() {
        seen.push(event.editor());
    }
    assert_eq!(seen, [second.id(), first.id(), first.id(), second.id()]);
}
