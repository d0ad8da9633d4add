//! Per-editor extension registry.
//!
//! Seeded with the built-in extensions. A caller extension whose id matches
//! a built-in replaces it in place; any other id collision is an error.

use std::collections::HashSet;
use std::fmt;

use start_engine::{OrderedMap, Plugin};

use crate::extension::{EditorId, Extension, ExtensionContext};
use crate::{CoreError, CoreResult};

struct Entry {
    extension: Box<dyn Extension>,
    builtin: bool,
}

/// A `destroy` callback that failed during teardown.
#[derive(Debug)]
pub struct ExtensionFailure {
    pub id: String,
    pub error: anyhow::Error,
}

impl fmt::Display for ExtensionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.id, self.error)
    }
}

#[derive(Default)]
pub struct ExtensionRegistry {
    entries: OrderedMap<Entry>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `seeds` as built-ins, bound to `editor`.
    pub fn seeded(seeds: Vec<Box<dyn Extension>>, editor: EditorId) -> Self {
        let mut entries = OrderedMap::new();
        for mut extension in seeds {
            extension.bind(editor);
            let id = extension.id().to_string();
            entries.insert(id, Entry { extension, builtin: true });
        }
        Self { entries }
    }

    /// Registers caller extensions in order.
    ///
    /// The whole batch is checked before anything is inserted, so a failing
    /// call leaves the registry untouched. Returns the registered ids.
    pub fn register(
        &mut self,
        extensions: Vec<Box<dyn Extension>>,
        editor: EditorId,
    ) -> CoreResult<Vec<String>> {
        let mut seen = HashSet::new();
        for ext in &extensions {
            let id = ext.id();
            if !seen.insert(id) {
                return Err(CoreError::DuplicateExtensionId(id.to_string()));
            }
            if let Some(existing) = self.entries.get(id) {
                if !existing.builtin {
                    return Err(CoreError::DuplicateExtensionId(id.to_string()));
                }
            }
        }

        let mut ids = Vec::with_capacity(extensions.len());
        for mut extension in extensions {
            extension.bind(editor);
            let id = extension.id().to_string();
            let replaced = self.entries.insert(
                id.clone(),
                Entry {
                    extension,
                    builtin: false,
                },
            );
            if replaced.is_some() {
                tracing::debug!(id = %id, "built-in extension overridden");
            } else {
                tracing::debug!(id = %id, "extension registered");
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Plugins of every extension, in registry order.
    pub fn plugins(&self) -> Vec<Plugin> {
        self.entries
            .values()
            .flat_map(|entry| entry.extension.plugins())
            .collect()
    }

    /// Calls `mounted` on every extension. Stops at the first failure.
    pub fn notify_mounted(&mut self, cx: &ExtensionContext<'_>) -> CoreResult<()> {
        for entry in self.entries.values_mut() {
            let id = entry.extension.id().to_string();
            entry
                .extension
                .mounted(cx)
                .map_err(|source| CoreError::Extension { id, source })?;
        }
        Ok(())
    }

    /// Calls `destroy` on every extension, even after a failure.
    pub fn teardown(&mut self, cx: &ExtensionContext<'_>) -> CoreResult<()> {
        let mut failures = Vec::new();
        for entry in self.entries.values_mut() {
            if let Err(error) = entry.extension.destroy(cx) {
                let id = entry.extension.id().to_string();
                tracing::warn!(id = %id, "extension failed to tear down: {:#}", error);
                failures.push(ExtensionFailure { id, error });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Teardown(failures))
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys()
    }

    pub fn get(&self, id: &str) -> Option<&dyn Extension> {
        self.entries.get(id).map(|entry| entry.extension.as_ref())
    }

    /// True if `id` still holds the built-in seed.
    pub fn is_builtin(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|entry| entry.builtin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use start_engine::{EditorState, ElementRef, StateConfig};

    use crate::content_type::ContentTypes;
    use crate::schema::assemble_schema;

    struct Probe {
        id: String,
        tag: &'static str,
        editor: Option<EditorId>,
        fail_destroy: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    fn probe(id: &str, tag: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn Extension> {
        Box::new(Probe {
            id: id.to_string(),
            tag,
            editor: None,
            fail_destroy: false,
            log: Rc::clone(log),
        })
    }

    impl Extension for Probe {
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
            vec![Plugin::new(self.tag)]
        }

        fn destroy(&mut self, _cx: &ExtensionContext<'_>) -> anyhow::Result<()> {
            self.log.borrow_mut().push(self.id.clone());
            if self.fail_destroy {
                anyhow::bail!("cannot release {}", self.id);
            }
            Ok(())
        }
    }

    fn keys(registry: &ExtensionRegistry) -> Vec<String> {
        registry.plugins().iter().map(|p| p.key().to_string()).collect()
    }

    #[test]
    fn test_builtin_override_keeps_position() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let editor = EditorId::new();
        let mut registry = ExtensionRegistry::seeded(
            vec![probe("a", "a0", &log), probe("b", "b0", &log)],
            editor,
        );
        registry.register(vec![probe("a", "a1", &log)], editor).unwrap();
        assert_eq!(keys(&registry), ["a1", "b0"]);
        assert!(!registry.is_builtin("a"));
        assert!(registry.is_builtin("b"));
        assert_eq!(registry.get("a").and_then(|e| e.editor()), Some(editor));
    }

    #[test]
    fn test_duplicate_custom_id_is_rejected_atomically() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let editor = EditorId::new();
        let mut registry = ExtensionRegistry::new();
        registry.register(vec![probe("x", "x", &log)], editor).unwrap();

        let err = registry
            .register(vec![probe("y", "y", &log), probe("x", "x2", &log)], editor)
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateExtensionId(ref id) if id == "x"));
        assert_eq!(registry.ids().collect::<Vec<_>>(), ["x"]);

        let err = registry
            .register(vec![probe("z", "z", &log), probe("z", "z", &log)], editor)
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateExtensionId(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_teardown_continues_after_failure() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let editor = EditorId::new();
        let failing = Box::new(Probe {
            id: "bad".into(),
            tag: "bad",
            editor: None,
            fail_destroy: true,
            log: Rc::clone(&log),
        });
        let mut registry = ExtensionRegistry::seeded(vec![failing, probe("good", "good", &log)], editor);

        let schema = Rc::new(assemble_schema(&ContentTypes::builtin(), &Default::default()).unwrap());
        let state = EditorState::create(StateConfig::new(schema)).unwrap();
        let container = ElementRef::new("div");
        let cx = ExtensionContext {
            editor,
            state: &state,
            container: &container,
        };

        match registry.teardown(&cx) {
            Err(CoreError::Teardown(failures)) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].id, "bad");
            }
            other => panic!("unexpected teardown result: {other:?}"),
        }
        assert_eq!(*log.borrow(), ["bad", "good"]);
    }
}
