//! Extensions: units of behavior plugged into an editor.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use start_engine::{EditorState, ElementRef, Plugin};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Identifies an editor instance. Extensions hold this instead of a
/// reference to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorId(pub Uuid);

impl EditorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EditorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an extension can see during lifecycle callbacks.
pub struct ExtensionContext<'a> {
    pub editor: EditorId,
    pub state: &'a EditorState,
    pub container: &'a ElementRef,
}

/// A unit of behavior bound to one editor.
///
/// `plugins` may be called more than once (every reconfiguration rebuilds
/// the plugin list) and should return the same behaviors each time.
pub trait Extension {
    /// Unique id within an editor.
    fn id(&self) -> &str;

    /// Records the owning editor. Called once on registration.
    fn bind(&mut self, editor: EditorId);

    fn editor(&self) -> Option<EditorId>;

    fn plugins(&self) -> Vec<Plugin>;

    /// Called once after the editor is first mounted and rendered.
    fn mounted(&mut self, _cx: &ExtensionContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the editor is destroyed, before the view is released.
    fn destroy(&mut self, _cx: &ExtensionContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Typed extension options built from defaults plus caller overrides.
pub trait ExtensionOptions: Serialize + DeserializeOwned + Default {
    /// Shallow merge: top-level keys of `overrides` replace the defaults.
    fn merge(id: &str, overrides: Option<&Value>) -> CoreResult<Self> {
        let Some(overrides) = overrides else {
            return Ok(Self::default());
        };
        let invalid = |reason: String| CoreError::InvalidOptions {
            id: id.to_string(),
            reason,
        };
        let Value::Object(overrides) = overrides else {
            return Err(invalid(format!("expected a table, got {overrides}")));
        };
        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(defaults)) => defaults,
            Ok(_) => serde_json::Map::new(),
            Err(e) => return Err(invalid(e.to_string())),
        };
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(merged)).map_err(|e| invalid(e.to_string()))
    }
}

impl<T: Serialize + DeserializeOwned + Default> ExtensionOptions for T {}
