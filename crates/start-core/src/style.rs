//! Style objects and their inline `style` string form.
//!
//! A style object maps camelCase property names (`fontFamily`) to values, the
//! way node attributes store them. The string form uses CSS property names
//! (`font-family: ...`).

use std::collections::BTreeMap;

/// Per-type style object, e.g. `{ "color": "red", "fontSize": "14px" }`.
pub type StyleObject = BTreeMap<String, String>;

/// Font stack applied to the editing canvas.
pub const DEFAULT_FONT_FAMILY: &str = "-apple-system, BlinkMacSystemFont, \"Segoe UI\", Helvetica, \"Apple Color Emoji\", Arial, sans-serif, \"Segoe UI Emoji\", \"Segoe UI Symbol\"";

/// Text color of the editing canvas.
pub const DEFAULT_COLOR: &str = "rgb(55, 53, 47)";

/// Renders a style object as an inline style string.
pub fn obj_to_style_string(style: &StyleObject) -> String {
    style
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}: {}", to_kebab(key), value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parses an inline style string on top of `defaults`.
pub fn style_string_to_obj(css: &str, defaults: &StyleObject) -> StyleObject {
    let mut style = defaults.clone();
    for decl in css.split(';') {
        let Some((key, value)) = decl.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        style.insert(to_camel(key), value.to_string());
    }
    style
}

/// Class of the editing canvas.
pub const CANVAS_CLASS: &str = "start-editor-canvas";

/// Attributes of the editing canvas: its class and the base text style.
pub fn canvas_attributes() -> Vec<(String, String)> {
    let mut style = StyleObject::new();
    style.insert("color".into(), DEFAULT_COLOR.into());
    style.insert("fontFamily".into(), DEFAULT_FONT_FAMILY.into());
    vec![
        ("class".to_string(), CANVAS_CLASS.to_string()),
        ("style".to_string(), obj_to_style_string(&style)),
    ]
}

/// Converts a JSON attribute value into a style object. Non-object values
/// and non-string entries are ignored.
pub fn style_from_value(value: Option<&serde_json::Value>) -> StyleObject {
    value
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

pub fn style_to_value(style: &StyleObject) -> serde_json::Value {
    serde_json::Value::Object(
        style
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
}

fn to_kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.to_ascii_lowercase().chars() {
        if ch == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
