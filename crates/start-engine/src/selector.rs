//! Minimal CSS selector matching shared by parse rules and the host DOM.
//!
//! Supported: `tag`, `#id`, `.class`, `[attr]`, compounds of those
//! (`span.start-editor-span`, `a[href]`) and comma-separated lists.

/// Anything a selector can be matched against.
pub(crate) trait Selectable {
    fn tag_name(&self) -> String;
    fn attribute_value(&self, name: &str) -> Option<String>;

    fn has_class(&self, class: &str) -> bool {
        self.attribute_value("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<String>,
}

impl Compound {
    fn parse(src: &str) -> Option<Self> {
        let src = src.trim();
        if src.is_empty() {
            return None;
        }

        let mut compound = Compound::default();
        let mut current = String::new();
        let mut kind = 't';

        let flush = |kind: char, current: &mut String, compound: &mut Compound| {
            if current.is_empty() {
                return;
            }
            let value = std::mem::take(current);
            match kind {
                't' => compound.tag = Some(value.to_ascii_lowercase()),
                '#' => compound.id = Some(value),
                '.' => compound.classes.push(value),
                '[' => compound.attrs.push(value.trim_end_matches(']').to_string()),
                _ => {}
            }
        };

        for c in src.chars() {
            match c {
                '#' | '.' | '[' => {
                    flush(kind, &mut current, &mut compound);
                    kind = c;
                }
                ']' => {
                    flush(kind, &mut current, &mut compound);
                    kind = 't';
                }
                c if c.is_whitespace() => return None,
                c => current.push(c),
            }
        }
        flush(kind, &mut current, &mut compound);
        Some(compound)
    }

    fn matches(&self, el: &impl Selectable) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && *tag != el.tag_name() {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attribute_value("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| el.has_class(c))
            && self.attrs.iter().all(|a| el.attribute_value(a).is_some())
    }
}

/// Returns true if `el` matches any selector in the comma-separated list.
pub(crate) fn matches(selector: &str, el: &impl Selectable) -> bool {
    selector
        .split(',')
        .filter_map(Compound::parse)
        .any(|compound| compound.matches(el))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct El(&'static str, Vec<(&'static str, &'static str)>);

    impl Selectable for El {
        fn tag_name(&self) -> String {
            self.0.to_string()
        }
        fn attribute_value(&self, name: &str) -> Option<String> {
            self.1
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_compound_selectors() {
        let span = El("span", vec![("class", "x start-editor-span")]);
        assert!(matches("span.start-editor-span", &span));
        assert!(matches(".start-editor-span", &span));
        assert!(!matches("span.other", &span));
        assert!(matches("b, span", &span));
    }

    #[test]
    fn test_id_and_attribute_selectors() {
        let link = El("a", vec![("href", "https://x"), ("id", "first")]);
        assert!(matches("a[href]", &link));
        assert!(matches("#first", &link));
        assert!(!matches("#missing", &link));
        assert!(!matches("a[title]", &link));
    }
}
