//! Input rules: regex patterns matched against the text before the cursor
//! (plus the text being typed) that rewrite the document when they match.

use std::fmt;
use std::rc::Rc;

use regex::Regex;

use crate::model::{Attrs, Node};
use crate::plugin::Plugin;
use crate::state::{EditorState, Selection, Transaction};

/// Characters of context the rules get to see.
const MAX_MATCH: usize = 500;

/// Capture groups of a match; index 0 is the whole match.
pub type Captures = Vec<Option<String>>;

/// Builds the transaction for a matched rule. `start..end` is the inline
/// range of the match that is already in the document.
pub type RuleHandler = Rc<dyn Fn(&EditorState, &Captures, usize, usize) -> Option<Transaction>>;

#[derive(Clone)]
pub struct InputRule {
    pattern: Regex,
    handler: RuleHandler,
}

impl InputRule {
    /// `pattern` should be anchored with `$` so that it only fires on text
    /// ending at the cursor.
    pub fn new(
        pattern: Regex,
        handler: impl Fn(&EditorState, &Captures, usize, usize) -> Option<Transaction> + 'static,
    ) -> Self {
        Self {
            pattern,
            handler: Rc::new(handler),
        }
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl fmt::Debug for InputRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputRule")
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Plugin that runs `rules` on typed text. The first matching rule that
/// produces a transaction wins.
pub fn input_rules(rules: Vec<InputRule>) -> Plugin {
    Plugin::new("inputRules").handle_text_input(move |state, text, dispatch| {
        let sel = state.selection();
        if !sel.is_empty() {
            return false;
        }
        let Some(block) = state.selected_block() else {
            return false;
        };
        let cursor = sel.head;
        let context_start = cursor.saturating_sub(MAX_MATCH);
        let before = format!("{}{}", block.text_between(context_start, cursor), text);

        for rule in &rules {
            let Some(caps) = rule.pattern.captures(&before) else {
                continue;
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let start = context_start + before[..whole.start()].chars().count();
            let captures: Captures = caps
                .iter()
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect();
            if let Some(tr) = (rule.handler)(state, &captures, start, cursor) {
                tracing::trace!(pattern = rule.pattern.as_str(), "input rule fired");
                dispatch(tr);
                return true;
            }
        }
        false
    })
}

/// Turns the textblock into `type_name` when the pattern is typed at its
/// start, dropping the matched text.
pub fn textblock_type_input_rule(
    pattern: Regex,
    type_name: &str,
    get_attrs: impl Fn(&Captures) -> Attrs + 'static,
) -> InputRule {
    let type_name = type_name.to_string();
    InputRule::new(pattern, move |state, captures, start, end| {
        let block = state.selection().block.clone();
        let mut tr = state.tr();
        tr.replace_inline(&block, start, end, Vec::new()).ok()?;
        tr.set_node_type(&block, &type_name, &get_attrs(captures)).ok()?;
        tr.set_selection(Selection::cursor(block, start));
        Some(tr)
    })
}

/// Wraps the textblock in `type_name` when the pattern is typed at its start.
pub fn wrapping_input_rule(pattern: Regex, type_name: &str) -> InputRule {
    let type_name = type_name.to_string();
    InputRule::new(pattern, move |state, _, start, end| {
        let schema = state.schema();
        let block_path = state.selection().block.clone();
        let mut tr = state.tr();
        tr.replace_inline(&block_path, start, end, Vec::new()).ok()?;
        let block = tr.doc().node_at(&block_path)?.clone();
        let wrapper = schema.node(&type_name, &Attrs::new(), vec![block]).ok()?;
        tr.replace_node(&block_path, wrapper).ok()?;
        let mut inner = block_path;
        inner.push(0);
        tr.set_selection(Selection::cursor(inner, start));
        Some(tr)
    })
}

/// Replaces a delimited run with its inner text carrying `mark_name`.
///
/// The last capture group is the inner text. With more than one group, the
/// first one is a leading context match (such as `(^|[^*])`) that stays
/// untouched.
pub fn mark_input_rule(pattern: Regex, mark_name: &str) -> InputRule {
    let mark_name = mark_name.to_string();
    InputRule::new(pattern, move |state, captures, start, end| {
        let inner = captures.last().cloned().flatten()?;
        if inner.is_empty() || captures.len() < 2 {
            return None;
        }
        let prefix = if captures.len() > 2 {
            captures[1].as_deref().map(|p| p.chars().count()).unwrap_or(0)
        } else {
            0
        };
        let start = start + prefix;
        let schema = state.schema();
        let mark = schema.mark_type(&mark_name).ok()?.create(&Attrs::new()).ok()?;
        let block_path = state.selection().block.clone();
        let block = state.selected_block()?;

        let base = block.marks_at(start);
        let marks = mark.add_to_set(&base, |name| schema.mark_rank(name));
        let mut tr = state.tr();
        tr.replace_inline(&block_path, start, end, vec![Node::text_node(inner.clone(), marks)])
            .ok()?;
        tr.set_selection(Selection::cursor(block_path, start + inner.chars().count()));
        tr.set_stored_marks(Some(mark.remove_from_set(&base)));
        Some(tr)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::test_schema;
    use crate::state::StateConfig;
    use crate::view::{DirectEditorProps, EditorView};
    use crate::dom::ElementRef;
    use serde_json::json;

    fn view(rules: Vec<InputRule>) -> EditorView {
        let state = EditorState::create(
            StateConfig::new(Rc::new(test_schema())).plugins(vec![input_rules(rules)]),
        )
        .unwrap();
        EditorView::new(ElementRef::new("div"), state, DirectEditorProps::default())
    }

    fn heading_rule() -> InputRule {
        textblock_type_input_rule(Regex::new(r"^(#{1,2})\s$").unwrap(), "heading", |caps| {
            let level = caps[1].as_deref().map(str::len).unwrap_or(1);
            let mut attrs = Attrs::new();
            attrs.insert("level".into(), json!(level));
            attrs
        })
    }

    #[test]
    fn test_textblock_rule_changes_type() {
        let mut view = view(vec![heading_rule()]);
        view.handle_text_input("#");
        view.handle_text_input("#");
        view.handle_text_input(" ");
        let block = view.state().doc().child(0).unwrap();
        assert_eq!(block.type_name(), "heading");
        assert_eq!(block.attr("level"), Some(&json!(2)));
        assert_eq!(block.child_count(), 0);
    }

    #[test]
    fn test_wrapping_rule() {
        let mut view = view(vec![wrapping_input_rule(Regex::new(r"^>\s$").unwrap(), "blockquote")]);
        view.handle_text_input(">");
        view.handle_text_input(" ");
        view.handle_text_input("q");
        let quote = view.state().doc().child(0).unwrap();
        assert_eq!(quote.type_name(), "blockquote");
        assert_eq!(quote.text_content(), "q");
    }

    #[test]
    fn test_mark_rule_and_stored_marks() {
        let bold = mark_input_rule(Regex::new(r"\*\*([^*]+)\*\*$").unwrap(), "bold");
        let mut view = view(vec![bold]);
        for ch in "a **b**".chars() {
            view.handle_text_input(&ch.to_string());
        }
        view.handle_text_input("c");
        let block = view.state().doc().child(0).unwrap();
        assert_eq!(block.text_content(), "a bc");
        assert_eq!(block.child(1).unwrap().marks()[0].type_name(), "bold");
        assert!(block.child(2).unwrap().marks().is_empty());
    }

    #[test]
    fn test_mark_rule_keeps_leading_context() {
        let italic = mark_input_rule(Regex::new(r"(^|[^*])\*([^*]+)\*$").unwrap(), "italic");
        let mut view = view(vec![italic]);
        for ch in "x *y*".chars() {
            view.handle_text_input(&ch.to_string());
        }
        let block = view.state().doc().child(0).unwrap();
        assert_eq!(block.text_content(), "x y");
        assert_eq!(block.child(1).unwrap().marks()[0].type_name(), "italic");
    }

    #[test]
    fn test_rule_that_does_not_match_falls_through() {
        let mut view = view(vec![heading_rule()]);
        view.handle_text_input("x");
        view.handle_text_input("#");
        view.handle_text_input(" ");
        assert_eq!(view.state().doc().child(0).unwrap().type_name(), "paragraph");
        assert_eq!(view.state().doc().text_content(), "x# ");
    }
}
