//! Undo/redo history.
//!
//! Every document-changing transaction is recorded as a group of steps
//! together with the selection to restore. Transactions that arrive within
//! `new_group_delay` of the previous one join its group, so a burst of
//! typing undoes as one unit.
//!
//! History lives in the [`EditorState`]; the `history` plugin only switches it
//! on and carries its options.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::plugin::{Command, Dispatch, Plugin, PluginProps, command};
use crate::state::{ADD_TO_HISTORY, EditorState, Selection, Step, Transaction};

/// Meta key set on transactions produced by [`undo`] and [`redo`].
pub const HISTORY_META: &str = "history$";

/// Undo history options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryOptions {
    /// Maximum number of undo groups kept.
    pub depth: usize,
    /// Transactions closer together than this are grouped.
    #[serde(with = "millis")]
    pub new_group_delay: Duration,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            depth: 100,
            new_group_delay: Duration::from_millis(500),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Steps that are undone (or redone) together.
#[derive(Debug, Clone)]
struct Group {
    steps: Vec<Step>,
    /// Selection to restore once the group has been reverted.
    selection: Selection,
}

/// The undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    done: VecDeque<Group>,
    undone: Vec<Group>,
    options: HistoryOptions,
    prev_time: Option<Instant>,
}

impl History {
    pub fn new(options: HistoryOptions) -> Self {
        Self {
            done: VecDeque::with_capacity(options.depth.min(64)),
            undone: Vec::new(),
            options,
            prev_time: None,
        }
    }

    /// History for a plugin list, if it carries the history plugin.
    pub(crate) fn from_plugins(plugins: &[Plugin]) -> Option<History> {
        plugins
            .iter()
            .find_map(|p| p.props().history)
            .map(History::new)
    }

    pub fn options(&self) -> HistoryOptions {
        self.options
    }

    pub(crate) fn with_options(&self, options: HistoryOptions) -> History {
        let mut history = self.clone();
        history.options = options;
        history.enforce_depth();
        history
    }

    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    /// Next history after `tr` was applied to a state whose selection was
    /// `selection_before`.
    pub(crate) fn apply(&self, tr: &Transaction, selection_before: &Selection) -> History {
        let mut next = self.clone();

        match tr.get_meta(HISTORY_META).and_then(|v| v.as_str()) {
            Some("undo") => {
                if let Some(group) = next.done.pop_back() {
                    next.undone.push(Group {
                        steps: group.steps,
                        selection: selection_before.clone(),
                    });
                }
                next.prev_time = None;
            }
            Some("redo") => {
                if let Some(group) = next.undone.pop() {
                    next.done.push_back(Group {
                        steps: group.steps,
                        selection: selection_before.clone(),
                    });
                }
                next.prev_time = None;
            }
            _ if tr.doc_changed() && tr.add_to_history() => {
                next.undone.clear();
                let joins = next
                    .prev_time
                    .is_some_and(|prev| tr.time().saturating_duration_since(prev) < next.options.new_group_delay);
                match next.done.back_mut() {
                    Some(last) if joins => last.steps.extend(tr.steps().iter().cloned()),
                    _ => next.done.push_back(Group {
                        steps: tr.steps().to_vec(),
                        selection: selection_before.clone(),
                    }),
                }
                next.prev_time = Some(tr.time());
                next.enforce_depth();
            }
            _ => {}
        }

        next
    }

    fn enforce_depth(&mut self) {
        while self.done.len() > self.options.depth {
            self.done.pop_front();
        }
    }
}

/// Plugin that enables undo history.
pub fn history(options: HistoryOptions) -> Plugin {
    Plugin::new("history").with_props(PluginProps {
        history: Some(options),
        ..Default::default()
    })
}

/// Reverts the most recent undo group.
pub fn undo() -> Command {
    command(|state, dispatch| revert(state, dispatch, Direction::Undo))
}

/// Re-applies the most recently undone group.
pub fn redo() -> Command {
    command(|state, dispatch| revert(state, dispatch, Direction::Redo))
}

#[derive(Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

fn revert(state: &EditorState, dispatch: Option<Dispatch<'_>>, direction: Direction) -> bool {
    let Some(history) = state.history() else {
        return false;
    };
    let group = match direction {
        Direction::Undo => history.done.back(),
        Direction::Redo => history.undone.last(),
    };
    let Some(group) = group else {
        return false;
    };
    let Some(dispatch) = dispatch else {
        return true;
    };

    let mut tr = state.tr();
    let steps: Vec<Step> = match direction {
        Direction::Undo => group.steps.iter().rev().map(Step::invert).collect(),
        Direction::Redo => group.steps.clone(),
    };
    for step in steps {
        if let Err(err) = tr.step(step) {
            tracing::warn!(%err, "history step no longer applies");
            return false;
        }
    }
    tr.set_selection(group.selection.clone());
    tr.set_meta(
        HISTORY_META,
        match direction {
            Direction::Undo => "undo",
            Direction::Redo => "redo",
        },
    );
    tr.set_meta(ADD_TO_HISTORY, false);
    dispatch(tr);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::test_schema;
    use crate::state::StateConfig;
    use std::rc::Rc;

    fn state(delay_ms: u64) -> EditorState {
        let options = HistoryOptions {
            depth: 10,
            new_group_delay: Duration::from_millis(delay_ms),
        };
        EditorState::create(StateConfig::new(Rc::new(test_schema())).plugins(vec![history(options)]))
            .unwrap()
    }

    fn type_text(state: &EditorState, text: &str) -> EditorState {
        let mut tr = state.tr();
        tr.insert_text(text).unwrap();
        state.apply(tr)
    }

    fn run(state: &EditorState, cmd: Command) -> EditorState {
        let mut result = None;
        let applied = cmd(state, Some(&mut |tr| result = Some(state.apply(tr))));
        assert!(applied);
        result.unwrap()
    }

    #[test]
    fn test_undo_redo() {
        let s0 = state(0);
        let s1 = type_text(&s0, "a");
        let s2 = type_text(&s1, "b");
        assert_eq!(s2.history().unwrap().undo_depth(), 2);

        let undone = run(&s2, undo());
        assert_eq!(undone.doc(), s1.doc());
        assert_eq!(undone.selection(), s1.selection());

        let redone = run(&undone, redo());
        assert_eq!(redone.doc(), s2.doc());
        assert_eq!(redone.selection(), s2.selection());
    }

    #[test]
    fn test_rapid_edits_are_grouped() {
        let s0 = state(60_000);
        let s1 = type_text(&s0, "a");
        let s2 = type_text(&s1, "b");
        assert_eq!(s2.history().unwrap().undo_depth(), 1);

        let undone = run(&s2, undo());
        assert_eq!(undone.doc(), s0.doc());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let s1 = type_text(&state(0), "a");
        let undone = run(&s1, undo());
        assert_eq!(undone.history().unwrap().redo_depth(), 1);
        let s2 = type_text(&undone, "b");
        assert_eq!(s2.history().unwrap().redo_depth(), 0);
        assert!(!redo()(&s2, None));
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut s = state(0);
        for _ in 0..15 {
            s = type_text(&s, "x");
        }
        assert_eq!(s.history().unwrap().undo_depth(), 10);
    }

    #[test]
    fn test_no_history_without_plugin() {
        let s = EditorState::create(StateConfig::new(Rc::new(test_schema()))).unwrap();
        assert!(!undo()(&s, None));
    }
}
