//! Stock editing commands.
//!
//! Each constructor returns a [`Command`]. Called without a dispatch sink a
//! command only reports whether it would apply.

use crate::keymap::Keymap;
use crate::model::{Attrs, Mark, Node};
use crate::plugin::{Command, command};
use crate::state::{EditorState, Selection, Transaction};
use crate::EngineResult;

/// Builds a command from a function that prepares a transaction. `Ok(None)`
/// means "does not apply"; errors are logged and treated the same way.
pub fn transform(
    name: &'static str,
    build: impl Fn(&EditorState) -> EngineResult<Option<Transaction>> + 'static,
) -> Command {
    command(move |state, dispatch| match build(state) {
        Ok(Some(tr)) => {
            if let Some(dispatch) = dispatch {
                dispatch(tr);
            }
            true
        }
        Ok(None) => false,
        Err(err) => {
            tracing::debug!(command = name, %err, "command not applicable");
            false
        }
    })
}

/// Tries each command in turn until one applies.
pub fn chain_commands(commands: Vec<Command>) -> Command {
    command(move |state, mut dispatch| {
        commands.iter().any(|cmd| match dispatch {
            Some(ref mut sink) => cmd(state, Some(&mut **sink)),
            None => cmd(state, None),
        })
    })
}

/// Adds the mark to the selection, or removes it if the whole selection
/// already carries it. With a cursor the stored marks are toggled instead.
pub fn toggle_mark(mark_name: &str, attrs: Attrs) -> Command {
    let mark_name = mark_name.to_string();
    transform("toggleMark", move |state| {
        let schema = state.schema();
        let mark = schema.mark_type(&mark_name)?.create(&attrs)?;
        let sel = state.selection();
        let Some(block) = state.selected_block() else {
            return Ok(None);
        };
        let mut tr = state.tr();

        if sel.is_empty() {
            let active = state.active_marks();
            let marks = if active.iter().any(|m| m.type_name() == mark_name) {
                mark.remove_from_set(&active)
            } else {
                mark.add_to_set(&active, |name| schema.mark_rank(name))
            };
            tr.set_stored_marks(Some(marks));
            return Ok(Some(tr));
        }

        let (from, to) = (sel.from(), sel.to());
        let covered = block
            .inline_slice(from, to)
            .iter()
            .filter(|n| n.is_text())
            .all(|n| n.marks().iter().any(|m| m.type_name() == mark_name));
        let remove = covered && has_text(block, from, to);

        let updated = block.map_inline(from, to, |node| {
            if !node.is_text() {
                return node.clone();
            }
            let marks = if remove {
                mark.remove_from_set(node.marks())
            } else {
                mark.add_to_set(node.marks(), |name| schema.mark_rank(name))
            };
            node.with_marks(marks)
        });
        let block_path = sel.block.clone();
        tr.replace_node(&block_path, updated)?;
        tr.set_selection(sel.clone());
        Ok(Some(tr))
    })
}

/// Applies the mark to the selection, replacing any mark of the same type
/// (e.g. a link with another `href`). Does not apply to a cursor.
pub fn add_mark(mark_name: &str, attrs: Attrs) -> Command {
    let mark_name = mark_name.to_string();
    transform("addMark", move |state| {
        let schema = state.schema();
        let mark = schema.mark_type(&mark_name)?.create(&attrs)?;
        let sel = state.selection();
        let Some(block) = state.selected_block() else {
            return Ok(None);
        };
        if sel.is_empty() || !has_text(block, sel.from(), sel.to()) {
            return Ok(None);
        }
        let updated = block.map_inline(sel.from(), sel.to(), |node| {
            if node.is_text() {
                node.with_marks(mark.add_to_set(node.marks(), |name| schema.mark_rank(name)))
            } else {
                node.clone()
            }
        });
        let mut tr = state.tr();
        tr.replace_node(&sel.block, updated)?;
        tr.set_selection(sel.clone());
        Ok(Some(tr))
    })
}

/// Removes every mark of `mark_name` from the selection.
pub fn remove_mark(mark_name: &str) -> Command {
    let mark_name = mark_name.to_string();
    transform("removeMark", move |state| {
        let sel = state.selection();
        let Some(block) = state.selected_block() else {
            return Ok(None);
        };
        let strip = |marks: &[Mark]| -> Vec<Mark> {
            marks
                .iter()
                .filter(|m| m.type_name() != mark_name)
                .cloned()
                .collect()
        };
        let mut tr = state.tr();
        if sel.is_empty() {
            tr.set_stored_marks(Some(strip(&state.active_marks())));
            return Ok(Some(tr));
        }
        let updated = block.map_inline(sel.from(), sel.to(), |node| node.with_marks(strip(node.marks())));
        tr.replace_node(&sel.block, updated)?;
        tr.set_selection(sel.clone());
        Ok(Some(tr))
    })
}

fn has_text(block: &Node, from: usize, to: usize) -> bool {
    block.inline_slice(from, to).iter().any(Node::is_text)
}

/// Turns the selected textblock into `type_name`.
pub fn set_block_type(type_name: &str, attrs: Attrs) -> Command {
    let type_name = type_name.to_string();
    transform("setBlockType", move |state| {
        let ty = state.schema().node_type(&type_name)?;
        let attrs = ty.compute_attrs(&attrs)?;
        let Some(block) = state.selected_block() else {
            return Ok(None);
        };
        if block.type_name() == type_name && block.attrs() == &attrs {
            return Ok(None);
        }
        let mut tr = state.tr();
        let path = state.selection().block.clone();
        tr.set_node_type(&path, &type_name, &attrs)?;
        tr.set_selection(state.selection().clone());
        Ok(Some(tr))
    })
}

/// Like [`set_block_type`], but turns a block that already has the type and
/// attributes back into the default textblock.
pub fn toggle_block_type(type_name: &str, attrs: Attrs) -> Command {
    let set = set_block_type(type_name, attrs.clone());
    let type_name = type_name.to_string();
    command(move |state, dispatch| {
        let Some(block) = state.selected_block() else {
            return false;
        };
        let same = state
            .schema()
            .node_type(&type_name)
            .and_then(|ty| ty.compute_attrs(&attrs))
            .is_ok_and(|computed| block.type_name() == type_name && block.attrs() == &computed);
        if !same {
            return set(state, dispatch);
        }
        match state.schema().default_textblock() {
            Some(default) => set_block_type(default.name(), Attrs::new())(state, dispatch),
            None => false,
        }
    })
}

/// Wraps the selected textblock in a `type_name` node.
pub fn wrap_in(type_name: &str, attrs: Attrs) -> Command {
    let type_name = type_name.to_string();
    transform("wrapIn", move |state| {
        let schema = state.schema();
        let sel = state.selection();
        let Some(block) = state.selected_block() else {
            return Ok(None);
        };
        let wrapper_type = schema.node_type(&type_name)?;
        let block_type = schema.node_type(block.type_name())?;
        if !wrapper_type.allows(block_type) || sel.block.is_empty() {
            return Ok(None);
        }
        let wrapper = schema.node(&type_name, &attrs, vec![block.clone()])?;
        let mut tr = state.tr();
        tr.replace_node(&sel.block, wrapper)?;
        let mut inner = sel.block.clone();
        inner.push(0);
        tr.set_selection(Selection::range(inner, sel.anchor, sel.head));
        Ok(Some(tr))
    })
}

/// Splits the selected textblock at the cursor. Splitting at the very end
/// of a block starts a default textblock.
pub fn split_block() -> Command {
    transform("splitBlock", |state| {
        let sel = state.selection();
        let Some((&index, parent_path)) = sel.block.split_last() else {
            return Ok(None);
        };
        let mut tr = state.tr();
        tr.delete_selection()?;
        let block_path = sel.block.clone();
        let Some(block) = tr.doc().node_at(&block_path).cloned() else {
            return Ok(None);
        };
        let Some(parent) = tr.doc().node_at(parent_path).cloned() else {
            return Ok(None);
        };

        let offset = sel.from();
        let (left, mut right) = block.split_inline_at(offset);
        if offset >= block.inline_len() {
            if let Some(default) = state.schema().default_textblock() {
                right = state.schema().node(default.name(), &Attrs::new(), Vec::new())?;
            }
        }

        let mut content = parent.content().to_vec();
        content[index] = left;
        content.insert(index + 1, right);
        tr.replace_node(parent_path, parent.with_content(content))?;

        let mut next = parent_path.to_vec();
        next.push(index + 1);
        tr.set_selection(Selection::cursor(next, 0));
        Ok(Some(tr))
    })
}

/// Deletes the selection, the character before the cursor, or joins the
/// block with the textblock before it.
pub fn delete_backward() -> Command {
    transform("deleteBackward", |state| {
        let sel = state.selection();
        let mut tr = state.tr();
        if !sel.is_empty() {
            tr.delete_selection()?;
            return Ok(Some(tr));
        }

        let cursor = sel.head;
        if cursor > 0 {
            tr.replace_inline(&sel.block, cursor - 1, cursor, Vec::new())?;
            tr.set_selection(Selection::cursor(sel.block.clone(), cursor - 1));
            return Ok(Some(tr));
        }

        let Some((&index, parent_path)) = sel.block.split_last() else {
            return Ok(None);
        };
        if index == 0 {
            return Ok(None);
        }
        let Some(parent) = state.doc().node_at(parent_path) else {
            return Ok(None);
        };
        let (Some(prev), Some(block)) = (parent.child(index - 1), parent.child(index)) else {
            return Ok(None);
        };
        let prev_is_textblock = state
            .schema()
            .node_type(prev.type_name())
            .is_ok_and(|t| t.is_textblock());
        if !prev_is_textblock {
            return Ok(None);
        }

        let join_at = prev.inline_len();
        let joined = prev.replace_inline(join_at, join_at, block.content().to_vec());
        let mut content = parent.content().to_vec();
        content.remove(index);
        content[index - 1] = joined;
        tr.replace_node(parent_path, parent.with_content(content))?;

        let mut target = parent_path.to_vec();
        target.push(index - 1);
        tr.set_selection(Selection::cursor(target, join_at));
        Ok(Some(tr))
    })
}

/// Inserts `node` at the cursor. Inline nodes go into the textblock; block
/// nodes are placed after the nearest ancestor block whose parent accepts
/// them.
pub fn insert_node(node: Node) -> Command {
    transform("insertNode", move |state| {
        let schema = state.schema();
        let ty = schema.node_type(node.type_name())?;
        let sel = state.selection();
        let mut tr = state.tr();

        if ty.is_inline() {
            let from = sel.from();
            tr.replace_inline(&sel.block, from, sel.to(), vec![node.clone()])?;
            tr.set_selection(Selection::cursor(sel.block.clone(), from + node.inline_size()));
            return Ok(Some(tr));
        }

        let mut path = sel.block.clone();
        while let Some(index) = path.pop() {
            let Some(parent) = state.doc().node_at(&path) else {
                break;
            };
            if !schema.node_type(parent.type_name())?.allows(ty) {
                continue;
            }
            let mut content = parent.content().to_vec();
            content.insert(index + 1, schema.check(&node)?);
            tr.replace_node(&path, parent.with_content(content))?;

            path.push(index + 1);
            let inner = tr
                .doc()
                .node_at(&path)
                .map(|inserted| {
                    inserted.find_paths(&|n| {
                        schema.node_type(n.type_name()).is_ok_and(|t| t.is_textblock())
                    })
                })
                .and_then(|paths| paths.into_iter().next());
            if let Some(inner) = inner {
                path.extend(inner);
                tr.set_selection(Selection::cursor(path, 0));
            }
            return Ok(Some(tr));
        }
        Ok(None)
    })
}

/// Enter splits, Backspace deletes backward.
pub fn base_keymap() -> Keymap {
    Keymap::new()
        .bind("Enter", split_block())
        .bind("Backspace", delete_backward())
}
