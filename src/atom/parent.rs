// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The "AtomParent" capability: an ordered child list plus the operations
//! that mutate it (`add_child`, `remove_child`, `delete_child`, `get_child`,
//! `find_child`) and keep a container atom's cached size consistent (I3).
//!
//! This is expressed as a body type, [`ContainerBody`], rather than as a
//! second trait every [`AtomBody`] must implement — any atom whose body
//! overrides `as_container`/`as_container_mut` to return `Some` is, for these
//! purposes, a container.

use std::rc::Rc;

use log::trace;

use crate::atom::inspector::{find_nth_child_of_type, inspect_children, write_children};
use crate::atom::{Atom, AtomBody, AtomNode};
use crate::error::{AtomError, Result};
use crate::io::ByteStream;
use crate::types::AtomType;

/// Body kind holding an ordered list of child atoms.
#[derive(Default)]
pub struct ContainerBody {
    children: Vec<Atom>,
}

impl ContainerBody {
    pub fn new() -> Self {
        ContainerBody { children: Vec::new() }
    }

    /// The children in on-wire (insertion) order.
    pub fn children(&self) -> &[Atom] {
        &self.children
    }
}

impl AtomBody for ContainerBody {
    fn write_fields(&self, stream: &mut dyn ByteStream) -> Result<()> {
        write_children(&self.children, stream)
    }

    fn inspect_fields(&self, inspector: &mut dyn crate::atom::inspector::Inspector) -> Result<()> {
        inspect_children(&self.children, inspector)
    }

    fn as_container(&self) -> Option<&ContainerBody> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut ContainerBody> {
        Some(self)
    }
}

/// Re-derives `atom`'s cached size from `header_size() + Σ child.size()`
/// (I3), then walks up through `atom.parent()`, `atom.parent().parent()`, ...
/// re-deriving each ancestor's size in turn, since an ancestor several levels
/// up is itself a container whose own `Σ child.size()` changed too. A no-op
/// at any level whose body is not a container (stops the walk there, since a
/// non-container atom has no parent-of-its-own cached size to refresh through
/// this path anyway — the walk only ever ascends parent pointers, all of
/// which are containers by construction).
fn recompute_size(atom: &Atom) {
    let mut current = Rc::clone(atom);
    loop {
        let total = {
            let node = current.borrow();
            match node.body().as_container() {
                Some(container) => {
                    node.header_size() + container.children.iter().map(|c| c.borrow().size()).sum::<u64>()
                }
                None => return,
            }
        };
        current.borrow_mut().set_size(total);
        match current.borrow().parent() {
            Some(next) => current = next,
            None => return,
        }
    }
}

/// Inserts `child` at `position` (0-based), or appends when `position` is
/// `None` or out of range. Sets `child`'s parent back-pointer and re-derives
/// the size of `parent` and every ancestor above it. Fails with
/// `NotSupported` if `parent` does not expose the container capability.
pub fn add_child(parent: &Atom, child: Atom, position: Option<usize>) -> Result<()> {
    {
        let mut node = parent.borrow_mut();
        let container = node
            .body_mut()
            .as_container_mut()
            .ok_or(AtomError::NotSupported("parent atom is not a container"))?;
        match position {
            Some(p) if p <= container.children.len() => container.children.insert(p, Rc::clone(&child)),
            _ => container.children.push(Rc::clone(&child)),
        }
    }
    child.borrow_mut().set_parent(Some(parent));
    trace!("attached {} under {}", child.borrow().atom_type(), parent.borrow().atom_type());
    recompute_size(parent);
    Ok(())
}

/// Removes `child` from `parent`'s child list (an O(n) scan), clears its
/// parent back-pointer, and returns ownership of it to the caller. `None` if
/// `parent` is not a container or does not hold `child`. Re-derives the size
/// of `parent` and every ancestor above it.
pub fn remove_child(parent: &Atom, child: &Atom) -> Option<Atom> {
    let removed = {
        let mut node = parent.borrow_mut();
        let container = node.body_mut().as_container_mut()?;
        let idx = container.children.iter().position(|c| Rc::ptr_eq(c, child))?;
        container.children.remove(idx)
    };
    removed.borrow_mut().set_parent(None);
    trace!("detached {} from {}", removed.borrow().atom_type(), parent.borrow().atom_type());
    recompute_size(parent);
    Some(removed)
}

/// Removes and drops the first child of `atom_type`. Returns whether one was
/// found.
pub fn delete_child(parent: &Atom, atom_type: AtomType) -> bool {
    match get_child(parent, atom_type, 0) {
        Some(child) => {
            remove_child(parent, &child);
            true
        }
        None => false,
    }
}

/// Returns the `index`-th child (0-based) whose type matches `atom_type`, if
/// any.
pub fn get_child(parent: &Atom, atom_type: AtomType, index: usize) -> Option<Atom> {
    let node = parent.borrow();
    let container = node.body().as_container()?;
    find_nth_child_of_type(container.children(), atom_type, index)
}

/// Walks a slash-separated path of four-character type tokens (each with an
/// optional `[k]` ordinal suffix, default `0`) from `parent` to a descendant.
///
/// With `auto_create`, a missing segment is filled in with an empty container
/// atom of that type; if the walk reaches a non-container atom partway
/// through, creation (and the whole walk) fails and this returns `None`
/// rather than panicking (§9 Open Question resolution).
pub fn find_child(parent: &Atom, path: &str, auto_create: bool) -> Option<Atom> {
    let mut current = Rc::clone(parent);
    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        let (type_bytes, index) = parse_segment(segment)?;
        let atom_type = AtomType::new(type_bytes);

        current = match get_child(&current, atom_type, index) {
            Some(found) => found,
            None if auto_create => {
                let created = AtomNode::new_simple(atom_type, Box::new(ContainerBody::new()));
                add_child(&current, Rc::clone(&created), None).ok()?;
                created
            }
            None => return None,
        };
    }
    Some(current)
}

/// Parses one path segment, e.g. `"trak[1]"` -> `(*b"trak", 1)`, `"mdia"` ->
/// `(*b"mdia", 0)`.
fn parse_segment(segment: &str) -> Option<([u8; 4], usize)> {
    let (name, index) = match segment.find('[') {
        Some(open) if segment.ends_with(']') => {
            let name = &segment[..open];
            let index: usize = segment[open + 1..segment.len() - 1].parse().ok()?;
            (name, index)
        }
        Some(_) => return None,
        None => (segment, 0),
    };
    if name.len() != 4 || !name.is_ascii() {
        return None;
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(name.as_bytes());
    Some((bytes, index))
}
