// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The inspector visitor: an abstract structured-dump sink atoms call into in
//! definition order (the call sequence is part of the contract, since
//! renderers may depend on it), plus the list-level helpers containers use to
//! write/inspect/size-sum their children and a reference text renderer.

use log::warn;

use crate::atom::{inspect_atom, write_atom, Atom};
use crate::error::Result;
use crate::io::ByteStream;
use crate::types::{AtomType, FormatHint};

/// A structured-dump sink for atom trees. Concrete inspectors render to text,
/// XML, JSON, or whatever a caller needs; this crate ships one reference
/// implementation, [`TextInspector`].
pub trait Inspector {
    fn start_element(&mut self, name: &str, extra: Option<&str>);
    fn end_element(&mut self);
    fn add_field_u32(&mut self, name: &str, value: u32, hint: FormatHint);
    fn add_field_str(&mut self, name: &str, value: &str, hint: FormatHint);
    fn add_field_bytes(&mut self, name: &str, bytes: &[u8], hint: FormatHint);
}

/// Walks `children` in order, writing each to `stream`. In debug builds,
/// asserts that each atom's write advanced the cursor by exactly its
/// `size()`, mirroring the original's `AP4_DEBUG`-gated assertion. In release
/// builds the check still runs but only warns: a write-time I1 violation is a
/// programmer error this core detects rather than panics on, permitted to
/// leave a structurally inconsistent stream rather than abort (§7).
pub fn write_children(children: &[Atom], stream: &mut dyn ByteStream) -> Result<()> {
    for child in children {
        let before = stream.tell();
        let expected = child.borrow().size();

        write_atom(child, stream)?;

        let advanced = stream.tell() - before;
        debug_assert_eq!(
            advanced, expected,
            "atom write advanced the stream by a different amount than its own size"
        );
        if advanced != expected {
            warn!(
                "atom {} wrote {} bytes but reported size() == {}",
                child.borrow().atom_type(),
                advanced,
                expected
            );
        }
    }
    Ok(())
}

/// Walks `children` in order, inspecting each.
pub fn inspect_children(children: &[Atom], inspector: &mut dyn Inspector) -> Result<()> {
    for child in children {
        inspect_atom(child, inspector)?;
    }
    Ok(())
}

/// Folds `Σ child.size()`, the right-hand side of I3.
pub fn sum_children_size(children: &[Atom]) -> u64 {
    children.iter().map(|c| c.borrow().size()).sum()
}

/// Returns the `index`-th (0-based) child of `atom_type` in `children`, or
/// `None` if there are fewer than `index + 1` matches.
pub fn find_nth_child_of_type(children: &[Atom], atom_type: AtomType, mut index: usize) -> Option<Atom> {
    for child in children {
        if child.borrow().atom_type() == atom_type {
            if index == 0 {
                return Some(std::rc::Rc::clone(child));
            }
            index -= 1;
        }
    }
    None
}

/// A plain indenting text renderer, the reference [`Inspector`] implementation
/// exercised by this crate's own tests and by the `dump` demonstration binary.
pub struct TextInspector<'a> {
    out: &'a mut dyn std::fmt::Write,
    depth: usize,
}

impl<'a> TextInspector<'a> {
    pub fn new(out: &'a mut dyn std::fmt::Write) -> Self {
        TextInspector { out, depth: 0 }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            let _ = self.out.write_str("  ");
        }
    }
}

impl<'a> Inspector for TextInspector<'a> {
    fn start_element(&mut self, name: &str, extra: Option<&str>) {
        self.indent();
        match extra {
            Some(extra) => {
                let _ = writeln!(self.out, "[{}] {}", name, extra);
            }
            None => {
                let _ = writeln!(self.out, "[{}]", name);
            }
        }
        self.depth += 1;
    }

    fn end_element(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn add_field_u32(&mut self, name: &str, value: u32, hint: FormatHint) {
        self.indent();
        match hint {
            FormatHint::Hex => {
                let _ = writeln!(self.out, "{}: 0x{:08x}", name, value);
            }
            FormatHint::Boolean => {
                let _ = writeln!(self.out, "{}: {}", name, value != 0);
            }
            FormatHint::None => {
                let _ = writeln!(self.out, "{}: {}", name, value);
            }
        }
    }

    fn add_field_str(&mut self, name: &str, value: &str, _hint: FormatHint) {
        self.indent();
        let _ = writeln!(self.out, "{}: {}", name, value);
    }

    fn add_field_bytes(&mut self, name: &str, bytes: &[u8], hint: FormatHint) {
        self.indent();
        match hint {
            FormatHint::Hex => {
                let _ = write!(self.out, "{}: ", name);
                for b in bytes {
                    let _ = write!(self.out, "{:02x}", b);
                }
                let _ = writeln!(self.out);
            }
            _ => {
                let _ = writeln!(self.out, "{}: <{} bytes>", name, bytes.len());
            }
        }
    }
}
