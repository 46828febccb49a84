// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A reusable core for the ISO Base Media File Format (ISO/IEC 14496-12) "atom"
//! (a.k.a. "box") structure underlying MP4, MOV, 3GP and related containers.
//!
//! This crate models the hierarchical tree of length-prefixed, four-character-typed
//! records that make up such a file, parses them losslessly from an arbitrary
//! seekable byte source, permits structural edits, and serializes the tree back to a
//! byte sink such that round-tripping an unmodified tree is byte-exact.
//!
//! Concrete atom kinds (`moov`, `trak`, `stsd`, ...) and the factory that dispatches
//! on four-character type during parsing are not part of this crate; it only
//! specifies the contract such types must satisfy and a generic [`UnknownBody`]
//! fallback that preserves unrecognized atoms verbatim.

pub mod atom;
pub mod error;
pub mod io;
pub mod types;

pub use atom::inspector::{Inspector, TextInspector};
pub use atom::parent::{add_child, delete_child, find_child, get_child, remove_child, ContainerBody};
pub use atom::unknown::UnknownBody;
pub use atom::{
    clone_atom, detach, inspect_atom, read_full_header, read_unknown_atom, write_atom, Atom,
    AtomBody, AtomHeader, AtomNode,
};
pub use error::{AtomError, Result};
pub use io::memory::MemoryStream;
pub use io::substream::SubStream;
pub use io::ByteStream;
pub use types::{AtomType, FormatHint};

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Parses a flat sequence of top-level atoms from `source`, using
    /// [`read_unknown_atom`] as the "factory" a real caller would otherwise
    /// supply, and attaches each to `into` as a child.
    fn parse_children_into(source: &Rc<RefCell<dyn ByteStream>>, into: &Atom) {
        loop {
            let size = source.borrow().size();
            let pos = source.borrow().tell();
            if pos >= size {
                break;
            }
            let child = {
                let mut s = source.borrow_mut();
                read_unknown_atom(&mut *s, Rc::clone(source)).unwrap()
            };
            add_child(into, child, None).unwrap();
        }
    }

    #[test]
    fn round_trips_a_flat_file_of_unknown_atoms_byte_exact() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x10, b'f', b't', b'y', b'p']);
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x08, b'f', b'r', b'e', b'e']);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x0C, b'm', b'd', b'a', b't']);
        bytes.extend_from_slice(&[0xFFu8; 4]);

        let source: Rc<RefCell<dyn ByteStream>> = Rc::new(RefCell::new(MemoryStream::from_vec(bytes.clone())));
        let root = AtomNode::new_simple(AtomType::new(*b"root"), Box::new(ContainerBody::new()));
        parse_children_into(&source, &root);

        assert_eq!(root.borrow().body().as_container().unwrap().children().len(), 3);
        assert_eq!(root.borrow().size(), 8 + bytes.len() as u64);

        let mut out = MemoryStream::with_size(0);
        for child in root.borrow().body().as_container().unwrap().children() {
            write_atom(child, &mut out).unwrap();
        }
        assert_eq!(out.as_slice(), &bytes[..]);
    }

    #[test]
    fn substream_bounded_parse_does_not_read_past_the_container_payload() {
        // A `moov` container (24 bytes total: 8-byte header + two 8-byte
        // `free` children) followed by a sentinel atom that must not be
        // touched while parsing `moov`'s children.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x18, b'm', b'o', b'o', b'v']);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x08, b'f', b'r', b'e', b'1']);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x08, b'f', b'r', b'e', b'2']);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x08, b's', b'e', b'n', b't']);

        let source: Rc<RefCell<dyn ByteStream>> = Rc::new(RefCell::new(MemoryStream::from_vec(bytes.clone())));
        source.borrow_mut().seek(8).unwrap();

        let moov = AtomNode::new_simple(AtomType::new(*b"moov"), Box::new(ContainerBody::new()));
        let window: Rc<RefCell<dyn ByteStream>> = Rc::new(RefCell::new(SubStream::new(Rc::clone(&source), 8, 16)));
        parse_children_into(&window, &moov);

        assert_eq!(moov.borrow().body().as_container().unwrap().children().len(), 2);
        // The container's own cached size (I3) reflects only what it parsed,
        // not the sentinel atom beyond its window.
        let recomputed = 8 + moov
            .borrow()
            .body()
            .as_container()
            .unwrap()
            .children()
            .iter()
            .map(|c| c.borrow().size())
            .sum::<u64>();
        assert_eq!(moov.borrow().size(), recomputed);
        assert_eq!(recomputed, 24);
    }
}
