// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The atom object model: a shared-ownership node holding an atom's header
//! fields plus a trait-object body, the contract bodies must satisfy
//! ([`AtomBody`]), and the free functions that write/inspect/detach/clone a
//! node.
//!
//! Concrete atom kinds are expressed as distinct [`AtomBody`] implementations
//! rather than as variants of a closed enum, since the set of four-character
//! types a downstream factory recognizes is explicitly open (§1, §9).
//! Parent/child structure is likewise capability composition, not
//! inheritance: [`parent::ContainerBody`] is just another `AtomBody` that
//! happens to also hold a child list, not a second trait every body must
//! implement.

pub mod inspector;
pub mod parent;
pub mod unknown;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{not_supported, AtomError, Result};
use crate::io::ByteStream;
use crate::types::{AtomType, FormatHint};
use inspector::Inspector;

pub use unknown::{read_unknown_atom, UnknownBody};

/// The payload contract every concrete atom kind implements.
///
/// A body never sees its own header directly; anything it needs to write or
/// inspect (a payload length, a cached child list) it computes or stores at
/// construction time. This keeps the trait free of the reentrant-borrow
/// hazard that would come from a body holding a handle back to the
/// [`AtomNode`] it lives inside.
pub trait AtomBody {
    /// Writes exactly this atom's payload (`effective_size() - header_size()`
    /// bytes) to `stream`.
    fn write_fields(&self, stream: &mut dyn ByteStream) -> Result<()>;

    /// Emits this atom's payload fields to `inspector`, in definition order.
    /// Most bodies have no payload-level fields worth reporting; the default
    /// is a no-op.
    fn inspect_fields(&self, _inspector: &mut dyn Inspector) -> Result<()> {
        Ok(())
    }

    /// Returns a clone of this body, or `None` if the concrete kind does not
    /// support cloning (the default).
    fn clone_box(&self) -> Option<Box<dyn AtomBody>> {
        None
    }

    /// Exposes the container (child-list) capability, if this body has one.
    fn as_container(&self) -> Option<&parent::ContainerBody> {
        None
    }

    /// Mutable counterpart of [`AtomBody::as_container`].
    fn as_container_mut(&mut self) -> Option<&mut parent::ContainerBody> {
        None
    }
}

/// The fixed-layout portion of an atom: type, on-wire size encoding, and (for
/// "full" atoms) version/flags.
#[derive(Debug, Clone)]
pub struct AtomHeader {
    pub atom_type: AtomType,
    /// The 32-bit on-wire size. `1` signals that `size64` carries the real
    /// size (I2: otherwise `size64` is always `0`).
    pub size32: u32,
    pub size64: u64,
    pub is_full: bool,
    pub version: u8,
    /// Only the low 24 bits are meaningful on the wire.
    pub flags: u32,
    /// The 16-byte extended type following a `uuid` atom's ordinary header,
    /// read and re-emitted verbatim; this core does not interpret it.
    pub extended_type: Option<[u8; 16]>,
}

impl AtomHeader {
    /// `8`/`12`/`16`/`20` per §3's formula, plus `16` more when this is a
    /// `uuid` atom carrying an extended type (§4.4 supplement).
    pub fn header_size(&self) -> u64 {
        let mut n: u64 = if self.size32 == 1 { 16 } else { 8 };
        if self.extended_type.is_some() {
            n += 16;
        }
        if self.is_full {
            n += 4;
        }
        n
    }

    /// The total on-wire byte count this atom occupies, header included.
    pub fn effective_size(&self) -> u64 {
        if self.size32 == 1 {
            self.size64
        }
        else {
            u64::from(self.size32)
        }
    }

    /// Sets the effective size, choosing the 32- or 64-bit encoding per I2.
    pub fn set_size(&mut self, size: u64) {
        if size <= u64::from(u32::MAX) {
            self.size32 = size as u32;
            self.size64 = 0;
        }
        else {
            self.size32 = 1;
            self.size64 = size;
        }
    }
}

/// A node in the atom tree: header fields, a non-owning back-pointer to the
/// parent (if any), and the body implementing this atom's concrete behaviour.
///
/// `Atom` handles are `Rc<RefCell<AtomNode>>`: ownership is downward through
/// the child list (§3, §5), and the upward `parent` edge is a `Weak` that
/// simply fails to upgrade once the parent is gone, rather than keeping it
/// alive.
pub struct AtomNode {
    header: AtomHeader,
    parent: Weak<RefCell<AtomNode>>,
    body: Box<dyn AtomBody>,
}

/// A shared handle to an atom tree node.
pub type Atom = Rc<RefCell<AtomNode>>;

impl AtomNode {
    /// Builds a simple (non-"full") atom of `atom_type` wrapping `body`, with
    /// its size initialized to its own header size (no payload, no children
    /// yet).
    pub fn new_simple(atom_type: AtomType, body: Box<dyn AtomBody>) -> Atom {
        Self::new(atom_type, false, 0, 0, None, body)
    }

    /// Builds a "full" atom (carrying version/flags) of `atom_type`.
    pub fn new_full(atom_type: AtomType, version: u8, flags: u32, body: Box<dyn AtomBody>) -> Atom {
        Self::new(atom_type, true, version, flags, None, body)
    }

    fn new(
        atom_type: AtomType,
        is_full: bool,
        version: u8,
        flags: u32,
        extended_type: Option<[u8; 16]>,
        body: Box<dyn AtomBody>,
    ) -> Atom {
        let header = AtomHeader {
            atom_type,
            size32: 0,
            size64: 0,
            is_full,
            version,
            flags: flags & 0x00FF_FFFF,
            extended_type,
        };
        let node = Rc::new(RefCell::new(AtomNode { header, parent: Weak::new(), body }));
        let header_size = node.borrow().header.header_size();
        node.borrow_mut().header.set_size(header_size);
        node
    }

    /// Builds a node from an already-populated header (used by the parser,
    /// §4.6, and by [`clone_atom`] to preserve the original's size and flags).
    pub fn with_header(header: AtomHeader, body: Box<dyn AtomBody>) -> Atom {
        Rc::new(RefCell::new(AtomNode { header, parent: Weak::new(), body }))
    }

    pub fn atom_type(&self) -> AtomType {
        self.header.atom_type
    }

    /// Changes this atom's type without resizing it.
    pub fn set_type(&mut self, atom_type: AtomType) {
        self.header.atom_type = atom_type;
    }

    /// The effective (on-wire, header-included) size.
    pub fn size(&self) -> u64 {
        self.header.effective_size()
    }

    pub fn set_size(&mut self, size: u64) {
        self.header.set_size(size);
    }

    pub fn header_size(&self) -> u64 {
        self.header.header_size()
    }

    pub fn is_full(&self) -> bool {
        self.header.is_full
    }

    pub fn version(&self) -> u8 {
        self.header.version
    }

    pub fn flags(&self) -> u32 {
        self.header.flags
    }

    /// Marks this atom as "full" (or updates its version/flags if it already
    /// is), and re-derives its cached size to account for the 4-byte
    /// version/flags field.
    pub fn set_full(&mut self, version: u8, flags: u32) {
        let was_full = self.header.is_full;
        self.header.is_full = true;
        self.header.version = version;
        self.header.flags = flags & 0x00FF_FFFF;
        if !was_full {
            let new_size = self.header.effective_size() + 4;
            self.header.set_size(new_size);
        }
    }

    pub fn extended_type(&self) -> Option<[u8; 16]> {
        self.header.extended_type
    }

    pub fn header(&self) -> &AtomHeader {
        &self.header
    }

    pub fn body(&self) -> &dyn AtomBody {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut dyn AtomBody {
        self.body.as_mut()
    }

    pub fn parent(&self) -> Option<Atom> {
        self.parent.upgrade()
    }

    pub fn set_parent(&mut self, parent: Option<&Atom>) {
        self.parent = match parent {
            Some(p) => Rc::downgrade(p),
            None => Weak::new(),
        };
    }
}

/// Reads a u32 and decomposes it into `(version, flags)` per the full-atom
/// header layout: `version` is the high byte, `flags` the low 24 bits.
pub fn read_full_header(stream: &mut dyn ByteStream) -> Result<(u8, u32)> {
    let v = stream.read_u32()?;
    Ok(((v >> 24) as u8, v & 0x00FF_FFFF))
}

/// Writes `node`'s header: `size32`, `type`, optionally `size64`, optionally
/// the `uuid` extended type, optionally the packed version/flags word.
pub fn write_header(node: &AtomNode, stream: &mut dyn ByteStream) -> Result<()> {
    let h = &node.header;
    stream.write_u32(h.size32)?;
    stream.write_u32(h.atom_type.as_u32())?;
    if h.size32 == 1 {
        stream.write_u64(h.size64)?;
    }
    if let Some(ext) = h.extended_type {
        stream.write_all(&ext)?;
    }
    if h.is_full {
        let vflags = (u32::from(h.version) << 24) | (h.flags & 0x00FF_FFFF);
        stream.write_u32(vflags)?;
    }
    Ok(())
}

/// Writes `atom` in full: header then payload. On success the stream cursor
/// has advanced by exactly `atom.borrow().size()` bytes.
pub fn write_atom(atom: &Atom, stream: &mut dyn ByteStream) -> Result<()> {
    let node = atom.borrow();
    write_header(&node, stream)?;
    node.body.write_fields(stream)
}

/// Emits `node`'s header fields to `inspector`, in the order a renderer would
/// expect to see them on the wire.
pub fn inspect_header(node: &AtomNode, inspector: &mut dyn Inspector) -> Result<()> {
    let h = &node.header;
    inspector.add_field_str("type", &h.atom_type.to_string(), FormatHint::None);
    inspector.add_field_u32("size32", h.size32, FormatHint::None);
    if h.size32 == 1 {
        inspector.add_field_str("size64", &h.size64.to_string(), FormatHint::None);
    }
    if let Some(ext) = h.extended_type {
        inspector.add_field_bytes("extended_type", &ext, FormatHint::Hex);
    }
    if h.is_full {
        inspector.add_field_u32("version", u32::from(h.version), FormatHint::None);
        inspector.add_field_u32("flags", h.flags, FormatHint::Hex);
    }
    Ok(())
}

/// Inspects `atom`: `start_element`, header fields, payload fields,
/// `end_element`.
pub fn inspect_atom(atom: &Atom, inspector: &mut dyn Inspector) -> Result<()> {
    let node = atom.borrow();
    inspector.start_element(&node.header.atom_type.to_string(), None);
    inspect_header(&node, inspector)?;
    node.body.inspect_fields(inspector)?;
    inspector.end_element();
    Ok(())
}

/// Removes `atom` from its parent's child list, if it has one. Afterwards
/// `atom`'s `parent()` is `None` regardless of whether it had one to begin
/// with.
pub fn detach(atom: &Atom) -> Result<()> {
    if let Some(parent) = atom.borrow().parent() {
        parent::remove_child(&parent, atom);
    }
    Ok(())
}

/// Clones `atom`'s body (if its concrete kind supports it) into a new,
/// unparented node carrying a copy of the original's header.
pub fn clone_atom(atom: &Atom) -> Result<Atom> {
    let node = atom.borrow();
    match node.body.clone_box() {
        Some(body) => Ok(AtomNode::with_header(node.header.clone(), body)),
        None => not_supported("atom body does not support cloning"),
    }
}
