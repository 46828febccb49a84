// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The generic fallback body for atom types a downstream factory doesn't
//! recognize. It never materializes its payload in memory: it remembers
//! where the payload lives in the source stream and re-reads it verbatim on
//! write, so an unmodified tree round-trips byte-exact (P5) regardless of how
//! large the unrecognized atom's payload is.

use std::cell::RefCell;
use std::rc::Rc;

use crate::atom::inspector::Inspector;
use crate::atom::{Atom, AtomBody, AtomHeader, AtomNode};
use crate::error::{invalid_parameter, AtomError, Result};
use crate::io::ByteStream;
use crate::types::{AtomType, FormatHint};

/// Preserves an unrecognized atom's payload by reference rather than by
/// value: `source_stream` must outlive this body (enforced by the `Rc` it
/// holds), and `source_offset` is the absolute position of the payload
/// (i.e., just past the header) within it.
pub struct UnknownBody {
    source_stream: Rc<RefCell<dyn ByteStream>>,
    source_offset: u64,
    payload_len: u64,
}

impl UnknownBody {
    pub fn payload_len(&self) -> u64 {
        self.payload_len
    }

    pub fn source_offset(&self) -> u64 {
        self.source_offset
    }
}

impl AtomBody for UnknownBody {
    fn write_fields(&self, stream: &mut dyn ByteStream) -> Result<()> {
        let mut source = self.source_stream.borrow_mut();
        source.seek(self.source_offset)?;
        source.copy_to(stream, self.payload_len)
    }

    fn inspect_fields(&self, inspector: &mut dyn Inspector) -> Result<()> {
        inspector.add_field_str("data", &format!("{} bytes", self.payload_len), FormatHint::None);
        Ok(())
    }
}

/// Reads a generic atom header from `stream` and wraps its payload in an
/// [`UnknownBody`] that replays the bytes verbatim from `source_stream` on
/// write. `source_stream` is typically the same underlying container
/// `stream` is reading from (perhaps via a `SubStream` wrapping it) — what
/// matters is that seeking `source_stream` to the returned atom's payload
/// offset yields the same bytes `stream` is about to skip over.
pub fn read_unknown_atom(stream: &mut dyn ByteStream, source_stream: Rc<RefCell<dyn ByteStream>>) -> Result<Atom> {
    let header = read_generic_header(stream)?;
    let source_offset = stream.tell();
    let payload_len = header.effective_size() - header.header_size();

    // The payload still needs to be skipped on `stream` itself so a caller
    // parsing a sequence of sibling atoms can continue from the right place.
    stream.seek(source_offset + payload_len)?;

    let body = UnknownBody { source_stream, source_offset, payload_len };
    Ok(AtomNode::with_header(header, Box::new(body)))
}

fn read_generic_header(stream: &mut dyn ByteStream) -> Result<AtomHeader> {
    let size32 = stream.read_u32()?;
    let atom_type = AtomType::from(stream.read_u32()?);

    if size32 == 0 {
        return invalid_parameter(
            "atom size of 0 (extends to end of container) must be resolved by the caller",
        );
    }

    let size64 = if size32 == 1 { stream.read_u64()? } else { 0 };

    let extended_type = if atom_type == AtomType::UUID {
        let mut uuid = [0u8; 16];
        stream.read_exact(&mut uuid)?;
        Some(uuid)
    }
    else {
        None
    };

    let header = AtomHeader { atom_type, size32, size64, is_full: false, version: 0, flags: 0, extended_type };
    if header.effective_size() < header.header_size() {
        return Err(AtomError::InvalidParameter("atom size is smaller than its header"));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::write_atom;
    use crate::io::MemoryStream;

    fn shared(bytes: Vec<u8>) -> Rc<RefCell<dyn ByteStream>> {
        Rc::new(RefCell::new(MemoryStream::from_vec(bytes)))
    }

    #[test]
    fn small_header_round_trips_byte_exact() {
        let bytes = vec![0x00, 0x00, 0x00, 0x10, b'f', b'r', b'e', b'e', 0, 0, 0, 0, 0, 0, 0, 0];
        let source = shared(bytes.clone());
        let atom = {
            let mut s = source.borrow_mut();
            read_unknown_atom(&mut *s, Rc::clone(&source)).unwrap()
        };

        assert_eq!(atom.borrow().atom_type(), AtomType::new(*b"free"));
        assert_eq!(atom.borrow().size(), 16);

        let mut out = MemoryStream::with_size(0);
        write_atom(&atom, &mut out).unwrap();
        assert_eq!(out.as_slice(), &bytes[..]);
    }

    #[test]
    fn extended_size_header_round_trips_byte_exact() {
        let mut bytes = vec![0x00, 0x00, 0x00, 0x01, b'm', b'd', b'a', b't'];
        bytes.extend_from_slice(&32u64.to_be_bytes());
        bytes.extend_from_slice(&[0xAAu8; 16]);
        let source = shared(bytes.clone());
        let atom = {
            let mut s = source.borrow_mut();
            read_unknown_atom(&mut *s, Rc::clone(&source)).unwrap()
        };

        assert_eq!(atom.borrow().size(), 32);
        assert_eq!(atom.borrow().header_size(), 16);

        let mut out = MemoryStream::with_size(0);
        write_atom(&atom, &mut out).unwrap();
        assert_eq!(out.as_slice(), &bytes[..]);
    }

    #[test]
    fn uuid_atom_round_trips_extended_type() {
        // 8-byte ordinary header + 16-byte extended type + 4-byte payload = 32.
        let mut bytes = vec![0x00, 0x00, 0x00, 0x20, b'u', b'u', b'i', b'd'];
        bytes.extend_from_slice(&[0x11u8; 16]);
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        let source = shared(bytes.clone());
        let atom = {
            let mut s = source.borrow_mut();
            read_unknown_atom(&mut *s, Rc::clone(&source)).unwrap()
        };

        assert_eq!(atom.borrow().header_size(), 24);
        assert_eq!(atom.borrow().extended_type(), Some([0x11u8; 16]));

        let mut out = MemoryStream::with_size(0);
        write_atom(&atom, &mut out).unwrap();
        assert_eq!(out.as_slice(), &bytes[..]);
    }

    #[test]
    fn size_smaller_than_header_is_invalid_parameter() {
        let bytes = vec![0x00, 0x00, 0x00, 0x04, b'f', b'r', b'e', b'e'];
        let source = shared(bytes);
        let mut s = source.borrow_mut();
        assert!(matches!(
            read_unknown_atom(&mut *s, Rc::clone(&source)),
            Err(AtomError::InvalidParameter(_))
        ));
    }
}
