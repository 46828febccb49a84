// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

/// A four-character atom type, packed big-endian into a 32-bit value.
///
/// Types are compared as the raw 4 bytes; an [`AtomType`] is not required to be
/// printable ASCII, and unprintable types still round-trip through [`AtomType::new`]
/// and [`AtomType::as_bytes`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct AtomType([u8; 4]);

impl AtomType {
    /// The `uuid` extended-type atom tag.
    pub const UUID: AtomType = AtomType([b'u', b'u', b'i', b'd']);

    /// Constructs an atom type from its four raw bytes.
    pub fn new(bytes: [u8; 4]) -> Self {
        AtomType(bytes)
    }

    /// Returns the raw four bytes.
    pub fn as_bytes(&self) -> [u8; 4] {
        self.0
    }

    /// Returns the type packed into a big-endian `u32`, per §3's byte-packing rule.
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl From<[u8; 4]> for AtomType {
    fn from(bytes: [u8; 4]) -> Self {
        AtomType(bytes)
    }
}

impl From<u32> for AtomType {
    fn from(val: u32) -> Self {
        AtomType(val.to_be_bytes())
    }
}

impl fmt::Debug for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.bytes().all(|b| b.is_ascii_graphic() || b == b' ') => f.write_str(s),
            _ => write!(f, "0x{:08x}", self.as_u32()),
        }
    }
}

/// Rendering hint passed alongside a field value to an [`crate::Inspector`].
///
/// Inspectors are free to ignore the hint; it exists so renderers that care can
/// format a flags word as hex or a boolean-ish integer as `true`/`false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    None,
    Hex,
    Boolean,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_printable_type() {
        let t = AtomType::new(*b"moov");
        assert_eq!(t.as_bytes(), *b"moov");
        assert_eq!(t.to_string(), "moov");
    }

    #[test]
    fn formats_unprintable_type_as_hex() {
        let t = AtomType::new([0xff, 0x00, 0x01, 0x02]);
        assert_eq!(t.to_string(), "0xff000102");
    }

    #[test]
    fn packs_bytes_big_endian() {
        let t = AtomType::new(*b"free");
        assert_eq!(t.as_u32(), 0x6672_6565);
    }

    #[test]
    fn equality_is_by_bytes() {
        assert_eq!(AtomType::new(*b"trak"), AtomType::new(*b"trak"));
        assert_ne!(AtomType::new(*b"trak"), AtomType::new(*b"trek"));
    }
}
