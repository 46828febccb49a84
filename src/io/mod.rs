// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements a uniform read/write/seek abstraction over a
//! random-access byte sequence, plus the big-endian integer codecs every atom
//! header and field reader/writer in this crate is built on.
//!
//! A [`ByteStream`] is `Referenceable` in the sense of the original Bento4 API
//! (explicit acquire/release, destruction on last release) without a parallel
//! hand-rolled reference count: every holder keeps an `Rc<RefCell<dyn ByteStream>>`
//! handle, acquiring is `Rc::clone`, releasing is dropping the handle, and the
//! underlying stream is dropped when the strong count reaches zero. This is why
//! the trait below has no `add_reference`/`release` methods of its own.

pub mod memory;
pub mod substream;

pub use memory::MemoryStream;
pub use substream::SubStream;

use crate::error::{buffer_too_small, eof, Result};

/// Minimum size of the staging buffer used by the default [`ByteStream::copy_to`]
/// implementation, per §4.1 ("implementation chooses size ≥ 4 KiB").
const COPY_STAGING_SIZE: usize = 8 * 1024;

/// A random-access byte stream with an independent cursor.
///
/// Streams are single-reader: concurrent use of the same stream's cursor from
/// multiple call sites is the caller's responsibility to serialize (§5).
pub trait ByteStream {
    /// Reads up to `buf.len()` bytes, returning the number actually read. A
    /// short read (fewer bytes than `buf.len()`) is only ever `Ok` when some
    /// bytes were available; reading past the end of the stream with a
    /// non-empty `buf` fails with [`crate::error::AtomError::Eof`].
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes up to `buf.len()` bytes, returning the number actually written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Seeks to an absolute position.
    fn seek(&mut self, pos: u64) -> Result<()>;

    /// Returns the current cursor position.
    fn tell(&self) -> u64;

    /// Returns the total extent of the stream (for growable streams, the
    /// current extent).
    fn size(&self) -> u64;

    /// Reads exactly `buf.len()` bytes, failing with `Eof` on a short read.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return eof();
            }
            filled += n;
        }
        Ok(())
    }

    /// Writes exactly `buf.len()` bytes, failing if the sink cannot accept
    /// them all.
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..])?;
            if n == 0 {
                return eof();
            }
            written += n;
        }
        Ok(())
    }

    /// Transfers exactly `size` bytes from this stream to `sink` using a fixed
    /// staging buffer. On success both cursors have advanced by `size`.
    fn copy_to(&mut self, sink: &mut dyn ByteStream, size: u64) -> Result<()> {
        let mut staging = [0u8; COPY_STAGING_SIZE];
        let mut remaining = size;
        while remaining > 0 {
            let chunk = remaining.min(COPY_STAGING_SIZE as u64) as usize;
            self.read_exact(&mut staging[..chunk])?;
            sink.write_all(&staging[..chunk])?;
            remaining -= chunk as u64;
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Reads a 3-byte big-endian value into the low 24 bits of a `u32`.
    fn read_u24(&mut self) -> Result<u32> {
        let mut buf = [0u8; 3];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes([0, buf[0], buf[1], buf[2]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])
    }

    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Writes the low 24 bits of `value` as 3 big-endian bytes.
    fn write_u24(&mut self, value: u32) -> Result<()> {
        let bytes = value.to_be_bytes();
        self.write_all(&bytes[1..4])
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Reads bytes into `buf` until (and including) a NUL byte, NUL-terminating
    /// within the first `buf.len() - 1` bytes. Fails with `BufferTooSmall` if no
    /// NUL is found in that span. Returns the string length, not counting the
    /// terminator.
    fn read_string(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return buffer_too_small();
        }
        for i in 0..buf.len() - 1 {
            let b = self.read_u8()?;
            buf[i] = b;
            if b == 0 {
                return Ok(i);
            }
        }
        buffer_too_small()
    }

    /// Writes `s`'s bytes followed by a terminating NUL.
    fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_all(s.as_bytes())?;
        self.write_u8(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endian_codecs_round_trip() {
        let mut s = MemoryStream::with_size(0);
        s.write_u8(0x12).unwrap();
        s.write_u16(0x3456).unwrap();
        s.write_u24(0x78_9a_bc).unwrap();
        s.write_u32(0xdead_beef).unwrap();
        s.write_u64(0x0123_4567_89ab_cdef).unwrap();

        assert_eq!(
            s.as_slice(),
            &[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xad, 0xbe, 0xef, 0x01, 0x23, 0x45, 0x67,
              0x89, 0xab, 0xcd, 0xef]
        );

        s.seek(0).unwrap();
        assert_eq!(s.read_u8().unwrap(), 0x12);
        assert_eq!(s.read_u16().unwrap(), 0x3456);
        assert_eq!(s.read_u24().unwrap(), 0x78_9a_bc);
        assert_eq!(s.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(s.read_u64().unwrap(), 0x0123_4567_89ab_cdef);
    }

    #[test]
    fn write_string_appends_terminator() {
        let mut s = MemoryStream::with_size(0);
        s.write_string("ftyp").unwrap();
        assert_eq!(s.as_slice(), b"ftyp\0");
    }

    #[test]
    fn read_string_stops_at_nul() {
        let mut s = MemoryStream::from_vec(b"abc\0junk".to_vec());
        let mut buf = [0u8; 8];
        let len = s.read_string(&mut buf).unwrap();
        assert_eq!(len, 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn read_string_without_nul_is_buffer_too_small() {
        let mut s = MemoryStream::from_vec(b"nonulhere".to_vec());
        let mut buf = [0u8; 4];
        assert!(matches!(s.read_string(&mut buf), Err(crate::error::AtomError::BufferTooSmall)));
    }

    #[test]
    fn copy_to_transfers_exact_byte_count() {
        let mut src = MemoryStream::from_vec((0..20u8).collect());
        let mut dst = MemoryStream::with_size(0);
        src.copy_to(&mut dst, 10).unwrap();
        assert_eq!(dst.as_slice(), &(0..10u8).collect::<Vec<_>>()[..]);
        assert_eq!(src.tell(), 10);
        assert_eq!(dst.tell(), 10);
    }
}
