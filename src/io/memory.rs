// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An in-memory [`ByteStream`] backed by a growable buffer, used both to
//! author atom trees from scratch and as a destination to serialize into
//! before handing bytes to a real sink.

use log::trace;

use crate::error::{out_of_range, Result};
use crate::io::ByteStream;

/// A [`ByteStream`] backed by a `Vec<u8>` that grows on write.
pub struct MemoryStream {
    buf: Vec<u8>,
    pos: u64,
}

impl MemoryStream {
    /// Creates a zero-filled stream of `size` bytes.
    pub fn with_size(size: usize) -> Self {
        MemoryStream { buf: vec![0u8; size], pos: 0 }
    }

    /// Adopts an existing buffer as the stream's backing store.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        MemoryStream { buf, pos: 0 }
    }

    /// Borrows the underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Mutably borrows the underlying bytes. The returned slice is invalidated
    /// by any subsequent `write` that reallocates; the borrow checker enforces
    /// this at compile time rather than leaving it as a documented caller
    /// obligation.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Consumes the stream, returning the underlying buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl ByteStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.buf.len() as u64 - self.pos;
        if remaining == 0 {
            return if buf.is_empty() { Ok(0) } else { crate::error::eof() };
        }
        let n = (buf.len() as u64).min(remaining) as usize;
        let start = self.pos as usize;
        buf[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let start = self.pos as usize;
        let end = start + buf.len();
        if end > self.buf.len() {
            trace!("memory stream growing from {} to {} bytes", self.buf.len(), end);
            self.buf.resize(end, 0);
        }
        self.buf[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.buf.len() as u64 {
            return out_of_range();
        }
        self.pos = pos;
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn size(&self) -> u64 {
        self.buf.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_grows_the_buffer() {
        let mut s = MemoryStream::with_size(0);
        s.write_all(b"hello").unwrap();
        assert_eq!(s.as_slice(), b"hello");
        assert_eq!(s.tell(), 5);
    }

    #[test]
    fn seek_past_current_end_is_out_of_range() {
        let mut s = MemoryStream::with_size(4);
        assert!(s.seek(4).is_ok());
        assert!(matches!(s.seek(5), Err(crate::error::AtomError::OutOfRange)));
    }

    #[test]
    fn write_over_existing_data_does_not_truncate() {
        let mut s = MemoryStream::from_vec(vec![0u8; 8]);
        s.seek(2).unwrap();
        s.write_all(&[1, 2]).unwrap();
        assert_eq!(s.as_slice(), &[0, 0, 1, 2, 0, 0, 0, 0]);
    }

    #[test]
    fn read_reports_eof_at_end() {
        let mut s = MemoryStream::from_vec(vec![1, 2, 3]);
        let mut buf = [0u8; 3];
        s.read_exact(&mut buf).unwrap();
        let mut one = [0u8; 1];
        assert!(matches!(s.read(&mut one), Err(crate::error::AtomError::Eof)));
    }

    #[test]
    fn zero_filled_constructor_starts_empty_of_content() {
        let s = MemoryStream::with_size(3);
        assert_eq!(s.as_slice(), &[0, 0, 0]);
        assert_eq!(s.size(), 3);
    }
}
