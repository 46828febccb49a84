// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A windowed view over another [`ByteStream`], used to bound the recursive
//! parse of a container atom's children to that container's payload.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::error::{eof, out_of_range, Result};
use crate::io::ByteStream;

/// A fixed-size window `[offset, offset + size)` over a shared container
/// stream, with its own logical cursor `p ∈ [0, size]`.
///
/// Before every I/O the container is seeked to `offset + p`, so a `SubStream`
/// remains correct even if the container's cursor was moved between calls by
/// some other holder of the same `Rc` — so long as callers don't interleave
/// I/O on the two from different threads, which the single-threaded
/// concurrency model (§5) rules out anyway.
pub struct SubStream {
    container: Rc<RefCell<dyn ByteStream>>,
    offset: u64,
    size: u64,
    pos: u64,
}

impl SubStream {
    /// Constructs a substream over `[offset, offset + size)` of `container`.
    /// The returned substream holds a reference on `container` for its
    /// lifetime (an `Rc::clone`, released when the substream is dropped).
    pub fn new(container: Rc<RefCell<dyn ByteStream>>, offset: u64, size: u64) -> Self {
        trace!("substream opened at offset {} size {}", offset, size);
        SubStream { container, offset, size, pos: 0 }
    }

    /// The window's starting offset within the container.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl ByteStream for SubStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.size - self.pos;
        if remaining == 0 {
            return if buf.is_empty() { Ok(0) } else { eof() };
        }
        let to_read = (buf.len() as u64).min(remaining) as usize;
        let mut container = self.container.borrow_mut();
        container.seek(self.offset + self.pos)?;
        let n = container.read(&mut buf[..to_read])?;
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let remaining = self.size - self.pos;
        if remaining == 0 {
            return if buf.is_empty() { Ok(0) } else { out_of_range() };
        }
        let to_write = (buf.len() as u64).min(remaining) as usize;
        let mut container = self.container.borrow_mut();
        container.seek(self.offset + self.pos)?;
        let n = container.write(&buf[..to_write])?;
        self.pos += n as u64;
        Ok(n)
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.size {
            return out_of_range();
        }
        self.pos = pos;
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::MemoryStream;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fixture() -> Rc<RefCell<dyn ByteStream>> {
        let container = MemoryStream::from_vec((0..100u8).collect());
        Rc::new(RefCell::new(container))
    }

    #[test]
    fn seek_clamps_to_window() {
        let mut s = SubStream::new(fixture(), 10, 20);
        assert!(s.seek(20).is_ok());
        assert!(matches!(s.seek(21), Err(crate::error::AtomError::OutOfRange)));
    }

    #[test]
    fn read_stays_within_window_and_hits_eof() {
        let mut s = SubStream::new(fixture(), 10, 20);
        let mut buf = [0u8; 30];
        let n = s.read(&mut buf).unwrap();
        assert_eq!(n, 20);
        assert_eq!(&buf[..20], &(10u8..30).collect::<Vec<_>>()[..]);

        let mut one = [0u8; 1];
        assert!(matches!(s.read(&mut one), Err(crate::error::AtomError::Eof)));
    }

    #[test]
    fn write_never_touches_bytes_outside_the_window() {
        let container = fixture();
        {
            let mut s = SubStream::new(Rc::clone(&container), 10, 5);
            s.write_all(&[1, 2, 3, 4, 5]).unwrap();
            assert!(matches!(s.write(&[6]), Err(crate::error::AtomError::OutOfRange)));
        }

        let mut verify = SubStream::new(Rc::clone(&container), 9, 7);
        let mut buf = [0u8; 7];
        verify.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [9, 1, 2, 3, 4, 5, 15]);
    }

    #[test]
    fn tell_and_size_report_window_relative_values() {
        let mut s = SubStream::new(fixture(), 10, 20);
        assert_eq!(s.size(), 20);
        let mut buf = [0u8; 4];
        s.read(&mut buf).unwrap();
        assert_eq!(s.tell(), 4);
    }
}
