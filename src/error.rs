// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `error` module defines the crate's common error type.

use std::fmt;
use std::io;

/// `AtomError` enumerates the result surface of the atom core.
#[derive(Debug)]
pub enum AtomError {
    /// An I/O error occurred while reading, writing, or seeking a stream.
    Io(io::Error),
    /// A short read or write occurred where the caller did not permit one.
    Eof,
    /// A seek, write, or index fell outside a bounded window.
    OutOfRange,
    /// A parameter was disallowed: a size smaller than the header size, a
    /// mismatched 32/64-bit size encoding, a malformed `find_child` path.
    InvalidParameter(&'static str),
    /// The operation is not implemented for this atom or body kind.
    NotSupported(&'static str),
    /// A fixed-size buffer was too small for the data being read into it.
    BufferTooSmall,
}

impl fmt::Display for AtomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomError::Io(err) => write!(f, "io error: {}", err),
            AtomError::Eof => write!(f, "unexpected end of stream"),
            AtomError::OutOfRange => write!(f, "position or index out of range"),
            AtomError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            AtomError::NotSupported(msg) => write!(f, "not supported: {}", msg),
            AtomError::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

impl std::error::Error for AtomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AtomError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AtomError {
    fn from(err: io::Error) -> AtomError {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => AtomError::Eof,
            _ => AtomError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, AtomError>;

/// Convenience function to create an out-of-range error.
pub fn out_of_range<T>() -> Result<T> {
    Err(AtomError::OutOfRange)
}

/// Convenience function to create an invalid-parameter error.
pub fn invalid_parameter<T>(msg: &'static str) -> Result<T> {
    Err(AtomError::InvalidParameter(msg))
}

/// Convenience function to create a not-supported error.
pub fn not_supported<T>(msg: &'static str) -> Result<T> {
    Err(AtomError::NotSupported(msg))
}

/// Convenience function to create a buffer-too-small error.
pub fn buffer_too_small<T>() -> Result<T> {
    Err(AtomError::BufferTooSmall)
}

/// Convenience function to create an end-of-stream error.
pub fn eof<T>() -> Result<T> {
    Err(AtomError::Eof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_unexpected_eof_becomes_eof_variant() {
        let err: AtomError = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, AtomError::Eof));
    }

    #[test]
    fn other_io_errors_are_preserved() {
        let err: AtomError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(err, AtomError::Io(_)));
    }

    #[test]
    fn display_is_non_empty() {
        assert!(!AtomError::OutOfRange.to_string().is_empty());
        assert!(!AtomError::BufferTooSmall.to_string().is_empty());
    }
}
