//! Finite byte sources.

use std::iter::FusedIterator;

use bytes::{Buf, Bytes};

/// Yields the bytes of a fixed buffer one at a time, in order.
///
/// A source is drained once; build a new one for each logical stream.
#[derive(Debug, Clone)]
pub struct ByteSource {
    bytes: Bytes,
}

impl ByteSource {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Bytes not yet produced.
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Iterator for ByteSource {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.bytes.has_remaining() {
            Some(self.bytes.get_u8())
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.bytes.len(), Some(self.bytes.len()))
    }
}

impl ExactSizeIterator for ByteSource {}

impl FusedIterator for ByteSource {}

impl From<Vec<u8>> for ByteSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&'static [u8]> for ByteSource {
    fn from(bytes: &'static [u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<Bytes> for ByteSource {
    fn from(bytes: Bytes) -> Self {
        Self::new(bytes)
    }
}
