//! [`ByteSource`] adapters for readers, iterators and slices.

use crate::error::{MkresError, Result};
use crate::traits::ByteSource;
use std::io::{ErrorKind, Read};

/// A byte source backed by any [`Read`] implementation.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        // Short reads are legal for `Read`; keep going until full or EOF.
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(MkresError::Io(e)),
            }
        }
        Ok(filled)
    }
}

/// A byte source backed by an iterator of bytes.
#[derive(Debug)]
pub struct IterSource<I> {
    iter: I,
}

impl<I: Iterator<Item = u8>> IterSource<I> {
    /// Wrap anything that iterates bytes.
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I: Iterator<Item = u8>> ByteSource for IterSource<I> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut count = 0;
        // `zip` polls `buf` first, so no byte is pulled past capacity.
        for (slot, byte) in buf.iter_mut().zip(&mut self.iter) {
            *slot = byte;
            count += 1;
        }
        Ok(count)
    }
}

/// A byte source over a borrowed slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    /// Read from `data` front to back.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }
}

impl ByteSource for SliceSource<'_> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.data.len());
        let (head, tail) = self.data.split_at(n);
        buf[..n].copy_from_slice(head);
        self.data = tail;
        Ok(n)
    }
}
