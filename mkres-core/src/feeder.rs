//! Fixed-capacity bridge between a [`ByteSource`] and a producer's input demand.

use crate::error::{MkresError, Result};
use crate::traits::{ByteSource, Feed};

/// Copies the byte source into a reused staging buffer, one chunk per pull.
///
/// The staging buffer is allocated once with the requested capacity and never
/// resized. Each [`pull`](Feed::pull) overwrites it from the start; bytes past
/// the reported fill length are stale and never exposed.
#[derive(Debug)]
pub struct BufferedFeeder<S> {
    source: S,
    staging: Box<[u8]>,
    filled: usize,
    total_in: u64,
    exhausted: bool,
}

impl<S: ByteSource> BufferedFeeder<S> {
    /// Create a feeder with a staging buffer of `capacity` bytes.
    pub fn new(source: S, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MkresError::engine_init(
                "staging buffer capacity must be non-zero",
            ));
        }
        Ok(Self {
            source,
            staging: vec![0u8; capacity].into_boxed_slice(),
            filled: 0,
            total_in: 0,
            exhausted: false,
        })
    }

    /// Capacity of the staging buffer.
    pub fn capacity(&self) -> usize {
        self.staging.len()
    }

    /// Whether the source has reported its end.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<S: ByteSource> Feed for BufferedFeeder<S> {
    fn pull(&mut self) -> Result<usize> {
        if self.exhausted {
            self.filled = 0;
            return Ok(0);
        }

        let n = self.source.fill(&mut self.staging)?;
        debug_assert!(n <= self.staging.len());
        self.filled = n;
        self.total_in += n as u64;
        if n == 0 {
            self.exhausted = true;
        }
        Ok(n)
    }

    fn staged(&self) -> &[u8] {
        &self.staging[..self.filled]
    }

    fn total_in(&self) -> u64 {
        self.total_in
    }
}
