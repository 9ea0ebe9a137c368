//! Core traits for the pull pipeline.
//!
//! A session is assembled from three seams:
//!
//! - [`ByteSource`]: the upstream, single-pass input.
//! - [`Feed`]: hands the next fixed-size input chunk to a producer.
//! - [`ChunkProducer`]: turns fed input into output chunks, one request at a
//!   time. The deflate engine and the pass-through producer both implement it,
//!   so the feeder and the cursor never depend on a particular codec.

use crate::error::Result;

/// Progress of a producer through its input.
///
/// Transitions only move forward: `Compressing` → `InputExhausted` →
/// `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SessionState {
    /// Input may still arrive.
    #[default]
    Compressing,
    /// The source is exhausted; remaining output is being flushed.
    InputExhausted,
    /// Every output byte has been produced.
    Finished,
}

/// A single-pass, forward-only sequence of bytes of unknown length.
pub trait ByteSource {
    /// Copy the next bytes into `buf`.
    ///
    /// Fills `buf` completely unless the source ends first. Returns 0 only when
    /// the source is exhausted (or `buf` is empty). Never reads past the end of
    /// the source.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).fill(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).fill(buf)
    }
}

/// Capability to pull the next input chunk.
///
/// `pull` replaces the staged chunk; it must not be called again before the
/// producer has consumed everything [`staged`](Feed::staged) returned.
pub trait Feed {
    /// Refill the staging buffer and return how many bytes it now holds.
    ///
    /// 0 signals that the source is exhausted.
    fn pull(&mut self) -> Result<usize>;

    /// The bytes filled by the most recent [`pull`](Feed::pull).
    fn staged(&self) -> &[u8];

    /// Total bytes pulled from the source so far.
    fn total_in(&self) -> u64;
}

/// A request/response transform producing output one chunk at a time.
pub trait ChunkProducer {
    /// Write the next ready bytes into `out`, starting at `out[0]`.
    ///
    /// Returns `out.len()` while more output may follow, fewer bytes for the
    /// final chunk, and 0 once the producer is finished.
    fn produce_next(&mut self, out: &mut [u8]) -> Result<usize>;

    /// Whether the producer has emitted its final byte.
    fn is_finished(&self) -> bool;

    /// Input bytes consumed so far.
    fn total_in(&self) -> u64;

    /// Output bytes produced so far.
    fn total_out(&self) -> u64;
}

impl<P: ChunkProducer + ?Sized> ChunkProducer for Box<P> {
    fn produce_next(&mut self, out: &mut [u8]) -> Result<usize> {
        (**self).produce_next(out)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn total_in(&self) -> u64 {
        (**self).total_in()
    }

    fn total_out(&self) -> u64 {
        (**self).total_out()
    }
}
