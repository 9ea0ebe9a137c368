//! Pull-driven DEFLATE compression engine.
//!
//! The engine wraps a deflate state machine and advances it one request at a
//! time: every [`produce_next`](ChunkProducer::produce_next) call fills the
//! caller's buffer (or finishes the stream) and returns. Input is requested
//! from the [`Feed`] only when the previous chunk has been consumed, and is
//! handed to the state machine in place without copying.

use crate::header::{GzipHeader, GzipTrailer, HEADER_LEN};
use flate2::{Compress, Compression, Crc, FlushCompress, Status};
use mkres_core::{
    ChunkProducer, CompressionConfig, Feed, Framing, MkresError, Result, SessionState,
};
use std::fmt;
use tracing::{debug, trace};

/// Framing bytes waiting to be copied out (gzip header or trailer).
#[derive(Debug, Default)]
struct Pending {
    buf: [u8; HEADER_LEN],
    pos: usize,
    len: usize,
}

impl Pending {
    fn set(&mut self, bytes: &[u8]) {
        debug_assert!(self.is_empty());
        self.buf[..bytes.len()].copy_from_slice(bytes);
        self.pos = 0;
        self.len = bytes.len();
    }

    fn is_empty(&self) -> bool {
        self.pos == self.len
    }

    /// Copy as much as fits into `out`, returning the count.
    fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let n = (self.len - self.pos).min(out.len());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}

/// Compresses the bytes of a [`Feed`] into gzip, zlib or raw DEFLATE.
///
/// The deflate window is always 32 KiB. Output is deterministic for a given
/// input and [`CompressionConfig`].
pub struct CompressionEngine<F> {
    deflate: Compress,
    feed: F,
    framing: Framing,
    state: SessionState,
    /// Offset of the first unconsumed byte in `feed.staged()`.
    consumed: usize,
    crc: Crc,
    pending: Pending,
    stream_end: bool,
    total_out: u64,
}

impl<F: Feed> CompressionEngine<F> {
    /// Create an engine pulling its input from `feed`.
    pub fn new(feed: F, config: &CompressionConfig) -> Result<Self> {
        config.validate()?;

        let level = config.level;
        let zlib_header = config.framing == Framing::Zlib;
        let deflate = Compress::new(Compression::new(u32::from(level.level())), zlib_header);

        let mut pending = Pending::default();
        if config.framing == Framing::Gzip {
            pending.set(&GzipHeader::for_level(level).to_bytes());
        }

        debug!(
            level = level.level(),
            framing = %config.framing,
            "compression engine initialized"
        );

        Ok(Self {
            deflate,
            feed,
            framing: config.framing,
            state: SessionState::Compressing,
            consumed: 0,
            crc: Crc::new(),
            pending,
            stream_end: false,
            total_out: 0,
        })
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Stream framing.
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Run one deflate round into `out`, returning (consumed, produced, status).
    fn round(&mut self, out: &mut [u8]) -> Result<(usize, usize, Status)> {
        let flush = if self.state == SessionState::InputExhausted {
            FlushCompress::Finish
        } else {
            FlushCompress::None
        };

        let input = &self.feed.staged()[self.consumed..];
        let before_in = self.deflate.total_in();
        let before_out = self.deflate.total_out();

        let status = self
            .deflate
            .compress(input, out, flush)
            .map_err(MkresError::engine)?;

        let consumed = (self.deflate.total_in() - before_in) as usize;
        let produced = (self.deflate.total_out() - before_out) as usize;

        if self.framing == Framing::Gzip {
            self.crc.update(&input[..consumed]);
        }
        self.consumed += consumed;

        Ok((consumed, produced, status))
    }
}

impl<F: Feed> ChunkProducer for CompressionEngine<F> {
    fn produce_next(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.state == SessionState::Finished {
            return Ok(0);
        }

        let mut written = self.pending.drain_into(out);

        while written < out.len() {
            if self.stream_end {
                // Deflate stream and trailer are both out.
                self.state = SessionState::Finished;
                break;
            }

            if self.state == SessionState::Compressing
                && self.consumed == self.feed.staged().len()
            {
                self.consumed = 0;
                if self.feed.pull()? == 0 {
                    self.state = SessionState::InputExhausted;
                }
            }

            let (consumed, produced, status) = self.round(&mut out[written..])?;
            written += produced;

            match status {
                Status::StreamEnd => {
                    self.stream_end = true;
                    if self.framing == Framing::Gzip {
                        self.pending.set(&GzipTrailer::from_crc(&self.crc).to_bytes());
                        written += self.pending.drain_into(&mut out[written..]);
                    }
                }
                Status::Ok => {}
                Status::BufError => {
                    if consumed == 0 && produced == 0 {
                        return Err(MkresError::engine("BufError (no progress possible)"));
                    }
                }
            }
        }

        // A full buffer whose last byte closed the stream: settle now so the
        // next call reports the end without another round.
        if self.stream_end && self.pending.is_empty() {
            self.state = SessionState::Finished;
        }

        trace!(bytes = written, state = ?self.state, "produced chunk");
        self.total_out += written as u64;
        Ok(written)
    }

    fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    fn total_in(&self) -> u64 {
        self.feed.total_in()
    }

    fn total_out(&self) -> u64 {
        self.total_out
    }
}

impl<F> fmt::Debug for CompressionEngine<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionEngine")
            .field("framing", &self.framing)
            .field("state", &self.state)
            .field("total_out", &self.total_out)
            .finish_non_exhaustive()
    }
}
