//! Lazy, single-pass byte sequences.
//!
//! A [`Session`] owns a [`ChunkProducer`] and the fixed-size ready buffer its
//! output lands in. Bytes are read through the session's one [`Cursor`]:
//!
//! ```rust
//! use mkres_core::{BufferedFeeder, Passthrough, Session, SliceSource};
//!
//! let feeder = BufferedFeeder::new(SliceSource::new(b"teste"), 4).unwrap();
//! let mut session = Session::new(Passthrough::new(feeder), 4).unwrap();
//!
//! let bytes: Vec<u8> = session.cursor().unwrap().collect::<Result<_, _>>().unwrap();
//! assert_eq!(bytes, b"teste");
//! assert!(session.is_ended());
//! ```
//!
//! The sequence cannot be restarted. Producing it again needs a new session
//! over a fresh source. A session hands out one active cursor for its whole
//! life; after the end it only hands out ended cursors.

use crate::error::{MkresError, Result};
use crate::traits::ChunkProducer;
use tracing::{debug, trace};

/// Byte totals of a session that reached its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Bytes pulled from the source.
    pub bytes_in: u64,
    /// Bytes delivered to the consumer.
    pub bytes_out: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    Unclaimed,
    Active,
    Ended,
}

/// A producer together with its ready buffer and read position.
///
/// The producer (and with it the byte source) is dropped as soon as the end
/// is reached or a round fails, even if the session itself lives on.
/// Dropping the session early releases it as well.
#[derive(Debug)]
pub struct Session<P> {
    producer: Option<P>,
    ready: Box<[u8]>,
    pos: usize,
    len: usize,
    primed: bool,
    claim: Claim,
    stats: Option<SessionStats>,
}

impl<P: ChunkProducer> Session<P> {
    /// Create a session whose ready buffer holds `buffer_len` bytes.
    pub fn new(producer: P, buffer_len: usize) -> Result<Self> {
        if buffer_len == 0 {
            return Err(MkresError::engine_init(
                "ready buffer capacity must be non-zero",
            ));
        }
        Ok(Self {
            producer: Some(producer),
            ready: vec![0u8; buffer_len].into_boxed_slice(),
            pos: 0,
            len: 0,
            primed: false,
            claim: Claim::Unclaimed,
            stats: None,
        })
    }

    /// Claim the session's cursor.
    ///
    /// The first call returns the live cursor. Once the sequence has ended any
    /// call returns an ended cursor. Asking again while iteration is still in
    /// progress (the first cursor was dropped before the end) fails with
    /// [`MkresError::ProtocolViolation`].
    pub fn cursor(&mut self) -> Result<Cursor<'_, P>> {
        match self.claim {
            Claim::Unclaimed => {
                self.claim = Claim::Active;
                Ok(Cursor { session: self })
            }
            Claim::Active => Err(MkresError::protocol(
                "session already has an active cursor",
            )),
            Claim::Ended => Ok(Cursor { session: self }),
        }
    }

    /// Whether the sequence has reached its end.
    pub fn is_ended(&self) -> bool {
        self.claim == Claim::Ended
    }

    /// Byte totals, available once the sequence has ended.
    pub fn stats(&self) -> Option<SessionStats> {
        self.stats
    }

    /// Capacity of the ready buffer.
    pub fn buffer_len(&self) -> usize {
        self.ready.len()
    }

    fn advance(&mut self) -> Result<bool> {
        if self.claim == Claim::Ended {
            return Ok(false);
        }
        if self.primed && self.pos + 1 < self.len {
            self.pos += 1;
            return Ok(true);
        }

        let Some(producer) = self.producer.as_mut() else {
            self.end();
            return Ok(false);
        };

        match producer.produce_next(&mut self.ready) {
            Ok(0) => {
                debug_assert!(producer.is_finished());
                self.end();
                Ok(false)
            }
            Ok(n) => {
                trace!(bytes = n, "ready buffer refilled");
                self.len = n;
                self.pos = 0;
                self.primed = true;
                Ok(true)
            }
            Err(e) => {
                self.end();
                Err(e)
            }
        }
    }

    fn current(&self) -> Result<u8> {
        if self.claim == Claim::Ended {
            return Err(MkresError::protocol("cursor is at the end of the sequence"));
        }
        if !self.primed {
            return Err(MkresError::protocol("cursor has not been advanced yet"));
        }
        Ok(self.ready[self.pos])
    }

    fn end(&mut self) {
        if let Some(producer) = self.producer.take() {
            let stats = SessionStats {
                bytes_in: producer.total_in(),
                bytes_out: producer.total_out(),
            };
            debug!(
                bytes_in = stats.bytes_in,
                bytes_out = stats.bytes_out,
                finished = producer.is_finished(),
                "session ended"
            );
            self.stats = Some(stats);
        }
        self.primed = false;
        self.len = 0;
        self.pos = 0;
        self.claim = Claim::Ended;
    }
}

/// The single read position of a [`Session`].
///
/// Starts before the first byte: call [`advance`](Cursor::advance) to move
/// onto it. Cursors cannot be cloned.
#[derive(Debug)]
pub struct Cursor<'a, P: ChunkProducer> {
    session: &'a mut Session<P>,
}

impl<P: ChunkProducer> Cursor<'_, P> {
    /// Move to the next byte. Returns `false` at the end, and keeps returning
    /// `false` afterwards.
    pub fn advance(&mut self) -> Result<bool> {
        self.session.advance()
    }

    /// The byte under the cursor.
    ///
    /// Fails with [`MkresError::ProtocolViolation`] on an ended cursor or
    /// before the first [`advance`](Cursor::advance).
    pub fn current(&self) -> Result<u8> {
        self.session.current()
    }

    /// Whether the cursor is permanently at the end.
    pub fn at_end(&self) -> bool {
        self.session.is_ended()
    }

    /// Byte totals, available once the cursor is at the end.
    pub fn stats(&self) -> Option<SessionStats> {
        self.session.stats()
    }
}

impl<P: ChunkProducer> Iterator for Cursor<'_, P> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.session.advance() {
            Ok(true) => Some(self.session.current()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<P: ChunkProducer> std::iter::FusedIterator for Cursor<'_, P> {}
