//! Identity producer for resources embedded without compression.

use crate::error::Result;
use crate::traits::{ChunkProducer, Feed, SessionState};

/// Copies fed input to the output unchanged.
///
/// Follows the same request/response contract as the deflate engine so a
/// session does not care which one it drives.
#[derive(Debug)]
pub struct Passthrough<F> {
    feed: F,
    state: SessionState,
    consumed: usize,
    total_out: u64,
}

impl<F: Feed> Passthrough<F> {
    /// Create a pass-through producer over `feed`.
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            state: SessionState::Compressing,
            consumed: 0,
            total_out: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }
}

impl<F: Feed> ChunkProducer for Passthrough<F> {
    fn produce_next(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.state == SessionState::Finished {
            return Ok(0);
        }

        let mut written = 0;
        while written < out.len() {
            if self.consumed == self.feed.staged().len() {
                self.consumed = 0;
                if self.feed.pull()? == 0 {
                    self.state = SessionState::Finished;
                    break;
                }
            }

            let staged = &self.feed.staged()[self.consumed..];
            let n = staged.len().min(out.len() - written);
            out[written..written + n].copy_from_slice(&staged[..n]);
            self.consumed += n;
            written += n;
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeder::BufferedFeeder;
    use crate::source::SliceSource;

    fn drain<P: ChunkProducer>(producer: &mut P, chunk: usize) -> Vec<u8> {
        let mut out = vec![0u8; chunk];
        let mut all = Vec::new();
        loop {
            let n = producer.produce_next(&mut out).unwrap();
            if n == 0 {
                break;
            }
            all.extend_from_slice(&out[..n]);
        }
        all
    }

    #[test]
    fn test_passthrough_identity() {
        let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
        for (staging, chunk) in [(16, 16), (7, 16), (64, 5), (1000, 1000), (1001, 999)] {
            let feeder = BufferedFeeder::new(SliceSource::new(&data), staging).unwrap();
            let mut producer = Passthrough::new(feeder);
            assert_eq!(drain(&mut producer, chunk), data);
            assert!(producer.is_finished());
            assert_eq!(producer.total_in(), 1000);
            assert_eq!(producer.total_out(), 1000);
        }
    }

    #[test]
    fn test_passthrough_empty() {
        let feeder = BufferedFeeder::new(SliceSource::new(b""), 8).unwrap();
        let mut producer = Passthrough::new(feeder);
        let mut out = [0u8; 8];
        assert_eq!(producer.produce_next(&mut out).unwrap(), 0);
        assert_eq!(producer.state(), SessionState::Finished);
        assert_eq!(producer.produce_next(&mut out).unwrap(), 0);
    }
}
