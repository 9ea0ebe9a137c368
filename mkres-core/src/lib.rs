//! # mkres Core
//!
//! Core components for the mkres resource embedder.
//!
//! This crate provides the codec-independent half of the lazy compression
//! pipeline:
//!
//! - [`source`]: [`ByteSource`] adapters for readers, iterators and slices
//! - [`feeder`]: fixed-capacity staging of source bytes ([`BufferedFeeder`])
//! - [`passthrough`]: the identity producer used for uncompressed resources
//! - [`sequence`]: the single-pass [`Session`] and its [`Cursor`]
//! - [`traits`]: the seams between them
//! - [`config`]: compression level, framing, buffer sizes
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! ```text
//! consumer ──pull──▶ Cursor ──produce_next──▶ ChunkProducer ──pull──▶ Feed ──fill──▶ ByteSource
//!          ◀─byte──  (ready buffer)          (deflate / passthrough)  (staging buffer)
//! ```
//!
//! Every session owns exactly two fixed-size buffers, so memory use does not
//! depend on the input size.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod feeder;
pub mod passthrough;
pub mod sequence;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use config::{
    CompressionConfig, CompressionLevel, DEFAULT_BUFFER_LEN, Framing, Transform, WINDOW_BITS,
};
pub use error::{DecompressFailure, MkresError, Result};
pub use feeder::BufferedFeeder;
pub use passthrough::Passthrough;
pub use sequence::{Cursor, Session, SessionStats};
pub use source::{IterSource, ReaderSource, SliceSource};
pub use traits::{ByteSource, ChunkProducer, Feed, SessionState};
