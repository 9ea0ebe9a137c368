//! # mkres Deflate
//!
//! Lazy, pull-driven DEFLATE compression for the mkres resource embedder.
//!
//! This crate turns a single-pass [`ByteSource`] into a lazily produced
//! sequence of gzip (or zlib, or raw DEFLATE) bytes without holding the whole
//! input or output in memory, and provides a one-shot [`decompress`] to check
//! the result.
//!
//! ## Example
//!
//! ```rust
//! use mkres_core::{CompressionConfig, SliceSource};
//! use mkres_deflate::{compress_session, decompress};
//!
//! let mut session = compress_session(SliceSource::new(b"teste"), &CompressionConfig::new()).unwrap();
//! let compressed: Vec<u8> = session.cursor().unwrap().collect::<Result<_, _>>().unwrap();
//!
//! let mut output = [0u8; 5];
//! let n = decompress(&compressed, &mut output).unwrap();
//! assert_eq!(&output[..n], b"teste");
//! ```
//!
//! ## Defaults
//!
//! - Level 9 (resources are compressed once and embedded forever)
//! - Gzip framing with a fixed 10-byte header (mtime 0), so output is
//!   reproducible
//! - 32 KiB window
//! - 8 KiB staging and ready buffers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod decompress;
pub mod engine;
pub mod header;

// Re-exports
pub use decompress::{decompress, decompress_framed, decompress_with_capacity, detect_framing};
pub use engine::CompressionEngine;
pub use header::{GZIP_MAGIC, GzipHeader, GzipTrailer};

use mkres_core::{
    BufferedFeeder, ByteSource, ChunkProducer, CompressionConfig, Passthrough, Result, Session,
    SliceSource, Transform,
};

/// A session compressing `source` per `config`.
pub fn compress_session<S: ByteSource>(
    source: S,
    config: &CompressionConfig,
) -> Result<Session<CompressionEngine<BufferedFeeder<S>>>> {
    config.validate()?;
    let feeder = BufferedFeeder::new(source, config.buffer_len)?;
    let engine = CompressionEngine::new(feeder, config)?;
    Session::new(engine, config.buffer_len)
}

/// A session producing the bytes of one embedded resource.
///
/// [`Transform::None`] passes the bytes through, [`Transform::Gzip`] runs them
/// through the engine with `config`.
pub fn resource_session<'a, S: ByteSource + 'a>(
    source: S,
    transform: Transform,
    config: &CompressionConfig,
) -> Result<Session<Box<dyn ChunkProducer + 'a>>> {
    config.validate()?;
    let feeder = BufferedFeeder::new(source, config.buffer_len)?;
    let producer: Box<dyn ChunkProducer + 'a> = match transform {
        Transform::None => Box::new(Passthrough::new(feeder)),
        Transform::Gzip => Box::new(CompressionEngine::new(feeder, config)?),
    };
    Session::new(producer, config.buffer_len)
}

/// Compress a whole slice into a vector.
pub fn compress_to_vec(data: &[u8], config: &CompressionConfig) -> Result<Vec<u8>> {
    let mut session = compress_session(SliceSource::new(data), config)?;
    let compressed = session.cursor()?.collect::<Result<Vec<u8>>>()?;
    Ok(compressed)
}
