//! Session configuration.

use crate::error::{MkresError, Result};
use std::fmt;
use std::str::FromStr;

/// Default capacity of the staging and ready buffers.
pub const DEFAULT_BUFFER_LEN: usize = 8192;

/// log2 of the deflate window size (32 KiB).
pub const WINDOW_BITS: u8 = 15;

/// Compression level (0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// No compression (stored blocks only).
    pub const NONE: Self = Self(0);
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Balanced compression.
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a level, rejecting values above 9.
    pub fn new(level: u8) -> Result<Self> {
        if level > Self::BEST.0 {
            return Err(MkresError::engine_init(format!(
                "compression level {} is outside 0-9",
                level
            )));
        }
        Ok(Self(level))
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

/// Resource embedding favours size over speed.
impl Default for CompressionLevel {
    fn default() -> Self {
        Self::BEST
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = MkresError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

/// Container wrapped around the deflate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Framing {
    /// RFC 1952 header and CRC-32/ISIZE trailer.
    #[default]
    Gzip,
    /// RFC 1950 header and Adler-32 trailer.
    Zlib,
    /// Bare RFC 1951 stream.
    Raw,
}

impl Framing {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zlib => "zlib",
            Self::Raw => "raw-deflate",
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The transform applied to an embedded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Transform {
    /// Bytes pass through unchanged.
    #[default]
    None,
    /// Bytes are gzip compressed.
    Gzip,
}

impl Transform {
    /// Name as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Transform {
    type Err = MkresError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            other => Err(MkresError::engine_init(format!(
                "unknown compression '{}', expected 'none' or 'gzip'",
                other
            ))),
        }
    }
}

/// Configuration of one compression session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressionConfig {
    /// Deflate level.
    pub level: CompressionLevel,
    /// Stream container.
    pub framing: Framing,
    /// Capacity of each of the two session buffers.
    pub buffer_len: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: CompressionLevel::default(),
            framing: Framing::default(),
            buffer_len: DEFAULT_BUFFER_LEN,
        }
    }
}

impl CompressionConfig {
    /// Default configuration: level 9, gzip framing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression level.
    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the stream framing.
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Set the buffer capacity.
    pub fn with_buffer_len(mut self, buffer_len: usize) -> Self {
        self.buffer_len = buffer_len;
        self
    }

    /// Check the configuration before any engine state is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_len == 0 {
            return Err(MkresError::engine_init("buffer length must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_level() {
        assert_eq!(CompressionLevel::NONE.level(), 0);
        assert_eq!(CompressionLevel::FAST.level(), 1);
        assert_eq!(CompressionLevel::DEFAULT.level(), 6);
        assert_eq!(CompressionLevel::BEST.level(), 9);
        assert_eq!(CompressionLevel::default(), CompressionLevel::BEST);

        assert!(matches!(
            CompressionLevel::new(10),
            Err(MkresError::EngineInit { .. })
        ));
        assert_eq!(CompressionLevel::try_from(3).unwrap().level(), 3);
    }

    #[test]
    fn test_transform_parse() {
        assert_eq!("none".parse::<Transform>().unwrap(), Transform::None);
        assert_eq!("GZIP".parse::<Transform>().unwrap(), Transform::Gzip);
        assert!("bzip2".parse::<Transform>().is_err());
        assert_eq!(Transform::Gzip.to_string(), "gzip");
    }

    #[test]
    fn test_config_defaults_and_validation() {
        let config = CompressionConfig::new();
        assert_eq!(config.level, CompressionLevel::BEST);
        assert_eq!(config.framing, Framing::Gzip);
        assert_eq!(config.buffer_len, DEFAULT_BUFFER_LEN);
        assert!(config.validate().is_ok());

        let config = config.with_buffer_len(0);
        assert!(matches!(
            config.validate(),
            Err(MkresError::EngineInit { .. })
        ));
    }
}
