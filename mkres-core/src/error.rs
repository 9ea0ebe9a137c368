//! Error types for mkres operations.
//!
//! Every failure in a compression session, a bulk decompression, or a misuse
//! of the single-pass cursor surfaces as a [`MkresError`]. Nothing is retried.

use std::fmt;
use std::io;
use thiserror::Error;

/// Why a bulk decompression did not reach a clean end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressFailure {
    /// The input ended before the stream (or its trailer) was complete.
    Truncated,
    /// The input is not a valid compressed stream.
    Corrupted,
    /// The output buffer filled up before the stream ended.
    OutputTooSmall,
    /// The stream decoded but its trailer checksum or length disagrees.
    ChecksumMismatch,
}

impl fmt::Display for DecompressFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Truncated => "truncated input",
            Self::Corrupted => "corrupted input",
            Self::OutputTooSmall => "output buffer too small",
            Self::ChecksumMismatch => "checksum mismatch",
        };
        f.write_str(s)
    }
}

/// The main error type for mkres operations.
#[derive(Debug, Error)]
pub enum MkresError {
    /// I/O error from an underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The compression engine could not be set up.
    #[error("Engine initialization failed: {message}")]
    EngineInit {
        /// Description of the rejected configuration.
        message: String,
    },

    /// A compression round reported an unexpected status.
    #[error("Compression engine failed with status {status}")]
    Engine {
        /// Status reported by the deflate state machine.
        status: String,
    },

    /// Bulk decompression did not cleanly reach the end of the stream.
    #[error("Decompression failed ({reason}): {status}")]
    Decompress {
        /// Classified cause.
        reason: DecompressFailure,
        /// Status or detail reported by the inflate state machine.
        status: String,
    },

    /// Invalid gzip/zlib header.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// The single-pass cursor contract was broken by the caller.
    #[error("Protocol violation: {message}")]
    ProtocolViolation {
        /// What the caller attempted.
        message: &'static str,
    },
}

/// Result type alias for mkres operations.
pub type Result<T> = std::result::Result<T, MkresError>;

impl MkresError {
    /// Create an engine initialization error.
    pub fn engine_init(message: impl Into<String>) -> Self {
        Self::EngineInit {
            message: message.into(),
        }
    }

    /// Create an engine error from a native status.
    pub fn engine(status: impl fmt::Display) -> Self {
        Self::Engine {
            status: status.to_string(),
        }
    }

    /// Create a decompression error.
    pub fn decompress(reason: DecompressFailure, status: impl fmt::Display) -> Self {
        Self::Decompress {
            reason,
            status: status.to_string(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a protocol violation error.
    pub fn protocol(message: &'static str) -> Self {
        Self::ProtocolViolation { message }
    }

    /// The decompression failure reason, if this is a decompression error.
    pub fn decompress_failure(&self) -> Option<DecompressFailure> {
        match self {
            Self::Decompress { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Whether this error is a broken cursor contract.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MkresError::engine("BufError");
        assert!(err.to_string().contains("BufError"));

        let err = MkresError::decompress(DecompressFailure::Truncated, "Ok");
        assert!(err.to_string().contains("truncated input"));
        assert_eq!(err.decompress_failure(), Some(DecompressFailure::Truncated));

        let err = MkresError::protocol("cursor is at end");
        assert!(err.is_protocol_violation());
        assert!(err.to_string().contains("cursor is at end"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: MkresError = io_err.into();
        assert!(matches!(err, MkresError::Io(_)));
        assert!(!err.is_protocol_violation());
        assert_eq!(err.decompress_failure(), None);
    }
}
