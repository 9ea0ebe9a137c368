//! GZIP member header and trailer (RFC 1952).

use flate2::Crc;
use mkres_core::{CompressionLevel, DecompressFailure, MkresError, Result};

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Operating system byte for "unknown".
pub const OS_UNKNOWN: u8 = 255;

/// Length of a header without optional fields.
pub const HEADER_LEN: usize = 10;

/// Length of the CRC-32 + ISIZE trailer.
pub const TRAILER_LEN: usize = 8;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits that must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// GZIP member header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipHeader {
    /// Flags.
    pub flags: u8,
    /// Modification time (Unix timestamp, 0 = unknown).
    pub mtime: u32,
    /// Extra flags (2 = maximum compression, 4 = fastest).
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
    /// Original filename (if FNAME flag set).
    pub filename: Option<String>,
    /// Comment (if FCOMMENT flag set).
    pub comment: Option<String>,
}

impl Default for GzipHeader {
    fn default() -> Self {
        Self {
            flags: 0,
            mtime: 0,
            xfl: 0,
            os: OS_UNKNOWN,
            filename: None,
            comment: None,
        }
    }
}

impl GzipHeader {
    /// Minimal header for a stream compressed at `level`.
    ///
    /// The modification time stays 0 so that output only depends on the input.
    pub fn for_level(level: CompressionLevel) -> Self {
        let xfl = match level.level() {
            0..=1 => 4,
            9 => 2,
            _ => 0,
        };
        Self {
            xfl,
            ..Self::default()
        }
    }

    /// The fixed 10-byte form (optional fields are not written).
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mtime = self.mtime.to_le_bytes();
        [
            GZIP_MAGIC[0],
            GZIP_MAGIC[1],
            CM_DEFLATE,
            self.flags & flags::FTEXT,
            mtime[0],
            mtime[1],
            mtime[2],
            mtime[3],
            self.xfl,
            self.os,
        ]
    }

    /// Parse a header at the start of `data`.
    ///
    /// Returns the header and the number of bytes it occupies.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        let fixed = data.get(..HEADER_LEN).ok_or_else(|| truncated("gzip header"))?;

        if fixed[0..2] != GZIP_MAGIC {
            return Err(MkresError::invalid_header(format!(
                "bad gzip magic {:02x?}",
                &fixed[0..2]
            )));
        }
        if fixed[2] != CM_DEFLATE {
            return Err(MkresError::invalid_header(format!(
                "unsupported gzip method {}",
                fixed[2]
            )));
        }

        let flag_bits = fixed[3];
        if flag_bits & flags::RESERVED != 0 {
            return Err(MkresError::invalid_header(format!(
                "reserved gzip flags set: {:#04x}",
                flag_bits
            )));
        }

        let mut header = Self {
            flags: flag_bits,
            mtime: u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]),
            xfl: fixed[8],
            os: fixed[9],
            filename: None,
            comment: None,
        };
        let mut pos = HEADER_LEN;

        if flag_bits & flags::FEXTRA != 0 {
            let xlen = data
                .get(pos..pos + 2)
                .ok_or_else(|| truncated("gzip extra length"))?;
            let xlen = u16::from_le_bytes([xlen[0], xlen[1]]) as usize;
            pos += 2;
            if data.len() < pos + xlen {
                return Err(truncated("gzip extra field"));
            }
            pos += xlen;
        }

        if flag_bits & flags::FNAME != 0 {
            let (name, next) = read_null_terminated(data, pos)?;
            header.filename = Some(name);
            pos = next;
        }

        if flag_bits & flags::FCOMMENT != 0 {
            let (comment, next) = read_null_terminated(data, pos)?;
            header.comment = Some(comment);
            pos = next;
        }

        if flag_bits & flags::FHCRC != 0 {
            let stored = data
                .get(pos..pos + 2)
                .ok_or_else(|| truncated("gzip header crc"))?;
            let stored = u16::from_le_bytes([stored[0], stored[1]]);
            let mut crc = Crc::new();
            crc.update(&data[..pos]);
            let computed = (crc.sum() & 0xFFFF) as u16;
            if stored != computed {
                return Err(MkresError::invalid_header(format!(
                    "header crc mismatch: expected {:#06x}, computed {:#06x}",
                    stored, computed
                )));
            }
            pos += 2;
        }

        Ok((header, pos))
    }
}

/// CRC-32 and length (mod 2^32) of the uncompressed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipTrailer {
    /// CRC-32 of the uncompressed data.
    pub crc: u32,
    /// Uncompressed length modulo 2^32.
    pub isize: u32,
}

impl GzipTrailer {
    /// Trailer for everything fed through `crc`.
    pub fn from_crc(crc: &Crc) -> Self {
        Self {
            crc: crc.sum(),
            isize: crc.amount(),
        }
    }

    /// Little-endian wire form.
    pub fn to_bytes(&self) -> [u8; TRAILER_LEN] {
        let mut out = [0u8; TRAILER_LEN];
        out[..4].copy_from_slice(&self.crc.to_le_bytes());
        out[4..].copy_from_slice(&self.isize.to_le_bytes());
        out
    }

    /// Parse the trailer from the first 8 bytes of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let t = data.get(..TRAILER_LEN).ok_or_else(|| truncated("gzip trailer"))?;
        Ok(Self {
            crc: u32::from_le_bytes([t[0], t[1], t[2], t[3]]),
            isize: u32::from_le_bytes([t[4], t[5], t[6], t[7]]),
        })
    }
}

fn truncated(what: &str) -> MkresError {
    MkresError::decompress(DecompressFailure::Truncated, format!("{} incomplete", what))
}

/// Read a null-terminated string starting at `pos`.
fn read_null_terminated(data: &[u8], pos: usize) -> Result<(String, usize)> {
    let rest = data.get(pos..).unwrap_or_default();
    let end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| truncated("gzip header string"))?;
    let text = String::from_utf8_lossy(&rest[..end]).into_owned();
    Ok((text, pos + end + 1))
}
