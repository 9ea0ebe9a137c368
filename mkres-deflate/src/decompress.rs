//! One-shot, whole-buffer decompression.
//!
//! Used to verify what the engine produced. The whole compressed stream must
//! be available and the caller must know (or bound) the decompressed size;
//! anything short of a clean end of stream is an error, never a partial
//! result.

use crate::header::{GZIP_MAGIC, GzipHeader, GzipTrailer};
use flate2::{Crc, Decompress, FlushDecompress, Status};
use mkres_core::{DecompressFailure, Framing, MkresError, Result, WINDOW_BITS};

/// Guess the framing of a compressed buffer from its first bytes.
///
/// A raw DEFLATE stream never starts with a low nibble of 8 (a stored block
/// header is followed by zero padding), so the zlib check cannot misfire.
pub fn detect_framing(data: &[u8]) -> Framing {
    match data {
        [a, b, ..] if [*a, *b] == GZIP_MAGIC => Framing::Gzip,
        [cmf, flg, ..] if is_zlib_header(*cmf, *flg) => Framing::Zlib,
        _ => Framing::Raw,
    }
}

fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    let check = (u16::from(cmf) << 8) | u16::from(flg);
    cmf & 0x0F == 8 && cmf >> 4 <= WINDOW_BITS - 8 && check % 31 == 0
}

/// Decompress `compressed` into `output` in a single inflate call.
///
/// The framing (gzip, zlib or raw DEFLATE) is detected from the input. For
/// gzip the trailer's CRC-32 and length are checked. Returns the number of
/// bytes written to `output`.
pub fn decompress(compressed: &[u8], output: &mut [u8]) -> Result<usize> {
    decompress_framed(compressed, output, detect_framing(compressed))
}

/// Like [`decompress`], with the framing given by the caller.
pub fn decompress_framed(compressed: &[u8], output: &mut [u8], framing: Framing) -> Result<usize> {
    match framing {
        Framing::Gzip => decompress_gzip(compressed, output),
        Framing::Zlib => inflate_once(compressed, output, true).map(|(written, _)| written),
        Framing::Raw => inflate_once(compressed, output, false).map(|(written, _)| written),
    }
}

/// Decompress into a freshly allocated buffer of at most `capacity` bytes.
pub fn decompress_with_capacity(compressed: &[u8], capacity: usize) -> Result<Vec<u8>> {
    let mut output = vec![0u8; capacity];
    let written = decompress(compressed, &mut output)?;
    output.truncate(written);
    Ok(output)
}

fn decompress_gzip(compressed: &[u8], output: &mut [u8]) -> Result<usize> {
    let (_, header_len) = GzipHeader::parse(compressed).map_err(|e| match e {
        MkresError::InvalidHeader { message } => {
            MkresError::decompress(DecompressFailure::Corrupted, message)
        }
        other => other,
    })?;

    let body = &compressed[header_len..];
    let (written, consumed) = inflate_once(body, output, false)?;

    let trailer = GzipTrailer::parse(&body[consumed..])?;

    let mut crc = Crc::new();
    crc.update(&output[..written]);
    let actual = GzipTrailer::from_crc(&crc);
    if actual != trailer {
        return Err(MkresError::decompress(
            DecompressFailure::ChecksumMismatch,
            format!(
                "expected crc {:#010x} / size {}, computed crc {:#010x} / size {}",
                trailer.crc, trailer.isize, actual.crc, actual.isize
            ),
        ));
    }

    Ok(written)
}

/// Inflate in one call, returning (bytes written, bytes consumed).
fn inflate_once(input: &[u8], output: &mut [u8], zlib_header: bool) -> Result<(usize, usize)> {
    let mut inflater = Decompress::new(zlib_header);
    let status = inflater
        .decompress(input, output, FlushDecompress::Finish)
        .map_err(|e| MkresError::decompress(DecompressFailure::Corrupted, e))?;

    let written = inflater.total_out() as usize;
    let consumed = inflater.total_in() as usize;

    match status {
        Status::StreamEnd => Ok((written, consumed)),
        Status::Ok | Status::BufError => {
            let reason = if written == output.len() {
                DecompressFailure::OutputTooSmall
            } else {
                DecompressFailure::Truncated
            };
            Err(MkresError::decompress(reason, format!("{:?}", status)))
        }
    }
}
