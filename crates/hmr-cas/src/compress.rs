// SPDX-License-Identifier: Apache-2.0
//! An LZ-style chunk compressor (spec §4.C).
//!
//! The algorithm is replaceable; the only contract the rest of the runtime
//! relies on is `decompress(compress(x)) == x` bitwise (spec §8 round-trip
//! laws). This implementation is a small LZSS variant: a greedy match finder
//! over a 4-byte-anchored hash chain, literal runs and back-references
//! encoded as a simple tagged stream.

use std::collections::HashMap;

use thiserror::Error;

const MIN_MATCH: usize = 4;
const TAG_LITERAL: u8 = 0;
const TAG_COPY: u8 = 1;

/// Errors returned while decoding a compressed chunk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompressError {
    /// The stream ended in the middle of a token header.
    #[error("truncated compressed stream")]
    Truncated,
    /// A copy token referenced an offset behind the start of the output.
    #[error("copy token offset {offset} exceeds decoded length {decoded_len}")]
    InvalidBackref {
        /// The offset the token requested.
        offset: usize,
        /// How many bytes had been decoded so far.
        decoded_len: usize,
    },
    /// The tag byte was neither a literal nor a copy token.
    #[error("unknown token tag {0}")]
    UnknownTag(u8),
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, DecompressError> {
    let slice = bytes.get(at..at + 4).ok_or(DecompressError::Truncated)?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(slice);
    Ok(u32::from_le_bytes(buf))
}

/// Compresses `input` into the tagged literal/copy-token stream.
///
/// Matches of at least [`MIN_MATCH`] bytes against any earlier position in
/// `input` are encoded as back-references; everything else is emitted as a
/// literal run. Output is never larger than `input.len()` by more than a
/// small fixed per-chunk header overhead in the worst case (fully
/// incompressible input).
#[must_use]
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    push_u32(&mut out, input.len() as u32);

    // anchor: 4-byte prefix -> most recent position with that prefix.
    let mut anchors: HashMap<[u8; 4], usize> = HashMap::new();
    let mut literal_start = 0usize;
    let mut pos = 0usize;

    let flush_literals = |out: &mut Vec<u8>, start: usize, end: usize| {
        if end > start {
            out.push(TAG_LITERAL);
            push_u32(out, (end - start) as u32);
            out.extend_from_slice(&input[start..end]);
        }
    };

    while pos + MIN_MATCH <= input.len() {
        let mut key = [0u8; 4];
        key.copy_from_slice(&input[pos..pos + 4]);

        let match_at = anchors.get(&key).copied();
        anchors.insert(key, pos);

        if let Some(start) = match_at {
            let mut len = 0usize;
            while pos + len < input.len() && input[start + len] == input[pos + len] {
                len += 1;
            }
            if len >= MIN_MATCH {
                flush_literals(&mut out, literal_start, pos);
                out.push(TAG_COPY);
                push_u32(&mut out, (pos - start) as u32);
                push_u32(&mut out, len as u32);
                pos += len;
                literal_start = pos;
                continue;
            }
        }
        pos += 1;
    }

    flush_literals(&mut out, literal_start, input.len());
    out
}

/// Decodes a stream produced by [`compress`].
///
/// # Errors
///
/// Returns a [`DecompressError`] if the stream is truncated, carries an
/// unknown tag byte, or a copy token references bytes before the start of
/// the output so far.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecompressError> {
    let declared_len = read_u32(input, 0)? as usize;
    let mut out = Vec::with_capacity(declared_len);
    let mut cursor = 4usize;

    while cursor < input.len() {
        let tag = input[cursor];
        cursor += 1;
        match tag {
            TAG_LITERAL => {
                let len = read_u32(input, cursor)? as usize;
                cursor += 4;
                let bytes = input
                    .get(cursor..cursor + len)
                    .ok_or(DecompressError::Truncated)?;
                out.extend_from_slice(bytes);
                cursor += len;
            }
            TAG_COPY => {
                let offset = read_u32(input, cursor)? as usize;
                cursor += 4;
                let len = read_u32(input, cursor)? as usize;
                cursor += 4;
                if offset == 0 || offset > out.len() {
                    return Err(DecompressError::InvalidBackref {
                        offset,
                        decoded_len: out.len(),
                    });
                }
                let start = out.len() - offset;
                for i in 0..len {
                    let byte = out[start + i];
                    out.push(byte);
                }
            }
            other => return Err(DecompressError::UnknownTag(other)),
        }
    }
    Ok(out)
}
