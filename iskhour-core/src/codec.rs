//! Versioned share-token codec: varint stream, XOR checksum, base64url.
//!
//! Token layout (version `'1'`): a literal version character followed by
//! the unpadded base64url encoding of eight little-endian base-128 varints
//! `[isk, lp, sites, start_time, end_time - start_time, min_time,
//! max_time, chars]` plus a trailing XOR checksum byte.
//!
//! The checksum is a single XOR fold seeded with a fixed constant. It only
//! guards against mangled copy/paste, not tampering; changing it would
//! invalidate every already-shared link, so it stays as-is.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

use crate::record::PerformanceRecord;

/// Version tag of the current token format.
pub const FORMAT_VERSION: char = '1';

/// Fixed non-zero seed folded into the checksum byte.
const CHECKSUM_SEED: u8 = 85;

/// Why a token could not be produced or read back.
///
/// Decode callers are expected to surface all of these uniformly as
/// "token could not be decoded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token string was empty.
    #[error("empty token")]
    Empty,
    /// The leading version character is not a format this codec knows.
    #[error("unknown token version '{0}'")]
    UnknownVersion(char),
    /// The payload is not valid unpadded base64url.
    #[error("malformed base64url payload")]
    Base64,
    /// The XOR fold over the payload did not reduce to the seed.
    #[error("checksum mismatch")]
    Checksum,
    /// The byte stream ended before all fields were read.
    #[error("truncated varint stream")]
    Truncated,
    /// A varint ran past the width of a u64.
    #[error("overlong varint")]
    Overlong,
    /// A decoded value does not fit the target field.
    #[error("value out of range for field {0}")]
    FieldRange(&'static str),
    /// The encoder refused a record whose end precedes its start.
    #[error("end time precedes start time")]
    NegativeDuration,
    /// Unparsed bytes remained after the final field.
    #[error("trailing bytes after final field")]
    TrailingBytes,
}

fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn read_varint(bytes: &[u8], pos: &mut usize) -> Result<u64, TokenError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *bytes.get(*pos).ok_or(TokenError::Truncated)?;
        *pos += 1;
        let chunk = u64::from(byte & 0x7F);
        if shift >= 64 || (shift == 63 && chunk > 1) {
            return Err(TokenError::Overlong);
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

fn xor_fold(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Serialize a record into a shareable token.
///
/// # Errors
///
/// Returns `TokenError::NegativeDuration` when `end_time < start_time`;
/// varints carry unsigned magnitudes only.
pub fn encode(record: &PerformanceRecord) -> Result<String, TokenError> {
    let delta = record
        .end_time
        .checked_sub(record.start_time)
        .ok_or(TokenError::NegativeDuration)?;

    let mut payload = Vec::with_capacity(32);
    for value in [
        record.isk,
        record.lp,
        u64::from(record.sites),
        record.start_time,
        delta,
        record.min_time,
        record.max_time,
        u64::from(record.chars),
    ] {
        write_varint(&mut payload, value);
    }
    payload.push(CHECKSUM_SEED ^ xor_fold(&payload));

    let mut token = String::with_capacity(1 + payload.len().div_ceil(3) * 4);
    token.push(FORMAT_VERSION);
    token.push_str(&URL_SAFE_NO_PAD.encode(&payload));
    Ok(token)
}

/// Decode a token back into a record, validating integrity first.
///
/// # Errors
///
/// Any deviation from the format - unknown version tag, malformed
/// base64url, checksum mismatch, truncated or overlong varints, values too
/// wide for their field, or trailing bytes - is a decode failure. No
/// partial recovery is attempted.
pub fn decode(token: &str) -> Result<PerformanceRecord, TokenError> {
    let mut chars = token.chars();
    let version = chars.next().ok_or(TokenError::Empty)?;
    if version != FORMAT_VERSION {
        return Err(TokenError::UnknownVersion(version));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(chars.as_str())
        .map_err(|_| TokenError::Base64)?;
    // Folding the checksum byte back in cancels the payload to the seed.
    if xor_fold(&bytes) != CHECKSUM_SEED {
        return Err(TokenError::Checksum);
    }

    let payload = &bytes[..bytes.len() - 1];
    let mut pos = 0;
    let mut fields = [0u64; 8];
    for field in &mut fields {
        *field = read_varint(payload, &mut pos)?;
    }
    if pos != payload.len() {
        return Err(TokenError::TrailingBytes);
    }

    let [isk, lp, sites, start_time, delta, min_time, max_time, chars] = fields;
    Ok(PerformanceRecord {
        isk,
        lp,
        sites: u32::try_from(sites).map_err(|_| TokenError::FieldRange("sites"))?,
        start_time,
        end_time: start_time
            .checked_add(delta)
            .ok_or(TokenError::FieldRange("end_time"))?,
        min_time,
        max_time,
        chars: u32::try_from(chars).map_err(|_| TokenError::FieldRange("chars"))?,
    })
}
