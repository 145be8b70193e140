//! Hex digit decoding for RAM and screen payloads
//!
//! Every binary field on the wire is a run of two-character hex pairs.
//! Both upper and lower case digits are accepted.

use crate::error::{Field, ProtocolError, Result};
use hex::FromHexError;

/// Decode the byte whose two hex digits start at `offset`
pub fn byte_at(text: &[u8], offset: usize, field: Field) -> Result<u8> {
    if text.len() < offset + 2 {
        return Err(ProtocolError::Truncated {
            field,
            expected: offset + 2,
            actual: text.len(),
        });
    }
    let mut out = [0u8; 1];
    decode_into(&text[offset..offset + 2], &mut out, field).map_err(|e| shift(e, offset))?;
    Ok(out[0])
}

/// Decode `text` into `out`, which must be exactly half as long as `text`
pub fn decode_into(text: &[u8], out: &mut [u8], field: Field) -> Result<()> {
    hex::decode_to_slice(text, out).map_err(|e| match e {
        FromHexError::InvalidHexCharacter { c, index } => ProtocolError::InvalidHex {
            offset: index,
            found: c,
        },
        FromHexError::OddLength | FromHexError::InvalidStringLength => ProtocolError::Truncated {
            field,
            expected: out.len() * 2,
            actual: text.len(),
        },
    })
}

/// Check that every character of `text` is a hex digit
pub fn validate(text: &[u8]) -> Result<()> {
    match text.iter().position(|c| !c.is_ascii_hexdigit()) {
        Some(offset) => Err(ProtocolError::InvalidHex {
            offset,
            found: text[offset] as char,
        }),
        None => Ok(()),
    }
}

/// Encode bytes as upper-case hex pairs, the form the simulator emits
pub fn encode(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

fn shift(err: ProtocolError, by: usize) -> ProtocolError {
    match err {
        ProtocolError::InvalidHex { offset, found } => ProtocolError::InvalidHex {
            offset: offset + by,
            found,
        },
        other => other,
    }
}
