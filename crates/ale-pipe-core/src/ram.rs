//! Console RAM payload decoding

use crate::error::{Field, ProtocolError, Result};
use crate::hex_codec;

/// Bytes of Atari 2600 RAM reported each turn
pub const RAM_SIZE: usize = 128;

/// A RAM snapshot
pub type Ram = [u8; RAM_SIZE];

/// Decode a RAM field: exactly `2 * RAM_SIZE` hex characters, byte `i` taken
/// from characters `2i..2i+2`.
pub fn decode(text: &str) -> Result<Ram> {
    let bytes = text.as_bytes();
    let expected = RAM_SIZE * 2;
    if bytes.len() < expected {
        return Err(ProtocolError::Truncated {
            field: Field::Ram,
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(ProtocolError::Overlong {
            field: Field::Ram,
            expected,
            actual: bytes.len(),
        });
    }

    let mut ram = [0u8; RAM_SIZE];
    hex_codec::decode_into(bytes, &mut ram, Field::Ram)?;
    Ok(ram)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ram {
        let mut ram = [0u8; RAM_SIZE];
        for (i, b) in ram.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        ram
    }

    #[test]
    fn test_decode_reencodes_to_source() {
        let ram = sample();
        let text = hex_codec::encode(&ram);
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded, ram);
        assert_eq!(hex_codec::encode(&decoded), text);
    }

    #[test]
    fn test_lower_case_input() {
        let text = hex_codec::encode(&sample()).to_lowercase();
        assert_eq!(decode(&text).unwrap(), sample());
    }

    #[test]
    fn test_short_input_is_truncated() {
        let text = "AB".repeat(RAM_SIZE - 1);
        match decode(&text) {
            Err(ProtocolError::Truncated {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, Field::Ram);
                assert_eq!(expected, 256);
                assert_eq!(actual, 254);
            }
            other => panic!("Expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_long_input_is_rejected() {
        let text = "AB".repeat(RAM_SIZE + 1);
        assert!(matches!(
            decode(&text),
            Err(ProtocolError::Overlong { field: Field::Ram, .. })
        ));
    }

    #[test]
    fn test_bad_digit() {
        let mut text = "00".repeat(RAM_SIZE);
        text.replace_range(10..11, "x");
        match decode(&text) {
            Err(ProtocolError::InvalidHex { offset, found }) => {
                assert_eq!(offset, 10);
                assert_eq!(found, 'x');
            }
            other => panic!("Expected InvalidHex, got {:?}", other),
        }
    }
}
