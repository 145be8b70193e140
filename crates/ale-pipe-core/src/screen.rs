//! Screen payload decoding (raster and run-length)
//!
//! Both formats carry palette indices as hex pairs. Pixels are written in
//! blue, green, red order, the layout native image buffers expect.
//!
//! The whole payload is validated before the first pixel is written, so a
//! rejected payload leaves the destination frame as it was.

use crate::capabilities::ScreenEncoding;
use crate::error::{Field, ProtocolError, Result};
use crate::frame::{CHANNELS, Frame};
use crate::hex_codec;
use crate::palette::Palette;

/// Hex characters per RLE record: two for the index, two for the run
const RLE_RECORD: usize = 4;

/// Decode a screen field into `frame` using the session's encoding
pub fn decode(
    text: &str,
    encoding: ScreenEncoding,
    palette: &dyn Palette,
    frame: &mut Frame,
) -> Result<()> {
    match encoding {
        ScreenEncoding::Raster => decode_raster(text, palette, frame),
        ScreenEncoding::Rle => decode_rle(text, palette, frame),
    }
}

/// One hex pair per pixel, row-major
pub fn decode_raster(text: &str, palette: &dyn Palette, frame: &mut Frame) -> Result<()> {
    let bytes = text.as_bytes();
    let pixels = frame.dimensions().pixels();
    let expected = pixels * 2;

    if bytes.len() < expected {
        return Err(ProtocolError::Truncated {
            field: Field::Screen,
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(ProtocolError::FrameSizeMismatch {
            expected: pixels,
            actual: bytes.len() / 2,
        });
    }
    hex_codec::validate(bytes)?;

    for (pixel, out) in frame.as_bytes_mut().chunks_exact_mut(CHANNELS).enumerate() {
        let index = hex_codec::byte_at(bytes, pixel * 2, Field::Screen)?;
        out.copy_from_slice(&palette.bgr(index));
    }
    Ok(())
}

/// `<index:2hex><run:2hex>` records until the input is exhausted.
///
/// Runs must add up to exactly `width * height` pixels.
pub fn decode_rle(text: &str, palette: &dyn Palette, frame: &mut Frame) -> Result<()> {
    let bytes = text.as_bytes();
    let pixels = frame.dimensions().pixels();

    if bytes.len() % RLE_RECORD != 0 {
        return Err(ProtocolError::Truncated {
            field: Field::Screen,
            expected: bytes.len().next_multiple_of(RLE_RECORD),
            actual: bytes.len(),
        });
    }
    hex_codec::validate(bytes)?;

    let runs = rle_records(bytes)?;
    let total: usize = runs.iter().map(|&(_, run)| run as usize).sum();
    if total != pixels {
        return Err(ProtocolError::FrameSizeMismatch {
            expected: pixels,
            actual: total,
        });
    }

    let out = frame.as_bytes_mut();
    let mut position = 0;
    for (index, run) in runs {
        let bgr = palette.bgr(index);
        let end = position + run as usize * CHANNELS;
        for pixel in out[position..end].chunks_exact_mut(CHANNELS) {
            pixel.copy_from_slice(&bgr);
        }
        position = end;
    }
    Ok(())
}

fn rle_records(bytes: &[u8]) -> Result<Vec<(u8, u8)>> {
    let mut runs = Vec::with_capacity(bytes.len() / RLE_RECORD);
    for offset in (0..bytes.len()).step_by(RLE_RECORD) {
        let index = hex_codec::byte_at(bytes, offset, Field::Screen)?;
        let run = hex_codec::byte_at(bytes, offset + 2, Field::Screen)?;
        runs.push((index, run));
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Dimensions;
    use crate::palette::NtscPalette;

    /// Palette that makes channel order obvious: index i -> (r=i, g=i+1, b=i+2)
    struct Ramp;

    impl Palette for Ramp {
        fn rgb(&self, index: u8) -> [u8; 3] {
            [index, index.wrapping_add(1), index.wrapping_add(2)]
        }
    }

    fn raster_text(indices: &[u8]) -> String {
        hex_codec::encode(indices)
    }

    fn rle_text(runs: &[(u8, u8)]) -> String {
        runs.iter()
            .map(|&(index, run)| hex_codec::encode(&[index, run]))
            .collect()
    }

    #[test]
    fn test_raster_writes_bgr() {
        let dims = Dimensions::new(3, 2);
        let indices = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60];
        let mut frame = Frame::new(dims);

        decode_raster(&raster_text(&indices), &Ramp, &mut frame).unwrap();

        assert_eq!(frame.as_bytes().len(), 3 * 2 * 3);
        for y in 0..2 {
            for x in 0..3 {
                let i = indices[y * 3 + x];
                assert_eq!(frame.pixel(x, y), [i + 2, i + 1, i]);
            }
        }
    }

    #[test]
    fn test_rle_matches_expanded_raster() {
        let dims = Dimensions::new(4, 3);
        let runs = [(0x0E, 5), (0x42, 1), (0x00, 4), (0x42, 2)];
        let expanded: Vec<u8> = runs
            .iter()
            .flat_map(|&(index, run)| std::iter::repeat_n(index, run as usize))
            .collect();

        let mut from_rle = Frame::new(dims);
        let mut from_raster = Frame::new(dims);
        decode_rle(&rle_text(&runs), &NtscPalette, &mut from_rle).unwrap();
        decode_raster(&raster_text(&expanded), &NtscPalette, &mut from_raster).unwrap();

        assert_eq!(from_rle, from_raster);
    }

    #[test]
    fn test_rle_lower_case() {
        let dims = Dimensions::new(2, 1);
        let mut frame = Frame::new(dims);
        decode_rle("0e02", &NtscPalette, &mut frame).unwrap();
        assert_eq!(frame.pixel(1, 0), [0xec, 0xec, 0xec]);
    }

    #[test]
    fn test_rle_run_sum_mismatch_leaves_frame() {
        let dims = Dimensions::new(4, 1);
        let mut frame = Frame::new(dims);
        decode_rle(&rle_text(&[(0x0E, 4)]), &NtscPalette, &mut frame).unwrap();
        let before = frame.clone();

        match decode_rle(&rle_text(&[(0x42, 3)]), &NtscPalette, &mut frame) {
            Err(ProtocolError::FrameSizeMismatch { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("Expected FrameSizeMismatch, got {:?}", other),
        }
        assert_eq!(frame, before);

        // Overrun must not write past the buffer either
        assert!(matches!(
            decode_rle(&rle_text(&[(0x42, 3), (0x42, 3)]), &NtscPalette, &mut frame),
            Err(ProtocolError::FrameSizeMismatch { actual: 6, .. })
        ));
        assert_eq!(frame, before);
    }

    #[test]
    fn test_rle_partial_record() {
        let mut frame = Frame::new(Dimensions::new(1, 1));
        assert!(matches!(
            decode_rle("0E01FF", &NtscPalette, &mut frame),
            Err(ProtocolError::Truncated { field: Field::Screen, expected: 8, actual: 6 })
        ));
    }

    #[test]
    fn test_raster_wrong_length() {
        let mut frame = Frame::new(Dimensions::new(2, 2));
        assert!(matches!(
            decode_raster("000000", &NtscPalette, &mut frame),
            Err(ProtocolError::Truncated { expected: 8, actual: 6, .. })
        ));
        assert!(matches!(
            decode_raster("0000000000", &NtscPalette, &mut frame),
            Err(ProtocolError::FrameSizeMismatch { expected: 4, actual: 5 })
        ));
    }

    #[test]
    fn test_raster_bad_digit_leaves_frame() {
        let mut frame = Frame::new(Dimensions::new(2, 1));
        decode_raster("0E0E", &NtscPalette, &mut frame).unwrap();
        let before = frame.clone();
        assert!(matches!(
            decode_raster("0E0Q", &NtscPalette, &mut frame),
            Err(ProtocolError::InvalidHex { offset: 3, found: 'Q' })
        ));
        assert_eq!(frame, before);
    }

    #[test]
    fn test_decode_dispatches_on_encoding() {
        let dims = Dimensions::new(2, 1);
        let mut a = Frame::new(dims);
        let mut b = Frame::new(dims);
        decode("4202", ScreenEncoding::Rle, &NtscPalette, &mut a).unwrap();
        decode("4242", ScreenEncoding::Raster, &NtscPalette, &mut b).unwrap();
        assert_eq!(a, b);
    }
}
