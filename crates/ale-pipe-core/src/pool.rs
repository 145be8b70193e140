//! Frame pooling over the last two raw frames

use crate::capabilities::PoolingMethod;
use crate::frame::Frame;

/// Combine `current` and `previous` into `out`.
///
/// Without a previous frame (nothing captured into the second slot yet) the
/// output is `current` whatever the method. `Mean` rounds halves up.
///
/// All three frames must share the same dimensions.
pub fn pool(current: &Frame, previous: Option<&Frame>, method: PoolingMethod, out: &mut Frame) {
    let Some(previous) = previous else {
        out.copy_from(current);
        return;
    };

    let a = current.as_bytes();
    let b = previous.as_bytes();
    let dst = out.as_bytes_mut();
    match method {
        PoolingMethod::None => dst.copy_from_slice(a),
        PoolingMethod::Max => {
            for ((d, &x), &y) in dst.iter_mut().zip(a).zip(b) {
                *d = x.max(y);
            }
        }
        PoolingMethod::Mean => {
            for ((d, &x), &y) in dst.iter_mut().zip(a).zip(b) {
                *d = ((x as u16 + y as u16 + 1) / 2) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Dimensions;

    fn frame_of(bytes: &[u8]) -> Frame {
        let mut frame = Frame::new(Dimensions::new(bytes.len() / 3, 1));
        frame.as_bytes_mut().copy_from_slice(bytes);
        frame
    }

    const A: [u8; 6] = [0, 255, 10, 3, 100, 7];
    const B: [u8; 6] = [255, 0, 20, 4, 100, 8];

    #[test]
    fn test_single_frame_passthrough() {
        let a = frame_of(&A);
        for method in [PoolingMethod::None, PoolingMethod::Max, PoolingMethod::Mean] {
            let mut out = frame_of(&[9; 6]);
            pool(&a, None, method, &mut out);
            assert_eq!(out, a);
        }
    }

    #[test]
    fn test_none_takes_current() {
        let (a, b) = (frame_of(&A), frame_of(&B));
        let mut out = frame_of(&[0; 6]);
        pool(&a, Some(&b), PoolingMethod::None, &mut out);
        assert_eq!(out, a);
    }

    #[test]
    fn test_max() {
        let (a, b) = (frame_of(&A), frame_of(&B));
        let mut out = frame_of(&[0; 6]);
        pool(&a, Some(&b), PoolingMethod::Max, &mut out);
        assert_eq!(out.as_bytes(), &[255, 255, 20, 4, 100, 8]);
    }

    #[test]
    fn test_mean_rounds_to_nearest() {
        let (a, b) = (frame_of(&A), frame_of(&B));
        let mut out = frame_of(&[0; 6]);
        pool(&a, Some(&b), PoolingMethod::Mean, &mut out);
        for i in 0..6 {
            let expected = ((A[i] as f64 + B[i] as f64) / 2.0).round() as u8;
            assert_eq!(out.as_bytes()[i], expected, "byte {}", i);
        }
        // 0 and 255 average to 127.5
        assert_eq!(out.as_bytes()[0], 128);
    }
}
