//! Screen dimensions and pixel buffers

use serde::{Deserialize, Serialize};

/// Bytes per pixel in every frame buffer (blue, green, red)
pub const CHANNELS: usize = 3;

/// Screen size reported by the simulator during the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels per frame
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    /// Size in bytes of a frame buffer
    pub fn frame_len(&self) -> usize {
        self.pixels() * CHANNELS
    }
}

/// An owned frame in B,G,R byte order, row-major.
///
/// The buffer length is fixed at `width * height * 3` for the frame's life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    dims: Dimensions,
    data: Vec<u8>,
}

impl Frame {
    /// Allocate a black frame
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            data: vec![0; dims.frame_len()],
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn width(&self) -> usize {
        self.dims.width
    }

    pub fn height(&self) -> usize {
        self.dims.height
    }

    /// Raw B,G,R bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// B,G,R triple at column `x`, row `y`
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let at = (y * self.dims.width + x) * CHANNELS;
        [self.data[at], self.data[at + 1], self.data[at + 2]]
    }

    /// Overwrite this frame with another of the same size
    pub fn copy_from(&mut self, other: &Frame) {
        self.data.copy_from_slice(&other.data);
    }
}
