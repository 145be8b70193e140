//! # ale-pipe-core
//!
//! Core types and payload codecs for the ALE fifo protocol.
//!
//! This crate provides:
//! - Hex, RAM, screen (raster and RLE) and signal decoders
//! - Frame buffers and two-frame pooling
//! - Negotiated capabilities and session options
//! - The action registry and the NTSC palette

pub mod action;
pub mod capabilities;
pub mod error;
pub mod frame;
pub mod hex_codec;
pub mod observation;
pub mod palette;
pub mod pool;
pub mod ram;
pub mod screen;
pub mod signal;

pub use action::{Action, Joystick, PLAYER_B_NOOP};
pub use capabilities::{Capabilities, PoolingMethod, ScreenEncoding};
pub use error::{Field, ProtocolError, Result};
pub use frame::{Dimensions, Frame};
pub use observation::{Observation, Outcome};
pub use palette::{NtscPalette, Palette};
pub use ram::{RAM_SIZE, Ram};
pub use signal::{LIVES_UNKNOWN, SignalRecord};
