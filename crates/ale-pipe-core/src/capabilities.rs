//! Negotiated capabilities and session-level decoding options

use serde::{Deserialize, Serialize};

/// What the client asks the simulator to report each turn.
///
/// Fixed for a session once the negotiation line has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Receive the rendered screen
    #[serde(default = "default_true")]
    pub wants_screen: bool,
    /// Receive console RAM
    #[serde(default = "default_true")]
    pub wants_ram: bool,
    /// Receive terminal/reward/lives
    #[serde(default)]
    pub wants_signal: bool,
    /// Frames each action is held for by `Session::step`
    #[serde(default = "default_frame_repeat")]
    pub frame_repeat: u32,
}

fn default_true() -> bool {
    true
}

fn default_frame_repeat() -> u32 {
    1
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            wants_screen: true,
            wants_ram: true,
            wants_signal: false,
            frame_repeat: 1,
        }
    }
}

impl Capabilities {
    /// Everything enabled, held for `frame_repeat` frames
    pub fn all(frame_repeat: u32) -> Self {
        Self {
            wants_screen: true,
            wants_ram: true,
            wants_signal: true,
            frame_repeat,
        }
    }

    /// The negotiation line: `<screen>,<ram>,1,<signal>`.
    ///
    /// The third slot is the simulator-side frame skip, always 1 because
    /// repetition is done client-side.
    pub fn negotiation_line(&self) -> String {
        format!(
            "{},{},1,{}",
            self.wants_screen as u8, self.wants_ram as u8, self.wants_signal as u8
        )
    }

    /// Number of `:`-separated fields in a turn line
    pub fn field_count(&self) -> usize {
        self.wants_ram as usize + self.wants_screen as usize + self.wants_signal as usize
    }
}

/// Wire format of the screen field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenEncoding {
    /// One hex pair per pixel
    Raster,
    /// `<index><run>` hex records
    #[default]
    Rle,
}

/// How two consecutive raw frames are combined into the output frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolingMethod {
    #[default]
    None,
    Max,
    Mean,
}
