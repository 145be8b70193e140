//! The observe/act exchange with a running simulator
//!
//! A session is strictly half-duplex: after the handshake the simulator
//! sends one turn line, the client answers with one action line, and so on.
//! The session tracks whose turn it is and rejects calls made out of turn.

use crate::transport::{LineReader, LineWriter, StreamReader, StreamWriter};
use ale_pipe_core::error::Field;
use ale_pipe_core::{
    Action, Capabilities, Dimensions, Frame, NtscPalette, Observation, Outcome, PLAYER_B_NOOP,
    Palette, PoolingMethod, ProtocolError, RAM_SIZE, Ram, Result, ScreenEncoding, SignalRecord,
    pool, ram, screen, signal,
};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

/// Line sent by the simulator when it is shutting down
const DIE: &str = "DIE";

/// Characters of a wire line kept in debug logs
const PREVIEW_CHARS: usize = 120;

/// Session-level decoding options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Wire format of the screen field
    pub screen_encoding: ScreenEncoding,
    /// How the last two raw frames become the output frame
    pub pooling: PoolingMethod,
}

/// Whose move it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    /// Waiting for the handshake line
    Handshake,
    /// A turn line is due from the simulator
    Observe,
    /// The simulator is waiting for an action
    Act,
}

/// Where a turn's screen field is decoded to
enum Capture<'f> {
    Skip,
    Slot(usize),
    Caller(&'f mut Frame),
}

/// Client side of one simulator session
pub struct Session<R, W> {
    reader: R,
    writer: W,
    config: SessionConfig,
    palette: Box<dyn Palette>,
    turn: Turn,
    caps: Capabilities,
    dims: Option<Dimensions>,
    /// Raw frame slots; `current` holds the newest capture
    raw: [Frame; 2],
    current: usize,
    captured: [bool; 2],
    /// Pooled output frame
    screen: Frame,
    ram: Ram,
    signal: SignalRecord,
    /// Signal decoded by the most recent turn line, if it carried one
    fresh_signal: Option<SignalRecord>,
    /// Whether the most recent turn line filled a raw slot
    fresh_screen: bool,
    /// Signal produced by the last `act` alone
    turn_signal: SignalRecord,
    terminate_requested: bool,
}

impl<R: BufRead, W: Write> Session<StreamReader<R>, StreamWriter<W>> {
    /// Session over a plain reader/writer pair
    pub fn from_streams(reader: R, writer: W, config: SessionConfig) -> Self {
        Self::new(StreamReader(reader), StreamWriter(writer), config)
    }
}

impl<R: LineReader, W: LineWriter> Session<R, W> {
    /// Create a session (not negotiated yet) using the NTSC palette
    pub fn new(reader: R, writer: W, config: SessionConfig) -> Self {
        let empty = Dimensions::new(0, 0);
        Self {
            reader,
            writer,
            config,
            palette: Box::new(NtscPalette),
            turn: Turn::Handshake,
            caps: Capabilities::default(),
            dims: None,
            raw: [Frame::new(empty), Frame::new(empty)],
            current: 0,
            captured: [false; 2],
            screen: Frame::new(empty),
            ram: [0; RAM_SIZE],
            signal: SignalRecord::default(),
            fresh_signal: None,
            fresh_screen: false,
            turn_signal: SignalRecord::default(),
            terminate_requested: false,
        }
    }

    /// Replace the palette used to color screen indices
    pub fn with_palette(mut self, palette: impl Palette + 'static) -> Self {
        self.palette = Box::new(palette);
        self
    }

    /// Read the handshake, send the capability line and prime the first
    /// observation (without screen capture).
    pub fn negotiate(&mut self, caps: Capabilities) -> Result<Dimensions> {
        if self.turn != Turn::Handshake {
            return Err(ProtocolError::OutOfSequence(
                "negotiate() called on a negotiated session".into(),
            ));
        }

        let line = match self.reader.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                return Err(ProtocolError::MalformedHandshake(
                    "simulator closed before sending its dimensions".into(),
                ));
            }
            Err(ProtocolError::Timeout(d)) => return Err(ProtocolError::Timeout(d)),
            Err(e) => return Err(ProtocolError::MalformedHandshake(e.to_string())),
        };
        let dims = parse_handshake(&line)?;
        info!("Simulator screen is {}x{}", dims.width, dims.height);

        self.dims = Some(dims);
        self.raw = [Frame::new(dims), Frame::new(dims)];
        self.screen = Frame::new(dims);
        self.caps = caps;

        let negotiation = caps.negotiation_line();
        debug!("[Rust→ALE] {}", negotiation);
        self.writer.write_line(&negotiation)?;
        self.turn = Turn::Observe;

        self.receive(Capture::Skip)?;
        Ok(dims)
    }

    /// Read one turn line, decoding the screen into `output` when given.
    ///
    /// Only legal when a turn line is due, i.e. after [`Session::send_action`];
    /// `act`, `step` and `reset` observe on their own.
    pub fn observe(&mut self, output: Option<&mut Frame>) -> Result<Outcome> {
        self.expect_turn(Turn::Observe, "observe()")?;
        match output {
            Some(frame) => {
                let dims = self.dims.unwrap_or(Dimensions::new(0, 0));
                if frame.dimensions() != dims {
                    return Err(ProtocolError::FrameSizeMismatch {
                        expected: dims.pixels(),
                        actual: frame.dimensions().pixels(),
                    });
                }
                self.receive(Capture::Caller(frame))
            }
            None => self.receive(Capture::Skip),
        }
    }

    /// Send one action line without observing. The next call must be
    /// [`Session::observe`].
    pub fn send_action(&mut self, action: Action) -> Result<()> {
        self.expect_turn(Turn::Act, "send_action()")?;
        self.send(action)
    }

    /// Hold `action` for `repeat` frames, then pool the last two frames.
    ///
    /// Intermediate frames are observed without decoding the screen; their
    /// rewards are summed, terminal flags OR-ed and lives follow the latest
    /// frame. The result is available from [`Session::turn_signal`].
    pub fn act(&mut self, action: Action, repeat: u32) -> Result<Outcome> {
        self.expect_turn(Turn::Act, "act()")?;
        self.fresh_signal = None;
        self.fresh_screen = false;

        let mut total = SignalRecord {
            lives: self.signal.lives,
            ..SignalRecord::default()
        };
        self.turn_signal = total;

        let outcome = if repeat <= 1 {
            self.current ^= 1;
            let received = match self.send(action) {
                Ok(()) => self.receive(Capture::Slot(self.current)),
                Err(e) => Err(e),
            };
            // The slot keeps its previous frame unless this turn filled it
            if !self.fresh_screen {
                self.current ^= 1;
            }
            let outcome = received?;
            if let Some(frame_signal) = self.fresh_signal {
                total.accumulate(&frame_signal);
            }
            outcome
        } else {
            let previous = self.current ^ 1;
            let captures = (0..repeat - 2)
                .map(|_| Capture::Skip)
                .chain([Capture::Slot(previous), Capture::Slot(self.current)]);

            let mut outcome = Outcome::Continue;
            for capture in captures {
                self.send(action)?;
                outcome = self.receive(capture)?;
                if let Some(frame_signal) = self.fresh_signal {
                    total.accumulate(&frame_signal);
                }
                if outcome.is_terminated() {
                    debug!("Simulator terminated while holding {}", action);
                    break;
                }
            }
            if self.caps.wants_signal {
                self.signal = total;
            }
            outcome
        };
        self.turn_signal = total;

        if self.fresh_screen {
            self.pool_frames();
        }
        Ok(outcome)
    }

    /// [`Session::act`] with the negotiated frame repeat
    pub fn step(&mut self, action: Action) -> Result<Outcome> {
        self.act(action, self.caps.frame_repeat)
    }

    /// Reset the console, refreshing both raw frames so pooling never mixes
    /// frames from either side of the reset.
    pub fn reset(&mut self) -> Result<Outcome> {
        info!("Resetting simulator");
        self.act(Action::SystemReset, 2)
    }

    /// Whether the simulator has ever sent `DIE`
    pub fn wants_terminate(&self) -> bool {
        self.terminate_requested
    }

    /// Screen size, once negotiated
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dims
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Pooled output frame
    pub fn screen(&self) -> &Frame {
        &self.screen
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    /// Latest signal snapshot. An empty turn line leaves it unchanged, so
    /// summing it across calls can count a reward twice; use
    /// [`Session::turn_signal`] for that.
    pub fn signal(&self) -> SignalRecord {
        self.signal
    }

    /// What the last `act` alone contributed: rewards decoded during that
    /// call (zero if none were), terminal OR-ed over its frames, latest lives
    pub fn turn_signal(&self) -> SignalRecord {
        self.turn_signal
    }

    pub fn observation(&self) -> Observation<'_> {
        Observation {
            screen: &self.screen,
            ram: &self.ram,
            signal: self.signal,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Tear down the session, returning its transports
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn expect_turn(&self, wanted: Turn, call: &str) -> Result<()> {
        if self.turn == wanted {
            return Ok(());
        }
        let reason = match self.turn {
            Turn::Handshake => format!("{} called before negotiate()", call),
            Turn::Observe => format!("{} called while a turn line is due; observe() first", call),
            Turn::Act => format!("{} called without an intervening act()", call),
        };
        Err(ProtocolError::OutOfSequence(reason))
    }

    fn send(&mut self, action: Action) -> Result<()> {
        let line = format!("{},{}", action.code(), PLAYER_B_NOOP);
        debug!("[Rust→ALE] {}", line);
        self.writer.write_line(&line)?;
        self.turn = Turn::Observe;
        Ok(())
    }

    /// Read and decode one turn line. End of stream and read failures end
    /// the session rather than erroring; a timeout is reported as an error
    /// and leaves the turn pending.
    fn receive(&mut self, capture: Capture<'_>) -> Result<Outcome> {
        self.fresh_signal = None;
        self.fresh_screen = false;

        let line = match self.reader.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Simulator closed its output");
                self.turn = Turn::Act;
                return Ok(Outcome::Terminated);
            }
            Err(ProtocolError::Timeout(d)) => return Err(ProtocolError::Timeout(d)),
            Err(e) => {
                warn!("Reading from simulator failed: {}", e);
                self.turn = Turn::Act;
                return Ok(Outcome::Terminated);
            }
        };
        self.turn = Turn::Act;

        let preview: String = line.chars().take(PREVIEW_CHARS).collect();
        debug!("[ALE→Rust] len={} line={}", line.len(), preview);

        if line == DIE {
            info!("Simulator requested termination");
            self.terminate_requested = true;
            return Ok(Outcome::Terminated);
        }
        if line.is_empty() {
            return Ok(Outcome::Continue);
        }

        self.apply(&line, capture)?;
        Ok(Outcome::Continue)
    }

    /// Decode the enabled fields of `line`. Nothing is committed unless
    /// every field decodes.
    fn apply(&mut self, line: &str, capture: Capture<'_>) -> Result<()> {
        let caps = self.caps;
        let mut fields = line.split(':');
        let mut seen = 0;
        let mut next_field = |field: Field| {
            let text = fields.next().ok_or(ProtocolError::Truncated {
                field,
                expected: caps.field_count(),
                actual: seen,
            })?;
            seen += 1;
            Ok::<_, ProtocolError>(text)
        };

        let new_ram = match caps.wants_ram {
            true => Some(ram::decode(next_field(Field::Ram)?)?),
            false => None,
        };
        let screen_text = match caps.wants_screen {
            true => Some(next_field(Field::Screen)?),
            false => None,
        };
        let new_signal = match caps.wants_signal {
            true => Some(signal::decode(next_field(Field::Signal)?)?),
            false => None,
        };

        if let Some(text) = screen_text {
            let encoding = self.config.screen_encoding;
            match capture {
                Capture::Skip => {}
                Capture::Slot(slot) => {
                    screen::decode(text, encoding, self.palette.as_ref(), &mut self.raw[slot])?;
                    self.captured[slot] = true;
                    self.fresh_screen = true;
                }
                Capture::Caller(frame) => {
                    screen::decode(text, encoding, self.palette.as_ref(), frame)?;
                }
            }
        }
        if let Some(new_ram) = new_ram {
            self.ram = new_ram;
        }
        if let Some(new_signal) = new_signal {
            self.signal = new_signal;
            self.fresh_signal = Some(new_signal);
        }
        Ok(())
    }

    fn pool_frames(&mut self) {
        if !self.caps.wants_screen {
            return;
        }
        let previous = self.current ^ 1;
        let previous = self.captured[previous].then(|| &self.raw[previous]);
        pool::pool(
            &self.raw[self.current],
            previous,
            self.config.pooling,
            &mut self.screen,
        );
    }
}

/// Parse `<width>-<height>` with both values positive
pub fn parse_handshake(line: &str) -> Result<Dimensions> {
    let malformed = || {
        ProtocolError::MalformedHandshake(format!("expected <width>-<height>, got {:?}", line))
    };

    let (width, height) = line.trim().split_once('-').ok_or_else(malformed)?;
    let width: usize = width.parse().map_err(|_| malformed())?;
    let height: usize = height.parse().map_err(|_| malformed())?;
    if width == 0 || height == 0 {
        return Err(ProtocolError::MalformedHandshake(format!(
            "invalid width/height: {}x{}",
            width, height
        )));
    }
    Ok(Dimensions::new(width, height))
}
