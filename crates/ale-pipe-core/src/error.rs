//! Error types for the ALE fifo protocol

use std::fmt;
use thiserror::Error;

/// Result type for ale-pipe operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Which part of a turn line a payload error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Ram,
    Screen,
    Signal,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Ram => f.write_str("ram"),
            Field::Screen => f.write_str("screen"),
            Field::Signal => f.write_str("signal"),
        }
    }
}

/// ale-pipe error types
///
/// Session end (`DIE` or end of stream) is not an error; it is reported as
/// [`Outcome::Terminated`](crate::Outcome::Terminated).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Handshake line missing or not `<width>-<height>` with positive values
    #[error("Malformed handshake: {0}")]
    MalformedHandshake(String),

    /// observe/act/negotiate called out of turn
    #[error("Out of sequence: {0}")]
    OutOfSequence(String),

    /// Payload shorter than the negotiated layout requires.
    ///
    /// Counts are hex characters, or fields when the whole field is missing.
    #[error("Truncated {field} payload: expected {expected}, got {actual}")]
    Truncated {
        field: Field,
        expected: usize,
        actual: usize,
    },

    /// Payload longer than the negotiated layout allows
    #[error("Overlong {field} payload: expected {expected} chars, got {actual}")]
    Overlong {
        field: Field,
        expected: usize,
        actual: usize,
    },

    /// Decoded pixel count differs from the session dimensions
    #[error("Frame size mismatch: expected {expected} pixels, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    /// Non-hex character inside a hex payload
    #[error("Invalid hex digit {found:?} at offset {offset}")]
    InvalidHex { offset: usize, found: char },

    /// Signal field not `<terminal>,<reward>[,<lives>]`
    #[error("Malformed signal: {0}")]
    MalformedSignal(String),

    /// Action name not in the registry
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// No line arrived within the configured read timeout
    #[error("Timed out after {0:?} waiting for simulator")]
    Timeout(std::time::Duration),

    /// Write or process failure
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Config(err.to_string())
    }
}
