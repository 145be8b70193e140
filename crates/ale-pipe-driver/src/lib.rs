//! Synchronous driver for the ALE fifo protocol
//!
//! This crate provides:
//! - Line transports (LineReader/LineWriter traits, with a timed reader)
//! - The observe/act session state machine
//! - A supervisor that launches the simulator and hands its pipes to a session

pub mod process;
pub mod session;
pub mod transport;

pub use process::{PipeReader, PipeSession, SimulatorConfig, SimulatorProcess};
pub use session::{Session, SessionConfig, parse_handshake};
pub use transport::{LineReader, LineWriter, StreamReader, StreamWriter, TimedLineReader};
