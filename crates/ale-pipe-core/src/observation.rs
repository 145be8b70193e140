//! Observation view and turn outcome

use crate::frame::Frame;
use crate::ram::Ram;
use crate::signal::SignalRecord;
use sha2::{Digest, Sha256};

/// How an observe or act call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The simulator answered; keep going
    Continue,
    /// The simulator sent `DIE` or closed its output
    Terminated,
}

impl Outcome {
    pub fn is_terminated(self) -> bool {
        self == Outcome::Terminated
    }

    /// `Terminated` if either side is
    pub fn or(self, other: Outcome) -> Outcome {
        if self.is_terminated() || other.is_terminated() {
            Outcome::Terminated
        } else {
            Outcome::Continue
        }
    }
}

/// What the controller sees after a turn.
///
/// Borrowed from the session; valid until the next `act`.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    /// Pooled output frame
    pub screen: &'a Frame,
    /// Console RAM
    pub ram: &'a Ram,
    /// Signal for the last turn (accumulated over held frames)
    pub signal: SignalRecord,
}

impl Observation<'_> {
    /// Determinism verification hash over console RAM
    pub fn state_hash(&self) -> String {
        state_hash(self.ram)
    }
}

/// SHA-256 of a RAM snapshot, hex-encoded
pub fn state_hash(ram: &Ram) -> String {
    hex::encode(Sha256::digest(ram))
}
