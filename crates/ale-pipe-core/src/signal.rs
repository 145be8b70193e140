//! Reinforcement-learning signal: terminal flag, reward, lives

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};

/// Flat value used for "lives not reported" by consumers that cannot hold
/// an `Option`
pub const LIVES_UNKNOWN: i32 = -1;

/// Terminal flag, reward and remaining lives for one turn (or one held
/// action, when accumulated over several frames)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub terminal: bool,
    pub reward: i64,
    /// `None` when the simulator does not report lives
    pub lives: Option<i32>,
}

impl SignalRecord {
    /// Lives, or [`LIVES_UNKNOWN`] when not reported
    pub fn lives_or_unknown(&self) -> i32 {
        self.lives.unwrap_or(LIVES_UNKNOWN)
    }

    /// Fold another frame's signal into this one: rewards add, terminal
    /// sticks once set, lives follow the latest frame.
    pub fn accumulate(&mut self, frame: &SignalRecord) {
        self.reward += frame.reward;
        self.terminal |= frame.terminal;
        self.lives = frame.lives;
    }
}

/// Decode `<terminal>,<reward>[,<lives>]`
pub fn decode(text: &str) -> Result<SignalRecord> {
    let mut parts = text.split(',');

    let terminal = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ProtocolError::MalformedSignal(format!("missing terminal in {:?}", text)))?;
    parse_int::<i64>(terminal, "terminal")?;

    let reward = parts
        .next()
        .ok_or_else(|| ProtocolError::MalformedSignal(format!("missing reward in {:?}", text)))?;
    let reward = parse_int::<i64>(reward, "reward")?;

    let lives = parts.next().map(|l| parse_int::<i32>(l, "lives")).transpose()?;

    if parts.next().is_some() {
        return Err(ProtocolError::MalformedSignal(format!(
            "too many fields in {:?}",
            text
        )));
    }

    Ok(SignalRecord {
        terminal: terminal == "1",
        reward,
        lives,
    })
}

fn parse_int<T: std::str::FromStr>(value: &str, name: &str) -> Result<T> {
    value.parse().map_err(|_| {
        ProtocolError::MalformedSignal(format!("{} is not an integer: {:?}", name, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_lives() {
        let signal = decode("1,-5,3").unwrap();
        assert!(signal.terminal);
        assert_eq!(signal.reward, -5);
        assert_eq!(signal.lives, Some(3));
        assert_eq!(signal.lives_or_unknown(), 3);
    }

    #[test]
    fn test_decode_without_lives() {
        let signal = decode("0,100").unwrap();
        assert!(!signal.terminal);
        assert_eq!(signal.reward, 100);
        assert_eq!(signal.lives, None);
        assert_eq!(signal.lives_or_unknown(), LIVES_UNKNOWN);
    }

    #[test]
    fn test_terminal_only_for_literal_one() {
        assert!(!decode("2,0").unwrap().terminal);
        assert!(!decode("0,0").unwrap().terminal);
    }

    #[test]
    fn test_malformed() {
        for bad in ["", "1", "x,0", "1,y", "1,0,z", "1,0,2,9"] {
            assert!(
                matches!(decode(bad), Err(ProtocolError::MalformedSignal(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_accumulate() {
        let mut total = SignalRecord::default();
        total.accumulate(&SignalRecord {
            terminal: false,
            reward: 2,
            lives: Some(3),
        });
        total.accumulate(&SignalRecord {
            terminal: true,
            reward: 5,
            lives: Some(2),
        });
        total.accumulate(&SignalRecord {
            terminal: false,
            reward: -1,
            lives: None,
        });
        assert!(total.terminal);
        assert_eq!(total.reward, 6);
        assert_eq!(total.lives, None);
    }
}
