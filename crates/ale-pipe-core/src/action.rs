//! ALE action codes and their symbolic names

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Joystick input for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joystick {
    Noop,
    Fire,
    Up,
    Right,
    Left,
    Down,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
    UpFire,
    RightFire,
    LeftFire,
    DownFire,
    UpRightFire,
    UpLeftFire,
    DownRightFire,
    DownLeftFire,
}

impl Joystick {
    /// All inputs in code order
    pub const ALL: [Joystick; 18] = [
        Joystick::Noop,
        Joystick::Fire,
        Joystick::Up,
        Joystick::Right,
        Joystick::Left,
        Joystick::Down,
        Joystick::UpRight,
        Joystick::UpLeft,
        Joystick::DownRight,
        Joystick::DownLeft,
        Joystick::UpFire,
        Joystick::RightFire,
        Joystick::LeftFire,
        Joystick::DownFire,
        Joystick::UpRightFire,
        Joystick::UpLeftFire,
        Joystick::DownRightFire,
        Joystick::DownLeftFire,
    ];

    fn offset(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Joystick::Noop => "noop",
            Joystick::Fire => "fire",
            Joystick::Up => "up",
            Joystick::Right => "right",
            Joystick::Left => "left",
            Joystick::Down => "down",
            Joystick::UpRight => "upright",
            Joystick::UpLeft => "upleft",
            Joystick::DownRight => "downright",
            Joystick::DownLeft => "downleft",
            Joystick::UpFire => "upfire",
            Joystick::RightFire => "rightfire",
            Joystick::LeftFire => "leftfire",
            Joystick::DownFire => "downfire",
            Joystick::UpRightFire => "uprightfire",
            Joystick::UpLeftFire => "upleftfire",
            Joystick::DownRightFire => "downrightfire",
            Joystick::DownLeftFire => "downleftfire",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|j| j.name() == name)
    }
}

/// An action the simulator understands.
///
/// Serializes as its name (`"player_a_fire"`, `"system_reset"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    PlayerA(Joystick),
    PlayerB(Joystick),
    Reset,
    SaveState,
    LoadState,
    SystemReset,
}

/// Code of player B's action in every action line; the second player is
/// never controlled.
pub const PLAYER_B_NOOP: u8 = 18;

impl Action {
    pub const NOOP: Action = Action::PlayerA(Joystick::Noop);

    /// Numeric code sent on the wire
    pub fn code(self) -> u8 {
        match self {
            Action::PlayerA(j) => j.offset(),
            Action::PlayerB(j) => PLAYER_B_NOOP + j.offset(),
            Action::Reset => 40,
            Action::SaveState => 43,
            Action::LoadState => 44,
            Action::SystemReset => 45,
        }
    }

    /// Inverse of [`Action::code`]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0..=17 => Some(Action::PlayerA(Joystick::ALL[code as usize])),
            18..=35 => Some(Action::PlayerB(Joystick::ALL[(code - PLAYER_B_NOOP) as usize])),
            40 => Some(Action::Reset),
            43 => Some(Action::SaveState),
            44 => Some(Action::LoadState),
            45 => Some(Action::SystemReset),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PlayerA(j) => write!(f, "player_a_{}", j.name()),
            Action::PlayerB(j) => write!(f, "player_b_{}", j.name()),
            Action::Reset => f.write_str("reset"),
            Action::SaveState => f.write_str("save_state"),
            Action::LoadState => f.write_str("load_state"),
            Action::SystemReset => f.write_str("system_reset"),
        }
    }
}

impl FromStr for Action {
    type Err = ProtocolError;

    /// Accepts the registry names, plus bare joystick names for player A
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let action = match name.as_str() {
            "reset" => Some(Action::Reset),
            "save_state" => Some(Action::SaveState),
            "load_state" => Some(Action::LoadState),
            "system_reset" => Some(Action::SystemReset),
            other => {
                if let Some(j) = other.strip_prefix("player_a_") {
                    Joystick::from_name(j).map(Action::PlayerA)
                } else if let Some(j) = other.strip_prefix("player_b_") {
                    Joystick::from_name(j).map(Action::PlayerB)
                } else {
                    Joystick::from_name(other).map(Action::PlayerA)
                }
            }
        };
        action.ok_or_else(|| ProtocolError::UnknownAction(s.to_string()))
    }
}

impl TryFrom<String> for Action {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_codes() {
        assert_eq!("player_a_noop".parse::<Action>().unwrap().code(), 0);
        assert_eq!("player_a_fire".parse::<Action>().unwrap().code(), 1);
        assert_eq!("player_a_downleftfire".parse::<Action>().unwrap().code(), 17);
        assert_eq!("player_b_noop".parse::<Action>().unwrap().code(), PLAYER_B_NOOP);
        assert_eq!("player_b_downleftfire".parse::<Action>().unwrap().code(), 35);
        assert_eq!("reset".parse::<Action>().unwrap().code(), 40);
        assert_eq!("system_reset".parse::<Action>().unwrap().code(), 45);
    }

    #[test]
    fn test_bare_joystick_name_is_player_a() {
        assert_eq!("Fire".parse::<Action>().unwrap(), Action::PlayerA(Joystick::Fire));
    }

    #[test]
    fn test_unknown_name() {
        match "jump".parse::<Action>() {
            Err(ProtocolError::UnknownAction(name)) => assert_eq!(name, "jump"),
            other => panic!("Expected UnknownAction, got {:?}", other),
        }
    }

    #[test]
    fn test_code_inverse() {
        for code in (0..=35).chain([40, 43, 44, 45]) {
            let action = Action::from_code(code).unwrap();
            assert_eq!(action.code(), code);
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
        assert_eq!(Action::from_code(41), None);
    }

    #[test]
    fn test_serde_by_name() {
        let actions: Vec<Action> = serde_json::from_str(r#"["fire", "player_a_left"]"#).unwrap();
        assert_eq!(actions, vec![Action::PlayerA(Joystick::Fire), Action::PlayerA(Joystick::Left)]);
        assert_eq!(serde_json::to_string(&Action::SystemReset).unwrap(), r#""system_reset""#);
    }
}
