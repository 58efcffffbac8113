//! Command vocabulary sent to the actuator.

use std::fmt;
use std::str::FromStr;

use crate::error::GestureError;

/// A discrete instruction for the remote actuator.
///
/// The wire form is the upper-case label returned by [`Command::as_str`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    // ── movement (right hand) ────────────────────────────────────────────
    Forward,
    Reverse,
    Left,
    Right,
    Stop,
    // ── actions (left hand) ──────────────────────────────────────────────
    Handshake,
    Jump,
    StayLow,
    Steady,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::Forward, Command::Reverse, Command::Left, Command::Right, Command::Stop,
        Command::Handshake, Command::Jump, Command::StayLow, Command::Steady,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Forward   => "FORWARD",
            Command::Reverse   => "REVERSE",
            Command::Left      => "LEFT",
            Command::Right     => "RIGHT",
            Command::Stop      => "STOP",
            Command::Handshake => "HANDSHAKE",
            Command::Jump      => "JUMP",
            Command::StayLow   => "STAYLOW",
            Command::Steady    => "STEADY",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Command {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Command::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| GestureError::UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for c in Command::ALL {
            assert_eq!(c.as_str().parse::<Command>().unwrap(), c);
        }
        assert_eq!("stayLow".parse::<Command>().unwrap(), Command::StayLow);
        assert!("None".parse::<Command>().is_err());
    }

    #[test]
    fn wire_form_is_upper_case_label() {
        assert_eq!(Command::StayLow.as_str(), "STAYLOW");
        assert_eq!(Command::Handshake.to_string(), "HANDSHAKE");
        assert_eq!(format!("{:<8}|", Command::Stop), "STOP    |");
    }
}
