//! Line protocol of the presenter remote socket.

use crate::navigator::{NavInput, NavKey};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const SOCKET_PATH: &str = "/tmp/podium.sock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Next,
    Prev,
    First,
    Last,
    /// 1-based page number, as shown to the presenter.
    Goto(usize),
    /// Close any open detail panel.
    Close,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'goto' needs a page number from 1, got '{0}'")]
    BadPage(String),
}

impl FromStr for RemoteCommand {
    type Err = RemoteError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        match cmd.to_ascii_lowercase().as_str() {
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "close" => Ok(Self::Close),
            "goto" => {
                let arg = parts.next().unwrap_or_default();
                match arg.parse::<usize>() {
                    Ok(n) if n >= 1 => Ok(Self::Goto(n)),
                    _ => Err(RemoteError::BadPage(arg.to_string())),
                }
            }
            _ => Err(RemoteError::Unknown(line.trim().to_string())),
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => write!(f, "next"),
            Self::Prev => write!(f, "prev"),
            Self::First => write!(f, "first"),
            Self::Last => write!(f, "last"),
            Self::Goto(n) => write!(f, "goto {}", n),
            Self::Close => write!(f, "close"),
        }
    }
}

impl RemoteCommand {
    /// Navigation input this command stands for; `None` for non-navigation
    /// commands.
    pub fn nav_input(&self) -> Option<NavInput> {
        match self {
            Self::Next => Some(NavInput::Next),
            Self::Prev => Some(NavInput::Previous),
            Self::First => Some(NavInput::Key(NavKey::Home)),
            Self::Last => Some(NavInput::Key(NavKey::End)),
            Self::Goto(n) => Some(NavInput::Dot(n.saturating_sub(1))),
            Self::Close => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        let cases = [
            ("next", RemoteCommand::Next),
            ("  PREV ", RemoteCommand::Prev),
            ("goto 3", RemoteCommand::Goto(3)),
            ("first", RemoteCommand::First),
            ("close", RemoteCommand::Close),
        ];
        for (line, expected) in cases {
            assert_eq!(line.parse::<RemoteCommand>().unwrap(), expected);
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            "goto 0".parse::<RemoteCommand>(),
            Err(RemoteError::BadPage("0".into()))
        );
        assert_eq!(
            "goto".parse::<RemoteCommand>(),
            Err(RemoteError::BadPage("".into()))
        );
        assert!(matches!(
            "dance".parse::<RemoteCommand>(),
            Err(RemoteError::Unknown(_))
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let cmd = RemoteCommand::Goto(2);
        assert_eq!(cmd.to_string().parse::<RemoteCommand>().unwrap(), cmd);
        assert_eq!(cmd.nav_input(), Some(NavInput::Dot(1)));
        assert_eq!(RemoteCommand::Close.nav_input(), None);
    }
}
