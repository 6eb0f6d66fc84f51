//! Line commands read from stdin while the live map runs.

use std::str::FromStr;

use thiserror::Error;

pub const HELP: &str = "commands: click <train>, close, trains, help, quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Click the marker of a train.
    Click(u32),
    /// Close the open popup.
    Close,
    Trains,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?} ({HELP})")]
    Unknown(String),
    #[error("expected a train number, got {0:?}")]
    TrainNumber(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Err(ParseCommandError::Empty);
        };

        match word.to_ascii_lowercase().as_str() {
            "click" | "inspect" => {
                let raw = words.next().unwrap_or_default();
                raw.parse().map(Command::Click).map_err(|_| ParseCommandError::TrainNumber(raw.to_string()))
            }
            "close" => Ok(Self::Close),
            "trains" | "list" => Ok(Self::Trains),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}
