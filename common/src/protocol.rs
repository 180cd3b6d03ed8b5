use thiserror::Error;

use crate::types::{fmt_degf, Mode, TargetRange, TempC1000};

/// A parsed request line. Matching is exact-token; nothing is
/// case-folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Get,
    Set(TargetRange),
}

/// Parse failures double as wire replies: the `Display` string is
/// exactly what goes back to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("bad command")]
    Empty,
    #[error("set: invalid minimum temperature value")]
    InvalidMin,
    #[error("set: invalid maximum temperature value")]
    InvalidMax,
    #[error("set: minimum temperature above maximum")]
    InvertedRange,
    #[error("unknown command: {0}")]
    Unknown(String),
}

impl Command {
    /// `set` arguments are raw integers in the 1000x-Celsius scale even
    /// though replies render Fahrenheit; the asymmetry is part of the
    /// wire format.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else {
            return Err(CommandError::Empty);
        };

        match command {
            "get" => Ok(Self::Get),
            "set" => {
                let min = tokens
                    .next()
                    .and_then(|token| token.parse::<TempC1000>().ok())
                    .ok_or(CommandError::InvalidMin)?;
                let max = tokens
                    .next()
                    .and_then(|token| token.parse::<TempC1000>().ok())
                    .ok_or(CommandError::InvalidMax)?;
                if min > max {
                    return Err(CommandError::InvertedRange);
                }
                Ok(Self::Set(TargetRange { min, max }))
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// What `get` reports: the control loop's last published observation
/// plus the live target range.
#[derive(Debug, Clone, Copy)]
pub struct StatusSnapshot {
    pub last_temp: Option<TempC1000>,
    pub range: TargetRange,
    pub mode: Mode,
    pub same_mode: u32,
}

pub fn format_status(status: &StatusSnapshot) -> String {
    let temp = status
        .last_temp
        .map(fmt_degf)
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "temperature {temp} to [{}, {}] mode {} {}x",
        fmt_degf(status.range.min),
        fmt_degf(status.range.max),
        status.mode,
        status.same_mode
    )
}

pub fn format_set_reply(range: TargetRange) -> String {
    format!(
        "set target range to [{}, {}]",
        fmt_degf(range.min),
        fmt_degf(range.max)
    )
}
