use std::error::Error;
use std::fmt;

use trick_cards::CardError;

/// A line didn't parse as any known message, or parsed but violated a
/// message-specific invariant (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    UnknownPrefix(String),
    BadNumber(String),
    BadSeat(String),
    BadCard(CardError),
    TrailingGarbage(String),
    DuplicateSeat,
    MissingSeat,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::UnknownPrefix(s) => write!(f, "unrecognized message: {:?}", s),
            LineError::BadNumber(s) => write!(f, "expected a number in {:?}", s),
            LineError::BadSeat(s) => write!(f, "expected a seat letter in {:?}", s),
            LineError::BadCard(e) => write!(f, "{}", e),
            LineError::TrailingGarbage(s) => write!(f, "unexpected trailing text: {:?}", s),
            LineError::DuplicateSeat => write!(f, "same seat listed twice"),
            LineError::MissingSeat => write!(f, "not every seat was listed"),
        }
    }
}

impl Error for LineError {}

impl From<CardError> for LineError {
    fn from(e: CardError) -> LineError {
        LineError::BadCard(e)
    }
}
