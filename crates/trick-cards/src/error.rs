use std::error::Error;
use std::fmt;

/// A card token didn't parse (§4.6), used by the line protocol to build
/// its own `WRONG` replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    BadToken(String),
    Truncated,
}

impl fmt::Display for CardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardError::BadToken(s) => write!(f, "not a card: {:?}", s),
            CardError::Truncated => write!(f, "card token cut off"),
        }
    }
}

impl Error for CardError {}

/// Deal construction or play-sequence errors (§4.6 invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    WrongHandCount { seats: usize },
    WrongHandSize { seat: crate::seat::Seat, size: usize },
    UnknownDealVariant(u8),
    EndingUnfinishedTrick,
    DealAlreadyComplete,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::WrongHandCount { seats } => {
                write!(f, "expected 4 hands, got {}", seats)
            }
            GameError::WrongHandSize { seat, size } => {
                write!(f, "seat {} has {} cards, expected 13", seat, size)
            }
            GameError::UnknownDealVariant(v) => write!(f, "unknown deal variant {}", v),
            GameError::EndingUnfinishedTrick => write!(f, "trick is not yet complete"),
            GameError::DealAlreadyComplete => write!(f, "deal already played its 13 tricks"),
        }
    }
}

impl Error for GameError {}
