//! Card, Deck, Seat and Deal data model plus scoring rules (C5): the
//! pieces shared by every component that needs to know what a legal game
//! state looks like, independent of how it travels over the wire.

pub mod card;
pub mod deal;
pub mod deck;
pub mod error;
pub mod scoring;
pub mod seat;

pub use card::{Card, Rank, Suit};
pub use deal::{Deal, TrickRecord, CARDS_PER_HAND, TRICKS_PER_DEAL};
pub use deck::Deck;
pub use error::{CardError, GameError};
pub use scoring::{trick_penalty, Variant};
pub use seat::{Seat, SEATS};
