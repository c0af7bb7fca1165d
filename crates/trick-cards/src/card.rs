use std::cmp::Ordering;
use std::fmt;

use crate::error::CardError;

/// Card rank, ordered `Two < Three < ... < Ace` (§4.6).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

const RANK_TOKENS: [(&str, Rank); 13] = [
    ("10", Rank::Ten),
    ("2", Rank::Two),
    ("3", Rank::Three),
    ("4", Rank::Four),
    ("5", Rank::Five),
    ("6", Rank::Six),
    ("7", Rank::Seven),
    ("8", Rank::Eight),
    ("9", Rank::Nine),
    ("J", Rank::Jack),
    ("Q", Rank::Queen),
    ("K", Rank::King),
    ("A", Rank::Ace),
];

impl Rank {
    pub fn token(self) -> &'static str {
        RANK_TOKENS.iter().find(|(_, r)| *r == self).unwrap().0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Card suit. No ordering is defined between suits; only same-suit ranks
/// compare (§4.6).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub fn letter(self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }

    fn parse(c: u8) -> Option<Suit> {
        match c {
            b'C' => Some(Suit::Clubs),
            b'D' => Some(Suit::Diamonds),
            b'H' => Some(Suit::Hearts),
            b'S' => Some(Suit::Spades),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A single playing card. Display/parse round-trip through the two-
/// character (three for ranks `10`) token used on the wire, e.g. `10H`,
/// `QS`, `2C`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    /// Parses one card token from the front of `s`, returning the card and
    /// the unconsumed remainder. Rank matching is greedy longest-match
    /// first, so `10H` is never mistaken for a stray `1` followed by `0H`.
    pub fn parse(s: &str) -> Result<(Card, &str), CardError> {
        let (_, rank) = RANK_TOKENS
            .iter()
            .filter(|(tok, _)| s.starts_with(tok))
            .max_by_key(|(tok, _)| tok.len())
            .ok_or_else(|| CardError::BadToken(s.to_string()))?;
        let rest = &s[rank.token().len()..];

        let suit_byte = rest.as_bytes().first().copied().ok_or(CardError::Truncated)?;
        let suit = Suit::parse(suit_byte).ok_or_else(|| CardError::BadToken(s.to_string()))?;

        Ok((Card::new(*rank, suit), &rest[1..]))
    }

    /// A full 52-card deck in a fixed, unshuffled order (rank-major,
    /// within-suit cycling C, D, H, S). Shuffling a fresh deal is out of
    /// scope here; deals are always supplied pre-dealt.
    pub fn full_deck() -> Vec<Card> {
        let suits = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
        let ranks = [
            Rank::Two,
            Rank::Three,
            Rank::Four,
            Rank::Five,
            Rank::Six,
            Rank::Seven,
            Rank::Eight,
            Rank::Nine,
            Rank::Ten,
            Rank::Jack,
            Rank::Queen,
            Rank::King,
            Rank::Ace,
        ];
        let mut deck = Vec::with_capacity(52);
        for rank in ranks {
            for suit in suits {
                deck.push(Card::new(rank, suit));
            }
        }
        deck
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Only cards of the same suit are comparable; `partial_cmp` returns
/// `None` across suits rather than imposing an arbitrary total order.
impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Card) -> Option<Ordering> {
        if self.suit != other.suit {
            return None;
        }
        self.rank.partial_cmp(&other.rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_round_trip() {
        for token in ["2C", "10H", "JS", "QD", "KC", "AH"] {
            let (card, rest) = Card::parse(token).unwrap();
            assert_eq!(rest, "");
            assert_eq!(card.to_string(), token);
        }
    }

    #[test]
    fn parse_prefers_the_longest_rank_match() {
        let (card, rest) = Card::parse("10H rest").unwrap();
        assert_eq!(card.rank, Rank::Ten);
        assert_eq!(card.suit, Suit::Hearts);
        assert_eq!(rest, " rest");
    }

    #[test]
    fn parse_leaves_remainder_for_list_parsing() {
        let (first, rest) = Card::parse("2C10H").unwrap();
        assert_eq!(first, Card::new(Rank::Two, Suit::Clubs));
        let (second, rest) = Card::parse(rest).unwrap();
        assert_eq!(second, Card::new(Rank::Ten, Suit::Hearts));
        assert_eq!(rest, "");
    }

    #[test]
    fn cross_suit_cards_are_incomparable() {
        let hearts_ace = Card::new(Rank::Ace, Suit::Hearts);
        let spades_two = Card::new(Rank::Two, Suit::Spades);
        assert_eq!(hearts_ace.partial_cmp(&spades_two), None);
    }

    #[test]
    fn same_suit_cards_order_by_rank() {
        let ten = Card::new(Rank::Ten, Suit::Clubs);
        let jack = Card::new(Rank::Jack, Suit::Clubs);
        assert!(ten < jack);
    }

    #[test]
    fn full_deck_has_fifty_two_distinct_cards() {
        let deck = Card::full_deck();
        assert_eq!(deck.len(), 52);
        for (i, a) in deck.iter().enumerate() {
            for b in &deck[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
