use crate::card::Card;
use crate::deck::Deck;
use crate::error::GameError;
use crate::scoring::{trick_penalty, Variant};
use crate::seat::{Seat, SEATS};

pub const TRICKS_PER_DEAL: u32 = 13;
pub const CARDS_PER_HAND: usize = 13;

/// One completed trick, kept for the `TAKEN` replay history (§4.8.1).
#[derive(Debug, Clone)]
pub struct TrickRecord {
    pub number: u32,
    pub starter: Seat,
    /// Cards indexed by seat, in the order they were actually played
    /// alongside the seat that played them.
    pub plays: [(Seat, Card); 4],
    pub taker: Seat,
}

/// A single deal: 4 dealt hands, a scoring variant, and the rolling state
/// of whichever trick is currently in progress (§4.6).
#[derive(Debug, Clone)]
pub struct Deal {
    variant: Variant,
    first_hands: [Deck; 4],
    hands: [Deck; 4],
    scores: [u32; 4],
    history: Vec<TrickRecord>,

    trick_starter: Seat,
    table: [Option<Card>; 4],
    placed: usize,
    trick_number: u32,
}

impl Deal {
    pub fn new(variant: Variant, starter: Seat, hands: [Deck; 4]) -> Result<Deal, GameError> {
        for seat in SEATS {
            let size = hands[seat.index()].len();
            if size != CARDS_PER_HAND {
                return Err(GameError::WrongHandSize { seat, size });
            }
        }

        Ok(Deal {
            variant,
            first_hands: hands.clone(),
            hands,
            scores: [0; 4],
            history: Vec::new(),
            trick_starter: starter,
            table: [None; 4],
            placed: 0,
            trick_number: 1,
        })
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn first_hand(&self, seat: Seat) -> &Deck {
        &self.first_hands[seat.index()]
    }

    pub fn hand(&self, seat: Seat) -> &Deck {
        &self.hands[seat.index()]
    }

    pub fn scores(&self) -> [u32; 4] {
        self.scores
    }

    pub fn history(&self) -> &[TrickRecord] {
        &self.history
    }

    pub fn trick_number(&self) -> u32 {
        self.trick_number
    }

    pub fn trick_starter(&self) -> Seat {
        self.trick_starter
    }

    /// Seat whose turn it is within the current, still-open trick.
    pub fn next_player(&self) -> Seat {
        Seat::from_index(self.trick_starter.index() + self.placed)
    }

    /// Cards placed so far in the current trick, in play order.
    pub fn cards_so_far(&self) -> Vec<(Seat, Card)> {
        let mut out = Vec::with_capacity(self.placed);
        for i in 0..self.placed {
            let seat = Seat::from_index(self.trick_starter.index() + i);
            out.push((seat, self.table[seat.index()].expect("placed slot is filled")));
        }
        out
    }

    pub fn is_trick_done(&self) -> bool {
        self.placed == 4
    }

    pub fn is_complete(&self) -> bool {
        self.trick_number > TRICKS_PER_DEAL && self.placed == 0
    }

    /// Attempts to play `card` for `seat`. Returns `true` if accepted;
    /// `false` means the play violated turn order, suit-following, or
    /// hand ownership and the caller should reply `WRONG` without
    /// changing any state (§4.6).
    pub fn play(&mut self, seat: Seat, card: Card) -> bool {
        if self.placed >= 4 {
            return false;
        }
        if seat != self.next_player() {
            return false;
        }

        let opener_suit = self.table[self.trick_starter.index()].map(|c| c.suit);
        if let Some(opener_suit) = opener_suit {
            if seat != self.trick_starter
                && card.suit != opener_suit
                && self.hands[seat.index()].contains_suit(opener_suit)
            {
                return false;
            }
        }

        if !self.hands[seat.index()].remove(card) {
            return false;
        }

        self.table[seat.index()] = Some(card);
        self.placed += 1;
        true
    }

    /// Taker of the current, fully-placed trick: whoever played the
    /// highest card of the opening suit.
    fn taker(&self) -> Seat {
        let opener_card = self.table[self.trick_starter.index()].expect("trick is done");
        let mut best_seat = self.trick_starter;
        let mut best_card = opener_card;
        for seat in SEATS {
            if let Some(card) = self.table[seat.index()] {
                if card.suit == opener_card.suit && card.rank > best_card.rank {
                    best_seat = seat;
                    best_card = card;
                }
            }
        }
        best_seat
    }

    /// Scores the just-finished trick, records it in `history`, and opens
    /// the next one (whose starter is the trick's taker). Returns the
    /// recorded trick.
    pub fn end_trick(&mut self) -> Result<TrickRecord, GameError> {
        if !self.is_trick_done() {
            return Err(GameError::EndingUnfinishedTrick);
        }

        let taker = self.taker();
        let cards: Vec<(Seat, Card)> = self.cards_so_far();
        let mut plays = [(Seat::North, cards[0].1); 4];
        for (i, entry) in cards.iter().enumerate() {
            plays[i] = *entry;
        }
        let table_cards: [Card; 4] = {
            let mut c = [cards[0].1; 4];
            for seat in SEATS {
                c[seat.index()] = self.table[seat.index()].unwrap();
            }
            c
        };

        let penalty = trick_penalty(self.variant, &table_cards, self.trick_number);
        self.scores[taker.index()] += penalty;

        let record = TrickRecord {
            number: self.trick_number,
            starter: self.trick_starter,
            plays,
            taker,
        };
        self.history.push(record.clone());

        self.table = [None; 4];
        self.placed = 0;
        self.trick_starter = taker;
        self.trick_number += 1;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    fn hand(cards: Vec<Card>) -> Deck {
        let mut deck = Deck::new(Vec::new());
        for c in cards {
            deck.push(c);
        }
        deck
    }

    fn padded_hand(first: Card, filler_suit: Suit) -> Deck {
        let mut cards = vec![first];
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
        ];
        for r in ranks {
            let c = Card::new(r, filler_suit);
            if c != first {
                cards.push(c);
            }
            if cards.len() == CARDS_PER_HAND {
                break;
            }
        }
        hand(cards)
    }

    #[test]
    fn rejects_wrong_hand_sizes() {
        let hands = [
            padded_hand(Card::new(Rank::Two, Suit::Clubs), Suit::Clubs),
            Deck::new(Vec::new()),
            padded_hand(Card::new(Rank::Two, Suit::Diamonds), Suit::Diamonds),
            padded_hand(Card::new(Rank::Two, Suit::Spades), Suit::Spades),
        ];
        let err = Deal::new(Variant::NoTricks, Seat::North, hands).unwrap_err();
        assert!(matches!(err, GameError::WrongHandSize { seat: Seat::East, size: 0 }));
    }

    #[test]
    fn enforces_turn_order_and_suit_following() {
        let north = padded_hand(Card::new(Rank::Two, Suit::Clubs), Suit::Clubs);
        // East holds both a club and a heart, so following suit is
        // mandatory once North opens clubs.
        let east = hand(vec![
            Card::new(Rank::Three, Suit::Hearts),
            Card::new(Rank::Nine, Suit::Clubs),
            Card::new(Rank::Three, Suit::Clubs),
            Card::new(Rank::Four, Suit::Hearts),
            Card::new(Rank::Five, Suit::Hearts),
            Card::new(Rank::Six, Suit::Hearts),
            Card::new(Rank::Seven, Suit::Hearts),
            Card::new(Rank::Eight, Suit::Hearts),
            Card::new(Rank::Nine, Suit::Hearts),
            Card::new(Rank::Ten, Suit::Hearts),
            Card::new(Rank::Jack, Suit::Hearts),
            Card::new(Rank::Queen, Suit::Hearts),
            Card::new(Rank::King, Suit::Hearts),
        ]);
        let south = padded_hand(Card::new(Rank::Four, Suit::Clubs), Suit::Clubs);
        let west = padded_hand(Card::new(Rank::Five, Suit::Clubs), Suit::Clubs);
        let mut deal = Deal::new(Variant::NoTricks, Seat::North, [north, east, south, west]).unwrap();

        // East tries to go out of turn.
        assert!(!deal.play(Seat::East, Card::new(Rank::Three, Suit::Hearts)));

        assert!(deal.play(Seat::North, Card::new(Rank::Two, Suit::Clubs)));

        // East holds a club and must follow suit; playing a heart is rejected.
        assert!(!deal.play(Seat::East, Card::new(Rank::Three, Suit::Hearts)));
        assert!(deal.play(Seat::East, Card::new(Rank::Nine, Suit::Clubs)));
    }

    #[test]
    fn completes_a_trick_and_advances_starter_to_taker() {
        let north = padded_hand(Card::new(Rank::Two, Suit::Clubs), Suit::Clubs);
        let east = padded_hand(Card::new(Rank::King, Suit::Clubs), Suit::Clubs);
        let south = padded_hand(Card::new(Rank::Four, Suit::Clubs), Suit::Clubs);
        let west = padded_hand(Card::new(Rank::Five, Suit::Clubs), Suit::Clubs);
        let mut deal = Deal::new(Variant::NoTricks, Seat::North, [north, east, south, west]).unwrap();

        assert!(deal.play(Seat::North, Card::new(Rank::Two, Suit::Clubs)));
        assert!(deal.play(Seat::East, Card::new(Rank::King, Suit::Clubs)));
        assert!(deal.play(Seat::South, Card::new(Rank::Four, Suit::Clubs)));
        assert!(deal.play(Seat::West, Card::new(Rank::Five, Suit::Clubs)));
        assert!(deal.is_trick_done());

        let record = deal.end_trick().unwrap();
        assert_eq!(record.taker, Seat::East);
        assert_eq!(deal.trick_starter(), Seat::East);
        assert_eq!(deal.scores()[Seat::East.index()], 1);
        assert_eq!(deal.trick_number(), 2);
    }
}
