use crate::card::{Card, Rank, Suit};
use crate::error::GameError;

/// Which of the 7 scoring rules governs a deal (§4.5). `Combined` sums the
/// penalties of all six single rules for every trick.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Variant {
    NoTricks,
    NoHearts,
    NoQueens,
    NoJacksOrKings,
    NoKingOfHearts,
    NoLastTwoTricks,
    Combined,
}

impl Variant {
    pub fn from_number(n: u8) -> Result<Variant, GameError> {
        match n {
            1 => Ok(Variant::NoTricks),
            2 => Ok(Variant::NoHearts),
            3 => Ok(Variant::NoQueens),
            4 => Ok(Variant::NoJacksOrKings),
            5 => Ok(Variant::NoKingOfHearts),
            6 => Ok(Variant::NoLastTwoTricks),
            7 => Ok(Variant::Combined),
            other => Err(GameError::UnknownDealVariant(other)),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Variant::NoTricks => 1,
            Variant::NoHearts => 2,
            Variant::NoQueens => 3,
            Variant::NoJacksOrKings => 4,
            Variant::NoKingOfHearts => 5,
            Variant::NoLastTwoTricks => 6,
            Variant::Combined => 7,
        }
    }
}

/// Penalty points a single trick adds to its taker's score (§4.5).
/// `trick_number` is 1-based (the first trick of the deal is 1, the last
/// is 13).
pub fn trick_penalty(variant: Variant, cards: &[Card; 4], trick_number: u32) -> u32 {
    let combined = variant == Variant::Combined;
    let mut total = 0;

    if variant == Variant::NoTricks || combined {
        total += 1;
    }
    if variant == Variant::NoHearts || combined {
        total += cards.iter().filter(|c| c.suit == Suit::Hearts).count() as u32;
    }
    if variant == Variant::NoQueens || combined {
        total += 5 * cards.iter().filter(|c| c.rank == Rank::Queen).count() as u32;
    }
    if variant == Variant::NoJacksOrKings || combined {
        total += 2 * cards
            .iter()
            .filter(|c| c.rank == Rank::Jack || c.rank == Rank::King)
            .count() as u32;
    }
    if variant == Variant::NoKingOfHearts || combined {
        let has_king_of_hearts = cards
            .iter()
            .any(|c| c.rank == Rank::King && c.suit == Suit::Hearts);
        if has_king_of_hearts {
            total += 18;
        }
    }
    if variant == Variant::NoLastTwoTricks || combined {
        if trick_number == 7 || trick_number == 13 {
            total += 10;
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Suit;

    fn trick(ranks: [(Rank, Suit); 4]) -> [Card; 4] {
        [
            Card::new(ranks[0].0, ranks[0].1),
            Card::new(ranks[1].0, ranks[1].1),
            Card::new(ranks[2].0, ranks[2].1),
            Card::new(ranks[3].0, ranks[3].1),
        ]
    }

    #[test]
    fn no_tricks_always_costs_one() {
        let cards = trick([
            (Rank::Two, Suit::Clubs),
            (Rank::Three, Suit::Clubs),
            (Rank::Four, Suit::Clubs),
            (Rank::Five, Suit::Clubs),
        ]);
        assert_eq!(trick_penalty(Variant::NoTricks, &cards, 1), 1);
    }

    #[test]
    fn king_of_hearts_costs_eighteen_only_when_present() {
        let with = trick([
            (Rank::King, Suit::Hearts),
            (Rank::Two, Suit::Clubs),
            (Rank::Three, Suit::Clubs),
            (Rank::Four, Suit::Clubs),
        ]);
        let without = trick([
            (Rank::King, Suit::Spades),
            (Rank::Two, Suit::Clubs),
            (Rank::Three, Suit::Clubs),
            (Rank::Four, Suit::Clubs),
        ]);
        assert_eq!(trick_penalty(Variant::NoKingOfHearts, &with, 3), 18);
        assert_eq!(trick_penalty(Variant::NoKingOfHearts, &without, 3), 0);
    }

    #[test]
    fn last_two_tricks_only_fire_on_seven_and_thirteen() {
        let cards = trick([
            (Rank::Two, Suit::Clubs),
            (Rank::Three, Suit::Clubs),
            (Rank::Four, Suit::Clubs),
            (Rank::Five, Suit::Clubs),
        ]);
        assert_eq!(trick_penalty(Variant::NoLastTwoTricks, &cards, 7), 10);
        assert_eq!(trick_penalty(Variant::NoLastTwoTricks, &cards, 13), 10);
        assert_eq!(trick_penalty(Variant::NoLastTwoTricks, &cards, 8), 0);
    }

    #[test]
    fn combined_deal_sums_a_full_fifty_two_card_play() {
        // Deal out a full deck across 13 tricks so every rule's total
        // across the whole deal equals a known constant: 13 tricks (rule
        // 1), 13 hearts (rule 2), 4 queens (rule 3), 8 jacks+kings (rule
        // 4), the lone king of hearts lands in exactly one trick (rule
        // 5), and tricks 7 and 13 always fire (rule 6).
        let deck = Card::full_deck();
        let mut total = 0;
        for trick_number in 1..=13u32 {
            let base = (trick_number as usize - 1) * 4;
            let cards = [deck[base], deck[base + 1], deck[base + 2], deck[base + 3]];
            total += trick_penalty(Variant::Combined, &cards, trick_number);
        }
        assert_eq!(total, 13 + 13 + 5 * 4 + 2 * 8 + 18 + 20);
    }
}
