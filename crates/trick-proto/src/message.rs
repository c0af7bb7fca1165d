use trick_cards::{Card, Seat, Variant, SEATS};

use crate::error::LineError;

/// One line of the ASCII protocol exchanged between client and server
/// (§4.7). `encode` and `parse` are exact inverses for every valid
/// message: `parse(&m.encode()) == Ok(m)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A client announcing which seat it wants: `IAM<seat>`.
    Iam(Seat),
    /// The requested seat (or every seat, on first connect) is taken:
    /// `BUSY<seats...>`.
    Busy(Vec<Seat>),
    /// A new deal starting: `DEAL<variant><first-seat><hand>`.
    Deal {
        variant: Variant,
        first_player: Seat,
        hand: Vec<Card>,
    },
    /// Either the cards played so far in the live trick, or (when
    /// replaying history to a reconnecting client) a fully recorded past
    /// trick: `TRICK<number><cards-so-far>`.
    Trick { number: u32, cards: Vec<Card> },
    /// A rejected client message: `WRONG<number>`.
    Wrong { number: u32 },
    /// A finished trick and who took it: `TAKEN<number><4 cards><taker>`.
    Taken {
        number: u32,
        cards: [Card; 4],
        taker: Seat,
    },
    /// End-of-deal scores: `SCORE<seat><points>...` (one pair per seat).
    Score([u32; 4]),
    /// End-of-game cumulative totals: `TOTAL<seat><points>...`.
    Total([u32; 4]),
}

const PREFIX_IAM: &str = "IAM";
const PREFIX_BUSY: &str = "BUSY";
const PREFIX_DEAL: &str = "DEAL";
const PREFIX_TRICK: &str = "TRICK";
const PREFIX_WRONG: &str = "WRONG";
const PREFIX_TAKEN: &str = "TAKEN";
const PREFIX_SCORE: &str = "SCORE";
const PREFIX_TOTAL: &str = "TOTAL";

impl Message {
    pub fn encode(&self) -> String {
        match self {
            Message::Iam(seat) => format!("{}{}", PREFIX_IAM, seat),
            Message::Busy(seats) => {
                let mut s = PREFIX_BUSY.to_string();
                for seat in seats {
                    s.push_str(&seat.to_string());
                }
                s
            }
            Message::Deal {
                variant,
                first_player,
                hand,
            } => {
                let mut s = format!("{}{}{}", PREFIX_DEAL, variant.number(), first_player);
                for card in hand {
                    s.push_str(&card.to_string());
                }
                s
            }
            Message::Trick { number, cards } => {
                let mut s = format!("{}{}", PREFIX_TRICK, number);
                for card in cards {
                    s.push_str(&card.to_string());
                }
                s
            }
            Message::Wrong { number } => format!("{}{}", PREFIX_WRONG, number),
            Message::Taken {
                number,
                cards,
                taker,
            } => {
                let mut s = format!("{}{}", PREFIX_TAKEN, number);
                for card in cards {
                    s.push_str(&card.to_string());
                }
                s.push_str(&taker.to_string());
                s
            }
            Message::Score(scores) => format!("{}{}", PREFIX_SCORE, encode_scores(scores)),
            Message::Total(scores) => format!("{}{}", PREFIX_TOTAL, encode_scores(scores)),
        }
    }

    pub fn parse(line: &str) -> Result<Message, LineError> {
        if let Some(rest) = line.strip_prefix(PREFIX_IAM) {
            let seat = parse_seat(rest)?;
            expect_empty(rest_after_seat(rest)?)?;
            return Ok(Message::Iam(seat));
        }
        if let Some(rest) = line.strip_prefix(PREFIX_BUSY) {
            let seats = parse_seat_list(rest)?;
            return Ok(Message::Busy(seats));
        }
        if let Some(rest) = line.strip_prefix(PREFIX_DEAL) {
            let (variant, rest) = parse_deal_variant(rest)?;
            let first_player = parse_seat(rest)?;
            let rest = rest_after_seat(rest)?;
            let (hand, rest) = parse_card_list(rest)?;
            expect_empty(rest)?;
            return Ok(Message::Deal {
                variant,
                first_player,
                hand,
            });
        }
        if let Some(rest) = line.strip_prefix(PREFIX_TRICK) {
            let (number, rest) = parse_number_with_maybe_card(rest)?;
            let (cards, rest) = parse_card_list(rest)?;
            expect_empty(rest)?;
            return Ok(Message::Trick { number, cards });
        }
        if let Some(rest) = line.strip_prefix(PREFIX_WRONG) {
            let (number, rest) = parse_number_with_maybe_card(rest)?;
            expect_empty(rest)?;
            return Ok(Message::Wrong { number });
        }
        if let Some(rest) = line.strip_prefix(PREFIX_TAKEN) {
            let (number, rest) = parse_number_with_maybe_card(rest)?;
            let (cards, rest) = parse_card_list(rest)?;
            if cards.len() != 4 {
                return Err(LineError::BadCard(trick_cards::CardError::Truncated));
            }
            let taker = parse_seat(rest)?;
            let rest = rest_after_seat(rest)?;
            expect_empty(rest)?;
            let mut fixed = [cards[0]; 4];
            fixed.copy_from_slice(&cards);
            return Ok(Message::Taken {
                number,
                cards: fixed,
                taker,
            });
        }
        if let Some(rest) = line.strip_prefix(PREFIX_SCORE) {
            return Ok(Message::Score(parse_scores(rest)?));
        }
        if let Some(rest) = line.strip_prefix(PREFIX_TOTAL) {
            return Ok(Message::Total(parse_scores(rest)?));
        }
        Err(LineError::UnknownPrefix(line.to_string()))
    }
}

fn encode_scores(scores: &[u32; 4]) -> String {
    let mut s = String::new();
    for seat in SEATS {
        s.push_str(&seat.to_string());
        s.push_str(&scores[seat.index()].to_string());
    }
    s
}

fn parse_scores(text: &str) -> Result<[u32; 4], LineError> {
    let mut scores = [0u32; 4];
    let mut seen = [false; 4];
    let mut rest = text;
    for _ in 0..4 {
        let seat = parse_seat(rest)?;
        rest = rest_after_seat(rest)?;
        if seen[seat.index()] {
            return Err(LineError::DuplicateSeat);
        }
        seen[seat.index()] = true;
        let (n, after) = parse_number_with_maybe_card(rest)?;
        scores[seat.index()] = n;
        rest = after;
    }
    expect_empty(rest)?;
    Ok(scores)
}

fn parse_seat(text: &str) -> Result<Seat, LineError> {
    let letter = text.get(..1).ok_or_else(|| LineError::BadSeat(text.to_string()))?;
    Seat::parse(letter).ok_or_else(|| LineError::BadSeat(text.to_string()))
}

fn rest_after_seat(text: &str) -> Result<&str, LineError> {
    if text.is_empty() {
        return Err(LineError::BadSeat(text.to_string()));
    }
    Ok(&text[1..])
}

fn parse_seat_list(mut text: &str) -> Result<Vec<Seat>, LineError> {
    let mut seats = Vec::new();
    while !text.is_empty() {
        let seat = parse_seat(text)?;
        if seats.contains(&seat) {
            return Err(LineError::DuplicateSeat);
        }
        seats.push(seat);
        text = rest_after_seat(text)?;
    }
    Ok(seats)
}

fn parse_card_list(mut text: &str) -> Result<(Vec<Card>, &str), LineError> {
    let mut cards = Vec::new();
    while !text.is_empty() {
        match Card::parse(text) {
            Ok((card, rest)) => {
                if cards.contains(&card) {
                    return Err(LineError::BadCard(trick_cards::CardError::BadToken(
                        text.to_string(),
                    )));
                }
                cards.push(card);
                text = rest;
            }
            Err(_) => break,
        }
    }
    Ok((cards, text))
}

fn expect_empty(text: &str) -> Result<(), LineError> {
    if text.is_empty() {
        Ok(())
    } else {
        Err(LineError::TrailingGarbage(text.to_string()))
    }
}

/// Consumes a single digit `1`..`7` naming a scoring variant. Unlike the
/// trick/wrong/taken counters, this is a single fixed-width token, never
/// disambiguated against a trailing card.
fn parse_deal_variant(text: &str) -> Result<(Variant, &str), LineError> {
    let digit = text.as_bytes().first().copied().ok_or_else(|| LineError::BadNumber(text.to_string()))?;
    if !digit.is_ascii_digit() {
        return Err(LineError::BadNumber(text.to_string()));
    }
    let n = digit - b'0';
    let variant = Variant::from_number(n).map_err(|_| LineError::BadNumber(text.to_string()))?;
    Ok((variant, &text[1..]))
}

/// Greedily consumes leading digits as a number, except it stops one
/// digit short whenever the untouched remainder would otherwise already
/// parse as a complete card token — e.g. in `TRICK110H`, the `1` before
/// `10H` must not be swallowed as part of an `11`-trick count.
fn parse_number_with_maybe_card(text: &str) -> Result<(u32, &str), LineError> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && Card::parse(&text[i..]).is_err() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == 0 {
        return Err(LineError::BadNumber(text.to_string()));
    }
    let number: u32 = text[..i]
        .parse()
        .map_err(|_| LineError::BadNumber(text.to_string()))?;
    Ok((number, &text[i..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trick_cards::Rank;
    use trick_cards::Suit;

    #[test]
    fn iam_round_trips() {
        let msg = Message::Iam(Seat::East);
        assert_eq!(msg.encode(), "IAME");
        assert_eq!(Message::parse("IAME").unwrap(), msg);
    }

    #[test]
    fn busy_round_trips_with_empty_and_full_lists() {
        assert_eq!(Message::Busy(vec![]).encode(), "BUSY");
        let full = Message::Busy(vec![Seat::North, Seat::East, Seat::South, Seat::West]);
        assert_eq!(full.encode(), "BUSYNESW");
        assert_eq!(Message::parse("BUSYNESW").unwrap(), full);
    }

    #[test]
    fn deal_round_trips() {
        let hand = vec![
            Card::new(Rank::Two, Suit::Clubs),
            Card::new(Rank::Ten, Suit::Hearts),
            Card::new(Rank::Ace, Suit::Spades),
        ];
        let msg = Message::Deal {
            variant: Variant::Combined,
            first_player: Seat::South,
            hand: hand.clone(),
        };
        let line = msg.encode();
        assert_eq!(line, "DEAL7S2C10HAS");
        assert_eq!(Message::parse(&line).unwrap(), msg);
    }

    #[test]
    fn trick_number_is_not_confused_with_a_leading_card_digit() {
        let msg = Message::Trick {
            number: 1,
            cards: vec![Card::new(Rank::Ten, Suit::Hearts)],
        };
        let line = msg.encode();
        assert_eq!(line, "TRICK110H");
        assert_eq!(Message::parse(&line).unwrap(), msg);
    }

    #[test]
    fn taken_requires_exactly_four_cards() {
        let line = "TAKEN12C3D4HASN";
        let err = Message::parse(line).unwrap_err();
        assert!(matches!(err, LineError::BadCard(_)));
    }

    #[test]
    fn taken_round_trips() {
        let msg = Message::Taken {
            number: 3,
            cards: [
                Card::new(Rank::Two, Suit::Clubs),
                Card::new(Rank::Three, Suit::Diamonds),
                Card::new(Rank::Four, Suit::Hearts),
                Card::new(Rank::Ace, Suit::Spades),
            ],
            taker: Seat::North,
        };
        let line = msg.encode();
        assert_eq!(Message::parse(&line).unwrap(), msg);
    }

    #[test]
    fn score_rejects_duplicate_seats() {
        let err = Message::parse("SCOREN1E2S3N4").unwrap_err();
        assert_eq!(err, LineError::DuplicateSeat);
    }

    #[test]
    fn score_round_trips() {
        let msg = Message::Score([10, 20, 0, 5]);
        let line = msg.encode();
        assert_eq!(line, "SCOREN10E20S0W5");
        assert_eq!(Message::parse(&line).unwrap(), msg);
    }

    #[test]
    fn unknown_prefix_is_reported() {
        let err = Message::parse("HELLO").unwrap_err();
        assert!(matches!(err, LineError::UnknownPrefix(_)));
    }
}
