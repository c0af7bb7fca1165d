use std::fmt;

/// One of the four positions at the table (§4.6).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Seat {
    North,
    East,
    South,
    West,
}

pub const SEATS: [Seat; 4] = [Seat::North, Seat::East, Seat::South, Seat::West];

impl Seat {
    /// Index into the 4-wide arrays `Deal` keeps per seat.
    pub fn index(self) -> usize {
        match self {
            Seat::North => 0,
            Seat::East => 1,
            Seat::South => 2,
            Seat::West => 3,
        }
    }

    pub fn from_index(i: usize) -> Seat {
        SEATS[i % 4]
    }

    pub fn next(self) -> Seat {
        Seat::from_index(self.index() + 1)
    }

    pub fn letter(self) -> char {
        match self {
            Seat::North => 'N',
            Seat::East => 'E',
            Seat::South => 'S',
            Seat::West => 'W',
        }
    }

    /// Parses a single-letter seat token, e.g. from `-N`/`-E`/`-S`/`-W`
    /// client options or from a `DEAL`/`TRICK` line.
    pub fn parse(s: &str) -> Option<Seat> {
        match s {
            "N" => Some(Seat::North),
            "E" => Some(Seat::East),
            "S" => Some(Seat::South),
            "W" => Some(Seat::West),
            _ => None,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps_around_the_table() {
        assert_eq!(Seat::West.next(), Seat::North);
        assert_eq!(Seat::North.next(), Seat::East);
    }

    #[test]
    fn parse_round_trips_with_display() {
        for seat in SEATS {
            assert_eq!(Seat::parse(&seat.to_string()), Some(seat));
        }
        assert_eq!(Seat::parse("X"), None);
    }
}
