use std::error::Error;
use std::fmt;

use trick_cards::GameError;
use trick_reactor::ReactorError;

#[derive(Debug)]
pub enum GameServerError {
    Reactor(ReactorError),
    Game(GameError),
    NoDeals,
}

impl fmt::Display for GameServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameServerError::Reactor(e) => write!(f, "{}", e),
            GameServerError::Game(e) => write!(f, "{}", e),
            GameServerError::NoDeals => write!(f, "no deals were supplied"),
        }
    }
}

impl Error for GameServerError {}

impl From<ReactorError> for GameServerError {
    fn from(e: ReactorError) -> GameServerError {
        GameServerError::Reactor(e)
    }
}

impl From<GameError> for GameServerError {
    fn from(e: GameError) -> GameServerError {
        GameServerError::Game(e)
    }
}
