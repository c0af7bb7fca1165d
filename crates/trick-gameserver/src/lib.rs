mod error;
mod orchestrator;
mod transcript;

pub use error::GameServerError;
pub use orchestrator::{DealConfig, GameServer, SEAT_TIMEOUT};
pub use transcript::TranscriptLogger;
