//! ASCII line protocol (C6) binding `trick-cards` types to the wire
//! format exchanged between client and server: `IAM`, `BUSY`, `DEAL`,
//! `TRICK`, `WRONG`, `TAKEN`, `SCORE`, `TOTAL`.

pub mod error;
pub mod message;

pub use error::LineError;
pub use message::Message;
