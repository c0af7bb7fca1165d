//! Single-threaded readiness-multiplexed reactor (C7): an `mio`-driven
//! accept loop and a table of line-framed connections, generalizing the
//! teacher's encrypted game-channel endpoint to a plain-text line
//! protocol with no handshake phase.

pub mod buffer;
pub mod connection;
pub mod error;
pub mod reactor;

pub use buffer::LineBuffer;
pub use connection::{Connection, MAX_LINE_LEN};
pub use error::ReactorError;
pub use reactor::{Reactor, ReadyEvent};
