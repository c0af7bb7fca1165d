//! PPCB packet codec, deadline-aware transport, and the per-session state
//! machine that drives the client/server frame exchange (§4.1–§4.3).

pub mod codec;
pub mod error;
pub mod session;
pub mod transport;

pub use codec::{Kind, LinkProtocol, Packet, DMAX};
pub use error::{CodecError, SessionError, TransportError};
pub use session::{Session, SkipSet, MAX_WAIT, RMAX};
pub use transport::{DatagramFrame, DatagramSocket, FrameReader, StreamTransport, MAX_DATAGRAM};
