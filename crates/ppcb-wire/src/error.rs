use std::fmt;
use std::io;

/// Error vocabulary for the PPCB transport layer (C2).
///
/// Mirrors the teacher's `NetworkError`/`ErrorUtils` split: a `WouldBlock`
/// from the OS is not a failure, it's a cue to keep waiting, so it gets its
/// own variant instead of being folded into `Io`.
#[derive(Debug)]
pub enum TransportError {
    /// The deadline for this logical wait elapsed before `n` bytes arrived.
    Timeout,
    /// A datagram was shorter than the caller asked to read from it.
    TruncatedPacket { wanted: usize, got: usize },
    /// An oversized write was attempted on a datagram transport.
    OversizedDatagram { len: usize, max: usize },
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "transport: deadline exceeded"),
            TransportError::TruncatedPacket { wanted, got } => write!(
                f,
                "transport: truncated packet (wanted {wanted} bytes, got {got})"
            ),
            TransportError::OversizedDatagram { len, max } => write!(
                f,
                "transport: datagram write of {len} bytes exceeds max {max}"
            ),
            TransportError::Io(e) => write!(f, "transport: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TransportError::Timeout,
            _ => TransportError::Io(e),
        }
    }
}

/// Error vocabulary produced by the session engine (C3, §4.3.5).
#[derive(Debug)]
pub enum SessionError {
    /// A frame of the wrong kind or wrong packet number arrived where an
    /// exact kind/number was expected.
    UnexpectedPacket { expected: &'static str, got: u8 },
    /// The peer rejected chunk `k`.
    RejectedData(u32),
    /// `DATA` whose declared length is invalid.
    MalformedData(u32),
    /// Stream-variant only: a frame carried the wrong session id. Fatal.
    SessionMismatch,
    /// No forward progress within the retransmit budget.
    Timeout,
    Transport(TransportError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnexpectedPacket { expected, got } => {
                write!(f, "expected {expected}, got kind {got}")
            }
            SessionError::RejectedData(k) => write!(f, "peer rejected chunk {k}"),
            SessionError::MalformedData(k) => write!(f, "malformed DATA chunk {k}"),
            SessionError::SessionMismatch => write!(f, "session id mismatch on stream transport"),
            SessionError::Timeout => write!(f, "session timed out"),
            SessionError::Transport(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => SessionError::Timeout,
            other => SessionError::Transport(other),
        }
    }
}

/// Errors that can occur while decoding bytes into a `Packet` (C1).
#[derive(Debug)]
pub enum CodecError {
    UnknownKind(u8),
    PayloadTooLarge { declared: u64, max: u64 },
    Truncated,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownKind(k) => write!(f, "unknown packet kind {k}"),
            CodecError::PayloadTooLarge { declared, max } => {
                write!(f, "declared byte_count {declared} exceeds max {max}")
            }
            CodecError::Truncated => write!(f, "packet truncated"),
        }
    }
}

impl std::error::Error for CodecError {}
