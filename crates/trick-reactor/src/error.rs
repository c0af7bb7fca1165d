use std::error::Error;
use std::fmt;
use std::io;

/// Reactor/connection-level failures (§4.7/§4.8).
#[derive(Debug)]
pub enum ReactorError {
    Io(io::Error),
    /// A peer sent more than `max_line_len` bytes without a `\r\n`
    /// terminator. Treated as fatal for that connection, never the whole
    /// reactor.
    LineTooLong,
    NotUtf8,
    UnknownConnection(usize),
}

impl fmt::Display for ReactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactorError::Io(e) => write!(f, "io error: {}", e),
            ReactorError::LineTooLong => write!(f, "line exceeded the maximum buffered length"),
            ReactorError::NotUtf8 => write!(f, "received bytes were not valid utf-8"),
            ReactorError::UnknownConnection(id) => write!(f, "no connection with id {}", id),
        }
    }
}

impl Error for ReactorError {}

impl From<io::Error> for ReactorError {
    fn from(e: io::Error) -> ReactorError {
        ReactorError::Io(e)
    }
}
