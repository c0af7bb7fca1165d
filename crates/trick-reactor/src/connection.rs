use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

use mio::net::TcpStream;

use crate::buffer::LineBuffer;
use crate::error::ReactorError;

/// Maximum bytes a single unterminated line may occupy before the
/// connection is considered misbehaving (§4.7).
pub const MAX_LINE_LEN: usize = 4096;

/// One peer's socket plus its line-framed read/write state. Read and
/// write are both driven by readiness events delivered by `Reactor`.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    in_buf: LineBuffer,
    out_buf: VecDeque<u8>,
    closed: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Connection {
        Connection {
            stream,
            peer,
            in_buf: LineBuffer::new(MAX_LINE_LEN),
            out_buf: VecDeque::new(),
            closed: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.out_buf.is_empty()
    }

    /// Reads everything currently available on the socket into the line
    /// buffer. Call after a readable-readiness event.
    pub fn fill_from_socket(&mut self) -> Result<(), ReactorError> {
        let mut scratch = [0u8; 4096];
        loop {
            match self.stream.read(&mut scratch) {
                Ok(0) => {
                    self.closed = true;
                    return Ok(());
                }
                Ok(n) => self.in_buf.push(&scratch[..n])?,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Pops the next complete line received from the peer, if any.
    pub fn next_line(&mut self) -> Result<Option<String>, ReactorError> {
        self.in_buf.take_line()
    }

    /// Queues `line` (plus the `\r\n` terminator) for transmission. Does
    /// not touch the socket; call `flush_to_socket` once the connection
    /// is writable.
    pub fn queue_line(&mut self, line: &str) {
        self.out_buf.extend(line.as_bytes());
        self.out_buf.extend(b"\r\n");
    }

    /// Drains as much of the output buffer to the socket as readiness
    /// allows. Call after a writable-readiness event.
    pub fn flush_to_socket(&mut self) -> Result<(), ReactorError> {
        while !self.out_buf.is_empty() {
            let (front, _) = self.out_buf.as_slices();
            match self.stream.write(front) {
                Ok(0) => return Ok(()),
                Ok(n) => {
                    self.out_buf.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
