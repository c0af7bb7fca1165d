use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::TransportError;

/// Maximum UDP datagram this implementation will ever construct or accept
/// (platform-friendly upper bound, §4.2).
pub const MAX_DATAGRAM: usize = 65_535;

/// Deadline-aware "read exactly N bytes" contract shared by both link
/// kinds (§4.2). `rewind()` lets a caller re-parse the current message
/// from its start, e.g. after peeking a header to decide how to dispatch.
pub trait FrameReader {
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, TransportError>;
    fn rewind(&mut self);
}

/// Stream-backed transport: an ordered, reliable byte pipe (TCP).
pub struct StreamTransport {
    stream: TcpStream,
    deadline: Instant,
    /// Bytes read for the message currently being parsed; `rewind()`
    /// replays from the start of this buffer instead of hitting the wire.
    history: Vec<u8>,
    replay_pos: usize,
}

impl StreamTransport {
    pub fn new(stream: TcpStream, deadline: Instant) -> StreamTransport {
        StreamTransport {
            stream,
            deadline,
            history: Vec::new(),
            replay_pos: 0,
        }
    }

    /// Start parsing a fresh message: drop replay history from the
    /// previous one. Call once a full packet has been consumed.
    pub fn start_message(&mut self) {
        self.history.clear();
        self.replay_pos = 0;
    }

    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = deadline;
    }

    fn remaining(&self) -> Result<Duration, TransportError> {
        let now = Instant::now();
        if now >= self.deadline {
            Err(TransportError::Timeout)
        } else {
            Ok(self.deadline - now)
        }
    }

    /// Whole-buffer write, looping on short writes (§4.2 writer contract).
    pub fn send(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(buf)?;
        Ok(())
    }

    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        self.stream.peer_addr()
    }
}

impl FrameReader for StreamTransport {
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        let mut out = vec![0u8; n];
        let mut filled = 0usize;

        // Serve as much as possible from replayed history first.
        if self.replay_pos < self.history.len() {
            let avail = &self.history[self.replay_pos..];
            let take = avail.len().min(n);
            out[..take].copy_from_slice(&avail[..take]);
            self.replay_pos += take;
            filled += take;
        }

        while filled < n {
            let remaining = self.remaining()?;
            self.stream.set_read_timeout(Some(remaining))?;
            match self.stream.read(&mut out[filled..]) {
                Ok(0) => return Err(TransportError::Io(std::io::ErrorKind::UnexpectedEof.into())),
                Ok(read) => {
                    self.history.extend_from_slice(&out[filled..filled + read]);
                    self.replay_pos = self.history.len();
                    filled += read;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(out)
    }

    fn rewind(&mut self) {
        self.replay_pos = 0;
    }
}

/// One received datagram, cursor-walked by successive `read_exact` calls
/// (§4.2 datagram contract: exactly one receive per transport instance).
pub struct DatagramFrame {
    buf: Vec<u8>,
    cursor: usize,
    peer: SocketAddr,
}

impl DatagramFrame {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// The full received datagram, regardless of cursor position.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl FrameReader for DatagramFrame {
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        if self.cursor + n > self.buf.len() {
            return Err(TransportError::TruncatedPacket {
                wanted: n,
                got: self.buf.len().saturating_sub(self.cursor),
            });
        }
        let slice = self.buf[self.cursor..self.cursor + n].to_vec();
        self.cursor += n;
        Ok(slice)
    }

    fn rewind(&mut self) {
        self.cursor = 0;
    }
}

/// Shared handle to a bound UDP socket. `Rc` suffices: every program in
/// this workspace drives its transport synchronously on one thread.
#[derive(Clone)]
pub struct DatagramSocket(Rc<UdpSocket>);

impl DatagramSocket {
    pub fn bind(addr: SocketAddr) -> Result<DatagramSocket, TransportError> {
        let socket = UdpSocket::bind(addr)?;
        Ok(DatagramSocket(Rc::new(socket)))
    }

    pub fn from_socket(socket: UdpSocket) -> DatagramSocket {
        DatagramSocket(Rc::new(socket))
    }

    pub fn connect(&self, addr: SocketAddr) -> Result<(), TransportError> {
        self.0.connect(addr)?;
        Ok(())
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.0.local_addr()
    }

    /// Block for exactly one datagram, subject to `deadline`.
    pub fn recv_one(&self, deadline: Instant) -> Result<DatagramFrame, TransportError> {
        let now = Instant::now();
        if now >= deadline {
            return Err(TransportError::Timeout);
        }
        self.0.set_read_timeout(Some(deadline - now))?;

        let mut scratch = vec![0u8; MAX_DATAGRAM];
        let (len, peer) = self.0.recv_from(&mut scratch)?;
        scratch.truncate(len);
        Ok(DatagramFrame {
            buf: scratch,
            cursor: 0,
            peer,
        })
    }

    /// Block indefinitely for exactly one datagram. Used by the server
    /// accept loop, which has no active session yet and therefore no
    /// deadline to honour.
    pub fn recv_blocking(&self) -> Result<DatagramFrame, TransportError> {
        self.0.set_read_timeout(None)?;
        let mut scratch = vec![0u8; MAX_DATAGRAM];
        let (len, peer) = self.0.recv_from(&mut scratch)?;
        scratch.truncate(len);
        Ok(DatagramFrame {
            buf: scratch,
            cursor: 0,
            peer,
        })
    }

    /// One-shot send; oversized writes are a programming error, not a
    /// recoverable condition (§4.2).
    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<(), TransportError> {
        if buf.len() > MAX_DATAGRAM {
            return Err(TransportError::OversizedDatagram {
                len: buf.len(),
                max: MAX_DATAGRAM,
            });
        }
        self.0.send_to(buf, addr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn stream_read_exact_blocks_for_full_count() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut client = TcpStream::connect(addr).unwrap();
            client.write_all(&[1, 2]).unwrap();
            thread::sleep(Duration::from_millis(20));
            client.write_all(&[3, 4, 5]).unwrap();
        });

        let (server_stream, _) = listener.accept().unwrap();
        let mut t = StreamTransport::new(server_stream, Instant::now() + Duration::from_secs(2));
        let bytes = t.read_exact(5).unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4, 5]);
        handle.join().unwrap();
    }

    #[test]
    fn stream_rewind_replays_history() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut client = TcpStream::connect(addr).unwrap();
            client.write_all(&[9, 9, 9, 9]).unwrap();
        });
        let (server_stream, _) = listener.accept().unwrap();
        let mut t = StreamTransport::new(server_stream, Instant::now() + Duration::from_secs(2));
        let first = t.read_exact(2).unwrap();
        t.rewind();
        let replayed = t.read_exact(2).unwrap();
        assert_eq!(first, replayed);
        handle.join().unwrap();
    }

    #[test]
    fn stream_read_past_deadline_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).unwrap();
        let (server_stream, _) = listener.accept().unwrap();
        let mut t = StreamTransport::new(server_stream, Instant::now() + Duration::from_millis(20));
        let err = t.read_exact(4).unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
    }

    #[test]
    fn datagram_truncated_is_distinguishable() {
        let a = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let b = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        b.send_to(&[1, 2, 3], a.local_addr().unwrap()).unwrap();
        let mut frame = a.recv_one(Instant::now() + Duration::from_secs(1)).unwrap();
        let err = frame.read_exact(10).unwrap_err();
        assert!(matches!(err, TransportError::TruncatedPacket { wanted: 10, got: 3 }));
    }

    #[test]
    fn datagram_rewind_resets_cursor() {
        let a = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let b = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        b.send_to(&[7, 7], a.local_addr().unwrap()).unwrap();
        let mut frame = a.recv_one(Instant::now() + Duration::from_secs(1)).unwrap();
        let first = frame.read_exact(1).unwrap();
        frame.rewind();
        let replayed = frame.read_exact(1).unwrap();
        assert_eq!(first, replayed);
    }
}
