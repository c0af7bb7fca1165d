use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use crate::codec::{Kind, LinkProtocol, Packet, DMAX};
use crate::error::{SessionError, TransportError};
use crate::transport::{DatagramFrame, DatagramSocket, FrameReader, StreamTransport};

/// Single logical wait, per §4.3.4.
pub const MAX_WAIT: Duration = Duration::from_secs(5);
/// Total retransmissions budgeted per outstanding frame, per §6.1.
pub const RMAX: u32 = 5;

/// A single skip-set rule (§4.3.2): late duplicates of `kind` are
/// discarded rather than handed to the caller.
#[derive(Debug, Clone, Copy)]
enum SkipRule {
    Numbered(Kind, u32),
    Unnumbered(Kind),
}

/// Builder for the predicates `get_next` uses to swallow late duplicates.
#[derive(Debug, Clone, Default)]
pub struct SkipSet(Vec<SkipRule>);

impl SkipSet {
    pub fn new() -> SkipSet {
        SkipSet(Vec::new())
    }

    pub fn numbered(mut self, kind: Kind, expected: u32) -> SkipSet {
        self.0.push(SkipRule::Numbered(kind, expected));
        self
    }

    pub fn unnumbered(mut self, kind: Kind) -> SkipSet {
        self.0.push(SkipRule::Unnumbered(kind));
        self
    }

    fn should_skip(&self, packet: &Packet) -> bool {
        for rule in &self.0 {
            match rule {
                SkipRule::Numbered(k, w) if packet.kind() == *k => {
                    if let Some(no) = packet.packet_no() {
                        if no < *w {
                            return true;
                        }
                    }
                }
                SkipRule::Unnumbered(k) if packet.kind() == *k => return true,
                _ => {}
            }
        }
        false
    }
}

enum Link {
    Stream(StreamTransport),
    Datagram(DatagramSocket),
}

/// Per-session state machine (C3): framing, duplicate filtering,
/// retransmission, deadline renewal, mis-routed-packet rejection.
pub struct Session {
    link: Link,
    session_id: u64,
    peer: SocketAddr,
    uses_stream: bool,
    has_retransmit: bool,
    is_server: bool,
    last_sent: Option<Packet>,
    retries_left: u32,
    log: slog::Logger,
}

impl Session {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn uses_stream(&self) -> bool {
        self.uses_stream
    }

    pub fn has_retransmit(&self) -> bool {
        self.has_retransmit
    }

    /// Construct a client-side TCP session. `session_id` has already been
    /// chosen by the caller.
    pub fn connect_tcp(stream: TcpStream, session_id: u64, log: slog::Logger) -> Result<Session, SessionError> {
        let peer = stream.peer_addr().map_err(TransportError::from)?;
        let transport = StreamTransport::new(stream, Instant::now() + MAX_WAIT);
        Ok(Session {
            link: Link::Stream(transport),
            session_id,
            peer,
            uses_stream: true,
            has_retransmit: false,
            is_server: false,
            last_sent: None,
            retries_left: 0,
            log,
        })
    }

    /// Construct a client-side UDP session (plain or with retransmit).
    pub fn connect_udp(
        socket: DatagramSocket,
        peer: SocketAddr,
        session_id: u64,
        has_retransmit: bool,
        log: slog::Logger,
    ) -> Session {
        Session {
            link: Link::Datagram(socket),
            session_id,
            peer,
            uses_stream: false,
            has_retransmit,
            is_server: false,
            last_sent: None,
            retries_left: 0,
            log,
        }
    }

    /// Server-side accept on an already-accepted TCP stream: read the
    /// opening `CONN` and build the session around it.
    pub fn accept_tcp(stream: TcpStream, log: slog::Logger) -> Result<(Session, Packet), SessionError> {
        let peer = stream.peer_addr().map_err(TransportError::from)?;
        let mut transport = StreamTransport::new(stream, Instant::now() + MAX_WAIT);
        let (kind, session_id) = read_header(&mut transport)?;
        if kind != Kind::Conn {
            return Err(SessionError::UnexpectedPacket {
                expected: "CONN",
                got: kind as u8,
            });
        }
        let conn = read_rest(&mut transport, kind, session_id)?;
        let session = Session {
            link: Link::Stream(transport),
            session_id,
            peer,
            uses_stream: true,
            has_retransmit: false,
            is_server: true,
            last_sent: None,
            retries_left: 0,
            log,
        };
        Ok((session, conn))
    }

    /// Server-side accept on a shared UDP socket: block (no deadline, this
    /// is the outer accept loop, not a session wait) until a `CONN`
    /// arrives, ignoring anything else since no session is active yet.
    pub fn accept_udp(socket: DatagramSocket, log: slog::Logger) -> Result<(Session, Packet), SessionError> {
        loop {
            let mut frame = socket.recv_blocking()?;
            let (kind, session_id) = match read_header(&mut frame) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if kind != Kind::Conn {
                continue;
            }
            let conn = match read_rest(&mut frame, kind, session_id) {
                Ok(p) => p,
                Err(_) => continue,
            };
            let has_retransmit = matches!(&conn, Packet::Conn { protocol, .. } if *protocol == LinkProtocol::UdpR as u8);
            let peer = frame.peer();
            let session = Session {
                link: Link::Datagram(socket),
                session_id,
                peer,
                uses_stream: false,
                has_retransmit,
                is_server: true,
                last_sent: None,
                retries_left: 0,
                log,
            };
            return Ok((session, conn));
        }
    }

    /// Send a frame to this session's peer. On the retransmit variant this
    /// arms the retransmission budget (§4.3.3).
    pub fn send(&mut self, packet: Packet) -> Result<(), SessionError> {
        self.transmit(&packet)?;
        if self.has_retransmit {
            self.last_sent = Some(packet);
            self.retries_left = RMAX;
        }
        Ok(())
    }

    /// Server-only: reply to a stranger's frame without touching this
    /// session's own retransmission bookkeeping (§4.3.2 mis-routed rules).
    fn reply_to(&self, packet: &Packet, addr: SocketAddr) {
        if let Link::Datagram(socket) = &self.link {
            let _ = socket.send_to(&packet.encode(), addr);
        }
    }

    fn transmit(&mut self, packet: &Packet) -> Result<(), SessionError> {
        let bytes = packet.encode();
        match &mut self.link {
            Link::Stream(t) => t.send(&bytes).map_err(SessionError::from),
            Link::Datagram(s) => s.send_to(&bytes, self.peer).map_err(SessionError::from),
        }
    }

    /// Read the next frame addressed to this session, applying the
    /// transport-dependent filtering of §4.3.2 and the retransmit loop of
    /// §4.3.3.
    pub fn get_next(&mut self, skip: &SkipSet) -> Result<Packet, SessionError> {
        loop {
            let deadline = Instant::now() + MAX_WAIT;
            match self.try_read_one(deadline, skip) {
                Ok(Some(packet)) => return Ok(packet),
                Ok(None) => continue,
                Err(SessionError::Timeout)
                    if self.has_retransmit && self.retries_left > 0 && self.last_sent.is_some() =>
                {
                    self.retries_left -= 1;
                    slog::debug!(self.log, "retransmitting"; "retries_left" => self.retries_left);
                    let packet = self.last_sent.clone().expect("checked above");
                    self.transmit(&packet)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_read_one(&mut self, deadline: Instant, skip: &SkipSet) -> Result<Option<Packet>, SessionError> {
        match &mut self.link {
            Link::Stream(transport) => {
                transport.set_deadline(deadline);
                transport.start_message();
                let (kind, session_id) = read_header(transport)?;
                if session_id != self.session_id {
                    return Err(SessionError::SessionMismatch);
                }
                let packet = read_rest(transport, kind, session_id)?;
                if skip.should_skip(&packet) {
                    return Ok(None);
                }
                Ok(Some(packet))
            }
            Link::Datagram(socket) => {
                let mut frame = socket.recv_one(deadline)?;
                let (kind, session_id) = read_header(&mut frame)?;

                if session_id == self.session_id && frame.peer() == self.peer {
                    let packet = read_rest(&mut frame, kind, session_id)?;
                    if skip.should_skip(&packet) {
                        return Ok(None);
                    }
                    return Ok(Some(packet));
                }

                if self.is_server && kind == Kind::Conn {
                    let stranger = frame.peer();
                    slog::debug!(self.log, "rejecting mis-routed CONN"; "stranger" => %stranger, "other_session" => session_id);
                    self.reply_to(&Packet::ConnRjt { session_id }, stranger);
                } else if self.is_server && kind == Kind::Data {
                    if let Ok(Packet::Data { packet_no, .. }) = read_rest(&mut frame, kind, session_id) {
                        let stranger = frame.peer();
                        slog::debug!(self.log, "rejecting mis-routed DATA"; "stranger" => %stranger, "other_session" => session_id);
                        self.reply_to(
                            &Packet::Rjt {
                                session_id,
                                packet_no,
                            },
                            stranger,
                        );
                    }
                }
                Ok(None)
            }
        }
    }
}

fn read_header<F: FrameReader>(f: &mut F) -> Result<(Kind, u64), SessionError> {
    let hdr = f.read_exact(9)?;
    let kind = Kind::from_u8(hdr[0]).ok_or(SessionError::UnexpectedPacket {
        expected: "known packet kind",
        got: hdr[0],
    })?;
    let session_id = u64::from_be_bytes(hdr[1..9].try_into().unwrap());
    Ok((kind, session_id))
}

fn read_rest<F: FrameReader>(f: &mut F, kind: Kind, session_id: u64) -> Result<Packet, SessionError> {
    match kind {
        Kind::Conn => {
            let rest = f.read_exact(9)?;
            let protocol = rest[0];
            let data_len = u64::from_be_bytes(rest[1..9].try_into().unwrap());
            Ok(Packet::Conn {
                session_id,
                protocol,
                data_len,
            })
        }
        Kind::ConnAcc => Ok(Packet::ConnAcc { session_id }),
        Kind::ConnRjt => Ok(Packet::ConnRjt { session_id }),
        Kind::Rcvd => Ok(Packet::Rcvd { session_id }),
        Kind::Data => {
            let hdr = f.read_exact(12)?;
            let packet_no = u32::from_be_bytes(hdr[0..4].try_into().unwrap());
            let byte_count = u64::from_be_bytes(hdr[4..12].try_into().unwrap());
            if byte_count > DMAX {
                return Err(SessionError::MalformedData(packet_no));
            }
            let bytes = f
                .read_exact(byte_count as usize)
                .map_err(|_| SessionError::MalformedData(packet_no))?;
            Ok(Packet::Data {
                session_id,
                packet_no,
                bytes,
            })
        }
        Kind::Acc => {
            let rest = f.read_exact(4)?;
            Ok(Packet::Acc {
                session_id,
                packet_no: u32::from_be_bytes(rest.try_into().unwrap()),
            })
        }
        Kind::Rjt => {
            let rest = f.read_exact(4)?;
            Ok(Packet::Rjt {
                session_id,
                packet_no: u32::from_be_bytes(rest.try_into().unwrap()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_set_swallows_late_numbered_duplicate() {
        let skip = SkipSet::new().numbered(Kind::Acc, 3);
        let late = Packet::Acc {
            session_id: 1,
            packet_no: 1,
        };
        assert!(skip.should_skip(&late));
        let fresh = Packet::Acc {
            session_id: 1,
            packet_no: 3,
        };
        assert!(!skip.should_skip(&fresh));
    }

    #[test]
    fn skip_set_swallows_unnumbered_kind_unconditionally() {
        let skip = SkipSet::new().unnumbered(Kind::ConnAcc);
        assert!(skip.should_skip(&Packet::ConnAcc { session_id: 9 }));
    }
}
