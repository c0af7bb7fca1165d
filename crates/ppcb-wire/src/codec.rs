use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

use crate::error::CodecError;

/// Maximum payload octets carried by a single `DATA` frame (§6.1).
pub const DMAX: u64 = 64_000;

/// Protocol identifiers carried in `CONN.protocol` (§6.1).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LinkProtocol {
    Tcp = 1,
    Udp = 2,
    UdpR = 3,
}

impl LinkProtocol {
    pub fn from_u8(v: u8) -> Option<LinkProtocol> {
        match v {
            1 => Some(LinkProtocol::Tcp),
            2 => Some(LinkProtocol::Udp),
            3 => Some(LinkProtocol::UdpR),
            _ => None,
        }
    }

    pub fn uses_stream(self) -> bool {
        matches!(self, LinkProtocol::Tcp)
    }

    pub fn has_retransmit(self) -> bool {
        matches!(self, LinkProtocol::UdpR)
    }
}

/// The 1-byte wire discriminant of each packet kind (§6.1).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Kind {
    Conn = 1,
    ConnAcc = 2,
    ConnRjt = 3,
    Data = 4,
    Acc = 5,
    Rjt = 6,
    Rcvd = 7,
}

impl Kind {
    pub fn from_u8(v: u8) -> Option<Kind> {
        match v {
            1 => Some(Kind::Conn),
            2 => Some(Kind::ConnAcc),
            3 => Some(Kind::ConnRjt),
            4 => Some(Kind::Data),
            5 => Some(Kind::Acc),
            6 => Some(Kind::Rjt),
            7 => Some(Kind::Rcvd),
            _ => None,
        }
    }

    /// Whether this kind carries a `packet_no`, relevant to skip-set
    /// semantics (§4.3.2).
    pub fn is_numbered(self) -> bool {
        matches!(self, Kind::Data | Kind::Acc | Kind::Rjt)
    }
}

/// A decoded PPCB frame (§3, tagged union, seven variants).
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Conn {
        session_id: u64,
        protocol: u8,
        data_len: u64,
    },
    ConnAcc {
        session_id: u64,
    },
    ConnRjt {
        session_id: u64,
    },
    Data {
        session_id: u64,
        packet_no: u32,
        bytes: Vec<u8>,
    },
    Acc {
        session_id: u64,
        packet_no: u32,
    },
    Rjt {
        session_id: u64,
        packet_no: u32,
    },
    Rcvd {
        session_id: u64,
    },
}

impl Packet {
    pub fn kind(&self) -> Kind {
        match self {
            Packet::Conn { .. } => Kind::Conn,
            Packet::ConnAcc { .. } => Kind::ConnAcc,
            Packet::ConnRjt { .. } => Kind::ConnRjt,
            Packet::Data { .. } => Kind::Data,
            Packet::Acc { .. } => Kind::Acc,
            Packet::Rjt { .. } => Kind::Rjt,
            Packet::Rcvd { .. } => Kind::Rcvd,
        }
    }

    pub fn session_id(&self) -> u64 {
        match *self {
            Packet::Conn { session_id, .. }
            | Packet::ConnAcc { session_id }
            | Packet::ConnRjt { session_id }
            | Packet::Data { session_id, .. }
            | Packet::Acc { session_id, .. }
            | Packet::Rjt { session_id, .. }
            | Packet::Rcvd { session_id } => session_id,
        }
    }

    /// The `packet_no` of numbered kinds (`DATA`, `ACC`, `RJT`).
    pub fn packet_no(&self) -> Option<u32> {
        match *self {
            Packet::Data { packet_no, .. }
            | Packet::Acc { packet_no, .. }
            | Packet::Rjt { packet_no, .. } => Some(packet_no),
            _ => None,
        }
    }

    /// Pure encode: pack this packet into its on-wire byte representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u8(self.kind() as u8).unwrap();
        match self {
            Packet::Conn {
                session_id,
                protocol,
                data_len,
            } => {
                buf.write_u64::<BigEndian>(*session_id).unwrap();
                buf.write_u8(*protocol).unwrap();
                buf.write_u64::<BigEndian>(*data_len).unwrap();
            }
            Packet::ConnAcc { session_id } | Packet::ConnRjt { session_id } | Packet::Rcvd { session_id } => {
                buf.write_u64::<BigEndian>(*session_id).unwrap();
            }
            Packet::Data {
                session_id,
                packet_no,
                bytes,
            } => {
                buf.write_u64::<BigEndian>(*session_id).unwrap();
                buf.write_u32::<BigEndian>(*packet_no).unwrap();
                buf.write_u64::<BigEndian>(bytes.len() as u64).unwrap();
                buf.write_all(bytes).unwrap();
            }
            Packet::Acc { session_id, packet_no } | Packet::Rjt { session_id, packet_no } => {
                buf.write_u64::<BigEndian>(*session_id).unwrap();
                buf.write_u32::<BigEndian>(*packet_no).unwrap();
            }
        }
        buf
    }

    /// Pure decode: parse a complete, already-assembled frame (used by
    /// tests and by the datagram transport, which has the whole frame in
    /// hand up front). The stream transport instead decodes incrementally
    /// via `decode_header` + the per-kind `read_*` helpers below, since it
    /// must not read more bytes than the kind dictates.
    pub fn decode(buf: &[u8]) -> Result<Packet, CodecError> {
        let mut cur = Cursor::new(buf);
        let kind_byte = cur.read_u8().map_err(|_| CodecError::Truncated)?;
        let kind = Kind::from_u8(kind_byte).ok_or(CodecError::UnknownKind(kind_byte))?;
        let session_id = cur.read_u64::<BigEndian>().map_err(|_| CodecError::Truncated)?;
        decode_body(kind, session_id, &mut cur)
    }

    /// Header read on the stream transport: 1-byte kind + 8-byte session id,
    /// the fixed prefix of every frame (§4.3.2).
    pub fn decode_header<R: Read>(mut r: R) -> Result<(Kind, u64), CodecError> {
        let kind_byte = r.read_u8().map_err(|_| CodecError::Truncated)?;
        let kind = Kind::from_u8(kind_byte).ok_or(CodecError::UnknownKind(kind_byte))?;
        let session_id = r.read_u64::<BigEndian>().map_err(|_| CodecError::Truncated)?;
        Ok((kind, session_id))
    }

    /// Decode the kind-specific remainder of a frame, given the already
    /// read `(kind, session_id)` header.
    pub fn decode_rest<R: Read>(kind: Kind, session_id: u64, mut r: R) -> Result<Packet, CodecError> {
        decode_body(kind, session_id, &mut r)
    }
}

fn decode_body<R: Read>(kind: Kind, session_id: u64, r: &mut R) -> Result<Packet, CodecError> {
    match kind {
        Kind::Conn => {
            let protocol = r.read_u8().map_err(|_| CodecError::Truncated)?;
            let data_len = r.read_u64::<BigEndian>().map_err(|_| CodecError::Truncated)?;
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
            let packet_no = r.read_u32::<BigEndian>().map_err(|_| CodecError::Truncated)?;
            let byte_count = r.read_u64::<BigEndian>().map_err(|_| CodecError::Truncated)?;
            if byte_count > DMAX {
                return Err(CodecError::PayloadTooLarge {
                    declared: byte_count,
                    max: DMAX,
                });
            }
            let mut bytes = vec![0u8; byte_count as usize];
            r.read_exact(&mut bytes).map_err(|_| CodecError::Truncated)?;
            Ok(Packet::Data {
                session_id,
                packet_no,
                bytes,
            })
        }
        Kind::Acc => {
            let packet_no = r.read_u32::<BigEndian>().map_err(|_| CodecError::Truncated)?;
            Ok(Packet::Acc { session_id, packet_no })
        }
        Kind::Rjt => {
            let packet_no = r.read_u32::<BigEndian>().map_err(|_| CodecError::Truncated)?;
            Ok(Packet::Rjt { session_id, packet_no })
        }
    }
}

/// Raw helpers the transport layer uses to read/write fixed-width fields
/// without going through a whole `Packet` (kept here since the codec is the
/// one place that knows the wire widths).
pub fn write_u8<W: Write>(mut w: W, v: u8) -> io::Result<()> {
    w.write_u8(v)
}

pub fn write_u64<W: Write>(mut w: W, v: u64) -> io::Result<()> {
    w.write_u64::<BigEndian>(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_conn() {
        let p = Packet::Conn {
            session_id: 42,
            protocol: 1,
            data_len: 0,
        };
        let bytes = p.encode();
        assert_eq!(bytes[0], Kind::Conn as u8);
        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded, p);
    }

    #[test]
    fn round_trip_data() {
        let p = Packet::Data {
            session_id: 7,
            packet_no: 3,
            bytes: vec![1, 2, 3, 4, 5],
        };
        let bytes = p.encode();
        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded, p);
    }

    #[test]
    fn round_trip_all_unnumbered_kinds() {
        for p in [
            Packet::ConnAcc { session_id: 1 },
            Packet::ConnRjt { session_id: 1 },
            Packet::Rcvd { session_id: 1 },
        ] {
            let decoded = Packet::decode(&p.encode()).unwrap();
            assert_eq!(decoded, p);
        }
    }

    #[test]
    fn data_over_dmax_rejected() {
        let mut buf = vec![Kind::Data as u8];
        buf.extend_from_slice(&1u64.to_be_bytes()); // session
        buf.extend_from_slice(&0u32.to_be_bytes()); // packet_no
        buf.extend_from_slice(&(DMAX + 1).to_be_bytes()); // byte_count
        let err = Packet::decode(&buf).unwrap_err();
        assert!(matches!(err, CodecError::PayloadTooLarge { .. }));
    }

    #[test]
    fn unknown_kind_rejected() {
        let buf = vec![99u8, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(Packet::decode(&buf), Err(CodecError::UnknownKind(99))));
    }

    #[test]
    fn header_then_rest_matches_whole_decode() {
        let p = Packet::Acc {
            session_id: 9,
            packet_no: 12,
        };
        let bytes = p.encode();
        let mut cur = Cursor::new(&bytes[..]);
        let (kind, session_id) = Packet::decode_header(&mut cur).unwrap();
        let decoded = Packet::decode_rest(kind, session_id, &mut cur).unwrap();
        assert_eq!(decoded, p);
    }
}
