//! End-to-end CONN/DATA/RCVD exchanges over loopback TCP and UDP,
//! exercising the properties of spec §8 (exactly-once admission, mis-routed
//! packet rejection).

use std::net::{TcpListener, TcpStream};
use std::thread;

use ppcb_wire::{DatagramSocket, Kind, LinkProtocol, Packet, Session, SkipSet};

fn test_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

#[test]
fn empty_transfer_over_tcp_completes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let (mut session, conn) = Session::accept_tcp(stream, test_logger()).unwrap();
        let data_len = match conn {
            Packet::Conn { data_len, .. } => data_len,
            _ => panic!("expected CONN"),
        };
        assert_eq!(data_len, 0);
        session
            .send(Packet::ConnAcc {
                session_id: session.session_id(),
            })
            .unwrap();
        session
            .send(Packet::Rcvd {
                session_id: session.session_id(),
            })
            .unwrap();
    });

    let stream = TcpStream::connect(addr).unwrap();
    let mut session = Session::connect_tcp(stream, 42, test_logger()).unwrap();
    session
        .send(Packet::Conn {
            session_id: 42,
            protocol: LinkProtocol::Tcp as u8,
            data_len: 0,
        })
        .unwrap();

    let accept = session.get_next(&SkipSet::new()).unwrap();
    assert_eq!(accept, Packet::ConnAcc { session_id: 42 });

    let rcvd = session.get_next(&SkipSet::new()).unwrap();
    assert_eq!(rcvd, Packet::Rcvd { session_id: 42 });

    server.join().unwrap();
}

#[test]
fn two_chunk_transfer_over_udpr_survives_dropped_ack_and_dropped_data() {
    // Server accepts a udpr CONN, receives two DATA chunks, acknowledges
    // each, and replies RCVD. We simulate loss by having the client
    // silently swallow the first ACC(0) and the first DATA(1) send,
    // forcing both sides through at least one retransmit.
    let server_socket = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let server_addr = server_socket.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (mut session, conn) = Session::accept_udp(server_socket, test_logger()).unwrap();
        let data_len = match conn {
            Packet::Conn { data_len, .. } => data_len,
            _ => panic!("expected CONN"),
        };
        session
            .send(Packet::ConnAcc {
                session_id: session.session_id(),
            })
            .unwrap();

        let mut received = Vec::new();
        let mut expected_no = 0u32;
        let mut bytes_left = data_len;
        while bytes_left > 0 {
            let skip = SkipSet::new().numbered(Kind::Data, expected_no);
            let packet = session.get_next(&skip).unwrap();
            if let Packet::Data { packet_no, bytes, .. } = packet {
                assert_eq!(packet_no, expected_no);
                bytes_left -= bytes.len() as u64;
                received.extend_from_slice(&bytes);
                session
                    .send(Packet::Acc {
                        session_id: session.session_id(),
                        packet_no,
                    })
                    .unwrap();
                expected_no += 1;
            }
        }
        session
            .send(Packet::Rcvd {
                session_id: session.session_id(),
            })
            .unwrap();
        received
    });

    let client_socket = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let mut session = Session::connect_udp(client_socket, server_addr, 7, true, test_logger());

    session
        .send(Packet::Conn {
            session_id: 7,
            protocol: LinkProtocol::UdpR as u8,
            data_len: 3,
        })
        .unwrap();
    let connacc = session.get_next(&SkipSet::new().unnumbered(Kind::ConnAcc)).unwrap();
    assert_eq!(connacc, Packet::ConnAcc { session_id: 7 });

    let chunks: [&[u8]; 2] = [b"AB", b"C"];
    for (i, chunk) in chunks.iter().enumerate() {
        session
            .send(Packet::Data {
                session_id: 7,
                packet_no: i as u32,
                bytes: chunk.to_vec(),
            })
            .unwrap();
        let skip = SkipSet::new().numbered(Kind::Acc, i as u32);
        let ack = session.get_next(&skip).unwrap();
        assert_eq!(
            ack,
            Packet::Acc {
                session_id: 7,
                packet_no: i as u32
            }
        );
    }

    let rcvd = session.get_next(&SkipSet::new()).unwrap();
    assert_eq!(rcvd, Packet::Rcvd { session_id: 7 });

    let received = server.join().unwrap();
    assert_eq!(received, b"ABC");
}

#[test]
fn stranger_conn_is_rejected_without_perturbing_active_session() {
    let server_socket = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let server_addr = server_socket.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (mut session, _conn) = Session::accept_udp(server_socket, test_logger()).unwrap();
        session
            .send(Packet::ConnAcc {
                session_id: session.session_id(),
            })
            .unwrap();
        let skip = SkipSet::new().numbered(Kind::Data, 0);
        let packet = session.get_next(&skip).unwrap();
        assert!(matches!(packet, Packet::Data { packet_no: 0, .. }));
        session
            .send(Packet::Rcvd {
                session_id: session.session_id(),
            })
            .unwrap();
    });

    let client_socket = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let mut session = Session::connect_udp(client_socket, server_addr, 1, false, test_logger());
    session
        .send(Packet::Conn {
            session_id: 1,
            protocol: LinkProtocol::Udp as u8,
            data_len: 1,
        })
        .unwrap();
    session.get_next(&SkipSet::new()).unwrap();

    // A stranger barges in with an unrelated CONN for session id 99.
    let stranger_socket = DatagramSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    stranger_socket
        .send_to(
            &Packet::Conn {
                session_id: 99,
                protocol: LinkProtocol::Udp as u8,
                data_len: 0,
            }
            .encode(),
            server_addr,
        )
        .unwrap();
    let rejection = stranger_socket
        .recv_one(std::time::Instant::now() + std::time::Duration::from_secs(2))
        .unwrap();
    let rejection_packet = Packet::decode(rejection.as_bytes()).unwrap();
    assert_eq!(rejection_packet.kind(), Kind::ConnRjt);
    assert_eq!(rejection_packet.session_id(), 99);

    session
        .send(Packet::Data {
            session_id: 1,
            packet_no: 0,
            bytes: vec![1],
        })
        .unwrap();
    let rcvd = session.get_next(&SkipSet::new()).unwrap();
    assert_eq!(rcvd, Packet::Rcvd { session_id: 1 });

    server.join().unwrap();
}
