use std::io;
use std::net::{TcpListener, TcpStream};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

use ppcb_transfer::Consumer;
use ppcb_wire::{DatagramSocket, Kind, Packet, Session, SkipSet};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliProtocol {
    Tcp,
    Udp,
}

/// PPCB file-transfer server: accepts transfers on one link variant and
/// writes received bytes to standard output, one session at a time (§6.3).
#[derive(Parser, Debug)]
#[command(name = "ppcb-server")]
struct Args {
    port: u16,
    protocol: CliProtocol,
}

fn init_logger() -> slog::Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(Severity::Info);
    builder.destination(Destination::Stderr);
    builder.build().expect("failed to build logger")
}

fn main() -> ExitCode {
    let args = Args::parse();
    let log = init_logger();

    match run(&args, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ppcb-server: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, log: &slog::Logger) -> Result<(), Box<dyn std::error::Error>> {
    match args.protocol {
        CliProtocol::Tcp => run_tcp(args.port, log),
        CliProtocol::Udp => run_udp(args.port, log),
    }
}

fn run_tcp(port: u16, log: &slog::Logger) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    loop {
        let (stream, peer) = listener.accept()?;
        slog::info!(log, "accepted connection"; "peer" => %peer);
        if let Err(e) = serve_tcp(stream, log) {
            slog::warn!(log, "session failed"; "error" => %e);
        }
    }
}

fn serve_tcp(stream: TcpStream, log: &slog::Logger) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, conn) = Session::accept_tcp(stream, log.clone())?;
    let data_len = match conn {
        Packet::Conn { data_len, .. } => data_len,
        _ => unreachable!("accept_tcp always returns a CONN"),
    };
    session.send(Packet::ConnAcc {
        session_id: session.session_id(),
    })?;
    receive_all(&mut session, data_len, log)
}

fn run_udp(port: u16, log: &slog::Logger) -> Result<(), Box<dyn std::error::Error>> {
    use std::net::ToSocketAddrs;
    let addr = ("0.0.0.0", port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "bind address did not resolve"))?;
    let socket = DatagramSocket::bind(addr)?;
    loop {
        let (mut session, conn) = Session::accept_udp(socket.clone(), log.clone())?;
        let data_len = match conn {
            Packet::Conn { data_len, .. } => data_len,
            _ => unreachable!("accept_udp always returns a CONN"),
        };
        slog::info!(log, "accepted udp session"; "peer" => %session.peer(), "retransmit" => session.has_retransmit());
        session.send(Packet::ConnAcc {
            session_id: session.session_id(),
        })?;
        if let Err(e) = receive_all(&mut session, data_len, log) {
            slog::warn!(log, "session failed"; "error" => %e);
        }
    }
}

fn receive_all(session: &mut Session, data_len: u64, _log: &slog::Logger) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut consumer = Consumer::new(stdout.lock());

    let mut received = 0u64;
    let mut expected_no = 0u32;
    while received < data_len {
        let skip = if session.has_retransmit() {
            SkipSet::new().numbered(Kind::Data, expected_no)
        } else {
            SkipSet::new()
        };
        match session.get_next(&skip)? {
            Packet::Data { packet_no, bytes, .. } => {
                if session.has_retransmit() && packet_no != expected_no {
                    session.send(Packet::Rjt {
                        session_id: session.session_id(),
                        packet_no,
                    })?;
                    continue;
                }
                if bytes.is_empty() && data_len != 0 {
                    return Err("empty DATA chunk for a non-empty transfer".into());
                }
                if received + bytes.len() as u64 > data_len {
                    if session.has_retransmit() {
                        session.send(Packet::Rjt {
                            session_id: session.session_id(),
                            packet_no,
                        })?;
                        continue;
                    }
                    return Err(format!(
                        "DATA chunk overshoots declared length: {} + {} > {}",
                        received,
                        bytes.len(),
                        data_len
                    )
                    .into());
                }
                received += bytes.len() as u64;
                consumer.accept(&bytes)?;
                if session.has_retransmit() {
                    session.send(Packet::Acc {
                        session_id: session.session_id(),
                        packet_no,
                    })?;
                }
                expected_no += 1;
            }
            other => return Err(format!("unexpected packet while receiving: {:?}", other.kind()).into()),
        }
    }

    session.send(Packet::Rcvd {
        session_id: session.session_id(),
    })?;
    Ok(())
}
