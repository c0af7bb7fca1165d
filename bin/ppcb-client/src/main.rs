use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

use ppcb_transfer::{Consumer, Producer};
use ppcb_wire::{DatagramSocket, Kind, LinkProtocol, Packet, Session, SkipSet};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliProtocol {
    Tcp,
    Udp,
    Udpr,
}

impl CliProtocol {
    fn link_protocol(self) -> LinkProtocol {
        match self {
            CliProtocol::Tcp => LinkProtocol::Tcp,
            CliProtocol::Udp => LinkProtocol::Udp,
            CliProtocol::Udpr => LinkProtocol::UdpR,
        }
    }
}

/// PPCB file-transfer client: reads a file from standard input and pushes
/// it to a server over one of the three link variants (§6.3).
#[derive(Parser, Debug)]
#[command(name = "ppcb-client")]
struct Args {
    protocol: CliProtocol,
    ip: String,
    port: u16,
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
            eprintln!("ppcb-client: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, log: &slog::Logger) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input)?;
    let data_len = input.len() as u64;
    let session_id: u64 = rand::random();

    let link = args.protocol.link_protocol();
    let mut session = match link {
        LinkProtocol::Tcp => {
            let addr = resolve(&args.ip, args.port)?;
            let stream = TcpStream::connect(addr)?;
            Session::connect_tcp(stream, session_id, log.clone())?
        }
        LinkProtocol::Udp | LinkProtocol::UdpR => {
            let addr = resolve(&args.ip, args.port)?;
            let socket = DatagramSocket::bind("0.0.0.0:0".parse().unwrap())?;
            Session::connect_udp(socket, addr, session_id, link.has_retransmit(), log.clone())
        }
    };

    session.send(Packet::Conn {
        session_id,
        protocol: link as u8,
        data_len,
    })?;

    let accept = session.get_next(&SkipSet::new())?;
    match accept {
        Packet::ConnAcc { .. } => {}
        Packet::ConnRjt { .. } => {
            slog::info!(log, "server rejected the connection");
            return Ok(());
        }
        other => return Err(format!("unexpected reply to CONN: {:?}", other.kind()).into()),
    }

    let mut producer = Producer::new(&input[..]);
    let mut packet_no = 0u32;
    while let Some(chunk) = producer.next_chunk()? {
        session.send(Packet::Data {
            session_id,
            packet_no,
            bytes: chunk,
        })?;

        if link.has_retransmit() {
            let skip = SkipSet::new().numbered(Kind::Acc, packet_no);
            match session.get_next(&skip)? {
                Packet::Acc { .. } => {}
                Packet::Rjt { .. } => return Err("server rejected a data chunk".into()),
                other => return Err(format!("unexpected reply to DATA: {:?}", other.kind()).into()),
            }
        }
        packet_no += 1;
    }

    match session.get_next(&SkipSet::new())? {
        Packet::Rcvd { .. } => Ok(()),
        other => Err(format!("unexpected reply after last chunk: {:?}", other.kind()).into()),
    }
}

fn resolve(ip: &str, port: u16) -> io::Result<SocketAddr> {
    (ip, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "address did not resolve"))
}
