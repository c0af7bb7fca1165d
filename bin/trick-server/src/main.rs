use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

use trick_cards::{Card, Deck, Seat, Variant};
use trick_gameserver::{DealConfig, GameServer, SEAT_TIMEOUT, TranscriptLogger};

/// Trick-taking game server: plays a fixed sequence of pre-dealt deals
/// to four seats over TCP (§6.3).
#[derive(Parser, Debug)]
#[command(name = "trick-server")]
struct Args {
    #[arg(short = 'p', default_value_t = 0)]
    port: u16,
    #[arg(short = 'f')]
    deal_file: String,
    #[arg(short = 't', default_value_t = SEAT_TIMEOUT.as_secs())]
    timeout_secs: u64,
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
            eprintln!("trick-server: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, log: &slog::Logger) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&args.deal_file)?;
    let deals = parse_deal_file(&text)?;

    let addr: SocketAddr = ("0.0.0.0", args.port)
        .to_socket_addrs()?
        .next()
        .ok_or("bind address did not resolve")?;

    let transcript = TranscriptLogger::new(std::io::stderr());
    let mut server = GameServer::bind(
        addr,
        deals,
        Duration::from_secs(args.timeout_secs),
        transcript,
        log.clone(),
    )?;

    slog::info!(log, "listening"; "addr" => %server.local_addr()?);
    server.run()?;
    Ok(())
}

/// Parses the deal file format of §6.3: one block per deal, a header line
/// (`<variant digit><starter seat>`) followed by four 13-card hand lines
/// in `N,E,S,W` order. Blocks repeat until EOF; blank lines are skipped.
fn parse_deal_file(text: &str) -> Result<Vec<DealConfig>, String> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let mut deals = Vec::new();

    loop {
        let header = match lines.next() {
            Some(h) => h,
            None => break,
        };

        let digit = header.as_bytes().first().copied().ok_or("empty deal header line")?;
        if !digit.is_ascii_digit() {
            return Err(format!("deal header `{header}` does not start with a variant digit"));
        }
        let variant = Variant::from_number(digit - b'0').map_err(|e| e.to_string())?;
        let seat_letter = &header[1..];
        let starter = Seat::parse(seat_letter).ok_or_else(|| format!("bad starter seat in `{header}`"))?;

        let mut hands: [Deck; 4] = Default::default();
        for seat in trick_cards::SEATS {
            let line = lines
                .next()
                .ok_or_else(|| format!("deal file ended mid-block after header `{header}`"))?;
            hands[seat.index()] = parse_hand(line)?;
        }

        deals.push(DealConfig { variant, starter, hands });
    }

    if deals.is_empty() {
        return Err("deal file contained no deals".to_string());
    }
    Ok(deals)
}

fn parse_hand(mut line: &str) -> Result<Deck, String> {
    let mut deck = Deck::new(Vec::new());
    while !line.is_empty() {
        let (card, rest) = Card::parse(line).map_err(|e| e.to_string())?;
        if !deck.push(card) {
            return Err(format!("duplicate card {card} in hand line `{line}`"));
        }
        line = rest;
    }
    if deck.len() != 13 {
        return Err(format!("hand line has {} cards, expected 13", deck.len()));
    }
    Ok(deck)
}
