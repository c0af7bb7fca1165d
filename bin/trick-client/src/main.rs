use std::io::{self, BufRead, BufReader, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::process::ExitCode;

use clap::Parser;
use rand::seq::SliceRandom;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

use trick_cards::{Card, Deck, Seat};
use trick_proto::Message;

/// Trick-taking game client: seats itself at a table and plays either
/// automatically or by prompting the operator (§6.3).
#[derive(Parser, Debug)]
#[command(name = "trick-client", disable_help_flag = true)]
struct Args {
    #[arg(short = 'h')]
    host: String,
    #[arg(short = 'p')]
    port: u16,
    #[arg(short = '4')]
    ipv4: bool,
    #[arg(short = '6')]
    ipv6: bool,
    #[arg(short = 'N')]
    north: bool,
    #[arg(short = 'E')]
    east: bool,
    #[arg(short = 'S')]
    south: bool,
    #[arg(short = 'W')]
    west: bool,
    #[arg(short = 'a')]
    automatic: bool,
}

impl Args {
    fn seat(&self) -> Result<Seat, String> {
        let picked: Vec<Seat> = [
            (self.north, Seat::North),
            (self.east, Seat::East),
            (self.south, Seat::South),
            (self.west, Seat::West),
        ]
        .into_iter()
        .filter(|(chosen, _)| *chosen)
        .map(|(_, seat)| seat)
        .collect();
        match picked.len() {
            1 => Ok(picked[0]),
            0 => Err("exactly one of -N/-E/-S/-W is required".to_string()),
            _ => Err("only one of -N/-E/-S/-W may be given".to_string()),
        }
    }
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
    let seat = match args.seat() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("trick-client: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args, seat, &log) {
        Ok(saw_total) => {
            if saw_total {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("trick-client: {e}");
            ExitCode::FAILURE
        }
    }
}

fn resolve(args: &Args) -> io::Result<SocketAddr> {
    let candidates: Vec<SocketAddr> = (args.host.as_str(), args.port).to_socket_addrs()?.collect();
    let pick = candidates
        .iter()
        .find(|a| match (args.ipv4, args.ipv6, a.ip()) {
            (true, false, IpAddr::V4(_)) => true,
            (false, true, IpAddr::V6(_)) => true,
            (false, false, _) => true,
            _ => false,
        })
        .or_else(|| candidates.first());
    pick.copied()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "host did not resolve"))
}

/// Tracks this client's own hand and the current trick's starter, mirroring
/// the server's own `Deal` bookkeeping closely enough to know which card of
/// a `TAKEN` broadcast was ours.
struct ClientState {
    seat: Seat,
    hand: Deck,
    trick_starter: Seat,
}

fn run(args: &Args, seat: Seat, log: &slog::Logger) -> Result<bool, Box<dyn std::error::Error>> {
    let addr = resolve(args)?;
    let stream = TcpStream::connect(addr)?;
    slog::info!(log, "connected"; "addr" => %addr, "seat" => %seat);
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    send_line(&mut writer, &Message::Iam(seat).encode())?;

    let mut state: Option<ClientState> = None;
    let mut saw_total = false;
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let msg = match Message::parse(trimmed) {
            Ok(m) => m,
            Err(_) => break,
        };

        match msg {
            Message::Busy(seats) => {
                println!("BUSY: {:?}", seats);
            }
            Message::Deal {
                variant,
                first_player,
                hand,
            } => {
                println!("DEAL variant={:?} starter={} hand={:?}", variant, first_player, hand);
                state = Some(ClientState {
                    seat,
                    hand: Deck::new(hand),
                    trick_starter: first_player,
                });
            }
            Message::Taken { cards, taker, .. } => {
                println!("TAKEN {:?} -> {}", cards, taker);
                if let Some(st) = state.as_mut() {
                    let offset = (st.seat.index() + 4 - st.trick_starter.index()) % 4;
                    st.hand.remove(cards[offset]);
                    st.trick_starter = taker;
                }
            }
            Message::Trick { number, cards } => {
                let st = state.as_mut().ok_or("TRICK received before any DEAL")?;
                let card = choose_card(st, &cards, args.automatic)?;
                st.hand.remove(card);
                send_line(&mut writer, &Message::Trick { number, cards: vec![card] }.encode())?;
            }
            Message::Wrong { number } => {
                println!("WRONG trick {number}, try again");
            }
            Message::Score(scores) => {
                println!("SCORE {:?}", scores);
            }
            Message::Total(scores) => {
                println!("TOTAL {:?}", scores);
                slog::debug!(log, "game finished"; "totals" => format!("{:?}", scores));
                saw_total = true;
            }
            Message::Iam(_) => {}
        }
    }

    Ok(saw_total)
}

fn choose_card(state: &ClientState, cards_so_far: &[Card], automatic: bool) -> Result<Card, Box<dyn std::error::Error>> {
    let legal = legal_cards(&state.hand, cards_so_far);
    if legal.is_empty() {
        return Err("no legal card to play".into());
    }

    if automatic {
        let mut rng = rand::thread_rng();
        Ok(*legal.choose(&mut rng).expect("checked non-empty"))
    } else {
        println!("your turn — hand: {:?}", state.hand.cards());
        loop {
            print!("play> ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let token = input.trim();
            match Card::parse(token) {
                Ok((card, "")) if legal.contains(&card) => return Ok(card),
                _ => println!("not a legal card, try again"),
            }
        }
    }
}

fn legal_cards(hand: &Deck, cards_so_far: &[Card]) -> Vec<Card> {
    match cards_so_far.first() {
        Some(opener) if hand.contains_suit(opener.suit) => hand
            .cards()
            .iter()
            .copied()
            .filter(|c| c.suit == opener.suit)
            .collect(),
        _ => hand.cards().to_vec(),
    }
}

fn send_line(w: &mut impl Write, line: &str) -> io::Result<()> {
    w.write_all(line.as_bytes())?;
    w.write_all(b"\r\n")?;
    w.flush()
}
