use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use trick_cards::{Card, Deal, Deck, Seat, Variant, SEATS};
use trick_proto::Message;
use trick_reactor::{Reactor, ReactorError};

use crate::error::GameServerError;
use crate::transcript::TranscriptLogger;

/// Default for the per-move/per-IAM deadline (§6.3's `-t`, default 5s).
pub const SEAT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Copy, Clone)]
enum Role {
    AwaitingIam { deadline: Instant },
    Seated(Seat),
    Draining,
}

/// One configured deal: its scoring variant, its starting seat, and the
/// four pre-dealt hands. Loading these from a deal file is the caller's
/// job (the entry binary); the orchestrator only plays through what it's
/// given.
#[derive(Clone)]
pub struct DealConfig {
    pub variant: Variant,
    pub starter: Seat,
    pub hands: [Deck; 4],
}

/// Drives one game end to end: accepting connections, seating players,
/// running the turn loop for every configured deal, and reporting final
/// totals. Mirrors the teacher's `Endpoint::sync` poll-then-react loop,
/// generalized from an encrypted game channel to the plain-text line
/// protocol and a single `mio::Poll`.
pub struct GameServer<W: Write> {
    reactor: Reactor,
    roles: HashMap<usize, Role>,
    seats: [Option<usize>; 4],
    deals: Vec<DealConfig>,
    deal_index: usize,
    deal: Option<Deal>,
    turn_deadline: Option<Instant>,
    totals: [u32; 4],
    game_over: bool,
    transcript: TranscriptLogger<W>,
    log: slog::Logger,
    seat_timeout: Duration,
    local_addr: SocketAddr,
}

impl<W: Write> GameServer<W> {
    pub fn bind(
        addr: SocketAddr,
        deals: Vec<DealConfig>,
        seat_timeout: Duration,
        transcript: TranscriptLogger<W>,
        log: slog::Logger,
    ) -> Result<GameServer<W>, GameServerError> {
        if deals.is_empty() {
            return Err(GameServerError::NoDeals);
        }
        let reactor = Reactor::bind(addr, log.clone())?;
        let local_addr = reactor.local_addr().map_err(ReactorError::from)?;
        let first = deals[0].clone();
        let deal = Deal::new(first.variant, first.starter, first.hands)?;

        Ok(GameServer {
            reactor,
            roles: HashMap::new(),
            seats: [None; 4],
            deals,
            deal_index: 0,
            deal: Some(deal),
            turn_deadline: None,
            totals: [0; 4],
            game_over: false,
            transcript,
            log,
            seat_timeout,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.reactor.local_addr()
    }

    /// Runs the accept/seat/play loop until every connection has drained
    /// and closed after the final `TOTAL`.
    pub fn run(&mut self) -> Result<(), GameServerError> {
        loop {
            let events = self.reactor.poll(Some(Duration::from_millis(200)))?;
            for event in events {
                self.handle_event(event.id, event.readable, event.writable)?;
            }
            self.check_timeouts()?;
            self.drain_finished()?;

            if self.game_over && self.roles.is_empty() {
                return Ok(());
            }
        }
    }

    fn handle_event(&mut self, id: usize, readable: bool, writable: bool) -> Result<(), GameServerError> {
        if !self.roles.contains_key(&id) {
            self.accept_new(id)?;
        }

        if writable {
            if let Some(conn) = self.reactor.connection_mut(id) {
                conn.flush_to_socket()?;
            }
            if !self.reactor.has_pending_writes(id) {
                self.reactor.want_readable_only(id)?;
            }
        }

        if readable {
            let mut disconnected = false;
            let peer = self.reactor.connection_mut(id).map(|c| c.peer());
            if let Some(conn) = self.reactor.connection_mut(id) {
                conn.fill_from_socket()?;
                disconnected = conn.is_closed();
            }
            loop {
                let line = match self.reactor.connection_mut(id) {
                    Some(conn) => conn.next_line()?,
                    None => break,
                };
                let Some(line) = line else { break };
                if let Some(peer) = peer {
                    self.transcript.log_inbound(peer, self.local_addr, &line);
                }
                self.on_line(id, &line)?;
            }
            if disconnected {
                self.on_disconnect(id)?;
            }
        }

        Ok(())
    }

    fn all_seats_full(&self) -> bool {
        self.seats.iter().all(|s| s.is_some())
    }

    fn accept_new(&mut self, id: usize) -> Result<(), GameServerError> {
        if self.game_over || self.all_seats_full() {
            self.queue(id, Message::Busy(SEATS.to_vec()))?;
            self.roles.insert(id, Role::Draining);
        } else {
            self.roles.insert(
                id,
                Role::AwaitingIam {
                    deadline: Instant::now() + self.seat_timeout,
                },
            );
        }
        Ok(())
    }

    fn on_line(&mut self, id: usize, line: &str) -> Result<(), GameServerError> {
        let role = match self.roles.get(&id) {
            Some(r) => *r,
            None => return Ok(()),
        };

        match role {
            Role::Draining => {}
            Role::AwaitingIam { .. } => match Message::parse(line) {
                Ok(Message::Iam(seat)) => self.handle_iam(id, seat)?,
                _ => self.close_connection(id)?,
            },
            Role::Seated(seat) => match Message::parse(line) {
                Ok(Message::Trick { number, cards }) => {
                    // §4.8.1: while a seat is empty, play on the remaining
                    // seated players is paused too.
                    if self.all_seats_full() {
                        self.handle_play(id, seat, number, cards)?;
                    }
                }
                _ => self.close_connection(id)?,
            },
        }
        Ok(())
    }

    fn handle_iam(&mut self, id: usize, seat: Seat) -> Result<(), GameServerError> {
        if self.game_over || self.seats[seat.index()].is_some() {
            self.queue(id, Message::Busy(vec![seat]))?;
            self.roles.insert(id, Role::Draining);
            return Ok(());
        }

        self.seats[seat.index()] = Some(id);
        self.roles.insert(id, Role::Seated(seat));
        self.send_deal_transcript(id, seat)?;

        if self.all_seats_full() && self.turn_deadline.is_none() {
            self.send_turn_trick()?;
        }
        Ok(())
    }

    fn send_deal_transcript(&mut self, id: usize, seat: Seat) -> Result<(), GameServerError> {
        let config = &self.deals[self.deal_index];
        let deal = self.deal.as_ref().expect("deal in progress");
        let hand = deal.first_hand(seat).cards().to_vec();
        self.queue(
            id,
            Message::Deal {
                variant: config.variant,
                first_player: config.starter,
                hand,
            },
        )?;
        for record in deal.history() {
            let cards: [Card; 4] = [
                record.plays[0].1,
                record.plays[1].1,
                record.plays[2].1,
                record.plays[3].1,
            ];
            self.queue(
                id,
                Message::Taken {
                    number: record.number,
                    cards,
                    taker: record.taker,
                },
            )?;
        }
        Ok(())
    }

    fn send_turn_trick(&mut self) -> Result<(), GameServerError> {
        let deal = self.deal.as_ref().expect("deal in progress");
        let seat = deal.next_player();
        let number = deal.trick_number();
        let cards: Vec<Card> = deal.cards_so_far().into_iter().map(|(_, c)| c).collect();

        if let Some(id) = self.seats[seat.index()] {
            self.queue(id, Message::Trick { number, cards })?;
            self.turn_deadline = Some(Instant::now() + self.seat_timeout);
        } else {
            // Seat is currently empty; nobody to prompt until they reseat.
            self.turn_deadline = None;
        }
        Ok(())
    }

    fn handle_play(&mut self, id: usize, seat: Seat, number: u32, cards: Vec<Card>) -> Result<(), GameServerError> {
        let deal = self.deal.as_mut().expect("deal in progress");
        let current_number = deal.trick_number();

        let accepted = self.seats[seat.index()] == Some(id)
            && number == current_number
            && cards.len() == 1
            && deal.play(seat, cards[0]);

        if !accepted {
            self.queue(id, Message::Wrong { number: current_number })?;
            return Ok(());
        }

        self.turn_deadline = None;

        if self.deal.as_ref().unwrap().is_trick_done() {
            let record = self.deal.as_mut().unwrap().end_trick()?;
            let cards: [Card; 4] = [
                record.plays[0].1,
                record.plays[1].1,
                record.plays[2].1,
                record.plays[3].1,
            ];
            self.broadcast(Message::Taken {
                number: record.number,
                cards,
                taker: record.taker,
            })?;

            if self.deal.as_ref().unwrap().is_complete() {
                self.finish_deal()?;
            } else {
                self.send_turn_trick()?;
            }
        } else {
            self.send_turn_trick()?;
        }

        Ok(())
    }

    fn finish_deal(&mut self) -> Result<(), GameServerError> {
        let deal = self.deal.take().expect("deal in progress");
        let scores = deal.scores();
        for seat in SEATS {
            self.totals[seat.index()] += scores[seat.index()];
        }
        self.broadcast(Message::Score(scores))?;

        self.deal_index += 1;
        if self.deal_index < self.deals.len() {
            let config = self.deals[self.deal_index].clone();
            self.deal = Some(Deal::new(config.variant, config.starter, config.hands.clone())?);
            for seat in SEATS {
                if let Some(id) = self.seats[seat.index()] {
                    let hand = self.deal.as_ref().unwrap().first_hand(seat).cards().to_vec();
                    self.queue(
                        id,
                        Message::Deal {
                            variant: config.variant,
                            first_player: config.starter,
                            hand,
                        },
                    )?;
                }
            }
            self.send_turn_trick()?;
        } else {
            self.broadcast(Message::Total(self.totals))?;
            self.game_over = true;
            for seat in SEATS {
                if let Some(id) = self.seats[seat.index()] {
                    self.roles.insert(id, Role::Draining);
                }
            }
            self.reactor.stop_accepting()?;
        }
        Ok(())
    }

    fn check_timeouts(&mut self) -> Result<(), GameServerError> {
        let now = Instant::now();

        let expired_waiting: Vec<usize> = self
            .roles
            .iter()
            .filter_map(|(id, role)| match role {
                Role::AwaitingIam { deadline } if *deadline <= now => Some(*id),
                _ => None,
            })
            .collect();
        for id in expired_waiting {
            self.close_connection(id)?;
        }

        if let Some(deadline) = self.turn_deadline {
            if deadline <= now && !self.game_over && self.all_seats_full() {
                self.send_turn_trick()?;
            }
        }
        Ok(())
    }

    fn drain_finished(&mut self) -> Result<(), GameServerError> {
        let finished: Vec<usize> = self
            .roles
            .iter()
            .filter_map(|(id, role)| match role {
                Role::Draining if !self.reactor.has_pending_writes(*id) => Some(*id),
                _ => None,
            })
            .collect();
        for id in finished {
            self.roles.remove(&id);
            self.reactor.close(id)?;
        }
        Ok(())
    }

    fn on_disconnect(&mut self, id: usize) -> Result<(), GameServerError> {
        if let Some(Role::Seated(seat)) = self.roles.get(&id).copied() {
            self.seats[seat.index()] = None;
            if let Some(deal) = &self.deal {
                if self.turn_deadline.is_some() && deal.next_player() == seat {
                    self.turn_deadline = None;
                }
            }
        }
        self.roles.remove(&id);
        self.reactor.close(id)?;
        Ok(())
    }

    fn close_connection(&mut self, id: usize) -> Result<(), GameServerError> {
        self.on_disconnect(id)
    }

    fn queue(&mut self, id: usize, msg: Message) -> Result<(), GameServerError> {
        let line = msg.encode();
        let peer = self.reactor.connection_mut(id).map(|c| c.peer());
        if let Some(peer) = peer {
            self.transcript.log_outbound(self.local_addr, peer, &line);
        }
        if let Some(conn) = self.reactor.connection_mut(id) {
            conn.queue_line(&line);
        }
        self.reactor.want_writable(id)?;
        Ok(())
    }

    fn broadcast(&mut self, msg: Message) -> Result<(), GameServerError> {
        for seat in SEATS {
            if let Some(id) = self.seats[seat.index()] {
                self.queue(id, msg.clone())?;
            }
        }
        Ok(())
    }
}
