use std::net::SocketAddr;
use std::time::Duration;

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};

use crate::connection::Connection;
use crate::error::ReactorError;

const LISTENER: Token = Token(usize::MAX);

/// A readiness event surfaced for one connection. Owned (not borrowed
/// from `mio::Events`) so the caller can freely mutate the reactor while
/// handling it.
#[derive(Debug, Copy, Clone)]
pub struct ReadyEvent {
    pub id: usize,
    pub readable: bool,
    pub writable: bool,
}

/// Single-threaded, single-`mio::Poll` reactor driving a TCP listener and
/// a table of line-framed connections. One `Endpoint`-style accept loop,
/// generalized to plain-text instead of an encrypted handshake.
pub struct Reactor {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    connections: Vec<Option<Connection>>,
    free: Vec<usize>,
    log: slog::Logger,
}

impl Reactor {
    pub fn bind(addr: SocketAddr, log: slog::Logger) -> Result<Reactor, ReactorError> {
        let mut listener = TcpListener::bind(addr)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        Ok(Reactor {
            poll,
            events: Events::with_capacity(1024),
            listener,
            connections: Vec::new(),
            free: Vec::new(),
            log,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Blocks up to `timeout` for readiness, accepts any pending
    /// connections, and returns the read/write-ready connection ids.
    /// Newly accepted connections are reported separately via their own
    /// return value from `accept_pending`, which this calls internally
    /// and folds into the id list as a readable event (there is always
    /// data to read immediately after IAM).
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<Vec<ReadyEvent>, ReactorError> {
        self.poll.poll(&mut self.events, timeout)?;

        let mut ready = Vec::new();
        let mut accepted_any = false;
        for event in &self.events {
            if event.token() == LISTENER {
                accepted_any = true;
                continue;
            }
            let id = event.token().0;
            ready.push(ReadyEvent {
                id,
                readable: event.is_readable(),
                writable: event.is_writable(),
            });
        }

        if accepted_any {
            for id in self.accept_pending()? {
                ready.push(ReadyEvent {
                    id,
                    readable: true,
                    writable: false,
                });
            }
        }

        Ok(ready)
    }

    fn accept_pending(&mut self) -> Result<Vec<usize>, ReactorError> {
        let mut accepted = Vec::new();
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    let id = match self.free.pop() {
                        Some(id) => id,
                        None => {
                            let id = self.connections.len();
                            self.connections.push(None);
                            id
                        }
                    };
                    self.poll.registry().register(
                        &mut stream,
                        Token(id),
                        Interest::READABLE,
                    )?;
                    self.connections[id] = Some(Connection::new(stream, peer));
                    slog::debug!(self.log, "accepted connection"; "id" => id, "peer" => %peer);
                    accepted.push(id);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(accepted)
    }

    pub fn connection_mut(&mut self, id: usize) -> Option<&mut Connection> {
        self.connections.get_mut(id).and_then(|c| c.as_mut())
    }

    /// Re-registers the connection for write readiness too, once it has
    /// something queued to send.
    pub fn want_writable(&mut self, id: usize) -> Result<(), ReactorError> {
        let conn = self
            .connections
            .get_mut(id)
            .and_then(|c| c.as_mut())
            .ok_or(ReactorError::UnknownConnection(id))?;
        self.poll.registry().reregister(
            &mut conn.stream_mut(),
            Token(id),
            Interest::READABLE | Interest::WRITABLE,
        )?;
        Ok(())
    }

    /// Drops back to read-only readiness once the output buffer has
    /// drained, to avoid spinning on writable-always-ready sockets.
    pub fn want_readable_only(&mut self, id: usize) -> Result<(), ReactorError> {
        let conn = self
            .connections
            .get_mut(id)
            .and_then(|c| c.as_mut())
            .ok_or(ReactorError::UnknownConnection(id))?;
        self.poll
            .registry()
            .reregister(&mut conn.stream_mut(), Token(id), Interest::READABLE)?;
        Ok(())
    }

    pub fn close(&mut self, id: usize) -> Result<(), ReactorError> {
        if let Some(mut conn) = self.connections.get_mut(id).and_then(|c| c.take()) {
            let _ = self.poll.registry().deregister(&mut conn.stream_mut());
            self.free.push(id);
        }
        Ok(())
    }

    pub fn has_pending_writes(&self, id: usize) -> bool {
        self.connections
            .get(id)
            .and_then(|c| c.as_ref())
            .map(|c| c.has_pending_writes())
            .unwrap_or(false)
    }

    /// Stops accepting new connections once the game has ended. Existing
    /// connections keep draining.
    pub fn stop_accepting(&mut self) -> Result<(), ReactorError> {
        self.poll.registry().deregister(&mut self.listener)?;
        Ok(())
    }
}
