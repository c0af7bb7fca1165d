use std::io::Write;
use std::net::SocketAddr;

use chrono::Utc;

/// Appends one line per message crossing the wire, in either direction:
/// `[<src>,<dst>,<timestamp>] <payload>`, with a millisecond-precision
/// ISO-8601 timestamp. Addresses are the reactor's own local-sockname /
/// peer-sockname snapshots, not synthetic labels. Used for post-mortem
/// debugging of a game, not for protocol behavior.
pub struct TranscriptLogger<W> {
    writer: W,
}

impl<W: Write> TranscriptLogger<W> {
    pub fn new(writer: W) -> TranscriptLogger<W> {
        TranscriptLogger { writer }
    }

    fn log(&mut self, src: SocketAddr, dst: SocketAddr, payload: &str) {
        let ts = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let _ = writeln!(self.writer, "[{},{},{}] {}", src, dst, ts, payload);
    }

    pub fn log_inbound(&mut self, peer: SocketAddr, local: SocketAddr, payload: &str) {
        self.log(peer, local, payload);
    }

    pub fn log_outbound(&mut self, local: SocketAddr, peer: SocketAddr, payload: &str) {
        self.log(local, peer, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_annotated_line_per_message() {
        let local: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let peer: SocketAddr = "127.0.0.1:51515".parse().unwrap();
        let mut buf = Vec::new();
        {
            let mut log = TranscriptLogger::new(&mut buf);
            log.log_outbound(local, peer, "IAMN");
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with(&format!("[{},{},", local, peer)));
        assert!(text.trim_end().ends_with("IAMN"));
    }
}
