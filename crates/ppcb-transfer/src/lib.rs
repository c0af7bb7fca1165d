//! File producer/consumer (C4): chunk an input byte stream into
//! `OPTIMAL`-sized pieces, and write accepted chunks back out in order.
//! Both sides are pure iterators over a byte stream; neither carries any
//! protocol state.

use std::io::{self, Read, Write};

/// MTU-friendly chunk size for produced `DATA` payloads (§4.4).
pub const OPTIMAL: usize = 1400;

/// Reads an input stream and yields fixed-size (except possibly the last)
/// byte chunks in order.
pub struct Producer<R> {
    reader: R,
}

impl<R: Read> Producer<R> {
    pub fn new(reader: R) -> Producer<R> {
        Producer { reader }
    }

    /// Returns the next chunk, or `Ok(None)` at end of stream.
    pub fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; OPTIMAL];
        let mut filled = 0;
        while filled < OPTIMAL {
            match self.reader.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf))
    }
}

impl<R: Read> Iterator for Producer<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Writes accepted `DATA` payloads to an output stream in order, flushing
/// after each write so a downstream reader sees bytes promptly.
pub struct Consumer<W> {
    writer: W,
}

impl<W: Write> Consumer<W> {
    pub fn new(writer: W) -> Consumer<W> {
        Consumer { writer }
    }

    pub fn accept(&mut self, payload: &[u8]) -> io::Result<()> {
        self.writer.write_all(payload)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn producer_chunks_to_optimal_size() {
        let data = vec![7u8; OPTIMAL * 2 + 13];
        let mut producer = Producer::new(Cursor::new(data.clone()));

        let first = producer.next_chunk().unwrap().unwrap();
        assert_eq!(first.len(), OPTIMAL);
        let second = producer.next_chunk().unwrap().unwrap();
        assert_eq!(second.len(), OPTIMAL);
        let third = producer.next_chunk().unwrap().unwrap();
        assert_eq!(third.len(), 13);
        assert!(producer.next_chunk().unwrap().is_none());

        let mut reassembled = first;
        reassembled.extend(second);
        reassembled.extend(third);
        assert_eq!(reassembled, data);
    }

    #[test]
    fn producer_on_empty_input_yields_nothing() {
        let mut producer = Producer::new(Cursor::new(Vec::<u8>::new()));
        assert!(producer.next_chunk().unwrap().is_none());
    }

    #[test]
    fn consumer_writes_and_flushes_in_order() {
        let mut out = Vec::new();
        {
            let mut consumer = Consumer::new(&mut out);
            consumer.accept(b"AB").unwrap();
            consumer.accept(b"C").unwrap();
        }
        assert_eq!(out, b"ABC");
    }
}
