use std::collections::VecDeque;

use crate::error::ReactorError;

/// Accumulates bytes off the wire and peels off complete `\r\n`-terminated
/// lines. Backed by a plain `VecDeque<u8>`, unlike the unsafe ring buffer
/// this is modelled on; nothing here needs to be `unsafe`.
pub struct LineBuffer {
    inner: VecDeque<u8>,
    max_len: usize,
}

impl LineBuffer {
    pub fn new(max_len: usize) -> LineBuffer {
        LineBuffer {
            inner: VecDeque::new(),
            max_len,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<(), ReactorError> {
        if self.inner.len() + bytes.len() > self.max_len {
            return Err(ReactorError::LineTooLong);
        }
        self.inner.extend(bytes);
        Ok(())
    }

    /// Removes and returns the next complete line (without its `\r\n`),
    /// or `None` if no terminator has arrived yet.
    pub fn take_line(&mut self) -> Result<Option<String>, ReactorError> {
        let pos = self
            .inner
            .iter()
            .zip(self.inner.iter().skip(1))
            .position(|(a, b)| *a == b'\r' && *b == b'\n');

        let Some(pos) = pos else {
            return Ok(None);
        };

        let line_bytes: Vec<u8> = self.inner.drain(..pos).collect();
        self.inner.pop_front(); // \r
        self.inner.pop_front(); // \n

        String::from_utf8(line_bytes)
            .map(Some)
            .map_err(|_| ReactorError::NotUtf8)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_one_line_at_a_time() {
        let mut buf = LineBuffer::new(1024);
        buf.push(b"IAMN\r\nBUSY").unwrap();
        assert_eq!(buf.take_line().unwrap(), Some("IAMN".to_string()));
        assert_eq!(buf.take_line().unwrap(), None);
        buf.push(b"NESW\r\n").unwrap();
        assert_eq!(buf.take_line().unwrap(), Some("BUSYNESW".to_string()));
    }

    #[test]
    fn overflow_is_reported_as_fatal() {
        let mut buf = LineBuffer::new(4);
        let err = buf.push(b"TOOLONG").unwrap_err();
        assert!(matches!(err, ReactorError::LineTooLong));
    }

    #[test]
    fn rejects_non_utf8_payloads() {
        let mut buf = LineBuffer::new(1024);
        buf.push(&[0xff, 0xfe, b'\r', b'\n']).unwrap();
        let err = buf.take_line().unwrap_err();
        assert!(matches!(err, ReactorError::NotUtf8));
    }
}
