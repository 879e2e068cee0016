/*
 * output.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Courier, a fluent HTTP request library.
 *
 * Courier is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Courier is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Courier.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Request body sink: a write buffer in front of the transport, with the charset used for
//! text writes and a flag telling whether the body is multipart.

use std::io;

use crate::protocol::http::charset::Charset;
use crate::protocol::http::transport::Transport;

#[derive(Debug)]
pub struct RequestOutput {
    charset: Charset,
    multipart: bool,
    buf: Vec<u8>,
    capacity: usize,
}

impl RequestOutput {
    pub fn new(charset: Charset, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            charset,
            multipart: false,
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    pub fn set_multipart(&mut self) {
        self.multipart = true;
    }

    /// Buffer `data`, spilling to the transport when the buffer is full. Writes at least
    /// as large as the buffer go straight through.
    pub fn write(&mut self, transport: &mut dyn Transport, data: &[u8]) -> io::Result<()> {
        if self.buf.len() + data.len() > self.capacity {
            self.flush(transport)?;
        }
        if data.len() >= self.capacity {
            return transport.write_output(data);
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Encode `text` in the output charset and write it.
    pub fn write_str(&mut self, transport: &mut dyn Transport, text: &str) -> io::Result<()> {
        let bytes = self.charset.encode(text)?;
        self.write(transport, &bytes)
    }

    pub fn flush(&mut self, transport: &mut dyn Transport) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = transport.write_output(&self.buf);
        self.buf.clear();
        result
    }

    /// Flush and end the body.
    pub fn close(mut self, transport: &mut dyn Transport) -> io::Result<()> {
        self.flush(transport)?;
        transport.finish_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::http::mock::MockTransport;

    #[test]
    fn small_writes_are_buffered_until_full() {
        let (mut transport, log) = MockTransport::new("http://example.com/");
        let mut output = RequestOutput::new(Charset::Utf8, 4);
        output.write(&mut transport, b"ab").unwrap();
        output.write(&mut transport, b"c").unwrap();
        assert!(log.borrow().writes.is_empty());
        output.write(&mut transport, b"de").unwrap();
        assert_eq!(log.borrow().writes, vec![b"abc".to_vec()]);
        output.close(&mut transport).unwrap();
        assert_eq!(log.borrow().writes, vec![b"abc".to_vec(), b"de".to_vec()]);
        assert_eq!(log.borrow().finished, 1);
    }

    #[test]
    fn large_write_bypasses_buffer() {
        let (mut transport, log) = MockTransport::new("http://example.com/");
        let mut output = RequestOutput::new(Charset::Utf8, 4);
        output.write(&mut transport, b"x").unwrap();
        output.write(&mut transport, b"12345678").unwrap();
        assert_eq!(log.borrow().writes, vec![b"x".to_vec(), b"12345678".to_vec()]);
    }

    #[test]
    fn text_is_encoded_in_output_charset() {
        let (mut transport, log) = MockTransport::new("http://example.com/");
        let mut output = RequestOutput::new(Charset::Latin1, 16);
        output.write_str(&mut transport, "caf\u{e9}").unwrap();
        let err = output.write_str(&mut transport, "\u{20ac}").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        output.close(&mut transport).unwrap();
        assert_eq!(log.borrow().body(), b"caf\xe9");
    }
}
