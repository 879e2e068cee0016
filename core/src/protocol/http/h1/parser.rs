/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, body (Content-Length, chunked or
//! read-until-close). Interim 1xx responses are skipped.

use bytes::Buf;
use bytes::BytesMut;
use std::io;

/// Callback for HTTP/1.1 response events.
pub trait H1ResponseHandler {
    fn status(&mut self, code: u16, reason: Option<&str>);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]);
    fn trailer(&mut self, name: &str, value: &str);
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Response complete.
    Idle,
    StatusLine,
    Headers,
    /// Headers done; caller must call set_body_mode().
    HeadersComplete,
    Body,
    /// Body runs until the peer closes; caller signals that with eof().
    BodyUntilClose,
    ChunkSize,
    ChunkData,
    ChunkDataEnd,
    ChunkTrailer,
}

/// Push parser for one HTTP/1.1 response. Feed bytes via `receive`; the handler is invoked as
/// complete tokens are parsed. Partial tokens stay in the buffer.
pub struct ResponseParser {
    state: ParseState,
    status: u16,
    content_length: u64,
    bytes_received: u64,
    chunk_remaining: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            status: 0,
            content_length: 0,
            bytes_received: 0,
            chunk_remaining: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Status code of the final response, once its status line has been parsed.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Idle
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    fn line(buf: &mut BytesMut, what: &str) -> io::Result<Option<String>> {
        let Some(end) = Self::find_crlf(buf) else {
            return Ok(None);
        };
        let line = buf.split_to(end + 2);
        let s = std::str::from_utf8(&line[..end])
            .map_err(|_| invalid(format!("invalid {} encoding", what)))?;
        Ok(Some(s.to_string()))
    }

    /// Consume and parse as much as possible from buf.
    pub fn receive<H: H1ResponseHandler>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> io::Result<()> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let Some(line) = Self::line(buf, "status line")? else {
                        return Ok(());
                    };
                    // HTTP/1.1 200 OK or HTTP/1.1 200
                    let mut parts = line.splitn(3, ' ');
                    let version = parts.next().unwrap_or("");
                    if !version.starts_with("HTTP/") {
                        return Err(invalid(format!("invalid status line: {}", line)));
                    }
                    let code = parts
                        .next()
                        .and_then(|s| s.parse::<u16>().ok())
                        .filter(|c| (100..1000).contains(c))
                        .ok_or_else(|| invalid(format!("invalid status line: {}", line)))?;
                    self.status = code;
                    if !is_interim(code) {
                        handler.status(code, parts.next().filter(|r| !r.is_empty()));
                    }
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let Some(line) = Self::line(buf, "header")? else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        if is_interim(self.status) {
                            self.state = ParseState::StatusLine;
                            continue;
                        }
                        self.state = ParseState::HeadersComplete;
                        return Ok(());
                    }
                    if is_interim(self.status) {
                        continue;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        handler.header(name.trim(), value.trim());
                    }
                }
                ParseState::Body => {
                    let remaining = self.content_length - self.bytes_received;
                    let to_read = remaining.min(buf.len() as u64) as usize;
                    if to_read > 0 {
                        let chunk = buf.split_to(to_read);
                        handler.body_chunk(&chunk);
                        self.bytes_received += to_read as u64;
                    }
                    if self.bytes_received >= self.content_length {
                        self.finish(handler);
                    }
                    return Ok(());
                }
                ParseState::BodyUntilClose => {
                    let chunk = buf.split_to(buf.len());
                    handler.body_chunk(&chunk);
                    return Ok(());
                }
                ParseState::ChunkSize => {
                    let Some(line) = Self::line(buf, "chunk size")? else {
                        return Ok(());
                    };
                    let hex = line.split(';').next().unwrap_or("").trim();
                    self.chunk_remaining = u64::from_str_radix(hex, 16)
                        .map_err(|_| invalid(format!("invalid chunk size: {}", line)))?;
                    self.state = if self.chunk_remaining == 0 {
                        ParseState::ChunkTrailer
                    } else {
                        ParseState::ChunkData
                    };
                }
                ParseState::ChunkData => {
                    let to_read = self.chunk_remaining.min(buf.len() as u64) as usize;
                    let chunk = buf.split_to(to_read);
                    handler.body_chunk(&chunk);
                    self.chunk_remaining -= to_read as u64;
                    if self.chunk_remaining == 0 {
                        self.state = ParseState::ChunkDataEnd;
                    }
                }
                ParseState::ChunkDataEnd => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    if &buf[..2] != b"\r\n" {
                        return Err(invalid("missing CRLF after chunk data".to_string()));
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
                ParseState::ChunkTrailer => {
                    let Some(line) = Self::line(buf, "trailer")? else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        self.finish(handler);
                        return Ok(());
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        handler.trailer(name.trim(), value.trim());
                    }
                }
                ParseState::HeadersComplete | ParseState::Idle => return Ok(()),
            }
        }
        Ok(())
    }

    /// Called after headers are received (state HeadersComplete). `content_length` of
    /// Some(0) means no body; None without chunked means read until close.
    pub fn set_body_mode<H: H1ResponseHandler>(
        &mut self,
        content_length: Option<u64>,
        chunked: bool,
        handler: &mut H,
    ) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        if chunked {
            self.state = ParseState::ChunkSize;
        } else if let Some(cl) = content_length {
            self.content_length = cl;
            self.bytes_received = 0;
            if cl == 0 {
                self.finish(handler);
            } else {
                self.state = ParseState::Body;
            }
        } else {
            self.state = ParseState::BodyUntilClose;
        }
    }

    /// Peer closed the connection. Completes a read-until-close body; anything else
    /// still in progress is a truncated response.
    pub fn eof<H: H1ResponseHandler>(&mut self, handler: &mut H) -> io::Result<()> {
        match self.state {
            ParseState::Idle => Ok(()),
            ParseState::BodyUntilClose => {
                self.finish(handler);
                Ok(())
            }
            ParseState::StatusLine if self.status == 0 => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before response",
            )),
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before end of response",
            )),
        }
    }

    fn finish<H: H1ResponseHandler>(&mut self, handler: &mut H) {
        handler.complete();
        self.state = ParseState::Idle;
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 1xx responses other than 101 are followed by the final response on the same connection.
fn is_interim(code: u16) -> bool {
    (100..200).contains(&code) && code != 101
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
