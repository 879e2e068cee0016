/*
 * connection.rs
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

//! Socket transport: one HTTP/1.1 exchange over a TCP or TLS stream.
//!
//! The transport owns a current-thread tokio runtime and blocks on it for every socket
//! operation. In buffered mode nothing touches the network until the response is first
//! queried; in streaming modes the head goes out when output starts and the body follows
//! as it is written. The response head is parsed eagerly, the body lazily as the caller
//! reads it.

use std::io::{self, Read};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tokio_rustls::rustls::ClientConfig;

use crate::config::{self, TransportConfig};
use crate::protocol::http::client::{timed, HttpClient};
use crate::protocol::http::h1::{H1ResponseHandler, ParseState, ResponseParser};
use crate::protocol::http::request::{BodyFraming, HeaderList, Method, RequestHead};
use crate::protocol::http::transport::{Connector, StreamingMode, Transport};
use crate::url::Url;

const READ_CHUNK: usize = 8192;

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Status line and headers of the final response.
#[derive(Debug, Default)]
struct ResponseHead {
    status: u16,
    reason: Option<String>,
    headers: Vec<(String, String)>,
}

impl ResponseHead {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Bridges parser callbacks to the response head and the pending body bytes.
struct Collector<'a> {
    head: &'a mut ResponseHead,
    body: &'a mut BytesMut,
}

impl H1ResponseHandler for Collector<'_> {
    fn status(&mut self, code: u16, reason: Option<&str>) {
        self.head.status = code;
        self.head.reason = reason.map(str::to_string);
    }

    fn header(&mut self, name: &str, value: &str) {
        self.head.headers.push((name.to_string(), value.to_string()));
    }

    fn body_chunk(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    fn trailer(&mut self, _name: &str, _value: &str) {}

    fn complete(&mut self) {}
}

/// Socket, runtime and response parsing state. Reading it yields the response body.
struct Wire {
    runtime: Runtime,
    stream: Option<HttpStream>,
    read_timeout: Option<Duration>,
    read_buf: BytesMut,
    parser: ResponseParser,
    head: ResponseHead,
    body: BytesMut,
}

impl Wire {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let runtime = &self.runtime;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))?;
        runtime.block_on(async {
            stream.write_all(data).await?;
            stream.flush().await
        })
    }

    /// Feed the parser, reading from the socket when the buffered bytes make no progress.
    fn pump(&mut self) -> io::Result<()> {
        let before = self.read_buf.len();
        if before > 0 {
            let mut collector = Collector {
                head: &mut self.head,
                body: &mut self.body,
            };
            self.parser.receive(&mut self.read_buf, &mut collector)?;
            if self.read_buf.len() != before {
                return Ok(());
            }
        }
        let runtime = &self.runtime;
        let limit = self.read_timeout;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))?;
        let mut tmp = [0u8; READ_CHUNK];
        let n = runtime.block_on(timed(limit, "read", stream.read(&mut tmp)))?;
        let mut collector = Collector {
            head: &mut self.head,
            body: &mut self.body,
        };
        if n == 0 {
            return self.parser.eof(&mut collector);
        }
        self.read_buf.extend_from_slice(&tmp[..n]);
        self.parser.receive(&mut self.read_buf, &mut collector)
    }

    /// Apply the body framing once the head is parsed. Some responses never have a body.
    fn set_body_mode(&mut self, method: Method) {
        let status = self.head.status;
        let content_length = if method == Method::Head
            || (100..200).contains(&status)
            || status == 204
            || status == 304
        {
            Some(0)
        } else {
            self.head
                .header("Content-Length")
                .and_then(|v| v.trim().parse::<u64>().ok())
        };
        let chunked = content_length != Some(0)
            && self
                .head
                .header("Transfer-Encoding")
                .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
        let mut collector = Collector {
            head: &mut self.head,
            body: &mut self.body,
        };
        self.parser.set_body_mode(content_length, chunked, &mut collector);
    }

    fn has_body(&self) -> bool {
        !(self.parser.is_complete() && self.body.is_empty())
    }
}

impl Read for Wire {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        loop {
            if !self.body.is_empty() {
                let n = out.len().min(self.body.len());
                out[..n].copy_from_slice(&self.body[..n]);
                self.body.advance(n);
                return Ok(n);
            }
            if self.parser.is_complete() || self.stream.is_none() || out.is_empty() {
                return Ok(0);
            }
            self.pump()?;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing sent yet.
    Idle,
    /// Head sent (or, in buffered mode, output started); body may follow.
    Sending,
    /// Response head parsed.
    Received,
    Disconnected,
}

/// Default `Transport`: real TCP/TLS sockets.
pub struct SocketTransport {
    url: Url,
    method: Method,
    headers: HeaderList,
    connect_timeout: Option<Duration>,
    mode: StreamingMode,
    tls: Option<Arc<ClientConfig>>,
    settings: TransportConfig,
    state: State,
    head_sent: bool,
    output_done: bool,
    out_buf: BytesMut,
    written: u64,
    error: Option<(io::ErrorKind, String)>,
    wire: Wire,
}

impl SocketTransport {
    /// New unconnected exchange with GET. Process-wide settings are captured now.
    pub fn new(url: Url) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            url,
            method: Method::Get,
            headers: HeaderList::new(),
            connect_timeout: None,
            mode: StreamingMode::default(),
            tls: None,
            settings: config::snapshot(),
            state: State::Idle,
            head_sent: false,
            output_done: false,
            out_buf: BytesMut::new(),
            written: 0,
            error: None,
            wire: Wire {
                runtime,
                stream: None,
                read_timeout: None,
                read_buf: BytesMut::with_capacity(READ_CHUNK),
                parser: ResponseParser::new(),
                head: ResponseHead::default(),
                body: BytesMut::new(),
            },
        })
    }

    /// Remember a failure so later queries report it again.
    fn fail(&mut self, e: io::Error) -> io::Error {
        if self.error.is_none() {
            self.error = Some((e.kind(), e.to_string()));
        }
        self.wire.stream = None;
        e
    }

    fn check_failed(&self) -> io::Result<()> {
        match &self.error {
            Some((kind, msg)) => Err(io::Error::new(*kind, msg.clone())),
            None if self.state == State::Disconnected => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection was disconnected",
            )),
            None => Ok(()),
        }
    }

    fn connect(&mut self) -> io::Result<bool> {
        let tls = if self.url.is_secure() {
            self.tls.clone()
        } else {
            None
        };
        let (stream, via_proxy) = self.wire.runtime.block_on(HttpClient::connect(
            &self.url,
            &self.settings.proxy,
            tls,
            self.connect_timeout,
        ))?;
        self.wire.stream = Some(stream);
        Ok(via_proxy)
    }

    fn send_head(&mut self, body: BodyFraming) -> io::Result<()> {
        let via_proxy = self.connect()?;
        let absolute;
        let target = if via_proxy {
            absolute = format!("{}://{}{}", self.url.scheme(), self.url.host_header(), self.url.target());
            absolute.as_str()
        } else {
            self.url.target()
        };
        let host = self.url.host_header();
        let mut out = BytesMut::new();
        RequestHead {
            method: self.method,
            target,
            host: &host,
            headers: &self.headers,
            keep_alive: self.settings.keep_alive,
            body,
        }
        .write_to(&mut out);
        log::debug!("[http] > {} {}", self.method, target);
        self.head_sent = true;
        self.wire.write_all(&out)
    }

    fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        let mut framed = BytesMut::with_capacity(data.len() + 16);
        framed.extend_from_slice(format!("{:x}\r\n", data.len()).as_bytes());
        framed.extend_from_slice(data);
        framed.extend_from_slice(b"\r\n");
        self.wire.write_all(&framed)
    }

    fn start_streaming(&mut self) -> io::Result<()> {
        match self.mode {
            StreamingMode::Buffered => Ok(()),
            StreamingMode::FixedLength(len) => self.send_head(BodyFraming::Length(len)),
            StreamingMode::Chunked(_) => self.send_head(BodyFraming::Chunked),
        }
    }

    fn write_body(&mut self, data: &[u8]) -> io::Result<()> {
        match self.mode {
            StreamingMode::Buffered => {
                self.out_buf.extend_from_slice(data);
                Ok(())
            }
            StreamingMode::FixedLength(len) => {
                if self.written + data.len() as u64 > len {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("body exceeds declared length of {} bytes", len),
                    ));
                }
                self.written += data.len() as u64;
                self.wire.write_all(data)
            }
            StreamingMode::Chunked(size) => {
                self.out_buf.extend_from_slice(data);
                while self.out_buf.len() >= size {
                    let chunk = self.out_buf.split_to(size);
                    self.write_chunk(&chunk)?;
                }
                Ok(())
            }
        }
    }

    fn finish_body(&mut self) -> io::Result<()> {
        match self.mode {
            StreamingMode::Buffered => Ok(()),
            StreamingMode::FixedLength(len) => {
                if self.written != len {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("body of {} bytes is shorter than declared {}", self.written, len),
                    ));
                }
                Ok(())
            }
            StreamingMode::Chunked(_) => {
                if !self.out_buf.is_empty() {
                    let rest = self.out_buf.split();
                    self.write_chunk(&rest)?;
                }
                self.wire.write_all(b"0\r\n\r\n")
            }
        }
    }

    /// Send whatever has not been sent yet and read the response head.
    fn exchange(&mut self) -> io::Result<()> {
        self.check_failed()?;
        if self.state == State::Received {
            return Ok(());
        }
        if let Err(e) = self.send_and_receive() {
            return Err(self.fail(e));
        }
        self.state = State::Received;
        Ok(())
    }

    fn send_and_receive(&mut self) -> io::Result<()> {
        if !self.head_sent {
            let framing = if self.state == State::Sending
                || matches!(self.method, Method::Post | Method::Put)
            {
                BodyFraming::Length(self.out_buf.len() as u64)
            } else {
                BodyFraming::None
            };
            self.send_head(framing)?;
            if !self.out_buf.is_empty() {
                let body = self.out_buf.split();
                self.wire.write_all(&body)?;
            }
            self.output_done = true;
        } else if !self.output_done {
            self.output_done = true;
            self.finish_body()?;
        }
        while self.wire.parser.state() != ParseState::HeadersComplete {
            self.wire.pump()?;
        }
        log::debug!(
            "[http] < {} {}",
            self.wire.head.status,
            self.wire.head.reason.as_deref().unwrap_or("")
        );
        self.wire.set_body_mode(self.method);
        Ok(())
    }

    fn check_unsent(&self, what: &str) -> io::Result<()> {
        if self.head_sent || self.state == State::Received {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("cannot set {} after the request was sent", what),
            ));
        }
        Ok(())
    }
}

impl Transport for SocketTransport {
    fn url(&self) -> &Url {
        &self.url
    }

    fn method(&self) -> Method {
        self.method
    }

    fn set_method(&mut self, method: Method) -> io::Result<()> {
        self.check_unsent("method")?;
        self.method = method;
        Ok(())
    }

    fn set_connect_timeout(&mut self, timeout: Option<Duration>) {
        self.connect_timeout = timeout;
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.wire.read_timeout = timeout;
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.check_unsent("header")?;
        self.headers.set(name, value);
        Ok(())
    }

    fn request_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    fn set_streaming_mode(&mut self, mode: StreamingMode) -> io::Result<()> {
        if self.state != State::Idle {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "cannot change streaming mode after output started",
            ));
        }
        if mode == StreamingMode::Chunked(0) {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "chunk size must be positive"));
        }
        self.mode = mode;
        Ok(())
    }

    fn set_tls_config(&mut self, config: Arc<ClientConfig>) {
        self.tls = Some(config);
    }

    fn start_output(&mut self) -> io::Result<()> {
        self.check_failed()?;
        if self.state != State::Idle {
            return Ok(());
        }
        self.state = State::Sending;
        self.start_streaming().map_err(|e| self.fail(e))
    }

    fn write_output(&mut self, data: &[u8]) -> io::Result<()> {
        self.check_failed()?;
        if self.state != State::Sending || self.output_done {
            return Err(io::Error::new(io::ErrorKind::Other, "request body is not open"));
        }
        self.write_body(data).map_err(|e| self.fail(e))
    }

    fn finish_output(&mut self) -> io::Result<()> {
        self.check_failed()?;
        if self.state != State::Sending || self.output_done {
            return Ok(());
        }
        if self.head_sent {
            self.output_done = true;
            return self.finish_body().map_err(|e| self.fail(e));
        }
        Ok(())
    }

    fn status(&mut self) -> io::Result<u16> {
        self.exchange()?;
        Ok(self.wire.head.status)
    }

    fn reason(&mut self) -> io::Result<Option<String>> {
        self.exchange()?;
        Ok(self.wire.head.reason.clone())
    }

    fn response_header(&mut self, name: &str) -> io::Result<Option<String>> {
        self.exchange()?;
        Ok(self.wire.head.header(name).map(str::to_string))
    }

    fn input_stream(&mut self) -> io::Result<&mut dyn Read> {
        self.exchange()?;
        Ok(&mut self.wire)
    }

    fn error_stream(&mut self) -> Option<&mut dyn Read> {
        self.exchange().ok()?;
        if self.wire.head.status >= 400 && self.wire.has_body() {
            Some(&mut self.wire)
        } else {
            None
        }
    }

    fn close_input(&mut self) -> io::Result<()> {
        self.wire.body.clear();
        let Some(mut stream) = self.wire.stream.take() else {
            return Ok(());
        };
        let limit = self.wire.read_timeout;
        match self
            .wire
            .runtime
            .block_on(timed(limit, "shutdown", stream.shutdown()))
        {
            // peer already gone
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    fn disconnect(&mut self) {
        self.wire.stream = None;
        self.state = State::Disconnected;
    }
}

impl Connector for Url {
    fn open(&self) -> io::Result<Box<dyn Transport>> {
        Ok(Box::new(SocketTransport::new(self.clone())?))
    }
}
