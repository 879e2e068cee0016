/*
 * transport.rs
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

//! The connection seam under `HttpRequest`.
//!
//! A `Transport` is one not-yet-sent HTTP exchange: request method and headers can be
//! configured, a body can be written, and the first response query performs the transfer.
//! After that the status, headers and body stream are served from the transport's own
//! state. `SocketTransport` is the default implementation; a `Connector` lets callers
//! supply their own (for example to rewrite URLs or to test without a network).

use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use tokio_rustls::rustls::ClientConfig;

use crate::protocol::http::request::Method;
use crate::url::Url;

/// How the request body reaches the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamingMode {
    /// Body is held in memory and sent with a Content-Length when the response is first queried.
    #[default]
    Buffered,
    /// Head is sent when output starts; the body must be exactly this many bytes.
    FixedLength(u64),
    /// Head is sent when output starts; the body is sent as chunks of at most this size.
    Chunked(usize),
}

/// One HTTP exchange. Methods that query the response perform the transfer on first use.
pub trait Transport {
    /// Target of the exchange.
    fn url(&self) -> &Url;

    /// True when the exchange runs over TLS.
    fn is_secure(&self) -> bool {
        self.url().is_secure()
    }

    fn method(&self) -> Method;

    /// Bind the request method. Fails once the request head has been sent.
    fn set_method(&mut self, method: Method) -> io::Result<()>;

    fn set_connect_timeout(&mut self, timeout: Option<Duration>);

    fn set_read_timeout(&mut self, timeout: Option<Duration>);

    /// Set a request header, replacing any value with the same (case-insensitive) name.
    /// Fails once the request head has been sent.
    fn set_request_header(&mut self, name: &str, value: &str) -> io::Result<()>;

    /// Currently configured request header value.
    fn request_header(&self, name: &str) -> Option<&str>;

    /// Select buffered or streaming upload. Fails once output has started.
    fn set_streaming_mode(&mut self, mode: StreamingMode) -> io::Result<()>;

    /// TLS client configuration for secure exchanges. Ignored for plain ones.
    fn set_tls_config(&mut self, config: Arc<ClientConfig>);

    /// Announce that a request body follows. In streaming modes this connects and sends the head.
    fn start_output(&mut self) -> io::Result<()>;

    /// Append request body bytes.
    fn write_output(&mut self, data: &[u8]) -> io::Result<()>;

    /// End of request body. Chunked uploads send the last chunk; fixed-length uploads
    /// verify the declared length was met.
    fn finish_output(&mut self) -> io::Result<()>;

    /// Response status code, performing the transfer if needed.
    fn status(&mut self) -> io::Result<u16>;

    /// Response reason phrase.
    fn reason(&mut self) -> io::Result<Option<String>>;

    /// First response header value with this (case-insensitive) name.
    fn response_header(&mut self, name: &str) -> io::Result<Option<String>>;

    /// Response body for successful exchanges. May fail for error statuses on
    /// transports that separate the two.
    fn input_stream(&mut self) -> io::Result<&mut dyn Read>;

    /// Response body for error statuses (>= 400), when the transport has one.
    fn error_stream(&mut self) -> Option<&mut dyn Read>;

    /// Release the response body. Called once the caller is done reading.
    fn close_input(&mut self) -> io::Result<()>;

    /// Drop the connection. Later response queries fail.
    fn disconnect(&mut self);
}

/// Indirection that yields an opened (not yet connected) transport.
pub trait Connector {
    fn open(&self) -> io::Result<Box<dyn Transport>>;
}
