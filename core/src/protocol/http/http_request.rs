/*
 * http_request.rs
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

//! Single-use fluent HTTP request.
//!
//! An `HttpRequest` wraps one transport. Headers and a body are configured first; the
//! first response accessor closes the body and performs the exchange. Setters return
//! `Result<&mut Self>` so calls chain with `?`:
//!
//! ```no_run
//! # fn main() -> courier_core::error::Result<()> {
//! use courier_core::HttpRequest;
//! let mut request = HttpRequest::post("http://example.com/login")?;
//! request.accept_json()?.form(&[("user", Some("ann")), ("remember", None)])?;
//! if request.ok()? {
//!     println!("{}", request.body()?);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_rustls::rustls::client::danger::ServerCertVerifier;
use tokio_rustls::rustls::RootCertStore;

use crate::codec::base64;
use crate::error::{RequestError, Result};
use crate::protocol::http::charset::Charset;
use crate::protocol::http::form;
use crate::protocol::http::guard::{self, Progress};
use crate::protocol::http::header::{self, *};
use crate::protocol::http::multipart::{self, Part, PartBody};
use crate::protocol::http::output::RequestOutput;
use crate::protocol::http::request::Method;
use crate::protocol::http::transport::{Connector, StreamingMode, Transport};
use crate::protocol::http::trust::{TlsOptions, Trust};
use crate::url::Url;

/// Default size of the body buffer and of copy chunks.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Upper bound on the memory reserved up front from a response Content-Length.
const MAX_BODY_PREALLOC: usize = 1 << 20;

/// Request lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No body written yet.
    Unopened,
    /// Body output is open.
    Writing,
    /// Body closed; the response may be read.
    ClosedForRead,
    /// Response body handed out.
    Consumed,
}

pub struct HttpRequest {
    transport: Box<dyn Transport>,
    secure: bool,
    phase: Phase,
    output: Option<RequestOutput>,
    buffer_size: usize,
    ignore_close_errors: bool,
    progress: Option<Progress>,
    tls: TlsOptions,
    form: bool,
    form_pairs: bool,
}

impl HttpRequest {
    /// Parse `url` and open a socket transport for it.
    pub fn new(url: &str, method: Method) -> Result<Self> {
        let url = Url::parse(url)?;
        Self::from_url(&url, method)
    }

    pub fn from_url(url: &Url, method: Method) -> Result<Self> {
        Self::from_connector(url, method)
    }

    /// Open a transport through `connector` and bind the method.
    pub fn from_connector(connector: &dyn Connector, method: Method) -> Result<Self> {
        let mut transport = connector.open()?;
        transport.set_method(method)?;
        let secure = transport.is_secure();
        Ok(Self {
            transport,
            secure,
            phase: Phase::Unopened,
            output: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            ignore_close_errors: true,
            progress: None,
            tls: TlsOptions::default(),
            form: false,
            form_pairs: false,
        })
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::new(url, Method::Get)
    }

    pub fn post(url: &str) -> Result<Self> {
        Self::new(url, Method::Post)
    }

    pub fn put(url: &str) -> Result<Self> {
        Self::new(url, Method::Put)
    }

    pub fn delete(url: &str) -> Result<Self> {
        Self::new(url, Method::Delete)
    }

    pub fn head(url: &str) -> Result<Self> {
        Self::new(url, Method::Head)
    }

    pub fn options(url: &str) -> Result<Self> {
        Self::new(url, Method::Options)
    }

    pub fn trace(url: &str) -> Result<Self> {
        Self::new(url, Method::Trace)
    }

    pub fn url(&self) -> &Url {
        self.transport.url()
    }

    pub fn method(&self) -> Method {
        self.transport.method()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn check_configurable(&self, what: &str) -> Result<()> {
        match self.phase {
            Phase::Unopened | Phase::Writing => Ok(()),
            Phase::ClosedForRead | Phase::Consumed => Err(RequestError::config(format!(
                "cannot set {} after the request body was closed",
                what
            ))),
        }
    }

    // ---- Connection control ----

    /// Drop the connection.
    pub fn disconnect(&mut self) -> &mut Self {
        self.transport.disconnect();
        self
    }

    pub fn connect_timeout(&mut self, timeout: Duration) -> Result<&mut Self> {
        self.check_configurable("connect timeout")?;
        self.transport.set_connect_timeout(Some(timeout));
        Ok(self)
    }

    pub fn read_timeout(&mut self, timeout: Duration) -> Result<&mut Self> {
        self.check_configurable("read timeout")?;
        self.transport.set_read_timeout(Some(timeout));
        Ok(self)
    }

    /// Size of the body buffer and of copy chunks. Must be at least 1.
    pub fn buffer_size(&mut self, size: usize) -> Result<&mut Self> {
        if size < 1 {
            return Err(RequestError::config("Size must be greater than zero"));
        }
        self.buffer_size = size;
        Ok(self)
    }

    pub fn get_buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Whether errors from closing streams are dropped (true by default).
    pub fn ignore_close_errors(&mut self, ignore: bool) -> &mut Self {
        self.ignore_close_errors = ignore;
        self
    }

    pub fn ignores_close_errors(&self) -> bool {
        self.ignore_close_errors
    }

    /// Callback receiving the cumulative bytes (or characters, for text) after each chunk.
    pub fn on_progress(&mut self, callback: impl FnMut(u64) + 'static) -> &mut Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn clear_progress(&mut self) -> &mut Self {
        self.progress = None;
        self
    }

    fn streaming_mode(&mut self, mode: StreamingMode) -> Result<&mut Self> {
        self.check_configurable("streaming mode")?;
        self.transport
            .set_streaming_mode(mode)
            .map_err(|e| RequestError::config(e.to_string()))?;
        Ok(self)
    }

    /// Stream the body as chunks of at most `size` bytes.
    pub fn chunk(&mut self, size: usize) -> Result<&mut Self> {
        if size < 1 {
            return Err(RequestError::config("Chunk size must be greater than zero"));
        }
        self.streaming_mode(StreamingMode::Chunked(size))
    }

    /// Stream a body of exactly `length` bytes.
    pub fn fixed_length(&mut self, length: u64) -> Result<&mut Self> {
        self.streaming_mode(StreamingMode::FixedLength(length))
    }

    // ---- Request headers ----

    pub fn header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.check_configurable("header")?;
        self.transport
            .set_request_header(name, value)
            .map_err(|e| RequestError::config(format!("cannot set header {}: {}", name, e)))?;
        Ok(self)
    }

    /// Set headers from a flat `[name, value, name, value, ...]` list.
    pub fn headers(&mut self, pairs: &[&str]) -> Result<&mut Self> {
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(RequestError::config(
                "headers must be a non-empty list of name/value pairs",
            ));
        }
        for pair in pairs.chunks(2) {
            self.header(pair[0], pair[1])?;
        }
        Ok(self)
    }

    /// Currently configured request header.
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.transport.request_header(name)
    }

    pub fn user_agent(&mut self, value: &str) -> Result<&mut Self> {
        self.header(USER_AGENT, value)
    }

    pub fn accept(&mut self, value: &str) -> Result<&mut Self> {
        self.header(ACCEPT, value)
    }

    pub fn accept_encoding(&mut self, value: &str) -> Result<&mut Self> {
        self.header(ACCEPT_ENCODING, value)
    }

    pub fn accept_gzip_encoding(&mut self) -> Result<&mut Self> {
        self.header(ACCEPT_ENCODING, ENCODING_GZIP)
    }

    pub fn accept_charset(&mut self, value: &str) -> Result<&mut Self> {
        self.header(ACCEPT_CHARSET, value)
    }

    pub fn accept_json(&mut self) -> Result<&mut Self> {
        self.header(ACCEPT, CONTENT_TYPE_JSON)
    }

    pub fn authorization(&mut self, value: &str) -> Result<&mut Self> {
        self.header(AUTHORIZATION, value)
    }

    /// Basic authentication: `Basic base64(name:password)`.
    pub fn basic(&mut self, name: &str, password: &str) -> Result<&mut Self> {
        let credentials = base64::encode_str(&format!("{}:{}", name, password));
        self.authorization(&format!("Basic {}", credentials))
    }

    pub fn if_none_match(&mut self, value: &str) -> Result<&mut Self> {
        self.header(IF_NONE_MATCH, value)
    }

    pub fn if_modified_since(&mut self, instant: DateTime<Utc>) -> Result<&mut Self> {
        self.header(IF_MODIFIED_SINCE, &header::format_http_date(instant))
    }

    /// Set Content-Type, with a charset parameter when one is given.
    pub fn content_type(&mut self, value: &str, charset: Option<&str>) -> Result<&mut Self> {
        match charset.filter(|c| !c.is_empty()) {
            Some(charset) => {
                let value = format!("{}; {}={}", value, PARAM_CHARSET, charset);
                self.header(CONTENT_TYPE, &value)
            }
            None => self.header(CONTENT_TYPE, value),
        }
    }

    // ---- TLS ----

    fn apply_tls(&mut self) -> Result<&mut Self> {
        self.check_configurable("TLS options")?;
        let config = self.tls.client_config()?;
        self.transport.set_tls_config(config);
        Ok(self)
    }

    /// Accept any server certificate chain. No effect on plain http.
    pub fn trust_all_certs(&mut self) -> Result<&mut Self> {
        if !self.secure {
            return Ok(self);
        }
        log::warn!("[http] certificate validation disabled for {}", self.transport.url());
        self.tls.trust = Trust::AcceptAll;
        self.apply_tls()
    }

    /// Accept certificates whose names do not match the host. No effect on plain http.
    pub fn trust_all_hosts(&mut self) -> Result<&mut Self> {
        if !self.secure {
            return Ok(self);
        }
        log::warn!("[http] hostname verification disabled for {}", self.transport.url());
        self.tls.any_host = true;
        self.apply_tls()
    }

    /// Validate server certificates against `roots` only. No effect on plain http.
    pub fn apply_trust_roots(&mut self, roots: RootCertStore) -> Result<&mut Self> {
        if !self.secure {
            return Ok(self);
        }
        log::warn!("[http] using caller-supplied trust roots for {}", self.transport.url());
        self.tls.trust = Trust::Roots(roots);
        self.apply_tls()
    }

    /// Validate server certificates with `verifier`. No effect on plain http.
    pub fn apply_trust_verifier(
        &mut self,
        verifier: Arc<dyn ServerCertVerifier>,
    ) -> Result<&mut Self> {
        if !self.secure {
            return Ok(self);
        }
        log::warn!("[http] using caller-supplied verifier for {}", self.transport.url());
        self.tls.trust = Trust::Verifier(verifier);
        self.apply_tls()
    }

    // ---- Output pipeline ----

    fn open_output(&mut self) -> Result<()> {
        match self.phase {
            Phase::Unopened => {}
            Phase::Writing => return Ok(()),
            Phase::ClosedForRead | Phase::Consumed => {
                return Err(RequestError::config("request body is already closed"))
            }
        }
        let charset = match self
            .transport
            .request_header(CONTENT_TYPE)
            .and_then(|ct| header::param(ct, PARAM_CHARSET))
        {
            Some(name) => Charset::for_name(name)
                .ok_or_else(|| RequestError::config(format!("unsupported charset: {}", name)))?,
            None => Charset::Utf8,
        };
        self.transport.start_output()?;
        self.output = Some(RequestOutput::new(charset, self.buffer_size));
        self.phase = Phase::Writing;
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.open_output()?;
        if let Some(output) = self.output.as_mut() {
            output.write(self.transport.as_mut(), data)?;
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.open_output()?;
        if let Some(output) = self.output.as_mut() {
            output.write_str(self.transport.as_mut(), text)?;
        }
        Ok(())
    }

    fn copy_into_body(&mut self, input: &mut dyn Read) -> Result<u64> {
        self.open_output()?;
        let Self {
            transport,
            output,
            progress,
            buffer_size,
            ..
        } = self;
        let output = output
            .as_mut()
            .ok_or_else(|| RequestError::config("request body is not open"))?;
        guard::copy_bytes(
            input,
            *buffer_size,
            |chunk| Ok(output.write(transport.as_mut(), chunk)?),
            progress,
        )
    }

    fn copy_text_into_body(&mut self, input: &mut dyn Read) -> Result<u64> {
        self.open_output()?;
        let Self {
            transport,
            output,
            progress,
            buffer_size,
            ..
        } = self;
        let output = output
            .as_mut()
            .ok_or_else(|| RequestError::config("request body is not open"))?;
        guard::copy_text(
            input,
            *buffer_size,
            Charset::Utf8.decoder(),
            |text| Ok(output.write_str(transport.as_mut(), text)?),
            progress,
        )
    }

    /// Finish the request body: write the multipart terminator, flush and close the sink.
    /// Idempotent; afterwards no more body can be written.
    pub fn close_output(&mut self) -> Result<&mut Self> {
        let Some(mut output) = self.output.take() else {
            return Ok(self);
        };
        self.phase = Phase::ClosedForRead;
        if output.is_multipart() {
            output.write_str(self.transport.as_mut(), &multipart::terminator())?;
        }
        let transport = self.transport.as_mut();
        guard::close_after(
            output,
            self.ignore_close_errors,
            |_| Ok(()),
            |output| output.close(transport),
        )?;
        Ok(self)
    }

    /// Every response accessor starts here.
    fn finish_request(&mut self) -> Result<()> {
        self.close_output()?;
        if self.phase == Phase::Unopened || self.phase == Phase::Writing {
            self.phase = Phase::ClosedForRead;
        }
        Ok(())
    }

    // ---- Body encoders ----

    /// Send bytes as (part of) the body.
    pub fn send_bytes(&mut self, data: &[u8]) -> Result<&mut Self> {
        let mut input = data;
        self.send_stream(&mut input)
    }

    /// Copy `input` into the body.
    pub fn send_stream(&mut self, input: impl Read) -> Result<&mut Self> {
        let ignore = self.ignore_close_errors;
        guard::close_after(
            input,
            ignore,
            |input| self.copy_into_body(input),
            |input| {
                drop(input);
                Ok(())
            },
        )?;
        Ok(self)
    }

    /// Copy a file into the body.
    pub fn send_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::with_capacity(self.buffer_size, file);
        self.send_stream(reader)
    }

    /// Copy UTF-8 text from `input`, re-encoded in the body charset. Progress counts characters.
    pub fn send_text(&mut self, input: impl Read) -> Result<&mut Self> {
        let ignore = self.ignore_close_errors;
        guard::close_after(
            input,
            ignore,
            |input| self.copy_text_into_body(input),
            |input| {
                drop(input);
                Ok(())
            },
        )?;
        Ok(self)
    }

    /// Write text in the body charset.
    pub fn send_str(&mut self, text: &str) -> Result<&mut Self> {
        self.write_text(text)?;
        Ok(self)
    }

    /// Write form pairs in UTF-8.
    pub fn form(&mut self, pairs: &[(&str, Option<&str>)]) -> Result<&mut Self> {
        self.form_with_charset(pairs, Charset::Utf8.name())
    }

    pub fn form_field(&mut self, name: &str, value: Option<&str>) -> Result<&mut Self> {
        self.form(&[(name, value)])
    }

    /// Write URL-encoded form pairs. The first call sets the form Content-Type.
    pub fn form_with_charset(
        &mut self,
        pairs: &[(&str, Option<&str>)],
        charset: &str,
    ) -> Result<&mut Self> {
        let cs = Charset::for_name(charset)
            .ok_or_else(|| RequestError::config(format!("unsupported charset: {}", charset)))?;
        if !self.form {
            self.content_type(CONTENT_TYPE_FORM, Some(cs.name()))?;
            self.form = true;
        }
        for (name, value) in pairs {
            let pair = form::encode_pair(name, *value, cs)?;
            if self.form_pairs {
                self.write_text("&")?;
            }
            self.write_text(&pair)?;
            self.form_pairs = true;
        }
        Ok(self)
    }

    fn start_part(&mut self) -> Result<()> {
        let multipart = self.output.as_ref().is_some_and(RequestOutput::is_multipart);
        if multipart {
            return self.write_text(&multipart::next_boundary());
        }
        self.content_type(&multipart::content_type(), None)?;
        self.open_output()?;
        if let Some(output) = self.output.as_mut() {
            output.set_multipart();
        }
        self.write_text(&multipart::first_boundary())
    }

    /// Write a raw `name: value` line inside the current part.
    pub fn part_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.write_text(&format!("{}: {}\r\n", name, value))?;
        Ok(self)
    }

    /// Append a multipart part. The first part sets the multipart Content-Type.
    pub fn part(&mut self, part: Part<'_>) -> Result<&mut Self> {
        self.start_part()?;
        self.part_header("Content-Disposition", &part.disposition())?;
        if let Some(content_type) = &part.content_type {
            self.part_header(CONTENT_TYPE, content_type)?;
        }
        self.write_text("\r\n")?;
        match part.body {
            PartBody::Text(text) => self.send_str(text),
            PartBody::Bytes(bytes) => self.send_bytes(bytes),
            PartBody::Reader(reader) => self.send_stream(reader),
            PartBody::File(path) => self.send_file(path),
        }
    }

    // ---- Status ----

    /// Response status code. Closes the body and performs the exchange on first use.
    pub fn code(&mut self) -> Result<u16> {
        self.finish_request()?;
        Ok(self.transport.status()?)
    }

    /// Response reason phrase.
    pub fn message(&mut self) -> Result<Option<String>> {
        self.finish_request()?;
        Ok(self.transport.reason()?)
    }

    pub fn ok(&mut self) -> Result<bool> {
        Ok(self.code()? == 200)
    }

    pub fn created(&mut self) -> Result<bool> {
        Ok(self.code()? == 201)
    }

    pub fn bad_request(&mut self) -> Result<bool> {
        Ok(self.code()? == 400)
    }

    pub fn not_found(&mut self) -> Result<bool> {
        Ok(self.code()? == 404)
    }

    pub fn not_modified(&mut self) -> Result<bool> {
        Ok(self.code()? == 304)
    }

    pub fn server_error(&mut self) -> Result<bool> {
        Ok(self.code()? == 500)
    }

    // ---- Response headers ----

    pub fn response_header(&mut self, name: &str) -> Result<Option<String>> {
        self.finish_request()?;
        Ok(self.transport.response_header(name)?)
    }

    /// Header as an integer, None when absent or not a number.
    pub fn int_header(&mut self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .response_header(name)?
            .and_then(|v| v.trim().parse::<i64>().ok()))
    }

    /// Header as an HTTP-date, None when absent or unparsable.
    pub fn date_header(&mut self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .response_header(name)?
            .and_then(|v| header::parse_http_date(&v)))
    }

    pub fn response_content_type(&mut self) -> Result<Option<String>> {
        self.response_header(CONTENT_TYPE)
    }

    pub fn content_length(&mut self) -> Result<Option<i64>> {
        self.int_header(CONTENT_LENGTH)
    }

    /// Charset parameter of the response Content-Type.
    pub fn charset(&mut self) -> Result<Option<String>> {
        Ok(self
            .response_content_type()?
            .and_then(|ct| header::param(&ct, PARAM_CHARSET).map(str::to_string)))
    }

    pub fn content_encoding(&mut self) -> Result<Option<String>> {
        self.response_header(CONTENT_ENCODING)
    }

    pub fn server(&mut self) -> Result<Option<String>> {
        self.response_header(SERVER)
    }

    pub fn date(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_header(DATE)
    }

    pub fn cache_control(&mut self) -> Result<Option<String>> {
        self.response_header(CACHE_CONTROL)
    }

    pub fn etag(&mut self) -> Result<Option<String>> {
        self.response_header(ETAG)
    }

    pub fn expires(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_header(EXPIRES)
    }

    pub fn last_modified(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.date_header(LAST_MODIFIED)
    }

    pub fn location(&mut self) -> Result<Option<String>> {
        self.response_header(LOCATION)
    }

    // ---- Response body ----

    fn check_unconsumed(&mut self) -> Result<()> {
        self.finish_request()?;
        if self.phase == Phase::Consumed {
            return Err(RequestError::config("response body was already consumed"));
        }
        Ok(())
    }

    fn consume(&mut self) -> Result<()> {
        self.check_unconsumed()?;
        self.phase = Phase::Consumed;
        Ok(())
    }

    fn response_charset(&mut self) -> Result<Charset> {
        Ok(match self.charset()? {
            Some(name) => Charset::for_name(&name).unwrap_or_else(|| {
                log::warn!("[http] unsupported response charset {}, decoding as UTF-8", name);
                Charset::Utf8
            }),
            None => Charset::Utf8,
        })
    }

    /// Response body stream: the input stream below 400, otherwise the error stream,
    /// falling back to the input stream when there is none.
    pub fn stream(&mut self) -> Result<&mut dyn Read> {
        self.consume()?;
        select_stream(self.transport.as_mut())
    }

    /// `stream()` behind a reader with the request's buffer size.
    pub fn buffered(&mut self) -> Result<BufReader<&mut dyn Read>> {
        let size = self.buffer_size;
        Ok(BufReader::with_capacity(size, self.stream()?))
    }

    /// Raw response body.
    pub fn bytes(&mut self) -> Result<Vec<u8>> {
        // Content-Length is only a hint; the server controls it
        let capacity = self
            .content_length()?
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
            .min(MAX_BODY_PREALLOC);
        let mut body = Vec::with_capacity(capacity);
        self.receive(&mut body)?;
        Ok(body)
    }

    /// Response body decoded with the response charset, or UTF-8. Only UTF-8, ISO-8859-1
    /// and US-ASCII are known; any other declared charset is decoded as UTF-8.
    pub fn body(&mut self) -> Result<String> {
        let charset = self.response_charset()?;
        Ok(charset.decode(&self.bytes()?))
    }

    /// Response body decoded with `charset`.
    pub fn body_with_charset(&mut self, charset: &str) -> Result<String> {
        let cs = Charset::for_name(charset)
            .ok_or_else(|| RequestError::config(format!("unsupported charset: {}", charset)))?;
        Ok(cs.decode(&self.bytes()?))
    }

    /// Copy the response body to `out`, then close the response input.
    pub fn receive(&mut self, out: &mut impl Write) -> Result<&mut Self> {
        self.consume()?;
        let Self {
            transport,
            progress,
            buffer_size,
            ignore_close_errors,
            ..
        } = self;
        guard::close_after(
            transport.as_mut(),
            *ignore_close_errors,
            |transport| {
                let input = select_stream(&mut **transport)?;
                guard::copy_bytes(
                    input,
                    *buffer_size,
                    |chunk| Ok(out.write_all(chunk)?),
                    progress,
                )
            },
            |transport| transport.close_input(),
        )?;
        Ok(self)
    }

    /// Decode the response body with the response charset and append it to `out`.
    /// Progress counts characters.
    pub fn receive_text(&mut self, out: &mut impl fmt::Write) -> Result<&mut Self> {
        let charset = self.response_charset()?;
        self.consume()?;
        let Self {
            transport,
            progress,
            buffer_size,
            ignore_close_errors,
            ..
        } = self;
        guard::close_after(
            transport.as_mut(),
            *ignore_close_errors,
            |transport| {
                let input = select_stream(&mut **transport)?;
                guard::copy_text(
                    input,
                    *buffer_size,
                    charset.decoder(),
                    |text| {
                        out.write_str(text)
                            .map_err(|e| io::Error::new(io::ErrorKind::Other, e).into())
                    },
                    progress,
                )
            },
            |transport| transport.close_input(),
        )?;
        Ok(self)
    }

    /// Write the response body to a file. The file is not created when the body was
    /// already consumed.
    pub fn receive_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.check_unconsumed()?;
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::with_capacity(self.buffer_size, file);
        let ignore = self.ignore_close_errors;
        guard::close_after(
            writer,
            ignore,
            |writer| {
                self.receive(writer)?;
                Ok(writer.flush()?)
            },
            |writer| writer.into_inner().map(|_| ()).map_err(|e| e.into_error()),
        )?;
        Ok(self)
    }
}

fn select_stream(transport: &mut dyn Transport) -> Result<&mut dyn Read> {
    let status = transport.status()?;
    if status >= 400 && transport.error_stream().is_some() {
        return transport.error_stream().ok_or_else(|| {
            RequestError::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "error stream is no longer available",
            ))
        });
    }
    Ok(transport.input_stream()?)
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.url())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method())
            .field("url", &self.url().to_string())
            .field("phase", &self.phase)
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}
