/*
 * mock.rs
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

//! In-memory transport for unit tests: records what the request does and serves a
//! canned response.

use std::cell::RefCell;
use std::io::{self, Cursor, Read};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio_rustls::rustls::ClientConfig;

use crate::protocol::http::request::{HeaderList, Method};
use crate::protocol::http::transport::{Connector, StreamingMode, Transport};
use crate::url::Url;

/// Everything the request did to the transport.
#[derive(Debug, Default)]
pub struct MockLog {
    pub method: Option<Method>,
    pub headers: HeaderList,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub mode: StreamingMode,
    pub tls_configs: usize,
    pub started: usize,
    pub writes: Vec<Vec<u8>>,
    pub finished: usize,
    pub exchanged: bool,
    pub closed_input: usize,
    pub disconnected: bool,
}

impl MockLog {
    pub fn body(&self) -> Vec<u8> {
        self.writes.concat()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }
}

pub struct MockTransport {
    url: Url,
    method: Method,
    request_headers: HeaderList,
    log: Rc<RefCell<MockLog>>,
    status: u16,
    reason: Option<String>,
    headers: Vec<(String, String)>,
    body: Cursor<Vec<u8>>,
    error_body: Option<Cursor<Vec<u8>>>,
    finish_error: Option<io::ErrorKind>,
    close_error: Option<io::ErrorKind>,
}

impl MockTransport {
    /// A transport answering `200 OK` with an empty body.
    pub fn new(url: &str) -> (Self, Rc<RefCell<MockLog>>) {
        let log = Rc::new(RefCell::new(MockLog::default()));
        let transport = Self {
            url: Url::parse(url).unwrap(),
            method: Method::Get,
            request_headers: HeaderList::new(),
            log: log.clone(),
            status: 200,
            reason: Some("OK".to_string()),
            headers: Vec::new(),
            body: Cursor::new(Vec::new()),
            error_body: None,
            finish_error: None,
            close_error: None,
        };
        (transport, log)
    }

    pub fn with_status(mut self, status: u16, reason: &str) -> Self {
        self.status = status;
        self.reason = Some(reason.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Cursor::new(body.into());
        self
    }

    pub fn with_error_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.error_body = Some(Cursor::new(body.into()));
        self
    }

    /// Make `finish_output` fail.
    pub fn failing_finish(mut self, kind: io::ErrorKind) -> Self {
        self.finish_error = Some(kind);
        self
    }

    /// Make `close_input` fail.
    pub fn failing_close(mut self, kind: io::ErrorKind) -> Self {
        self.close_error = Some(kind);
        self
    }

    fn exchange(&mut self) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        if log.disconnected {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "disconnected"));
        }
        log.exchanged = true;
        Ok(())
    }

    fn check_unsent(&self) -> io::Result<()> {
        if self.log.borrow().exchanged {
            return Err(io::Error::new(io::ErrorKind::Other, "already sent"));
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn url(&self) -> &Url {
        &self.url
    }

    fn method(&self) -> Method {
        self.method
    }

    fn set_method(&mut self, method: Method) -> io::Result<()> {
        self.check_unsent()?;
        self.method = method;
        self.log.borrow_mut().method = Some(method);
        Ok(())
    }

    fn set_connect_timeout(&mut self, timeout: Option<Duration>) {
        self.log.borrow_mut().connect_timeout = timeout;
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.log.borrow_mut().read_timeout = timeout;
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.check_unsent()?;
        self.request_headers.set(name, value);
        self.log.borrow_mut().headers.set(name, value);
        Ok(())
    }

    fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers.get(name)
    }

    fn set_streaming_mode(&mut self, mode: StreamingMode) -> io::Result<()> {
        self.log.borrow_mut().mode = mode;
        Ok(())
    }

    fn set_tls_config(&mut self, _config: Arc<ClientConfig>) {
        self.log.borrow_mut().tls_configs += 1;
    }

    fn start_output(&mut self) -> io::Result<()> {
        self.log.borrow_mut().started += 1;
        Ok(())
    }

    fn write_output(&mut self, data: &[u8]) -> io::Result<()> {
        self.log.borrow_mut().writes.push(data.to_vec());
        Ok(())
    }

    fn finish_output(&mut self) -> io::Result<()> {
        self.log.borrow_mut().finished += 1;
        match self.finish_error {
            Some(kind) => Err(io::Error::new(kind, "finish failed")),
            None => Ok(()),
        }
    }

    fn status(&mut self) -> io::Result<u16> {
        self.exchange()?;
        Ok(self.status)
    }

    fn reason(&mut self) -> io::Result<Option<String>> {
        self.exchange()?;
        Ok(self.reason.clone())
    }

    fn response_header(&mut self, name: &str) -> io::Result<Option<String>> {
        self.exchange()?;
        Ok(self
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone()))
    }

    fn input_stream(&mut self) -> io::Result<&mut dyn Read> {
        self.exchange()?;
        Ok(&mut self.body)
    }

    fn error_stream(&mut self) -> Option<&mut dyn Read> {
        self.exchange().ok()?;
        if self.status < 400 {
            return None;
        }
        self.error_body.as_mut().map(|b| b as &mut dyn Read)
    }

    fn close_input(&mut self) -> io::Result<()> {
        self.log.borrow_mut().closed_input += 1;
        match self.close_error {
            Some(kind) => Err(io::Error::new(kind, "close failed")),
            None => Ok(()),
        }
    }

    fn disconnect(&mut self) {
        self.log.borrow_mut().disconnected = true;
    }
}

/// Hands out one prepared transport.
pub struct MockConnector(RefCell<Option<MockTransport>>);

impl MockConnector {
    pub fn new(transport: MockTransport) -> Self {
        Self(RefCell::new(Some(transport)))
    }
}

impl Connector for MockConnector {
    fn open(&self) -> io::Result<Box<dyn Transport>> {
        match self.0.borrow_mut().take() {
            Some(t) => Ok(Box::new(t)),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "already opened")),
        }
    }
}
