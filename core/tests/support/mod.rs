/*
 * mod.rs
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

//! One-shot HTTP/1.1 server on a thread: accepts a single connection, records the request
//! and answers with canned bytes.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What the server received.
#[derive(Debug)]
pub struct Captured {
    pub head: String,
    /// Body with any chunked framing removed.
    pub body: Vec<u8>,
    /// Body bytes exactly as sent.
    pub raw_body: Vec<u8>,
}

impl Captured {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case(name)
                .then(|| v.trim().to_string())
        })
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn read_more(stream: &mut TcpStream, buf: &mut Vec<u8>) -> bool {
    let mut tmp = [0u8; 4096];
    match stream.read(&mut tmp) {
        Ok(0) | Err(_) => false,
        Ok(n) => {
            buf.extend_from_slice(&tmp[..n]);
            true
        }
    }
}

fn dechunk(mut raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(end) = find(raw, b"\r\n") {
        let size_line = std::str::from_utf8(&raw[..end]).unwrap();
        let size = usize::from_str_radix(size_line.trim(), 16).unwrap();
        raw = &raw[end + 2..];
        if size == 0 {
            break;
        }
        out.extend_from_slice(&raw[..size]);
        raw = &raw[size + 2..];
    }
    out
}

pub fn read_request(stream: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let head_end = loop {
        if let Some(i) = find(&buf, b"\r\n\r\n") {
            break i + 4;
        }
        assert!(read_more(stream, &mut buf), "client closed before request head");
    };
    let head = String::from_utf8(buf[..head_end].to_vec()).unwrap();
    let mut captured = Captured {
        head,
        body: Vec::new(),
        raw_body: buf[head_end..].to_vec(),
    };
    if let Some(len) = captured.header("Content-Length") {
        let len: usize = len.parse().unwrap();
        while captured.raw_body.len() < len && read_more(stream, &mut captured.raw_body) {}
        captured.body = captured.raw_body.clone();
    } else if captured
        .header("Transfer-Encoding")
        .is_some_and(|v| v.contains("chunked"))
    {
        while !captured.raw_body.ends_with(b"0\r\n\r\n")
            && read_more(stream, &mut captured.raw_body)
        {}
        captured.body = dechunk(&captured.raw_body);
    }
    captured
}

/// Serve `response` to the first request. Returns the base URL and the captured request.
pub fn serve(response: impl Into<Vec<u8>>) -> (String, JoinHandle<Captured>) {
    serve_with(response, Duration::ZERO)
}

/// Like `serve`, but waits `delay` before answering.
pub fn serve_with(response: impl Into<Vec<u8>>, delay: Duration) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let response = response.into();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let captured = read_request(&mut stream);
        thread::sleep(delay);
        let _ = stream.write_all(&response);
        let _ = stream.flush();
        captured
    });
    (format!("http://127.0.0.1:{}", port), handle)
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
