/*
 * request.rs
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

//! HTTP/1.1 request head: method, request target and header list, serialized onto the wire
//! by the socket transport.

use std::fmt;
use std::io;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = io::Error;

    fn from_str(s: &str) -> io::Result<Method> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid HTTP method: {}", s),
            )),
        }
    }
}

/// Ordered request header list. Setting a name that is already present (compared
/// case-insensitively) replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything written before the body: request line and headers.
pub struct RequestHead<'a> {
    pub method: Method,
    /// Origin-form (`/path?q`) or, through a plain proxy, absolute-form.
    pub target: &'a str,
    pub host: &'a str,
    pub headers: &'a HeaderList,
    pub keep_alive: bool,
    pub body: BodyFraming,
}

/// How the body length is communicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    None,
    Length(u64),
    Chunked,
}

impl RequestHead<'_> {
    /// Serialize the head including the terminating blank line. Framing headers set by the
    /// caller are replaced by the ones implied by `body`.
    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_slice(self.method.as_str().as_bytes());
        out.put_u8(b' ');
        out.put_slice(self.target.as_bytes());
        out.put_slice(b" HTTP/1.1\r\nHost: ");
        out.put_slice(self.host.as_bytes());
        out.put_slice(b"\r\n");
        for (k, v) in self.headers.iter() {
            if k.eq_ignore_ascii_case("Host")
                || k.eq_ignore_ascii_case("Content-Length")
                || k.eq_ignore_ascii_case("Transfer-Encoding")
                || k.eq_ignore_ascii_case("Connection")
            {
                continue;
            }
            out.put_slice(k.as_bytes());
            out.put_slice(b": ");
            out.put_slice(v.as_bytes());
            out.put_slice(b"\r\n");
        }
        match self.body {
            BodyFraming::None => {}
            BodyFraming::Length(n) => {
                out.put_slice(format!("Content-Length: {}\r\n", n).as_bytes());
            }
            BodyFraming::Chunked => out.put_slice(b"Transfer-Encoding: chunked\r\n"),
        }
        if self.keep_alive {
            out.put_slice(b"Connection: keep-alive\r\n");
        } else {
            out.put_slice(b"Connection: close\r\n");
        }
        out.put_slice(b"\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trip() {
        for m in [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Head,
            Method::Options,
            Method::Trace,
        ] {
            assert_eq!(m.as_str().parse::<Method>().unwrap(), m);
        }
        assert!("PATCH".parse::<Method>().is_err());
        assert!("get".parse::<Method>().is_err());
    }

    #[test]
    fn header_list_last_write_wins() {
        let mut h = HeaderList::new();
        h.set("Accept", "text/plain");
        h.set("X-A", "1");
        h.set("accept", "application/json");
        assert_eq!(h.len(), 2);
        assert_eq!(h.get("ACCEPT"), Some("application/json"));
        let names: Vec<&str> = h.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["Accept", "X-A"]);
    }

    #[test]
    fn head_with_length() {
        let mut h = HeaderList::new();
        h.set("Content-Type", "text/plain");
        h.set("Content-Length", "999");
        let head = RequestHead {
            method: Method::Post,
            target: "/submit",
            host: "example.com",
            headers: &h,
            keep_alive: false,
            body: BodyFraming::Length(5),
        };
        let mut out = BytesMut::new();
        head.write_to(&mut out);
        assert_eq!(
            &out[..],
            &b"POST /submit HTTP/1.1\r\nHost: example.com\r\nContent-Type: text/plain\r\n\
Content-Length: 5\r\nConnection: close\r\n\r\n"[..]
        );
    }

    #[test]
    fn head_chunked_keep_alive() {
        let h = HeaderList::new();
        let head = RequestHead {
            method: Method::Put,
            target: "/x",
            host: "h:8080",
            headers: &h,
            keep_alive: true,
            body: BodyFraming::Chunked,
        };
        let mut out = BytesMut::new();
        head.write_to(&mut out);
        let text = std::str::from_utf8(&out).unwrap();
        assert!(text.starts_with("PUT /x HTTP/1.1\r\nHost: h:8080\r\n"));
        assert!(text.contains("Transfer-Encoding: chunked\r\n"));
        assert!(text.ends_with("Connection: keep-alive\r\n\r\n"));
    }
}
