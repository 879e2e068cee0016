/*
 * url.rs
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

//! Absolute http/https URLs: scheme, authority (optional userinfo, host, port) and
//! request target (path + query). Fragments are dropped; they never go on the wire.

use std::fmt;
use std::io;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters that cannot appear raw in a request target. Everything else (including
/// `%`, so already-encoded targets pass through) is left alone.
const TARGET: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`').add(b'{').add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    secure: bool,
    userinfo: Option<String>,
    host: String,
    port: u16,
    explicit_port: bool,
    target: String,
}

impl Url {
    /// Parse an absolute `http://` or `https://` URL.
    pub fn parse(s: &str) -> io::Result<Url> {
        let s = s.trim();
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| invalid(format!("no protocol: {}", s)))?;
        let secure = if scheme.eq_ignore_ascii_case("https") {
            true
        } else if scheme.eq_ignore_ascii_case("http") {
            false
        } else {
            return Err(invalid(format!("unknown protocol: {}", scheme)));
        };
        let rest = rest.split('#').next().unwrap_or("");
        let authority_end = rest.find(&['/', '?'][..]).unwrap_or(rest.len());
        let (authority, target) = rest.split_at(authority_end);
        let (userinfo, host_port) = match authority.rfind('@') {
            Some(i) => (Some(authority[..i].to_string()), &authority[i + 1..]),
            None => (None, authority),
        };
        let (host, port) = split_host_port(host_port)?;
        if host.is_empty() {
            return Err(invalid(format!("missing host: {}", s)));
        }
        let default_port = if secure { 443 } else { 80 };
        let target = if target.is_empty() {
            "/".to_string()
        } else if target.starts_with('?') {
            format!("/{}", target)
        } else {
            target.to_string()
        };
        Ok(Url {
            secure,
            userinfo,
            host: host.to_string(),
            port: port.unwrap_or(default_port),
            explicit_port: port.is_some(),
            target: utf8_percent_encode(&target, TARGET).to_string(),
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// True for https.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn userinfo(&self) -> Option<&str> {
        self.userinfo.as_deref()
    }

    /// Host without brackets (IPv6 literals are stored bare).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Effective port (explicit or scheme default).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path and query, always starting with `/`.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Value for the Host header: port only when it is not the scheme default.
    pub fn host_header(&self) -> String {
        let default_port = if self.secure { 443 } else { 80 };
        let host = self.bracketed_host();
        if self.port != default_port {
            format!("{}:{}", host, self.port)
        } else {
            host
        }
    }

    /// `host:port` as used for socket addresses and CONNECT tunnels.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.bracketed_host(), self.port)
    }

    fn bracketed_host(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme())?;
        if let Some(u) = &self.userinfo {
            write!(f, "{}@", u)?;
        }
        f.write_str(&self.bracketed_host())?;
        if self.explicit_port {
            write!(f, ":{}", self.port)?;
        }
        f.write_str(&self.target)
    }
}

impl FromStr for Url {
    type Err = io::Error;

    fn from_str(s: &str) -> io::Result<Url> {
        Url::parse(s)
    }
}

fn split_host_port(host_port: &str) -> io::Result<(&str, Option<u16>)> {
    let (host, port) = if let Some(rest) = host_port.strip_prefix('[') {
        let close = rest
            .find(']')
            .ok_or_else(|| invalid(format!("unterminated IPv6 literal: {}", host_port)))?;
        let after = &rest[close + 1..];
        (&rest[..close], after.strip_prefix(':'))
    } else {
        match host_port.rsplit_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (host_port, None),
        }
    };
    let port = match port {
        Some("") | None => None,
        Some(p) => Some(
            p.parse::<u16>()
                .map_err(|_| invalid(format!("invalid port: {}", p)))?,
        ),
    };
    Ok((host, port))
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_and_target() {
        let u = Url::parse("http://example.com").unwrap();
        assert_eq!(u.port(), 80);
        assert_eq!(u.target(), "/");
        assert_eq!(u.host_header(), "example.com");
        assert!(!u.is_secure());

        let s = Url::parse("https://example.com/a/b?x=1#frag").unwrap();
        assert_eq!(s.port(), 443);
        assert_eq!(s.target(), "/a/b?x=1");
        assert!(s.is_secure());
    }

    #[test]
    fn explicit_port_in_host_header() {
        let u = Url::parse("http://localhost:8080/upload").unwrap();
        assert_eq!(u.port(), 8080);
        assert_eq!(u.host_header(), "localhost:8080");
        assert_eq!(u.authority(), "localhost:8080");
        assert_eq!(u.to_string(), "http://localhost:8080/upload");
    }

    #[test]
    fn ipv6_literal() {
        let u = Url::parse("http://[::1]:9000/").unwrap();
        assert_eq!(u.host(), "::1");
        assert_eq!(u.authority(), "[::1]:9000");
    }

    #[test]
    fn query_only_and_spaces() {
        let u = Url::parse("http://h?q=a b").unwrap();
        assert_eq!(u.target(), "/?q=a%20b");
    }

    #[test]
    fn rejects_other_schemes_and_bad_ports() {
        assert_eq!(Url::parse("ftp://h/").unwrap_err().kind(), io::ErrorKind::InvalidInput);
        assert!(Url::parse("example.com").is_err());
        assert!(Url::parse("http://h:99999/").is_err());
        assert!(Url::parse("http:///path").is_err());
    }
}
