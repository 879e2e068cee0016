/*
 * form.rs
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

//! `application/x-www-form-urlencoded` encoding.

use std::io;

use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::protocol::http::charset::Charset;

/// Everything but `A-Za-z0-9.-*_` is escaped. Space is handled separately.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_');

/// Encode one key or value: bytes in `charset`, space as `+`, others as uppercase `%XX`.
pub fn encode(s: &str, charset: Charset) -> io::Result<String> {
    let bytes = charset.encode(s)?;
    let encoded: Vec<String> = bytes
        .split(|&b| b == b' ')
        .map(|segment| percent_encode(segment, FORM).to_string())
        .collect();
    Ok(encoded.join("+"))
}

/// `key=value`, or a bare `key` when there is no value.
pub fn encode_pair(key: &str, value: Option<&str>, charset: Charset) -> io::Result<String> {
    let mut pair = encode(key, charset)?;
    if let Some(value) = value {
        pair.push('=');
        pair.push_str(&encode(value, charset)?);
    }
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_kept_space_is_plus() {
        assert_eq!(encode("a.b-c*d_e", Charset::Utf8).unwrap(), "a.b-c*d_e");
        assert_eq!(encode("hello world", Charset::Utf8).unwrap(), "hello+world");
        assert_eq!(encode("a&b=c/d~", Charset::Utf8).unwrap(), "a%26b%3Dc%2Fd%7E");
    }

    #[test]
    fn charset_controls_escapes() {
        assert_eq!(encode("\u{e9}", Charset::Utf8).unwrap(), "%C3%A9");
        assert_eq!(encode("\u{e9}", Charset::Latin1).unwrap(), "%E9");
        assert!(encode("\u{e9}", Charset::Ascii).is_err());
    }

    #[test]
    fn pairs() {
        assert_eq!(encode_pair("a", Some("b"), Charset::Utf8).unwrap(), "a=b");
        assert_eq!(encode_pair("flag", None, Charset::Utf8).unwrap(), "flag");
        assert_eq!(encode_pair("k", Some(""), Charset::Utf8).unwrap(), "k=");
    }
}
