/*
 * charset.rs
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

//! Character sets for request and response bodies: UTF-8, ISO-8859-1 and US-ASCII.
//!
//! Encoding is strict (an unmappable character is an error, since it would corrupt the
//! body on the wire). Decoding is lenient: malformed input becomes U+FFFD.

use std::borrow::Cow;
use std::fmt;
use std::io;

const REPLACEMENT_CHAR: char = '\u{FFFD}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Charset {
    /// Look up a charset by name (case-insensitive, common aliases accepted).
    pub fn for_name(name: &str) -> Option<Charset> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" => Some(Charset::Latin1),
            "us-ascii" | "ascii" => Some(Charset::Ascii),
            _ => None,
        }
    }

    /// Canonical name, as used in a `charset=` parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
        }
    }

    fn max_char(&self) -> u32 {
        match self {
            Charset::Utf8 => char::MAX as u32,
            Charset::Latin1 => 0xFF,
            Charset::Ascii => 0x7F,
        }
    }

    /// Encode text. Fails with `InvalidData` on the first character the charset cannot represent.
    pub fn encode<'a>(&self, s: &'a str) -> io::Result<Cow<'a, [u8]>> {
        if *self == Charset::Utf8 || s.is_ascii() {
            return Ok(Cow::Borrowed(s.as_bytes()));
        }
        let max = self.max_char();
        let mut out = Vec::with_capacity(s.len());
        for c in s.chars() {
            if c as u32 > max {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unmappable character {:?} for {}", c, self.name()),
                ));
            }
            out.push(c as u8);
        }
        Ok(Cow::Owned(out))
    }

    /// Decode a complete byte sequence.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut decoder = self.decoder();
        decoder.decode(bytes, &mut out);
        decoder.finish(&mut out);
        out
    }

    /// Incremental decoder for bodies that arrive in chunks.
    pub fn decoder(&self) -> Decoder {
        Decoder {
            charset: *self,
            pending: Vec::new(),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decodes a byte stream chunk by chunk. A UTF-8 sequence split across chunks is held back
/// until the next chunk (or `finish`) completes it.
#[derive(Debug)]
pub struct Decoder {
    charset: Charset,
    pending: Vec<u8>,
}

impl Decoder {
    /// Decode `input` and append to `out`. Returns the number of characters appended.
    pub fn decode(&mut self, input: &[u8], out: &mut String) -> usize {
        match self.charset {
            Charset::Latin1 => {
                out.extend(input.iter().map(|&b| b as char));
                input.len()
            }
            Charset::Ascii => {
                out.extend(input.iter().map(|&b| {
                    if b.is_ascii() {
                        b as char
                    } else {
                        REPLACEMENT_CHAR
                    }
                }));
                input.len()
            }
            Charset::Utf8 => {
                let mut buf = std::mem::take(&mut self.pending);
                buf.extend_from_slice(input);
                self.decode_utf8(&buf, out, false)
            }
        }
    }

    /// Flush any incomplete trailing sequence as U+FFFD.
    pub fn finish(&mut self, out: &mut String) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let buf = std::mem::take(&mut self.pending);
        self.decode_utf8(&buf, out, true)
    }

    fn decode_utf8(&mut self, mut bytes: &[u8], out: &mut String, last: bool) -> usize {
        let mut count = 0;
        loop {
            match std::str::from_utf8(bytes) {
                Ok(s) => {
                    out.push_str(s);
                    return count + s.chars().count();
                }
                Err(e) => {
                    let (valid, rest) = bytes.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8
                    let s = std::str::from_utf8(valid).unwrap_or_default();
                    out.push_str(s);
                    count += s.chars().count();
                    match e.error_len() {
                        Some(n) => {
                            out.push(REPLACEMENT_CHAR);
                            count += 1;
                            bytes = &rest[n..];
                        }
                        None if last => {
                            out.push(REPLACEMENT_CHAR);
                            return count + 1;
                        }
                        None => {
                            self.pending.extend_from_slice(rest);
                            return count;
                        }
                    }
                }
            }
        }
    }
}
