/*
 * base64.rs
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

//! Base64 (RFC 4648 standard alphabet, `=` padding). Used for Basic authorization values.

use ::base64::engine::general_purpose::STANDARD;
use ::base64::Engine;

/// Encode bytes with padding.
pub fn encode(input: &[u8]) -> String {
    STANDARD.encode(input)
}

/// Encode the UTF-8 bytes of a string.
pub fn encode_str(s: &str) -> String {
    encode(s.as_bytes())
}

/// Decode standard base64, skipping ASCII whitespace. None when the input is malformed.
pub fn decode(input: &str) -> Option<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).ok()
}
