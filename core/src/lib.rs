/*
 * lib.rs
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

//! Courier core: single-use, fluent HTTP/1.1 requests.
//!
//! `HttpRequest` wraps one exchange. Configure headers, timeouts and TLS trust, write a
//! body (raw, form-encoded or multipart) and read the response through typed accessors.
//! Process-wide keep-alive and proxy settings live in `config`.

pub mod codec;
pub mod config;
pub mod error;
pub mod net;
pub mod protocol;
pub mod url;

pub use error::{RequestError, Result};
pub use protocol::http::{HttpRequest, Method, Part, PartBody};
pub use url::Url;
