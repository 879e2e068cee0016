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

//! HTTP/1.1 client.
//!
//! `HttpRequest` is the entry point. It drives a `Transport`, by default a
//! `SocketTransport` that speaks HTTP/1.1 over TCP or TLS with a push-parsed response.
//! Request bodies go through a buffered, charset-aware `RequestOutput`; form and multipart
//! encoders write into it.

pub mod charset;
pub mod client;
pub mod connection;
pub mod form;
pub mod guard;
pub mod h1;
pub mod header;
pub mod http_request;
pub mod multipart;
pub mod output;
pub mod request;
pub mod transport;
pub mod trust;

#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpClient;
pub use connection::{HttpStream, SocketTransport};
pub use http_request::{HttpRequest, Phase, DEFAULT_BUFFER_SIZE};
pub use multipart::{Part, PartBody, BOUNDARY};
pub use request::Method;
pub use transport::{Connector, StreamingMode, Transport};
pub use trust::{AcceptAllVerifier, AnyHostVerifier, TlsOptions, Trust};
