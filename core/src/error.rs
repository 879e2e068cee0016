/*
 * error.rs
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

//! Request errors.
//!
//! Every network or stream failure surfaces as `Transport`, whichever side of the
//! exchange it happened on (send, receive or close). Caller mistakes are `Config` and
//! are raised before any I/O is attempted. `Security` is reserved for the TLS provider
//! refusing the requested trust setup.

use std::io;

/// Errors from `HttpRequest` and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Connect, read, write or close failed.
    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),

    /// Invalid argument or an operation not allowed in the current request phase.
    #[error("invalid request configuration: {0}")]
    Config(String),

    /// The TLS provider rejected the requested protocol versions or trust material.
    #[error("security configuration error: {0}")]
    Security(String),
}

impl RequestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    /// The wrapped I/O failure, if this is a transport error.
    pub fn io_cause(&self) -> Option<&io::Error> {
        match self {
            RequestError::Transport(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RequestError::Transport(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, RequestError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, RequestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_to_transport() {
        let err: RequestError = io::Error::new(io::ErrorKind::TimedOut, "read timed out").into();
        assert!(err.is_transport());
        assert_eq!(err.io_cause().map(|e| e.kind()), Some(io::ErrorKind::TimedOut));
        assert_eq!(err.to_string(), "transport failure: read timed out");
    }

    #[test]
    fn config_error_has_no_io_cause() {
        let err = RequestError::config("Size must be greater than zero");
        assert!(err.is_config());
        assert!(err.io_cause().is_none());
    }
}
