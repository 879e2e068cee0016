/*
 * guard.rs
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

//! Resource closing and chunked copying with progress.

use std::io::{self, Read};

use crate::error::Result;
use crate::protocol::http::charset::Decoder;

/// Progress callback: receives the cumulative count after each chunk.
pub type Progress = Box<dyn FnMut(u64)>;

/// Run `op` on `resource`, then always close it.
///
/// An error from `op` wins over any close error. Otherwise a close error is returned,
/// unless `ignore_close_errors` is set, in which case it is logged and dropped.
pub fn close_after<R, T>(
    mut resource: R,
    ignore_close_errors: bool,
    op: impl FnOnce(&mut R) -> Result<T>,
    close: impl FnOnce(R) -> io::Result<()>,
) -> Result<T> {
    let result = op(&mut resource);
    let closed = close(resource);
    match (result, closed) {
        (Err(e), Err(close_err)) => {
            log::debug!("[http] close error after failure: {}", close_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(value), Ok(())) => Ok(value),
        (Ok(value), Err(close_err)) => {
            if ignore_close_errors {
                log::debug!("[http] ignoring close error: {}", close_err);
                Ok(value)
            } else {
                Err(close_err.into())
            }
        }
    }
}

fn read_some(input: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match input.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Copy `input` to `sink` in chunks of at most `buffer_size` bytes. Returns the byte count.
pub fn copy_bytes(
    input: &mut dyn Read,
    buffer_size: usize,
    mut sink: impl FnMut(&[u8]) -> Result<()>,
    progress: &mut Option<Progress>,
) -> Result<u64> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = read_some(input, &mut buf)?;
        if n == 0 {
            return Ok(total);
        }
        sink(&buf[..n])?;
        total += n as u64;
        if let Some(callback) = progress.as_mut() {
            callback(total);
        }
    }
}

/// Decode `input` with `decoder` and copy the text to `sink`. Progress and the return value
/// count characters.
pub fn copy_text(
    input: &mut dyn Read,
    buffer_size: usize,
    mut decoder: Decoder,
    mut sink: impl FnMut(&str) -> Result<()>,
    progress: &mut Option<Progress>,
) -> Result<u64> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut text = String::with_capacity(buffer_size);
    let mut total = 0u64;
    loop {
        let n = read_some(input, &mut buf)?;
        text.clear();
        let chars = if n == 0 {
            decoder.finish(&mut text)
        } else {
            decoder.decode(&buf[..n], &mut text)
        };
        if chars > 0 {
            sink(&text)?;
            total += chars as u64;
            if let Some(callback) = progress.as_mut() {
                callback(total);
            }
        }
        if n == 0 {
            return Ok(total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;
    use crate::protocol::http::charset::Charset;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording() -> (Rc<RefCell<Vec<u64>>>, Option<Progress>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        (calls, Some(Box::new(move |n| sink.borrow_mut().push(n))))
    }

    #[test]
    fn op_error_wins_over_close_error() {
        let result: Result<()> = close_after(
            (),
            false,
            |_| Err(RequestError::config("op failed")),
            |_| Err(io::Error::new(io::ErrorKind::Other, "close failed")),
        );
        assert!(matches!(result, Err(RequestError::Config(m)) if m == "op failed"));
    }

    #[test]
    fn close_error_escalates_unless_ignored() {
        let fail = |_: ()| Err(io::Error::new(io::ErrorKind::BrokenPipe, "close failed"));
        let strict = close_after((), false, |_| Ok(7), fail);
        assert_eq!(
            strict.unwrap_err().io_cause().map(|e| e.kind()),
            Some(io::ErrorKind::BrokenPipe)
        );
        assert_eq!(close_after((), true, |_| Ok(7), fail).unwrap(), 7);
    }

    #[test]
    fn close_runs_after_failure() {
        let mut closed = false;
        let _ = close_after(
            &mut closed,
            true,
            |_| -> Result<()> { Err(RequestError::config("x")) },
            |flag| {
                *flag = true;
                Ok(())
            },
        );
        assert!(closed);
    }

    #[test]
    fn progress_per_chunk() {
        let data = vec![7u8; 10];
        let (calls, mut progress) = recording();
        let mut out = Vec::new();
        let total = copy_bytes(
            &mut data.as_slice(),
            4,
            |chunk| {
                out.extend_from_slice(chunk);
                Ok(())
            },
            &mut progress,
        )
        .unwrap();
        assert_eq!(total, 10);
        assert_eq!(out, data);
        assert_eq!(*calls.borrow(), vec![4, 8, 10]);
    }

    #[test]
    fn text_progress_counts_characters() {
        let data = "\u{e9}t\u{e9}".as_bytes();
        let (calls, mut progress) = recording();
        let mut out = String::new();
        let total = copy_text(
            &mut &data[..],
            3,
            Charset::Utf8.decoder(),
            |s| {
                out.push_str(s);
                Ok(())
            },
            &mut progress,
        )
        .unwrap();
        assert_eq!(out, "\u{e9}t\u{e9}");
        assert_eq!(total, 3);
        assert_eq!(calls.borrow().last(), Some(&3));
    }
}
