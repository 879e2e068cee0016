/*
 * multipart.rs
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

//! `multipart/form-data` parts and framing.

use std::fmt;
use std::io::Read;
use std::path::Path;

/// Boundary used for every multipart body.
pub const BOUNDARY: &str = "00content0boundary00";

/// Content-Type of a multipart body.
pub fn content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Opens the first part.
pub(crate) fn first_boundary() -> String {
    format!("--{}\r\n", BOUNDARY)
}

/// Separates a part from the previous one.
pub(crate) fn next_boundary() -> String {
    format!("\r\n--{}\r\n", BOUNDARY)
}

/// Ends the body.
pub(crate) fn terminator() -> String {
    format!("\r\n--{}--\r\n", BOUNDARY)
}

/// Part payload.
pub enum PartBody<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Reader(&'a mut dyn Read),
    File(&'a Path),
}

impl fmt::Debug for PartBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartBody::Text(t) => write!(f, "Text({} bytes)", t.len()),
            PartBody::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            PartBody::Reader(_) => f.write_str("Reader"),
            PartBody::File(p) => write!(f, "File({})", p.display()),
        }
    }
}

/// One form field of a multipart body.
#[derive(Debug)]
pub struct Part<'a> {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub body: PartBody<'a>,
}

impl<'a> Part<'a> {
    pub fn new(name: impl Into<String>, body: PartBody<'a>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            body,
        }
    }

    pub fn text(name: impl Into<String>, text: &'a str) -> Self {
        Self::new(name, PartBody::Text(text))
    }

    pub fn bytes(name: impl Into<String>, bytes: &'a [u8]) -> Self {
        Self::new(name, PartBody::Bytes(bytes))
    }

    pub fn reader(name: impl Into<String>, reader: &'a mut dyn Read) -> Self {
        Self::new(name, PartBody::Reader(reader))
    }

    /// File part. The filename defaults to the last component of `path`.
    pub fn file(name: impl Into<String>, path: &'a Path) -> Self {
        let mut part = Self::new(name, PartBody::File(path));
        part.filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned());
        part
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Value of the Content-Disposition part header.
    pub(crate) fn disposition(&self) -> String {
        match &self.filename {
            Some(filename) => format!("form-data; name=\"{}\"; filename=\"{}\"", self.name, filename),
            None => format!("form-data; name=\"{}\"", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_part_defaults_filename() {
        let part = Part::file("upload", Path::new("/tmp/dir/report.pdf"));
        assert_eq!(part.filename.as_deref(), Some("report.pdf"));
        assert_eq!(
            part.disposition(),
            "form-data; name=\"upload\"; filename=\"report.pdf\""
        );
        let renamed = Part::file("upload", Path::new("/tmp/x")).filename("y.txt");
        assert_eq!(renamed.filename.as_deref(), Some("y.txt"));
    }

    #[test]
    fn framing_strings() {
        assert_eq!(content_type(), "multipart/form-data; boundary=00content0boundary00");
        assert_eq!(first_boundary(), "--00content0boundary00\r\n");
        assert_eq!(next_boundary(), "\r\n--00content0boundary00\r\n");
        assert_eq!(terminator(), "\r\n--00content0boundary00--\r\n");
        assert_eq!(Part::text("a", "b").disposition(), "form-data; name=\"a\"");
    }
}
