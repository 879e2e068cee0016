/*
 * header.rs
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

//! Header names, header parameter extraction and HTTP-date handling (RFC 9110 §5.6.7).

use chrono::{DateTime, NaiveDateTime, Utc};

pub const ACCEPT: &str = "Accept";
pub const ACCEPT_CHARSET: &str = "Accept-Charset";
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const AUTHORIZATION: &str = "Authorization";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const DATE: &str = "Date";
pub const ETAG: &str = "ETag";
pub const EXPIRES: &str = "Expires";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";
pub const IF_NONE_MATCH: &str = "If-None-Match";
pub const LAST_MODIFIED: &str = "Last-Modified";
pub const LOCATION: &str = "Location";
pub const SERVER: &str = "Server";
pub const USER_AGENT: &str = "User-Agent";

/// Content-Type parameter carrying the character set.
pub const PARAM_CHARSET: &str = "charset";

pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const ENCODING_GZIP: &str = "gzip";

/// Value of parameter `name` in a `type/subtype; a=b; c="d"` header value.
///
/// Parameter names are matched exactly. Entries without exactly one `=` or with an empty
/// value are skipped. A value wrapped in double quotes has them removed.
pub fn param<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    let (_, params) = value.split_once(';')?;
    if params.is_empty() {
        return None;
    }
    for entry in params.split(';') {
        let mut kv = entry.split('=');
        let (Some(k), Some(v), None) = (kv.next(), kv.next(), kv.next()) else {
            continue;
        };
        if k.trim() != name {
            continue;
        }
        let v = v.trim();
        if v.is_empty() {
            continue;
        }
        if v.len() > 2 && v.starts_with('"') && v.ends_with('"') {
            return Some(&v[1..v.len() - 1]);
        }
        return Some(v);
    }
    None
}

/// Parse an HTTP-date. Accepts IMF-fixdate, the obsolete RFC 850 form and asctime.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    const FORMATS: &[&str] = &[
        "%a, %d %b %Y %H:%M:%S GMT",
        "%A, %d-%b-%y %H:%M:%S GMT",
        "%a %b %d %H:%M:%S %Y",
    ];
    // asctime pads single-digit days with a space
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(&collapsed, f).ok())
        .map(|naive| naive.and_utc())
}

/// Format an instant as IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(instant: DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn charset_param() {
        assert_eq!(param("text/html; charset=ISO-8859-1", PARAM_CHARSET), Some("ISO-8859-1"));
        assert_eq!(param("text/html;charset=\"utf-8\"", PARAM_CHARSET), Some("utf-8"));
        assert_eq!(param("text/html; q=1; charset=utf-8", PARAM_CHARSET), Some("utf-8"));
    }

    #[test]
    fn missing_or_malformed_param() {
        assert_eq!(param("text/html", PARAM_CHARSET), None);
        assert_eq!(param("text/html;", PARAM_CHARSET), None);
        assert_eq!(param("text/html; charset=", PARAM_CHARSET), None);
        assert_eq!(param("text/html; charset=a=b", PARAM_CHARSET), None);
        assert_eq!(param("text/html; Charset=utf-8", PARAM_CHARSET), None);
    }

    #[test]
    fn http_date_formats() {
        let expected = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(expected));
        assert_eq!(parse_http_date("not a date"), None);
        assert_eq!(format_http_date(expected), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
