/*
 * proxy.rs
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

//! Process-wide keep-alive and proxy settings. These mutate global state, so they run as
//! one test in their own binary.

mod support;

use courier_core::config;
use courier_core::HttpRequest;

use support::serve;

#[test]
fn process_wide_settings() {
    // keep-alive off asks the server to close
    config::set_keep_alive(false);
    let (base, server) = serve("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
    assert!(HttpRequest::get(&base).unwrap().ok().unwrap());
    assert_eq!(server.join().unwrap().header("Connection").as_deref(), Some("close"));
    config::set_keep_alive(true);

    // plain requests through a proxy use the absolute-form target
    let (proxy, server) = serve("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nvp");
    let port: u16 = proxy.rsplit(':').next().unwrap().parse().unwrap();
    config::set_proxy_host(Some("127.0.0.1"));
    config::set_proxy_port(port);
    let mut req = HttpRequest::get("http://origin.invalid/path?q=1").unwrap();
    assert_eq!(req.body().unwrap(), "vp");
    let captured = server.join().unwrap();
    assert_eq!(captured.request_line(), "GET http://origin.invalid/path?q=1 HTTP/1.1");
    assert_eq!(captured.header("Connection").as_deref(), Some("keep-alive"));

    // secure requests ask for a tunnel; a refusal is a transport error
    let (proxy, server) = serve("HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n");
    let port: u16 = proxy.rsplit(':').next().unwrap().parse().unwrap();
    config::set_proxy_port(port);
    let err = HttpRequest::get("https://origin.invalid/").unwrap().code().unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("403"));
    assert_eq!(server.join().unwrap().request_line(), "CONNECT origin.invalid:443 HTTP/1.1");

    // non-proxy hosts connect directly
    let (base, server) = serve("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
    config::set_proxy_port(1);
    config::set_non_proxy_hosts(&["localhost", "127.*"]);
    assert_eq!(config::non_proxy_hosts().as_deref(), Some("localhost|127.*"));
    assert!(HttpRequest::get(&format!("{}/direct", base)).unwrap().ok().unwrap());
    assert_eq!(server.join().unwrap().request_line(), "GET /direct HTTP/1.1");

    config::set_non_proxy_hosts(&[]);
    config::set_proxy_host(None);
}
