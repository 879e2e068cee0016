/*
 * client.rs
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

//! Opening the socket for one exchange: TCP connect (directly or to a proxy), an optional
//! CONNECT tunnel, then the TLS handshake for https.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;

use crate::config::ProxySettings;
use crate::protocol::http::connection::HttpStream;
use crate::protocol::http::h1::{H1ResponseHandler, ParseState, ResponseParser};
use crate::url::Url;

/// Run `fut`, failing with `TimedOut` if `limit` elapses first. No limit waits forever.
pub(crate) async fn timed<T, F>(limit: Option<Duration>, what: &str, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match limit {
        Some(limit) => timeout(limit, fut).await.map_err(|_| {
            io::Error::new(io::ErrorKind::TimedOut, format!("{} timed out", what))
        })?,
        None => fut.await,
    }
}

/// Connects sockets for the socket transport.
pub struct HttpClient;

impl HttpClient {
    /// Connect to the URL's origin, or to a proxy when one applies. Secure URLs get a
    /// CONNECT tunnel through the proxy and a TLS handshake using `tls`. The whole
    /// sequence is bounded by `connect_timeout`.
    ///
    /// Returns the stream and whether it goes through a plain (non-tunnelled) proxy, in
    /// which case requests must use the absolute-form target.
    pub async fn connect(
        url: &Url,
        proxy: &ProxySettings,
        tls: Option<Arc<ClientConfig>>,
        connect_timeout: Option<Duration>,
    ) -> io::Result<(HttpStream, bool)> {
        timed(connect_timeout, "connect", Self::open(url, proxy, tls)).await
    }

    async fn open(
        url: &Url,
        proxy: &ProxySettings,
        tls: Option<Arc<ClientConfig>>,
    ) -> io::Result<(HttpStream, bool)> {
        let via = proxy.proxy_for(url.host(), url.is_secure());
        let addr = match &via {
            Some((host, port)) => {
                log::debug!("[http] using proxy {}:{} for {}", host, port, url.authority());
                (host.as_str(), *port)
            }
            None => (url.host(), url.port()),
        };
        log::debug!("[http] connecting to {}:{}", addr.0, addr.1);
        let mut tcp = TcpStream::connect(addr).await?;
        let _ = tcp.set_nodelay(true);

        if !url.is_secure() {
            return Ok((HttpStream::Plain(tcp), via.is_some()));
        }
        if via.is_some() {
            tunnel(&mut tcp, url).await?;
        }
        let config = match tls {
            Some(config) => config,
            None => crate::net::default_client_config()?,
        };
        let server_name = ServerName::try_from(url.host())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))?
            .to_owned();
        let tls = TlsConnector::from(config)
            .connect(server_name, tcp)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
        Ok((HttpStream::Tls(Box::new(tls)), false))
    }
}

#[derive(Default)]
struct TunnelStatus {
    code: u16,
    reason: Option<String>,
}

impl H1ResponseHandler for TunnelStatus {
    fn status(&mut self, code: u16, reason: Option<&str>) {
        self.code = code;
        self.reason = reason.map(str::to_string);
    }
    fn header(&mut self, _name: &str, _value: &str) {}
    fn body_chunk(&mut self, _data: &[u8]) {}
    fn trailer(&mut self, _name: &str, _value: &str) {}
    fn complete(&mut self) {}
}

/// Ask the proxy for a tunnel to the URL's authority and wait for a 2xx.
async fn tunnel(tcp: &mut TcpStream, url: &Url) -> io::Result<()> {
    let authority = url.authority();
    let request = format!(
        "CONNECT {0} HTTP/1.1\r\nHost: {0}\r\nProxy-Connection: keep-alive\r\n\r\n",
        authority
    );
    tcp.write_all(request.as_bytes()).await?;
    tcp.flush().await?;

    let mut parser = ResponseParser::new();
    let mut status = TunnelStatus::default();
    let mut buf = BytesMut::with_capacity(1024);
    while parser.state() != ParseState::HeadersComplete {
        let mut tmp = [0u8; 1024];
        let n = tcp.read(&mut tmp).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "proxy closed connection during CONNECT",
            ));
        }
        buf.extend_from_slice(&tmp[..n]);
        parser.receive(&mut buf, &mut status)?;
    }
    if !(200..300).contains(&status.code) {
        return Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            format!(
                "proxy refused tunnel to {}: {} {}",
                authority,
                status.code,
                status.reason.unwrap_or_default()
            ),
        ));
    }
    log::debug!("[http] tunnel established to {}", authority);
    Ok(())
}
