/*
 * config.rs
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

//! Process-wide transport settings: keep-alive and proxy. Changes apply to every request
//! whose transport is created afterwards; each transport takes a `snapshot()` when it is
//! opened, so requests already in flight are unaffected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// When false, requests ask the server to close the connection after the response.
static KEEP_ALIVE: AtomicBool = AtomicBool::new(true);

static PROXY: RwLock<ProxySettings> = RwLock::new(ProxySettings::empty());

/// Proxy settings. Host and port are kept separately for plain and secure requests,
/// although the setters below always set both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProxySettings {
    pub http_host: Option<String>,
    pub http_port: Option<u16>,
    pub https_host: Option<String>,
    pub https_port: Option<u16>,
    /// `|`-separated host patterns that bypass the proxy; a pattern may start or end with `*`.
    pub non_proxy_hosts: Option<String>,
}

impl ProxySettings {
    const fn empty() -> Self {
        Self {
            http_host: None,
            http_port: None,
            https_host: None,
            https_port: None,
            non_proxy_hosts: None,
        }
    }

    /// Proxy `(host, port)` to use for a request to `host`, or None to connect directly.
    /// The port defaults to 80 for plain and 443 for secure requests, matching the
    /// scheme of the proxied URL.
    pub fn proxy_for(&self, host: &str, secure: bool) -> Option<(String, u16)> {
        let (proxy_host, proxy_port, default_port) = if secure {
            (self.https_host.as_ref(), self.https_port, 443)
        } else {
            (self.http_host.as_ref(), self.http_port, 80)
        };
        let proxy_host = proxy_host.filter(|h| !h.is_empty())?;
        if self.bypasses(host) {
            return None;
        }
        Some((proxy_host.clone(), proxy_port.unwrap_or(default_port)))
    }

    fn bypasses(&self, host: &str) -> bool {
        let Some(list) = &self.non_proxy_hosts else {
            return false;
        };
        list.split('|')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .any(|pattern| host_matches(pattern, host))
    }
}

/// Match a non-proxy pattern: exact, `*suffix`, or `prefix*` (case-insensitive).
fn host_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    if pattern == "*" {
        true
    } else if let Some(suffix) = pattern.strip_prefix('*') {
        host.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix('*') {
        host.starts_with(prefix)
    } else {
        host == pattern
    }
}

/// Settings captured by a transport when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub keep_alive: bool,
    pub proxy: ProxySettings,
}

/// Enable or disable keep-alive for subsequently created requests.
pub fn set_keep_alive(keep_alive: bool) {
    KEEP_ALIVE.store(keep_alive, Ordering::SeqCst);
}

pub fn keep_alive() -> bool {
    KEEP_ALIVE.load(Ordering::SeqCst)
}

/// Set (or clear, with None) the proxy host for both plain and secure requests.
pub fn set_proxy_host(host: Option<&str>) {
    let mut proxy = PROXY.write().unwrap_or_else(PoisonError::into_inner);
    proxy.http_host = host.map(str::to_string);
    proxy.https_host = host.map(str::to_string);
}

/// Set the proxy port for both plain and secure requests.
pub fn set_proxy_port(port: u16) {
    let mut proxy = PROXY.write().unwrap_or_else(PoisonError::into_inner);
    proxy.http_port = Some(port);
    proxy.https_port = Some(port);
}

/// Set the hosts that bypass the proxy, joined with `|`. An empty list clears the setting.
pub fn set_non_proxy_hosts(hosts: &[&str]) {
    let mut proxy = PROXY.write().unwrap_or_else(PoisonError::into_inner);
    proxy.non_proxy_hosts = if hosts.is_empty() {
        None
    } else {
        Some(hosts.join("|"))
    };
}

/// Current `|`-joined non-proxy host list.
pub fn non_proxy_hosts() -> Option<String> {
    PROXY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .non_proxy_hosts
        .clone()
}

/// Copy of the current process-wide settings.
pub fn snapshot() -> TransportConfig {
    TransportConfig {
        keep_alive: keep_alive(),
        proxy: PROXY.read().unwrap_or_else(PoisonError::into_inner).clone(),
    }
}
