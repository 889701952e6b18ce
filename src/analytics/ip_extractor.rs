//! Client address extraction and normalization
//!
//! The address handed to the geo resolver is picked in this order:
//! - first entry of `X-Forwarded-For`, trimmed
//! - the socket remote address
//! - the `X-Real-IP` header
//!
//! IPv6-mapped IPv4 addresses are reduced to their IPv4 part and the IPv6
//! loopback becomes `127.0.0.1`, since geo services answer those forms
//! inconsistently.

use axum::http::HeaderMap;
use std::net::IpAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const MAPPED_V4_MARKER: &str = "::ffff:";
const V6_LOOPBACK: &str = "::1";

/// Raw address sources for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientAddress {
    pub forwarded_for: Option<String>,
    pub remote_addr: Option<IpAddr>,
    pub real_ip: Option<String>,
}

impl ClientAddress {
    pub fn from_request(headers: &HeaderMap, remote_addr: Option<IpAddr>) -> Self {
        Self {
            forwarded_for: header_str(headers, FORWARDED_FOR),
            remote_addr,
            real_ip: header_str(headers, REAL_IP),
        }
    }

    /// The best available address, before normalization
    pub fn raw_ip(&self) -> Option<String> {
        let forwarded = self
            .forwarded_for
            .as_deref()
            .and_then(|xff| xff.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }

        if let Some(addr) = self.remote_addr {
            return Some(addr.to_string());
        }

        self.real_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
    }

    /// The address to send to the geo resolver
    pub fn normalized_ip(&self) -> Option<String> {
        self.raw_ip().map(|ip| normalize_ip(&ip))
    }
}

/// Map `::ffff:a.b.c.d` to `a.b.c.d` and `::1` to `127.0.0.1`; anything else
/// passes through untouched.
pub fn normalize_ip(ip: &str) -> String {
    if ip.contains(MAPPED_V4_MARKER) {
        return ip.rsplit(':').next().unwrap_or(ip).to_string();
    }
    if ip == V6_LOOPBACK {
        return "127.0.0.1".to_string();
    }
    ip.to_string()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}
