//! Pure helpers for classifying and formatting server and host strings.

use crate::config::{DNS_PORT, LOOPBACK_SUBSTITUTE_V4, LOOPBACK_SUBSTITUTE_V6};
use crate::error::{ResolverError, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Longest DNS name in presentation form, without the trailing dot.
const MAX_NAME_LEN: usize = 253;
/// Longest single label.
const MAX_LABEL_LEN: usize = 63;

/// What a server or host string looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Dotted-quad literal, or an IPv4-mapped IPv6 literal.
    Ipv4,
    /// IPv6 literal with no IPv4-mapped form.
    Ipv6,
    /// Anything else; dialed IPv4-style.
    Hostname,
}

impl HostKind {
    /// Returns `true` only for IPv6 literals.
    #[must_use]
    pub const fn is_ipv6(self) -> bool {
        matches!(self, Self::Ipv6)
    }
}

/// Classifies `addr` as an IPv4 literal, IPv6 literal, or hostname.
///
/// Surrounding brackets are ignored, so `"[::1]"` is IPv6.
///
/// ```
/// use fallback_resolver::util::{classify, HostKind};
///
/// assert_eq!(classify("8.8.8.8"), HostKind::Ipv4);
/// assert_eq!(classify("2400:3200::1"), HostKind::Ipv6);
/// assert_eq!(classify("::ffff:1.2.3.4"), HostKind::Ipv4);
/// assert_eq!(classify("dns.google"), HostKind::Hostname);
/// ```
#[must_use]
pub fn classify(addr: &str) -> HostKind {
    let bare = addr
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(addr);
    match bare.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => HostKind::Ipv4,
        Ok(IpAddr::V6(v6)) if v6.to_ipv4_mapped().is_some() => HostKind::Ipv4,
        Ok(IpAddr::V6(_)) => HostKind::Ipv6,
        Err(_) => HostKind::Hostname,
    }
}

/// Splits `"host:port"` or `"[host]:port"` into its parts.
///
/// Returns `None` when there is no numeric port, or when an unbracketed
/// host still contains a colon (a bare IPv6 literal).
#[must_use]
pub fn split_host_port(addr: &str) -> Option<(&str, u16)> {
    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, port) = rest.split_once("]:")?;
        (host, port)
    } else {
        let (host, port) = addr.rsplit_once(':')?;
        if host.contains(':') {
            return None;
        }
        (host, port)
    };
    if host.is_empty() {
        return None;
    }
    Some((host, port.parse().ok()?))
}

/// Formats a server string into a dial endpoint.
///
/// Strings that already carry a port are returned unchanged. Otherwise the
/// DNS port is appended, bracketing IPv6 literals first.
///
/// ```
/// use fallback_resolver::util::format_endpoint;
///
/// assert_eq!(format_endpoint("8.8.8.8"), "8.8.8.8:53");
/// assert_eq!(format_endpoint("2402:4e00::"), "[2402:4e00::]:53");
/// assert_eq!(format_endpoint("9.9.9.9:5353"), "9.9.9.9:5353");
/// ```
#[must_use]
pub fn format_endpoint(addr: &str) -> String {
    if split_host_port(addr).is_some() {
        return addr.to_string();
    }
    if addr.parse::<Ipv6Addr>().is_ok() {
        return format!("[{addr}]:{DNS_PORT}");
    }
    format!("{addr}:{DNS_PORT}")
}

/// Replaces a loopback nameserver on the DNS port with a public resolver.
///
/// Only `127.0.0.1:53` and `[::1]:53` are rewritten; other loopback
/// addresses (such as a `127.0.0.53` stub) and other ports pass through.
#[must_use]
pub fn substitute_loopback(addr: SocketAddr) -> SocketAddr {
    if addr.port() != DNS_PORT {
        return addr;
    }
    match addr.ip() {
        IpAddr::V4(ip) if ip == Ipv4Addr::LOCALHOST => LOOPBACK_SUBSTITUTE_V4,
        IpAddr::V6(ip) if ip == Ipv6Addr::LOCALHOST => LOOPBACK_SUBSTITUTE_V6,
        _ => addr,
    }
}

/// Checks a lookup target.
///
/// Returns `Some(ip)` for an IP literal (which needs no query), `None` for a
/// well-formed DNS name.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidInput`] if `host` is empty or not a
/// syntactically valid name.
pub fn parse_target(host: &str) -> Result<Option<IpAddr>> {
    let invalid = |reason| ResolverError::InvalidInput {
        host: host.to_string(),
        reason,
    };

    if host.is_empty() {
        return Err(invalid("empty host"));
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(Some(ip));
    }

    let name = host.strip_suffix('.').unwrap_or(host);
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("name too long"));
    }
    for label in name.split('.') {
        if label.is_empty() {
            return Err(invalid("empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(invalid("label too long"));
        }
        if label
            .chars()
            .any(|c| c.is_ascii() && !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(invalid("illegal character"));
        }
    }
    Ok(None)
}

/// Checks that `server` forms a dialable DNS endpoint.
///
/// Intended for configuration front-ends that want to reject a typo before
/// storing it; [`set_custom_server`](crate::DnsResolver::set_custom_server)
/// itself never validates.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidInput`] if the host part is neither an IP
/// literal nor a valid name, or if the port is zero.
pub fn validate_server(server: &str) -> Result<()> {
    let endpoint = format_endpoint(server);
    let Some((host, port)) = split_host_port(&endpoint) else {
        return Err(ResolverError::InvalidInput {
            host: server.to_string(),
            reason: "not a host:port endpoint",
        });
    };
    if port == 0 {
        return Err(ResolverError::InvalidInput {
            host: server.to_string(),
            reason: "port 0",
        });
    }
    parse_target(host).map(|_| ())
}
