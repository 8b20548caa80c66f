//! Server candidates and the address-family selector used to query them.

use crate::util::{HostKind, classify, format_endpoint, split_host_port};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Which address records a single query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    /// A records only.
    Ipv4Only,
    /// AAAA records only.
    Ipv6Only,
    /// A and AAAA in one lookup.
    DualStack,
}

impl QueryFamily {
    /// First query issued against a server of the given kind.
    ///
    /// IPv6 servers are assumed dual-stack aware; everything else is asked
    /// for IPv4 first.
    #[must_use]
    pub const fn initial_for(kind: HostKind) -> Self {
        match kind {
            HostKind::Ipv6 => Self::DualStack,
            HostKind::Ipv4 | HostKind::Hostname => Self::Ipv4Only,
        }
    }

    /// Query to retry the same server with after this one failed or came
    /// back empty.
    #[must_use]
    pub const fn fallback(self) -> Option<Self> {
        match self {
            Self::Ipv4Only => Some(Self::Ipv6Only),
            Self::Ipv6Only | Self::DualStack => None,
        }
    }

    /// Returns `true` if `ip` belongs to this family.
    #[must_use]
    pub const fn admits(self, ip: &IpAddr) -> bool {
        match self {
            Self::Ipv4Only => ip.is_ipv4(),
            Self::Ipv6Only => ip.is_ipv6(),
            Self::DualStack => true,
        }
    }
}

impl fmt::Display for QueryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ipv4Only => "ip4",
            Self::Ipv6Only => "ip6",
            Self::DualStack => "ip",
        })
    }
}

/// One DNS server the engine may query, derived from a configured string.
///
/// # Example
///
/// ```
/// use fallback_resolver::ServerCandidate;
///
/// let c = ServerCandidate::new("2400:3200::1");
/// assert!(c.is_ipv6());
/// assert_eq!(c.endpoint(), "[2400:3200::1]:53");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCandidate {
    address: String,
    kind: HostKind,
    endpoint: String,
}

impl ServerCandidate {
    /// Derives a candidate from a configuration entry.
    #[must_use]
    pub fn new(entry: &str) -> Self {
        let host = split_host_port(entry).map_or(entry, |(host, _)| host);
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        Self {
            address: host.to_string(),
            kind: classify(host),
            endpoint: format_endpoint(entry),
        }
    }

    /// The host part of the entry, without brackets or port.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// How the host part classified.
    #[must_use]
    pub const fn kind(&self) -> HostKind {
        self.kind
    }

    /// Returns `true` for IPv6-literal servers.
    #[must_use]
    pub const fn is_ipv6(&self) -> bool {
        self.kind.is_ipv6()
    }

    /// The `host:port` string to dial.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The endpoint as a socket address, when the host is an IP literal.
    ///
    /// IPv4-mapped IPv6 literals come back as plain IPv4.
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        let addr: SocketAddr = self.endpoint.parse().ok()?;
        Some(SocketAddr::new(addr.ip().to_canonical(), addr.port()))
    }

    /// The first query to issue against this server.
    #[must_use]
    pub const fn initial_family(&self) -> QueryFamily {
        QueryFamily::initial_for(self.kind)
    }
}

impl fmt::Display for ServerCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_candidate() {
        let c = ServerCandidate::new("114.114.114.114");
        assert_eq!(c.address(), "114.114.114.114");
        assert!(!c.is_ipv6());
        assert_eq!(c.endpoint(), "114.114.114.114:53");
        assert_eq!(c.socket_addr(), Some("114.114.114.114:53".parse().unwrap()));
        assert_eq!(c.initial_family(), QueryFamily::Ipv4Only);
    }

    #[test]
    fn ipv6_candidate_with_port() {
        let c = ServerCandidate::new("[2402:4e00::]:5353");
        assert_eq!(c.address(), "2402:4e00::");
        assert!(c.is_ipv6());
        assert_eq!(c.endpoint(), "[2402:4e00::]:5353");
        assert_eq!(c.initial_family(), QueryFamily::DualStack);
    }

    #[test]
    fn bracketed_ipv6_without_port() {
        let c = ServerCandidate::new("[::1]");
        assert_eq!(c.address(), "::1");
        assert!(c.is_ipv6());
        assert_eq!(c.socket_addr(), Some("[::1]:53".parse().unwrap()));
    }

    #[test]
    fn hostname_candidate_dials_ipv4_style() {
        let c = ServerCandidate::new("dns.google");
        assert_eq!(c.kind(), HostKind::Hostname);
        assert_eq!(c.endpoint(), "dns.google:53");
        assert_eq!(c.socket_addr(), None);
        assert_eq!(c.initial_family(), QueryFamily::Ipv4Only);
    }

    #[test]
    fn mapped_literal_is_canonicalised() {
        let c = ServerCandidate::new("::ffff:8.8.8.8");
        assert!(!c.is_ipv6());
        assert_eq!(c.socket_addr(), Some("8.8.8.8:53".parse().unwrap()));
    }

    #[test]
    fn family_transitions() {
        assert_eq!(QueryFamily::Ipv4Only.fallback(), Some(QueryFamily::Ipv6Only));
        assert_eq!(QueryFamily::Ipv6Only.fallback(), None);
        assert_eq!(QueryFamily::DualStack.fallback(), None);
    }

    #[test]
    fn family_admits() {
        let v4: IpAddr = "1.2.3.4".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        assert!(QueryFamily::Ipv4Only.admits(&v4));
        assert!(!QueryFamily::Ipv4Only.admits(&v6));
        assert!(QueryFamily::Ipv6Only.admits(&v6));
        assert!(QueryFamily::DualStack.admits(&v4) && QueryFamily::DualStack.admits(&v6));
    }
}
