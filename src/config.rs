//! Resolution configuration: the override and the built-in server tiers.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::time::Duration;

/// Standard DNS port.
pub const DNS_PORT: u16 = 53;

/// Per-candidate attempt window, covering both dial and answer.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Public IPv4 resolvers tried, in order, when no override is set.
pub const DEFAULT_SERVERS: &[&str] = &["114.114.114.114", "8.8.8.8"];

/// Public IPv6-capable resolvers, tried after [`DEFAULT_SERVERS`].
pub const IPV6_SERVERS: &[&str] = &[
    "2402:4e00::",
    "2402:4e00:1::",
    "2400:3200::1",
    "2400:3200:baba::1",
];

/// Last-resort resolvers, consulted once the primary tier is exhausted.
pub const FALLBACK_SERVERS: &[&str] = &["8.8.8.8", "1.1.1.1", "114.114.114.114"];

/// Resolvers used by [`DnsResolver::lookup_ipv4_only`](crate::DnsResolver::lookup_ipv4_only).
pub const IPV4_ONLY_SERVERS: &[&str] = &["8.8.8.8", "114.114.114.114", "1.1.1.1"];

/// Dialed in place of `127.0.0.1:53`.
pub const LOOPBACK_SUBSTITUTE_V4: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), DNS_PORT));

/// Dialed in place of `[::1]:53`.
pub const LOOPBACK_SUBSTITUTE_V6: SocketAddr = SocketAddr::V6(SocketAddrV6::new(
    Ipv6Addr::new(0x2402, 0x4e00, 0, 0, 0, 0, 0, 0),
    DNS_PORT,
    0,
    0,
));

/// What [`ResolverConfig::current_server`] reports when no override is set.
pub const SYSTEM_DEFAULT: &str = "system default";

/// Server tiers and timing for a [`DnsResolver`](crate::DnsResolver).
///
/// # Example
///
/// ```
/// use fallback_resolver::ResolverConfig;
///
/// let config = ResolverConfig::new().with_custom_server("9.9.9.9");
/// assert_eq!(config.custom_server(), Some("9.9.9.9"));
/// assert_eq!(config.current_server(), "9.9.9.9");
///
/// let config = config.with_custom_server("");
/// assert_eq!(config.custom_server(), None);
/// assert_eq!(config.current_server(), "system default");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    custom_server: Option<String>,
    default_servers: Vec<String>,
    ipv6_servers: Vec<String>,
    fallback_servers: Vec<String>,
    ignore_system_dns: bool,
    attempt_timeout: Duration,
    overall_timeout: Option<Duration>,
}

impl ResolverConfig {
    /// Creates a config with the built-in tiers and no override.
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom_server: None,
            default_servers: to_owned(DEFAULT_SERVERS),
            ipv6_servers: to_owned(IPV6_SERVERS),
            fallback_servers: to_owned(FALLBACK_SERVERS),
            ignore_system_dns: true,
            attempt_timeout: ATTEMPT_TIMEOUT,
            overall_timeout: None,
        }
    }

    /// Records `server` as the override. An empty string clears it.
    ///
    /// No reachability check happens here.
    pub fn set_custom_server(&mut self, server: impl Into<String>) {
        let server = server.into();
        self.custom_server = (!server.is_empty()).then_some(server);
    }

    /// Builder form of [`set_custom_server`](Self::set_custom_server).
    #[must_use]
    pub fn with_custom_server(mut self, server: impl Into<String>) -> Self {
        self.set_custom_server(server);
        self
    }

    /// Replaces the default tier.
    #[must_use]
    pub fn with_default_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_servers = servers.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the IPv6 servers appended to the default tier.
    #[must_use]
    pub fn with_ipv6_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ipv6_servers = servers.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the last-resort tier.
    #[must_use]
    pub fn with_fallback_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_servers = servers.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the per-candidate attempt window.
    #[must_use]
    pub const fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Bounds the whole lookup, across every candidate of every tier.
    #[must_use]
    pub const fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = Some(timeout);
        self
    }

    /// Uses the host's configured nameservers as the primary tier instead
    /// of the built-in default list. Loopback nameservers are still
    /// substituted.
    #[must_use]
    pub const fn use_system_config(mut self, enabled: bool) -> Self {
        self.ignore_system_dns = !enabled;
        self
    }

    /// Returns the override, if one is set.
    #[must_use]
    pub fn custom_server(&self) -> Option<&str> {
        self.custom_server.as_deref()
    }

    /// Returns the override, or [`SYSTEM_DEFAULT`] when none is set.
    #[must_use]
    pub fn current_server(&self) -> &str {
        self.custom_server().unwrap_or(SYSTEM_DEFAULT)
    }

    /// Returns the server that follows `current` in the default tier,
    /// wrapping around at the end. The override wins when set.
    ///
    /// An unknown or empty `current` yields the first default server.
    #[must_use]
    pub fn next_default_server(&self, current: &str) -> Option<&str> {
        if let Some(custom) = self.custom_server() {
            return Some(custom);
        }
        let position = self.default_servers.iter().position(|s| s == current);
        let next = match position {
            Some(i) => (i + 1) % self.default_servers.len(),
            None => 0,
        };
        self.default_servers.get(next).map(String::as_str)
    }

    /// The default tier.
    #[must_use]
    pub fn default_servers(&self) -> &[String] {
        &self.default_servers
    }

    /// The IPv6 servers appended to the default tier.
    #[must_use]
    pub fn ipv6_servers(&self) -> &[String] {
        &self.ipv6_servers
    }

    /// The last-resort tier.
    #[must_use]
    pub fn fallback_servers(&self) -> &[String] {
        &self.fallback_servers
    }

    /// Whether the host's resolver configuration is bypassed.
    #[must_use]
    pub const fn ignores_system_dns(&self) -> bool {
        self.ignore_system_dns
    }

    /// The per-candidate attempt window.
    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// The overall deadline, if any.
    #[must_use]
    pub const fn overall_timeout(&self) -> Option<Duration> {
        self.overall_timeout
    }

    /// The default tier followed by the IPv6 servers.
    pub(crate) fn builtin_primary(&self) -> Vec<String> {
        self.default_servers
            .iter()
            .chain(&self.ipv6_servers)
            .cloned()
            .collect()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn to_owned(servers: &[&str]) -> Vec<String> {
    servers.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_builtin_tiers() {
        let c = ResolverConfig::new();
        assert_eq!(c.custom_server(), None);
        assert_eq!(c.default_servers(), DEFAULT_SERVERS);
        assert_eq!(c.ipv6_servers(), IPV6_SERVERS);
        assert_eq!(c.fallback_servers(), FALLBACK_SERVERS);
        assert!(c.ignores_system_dns());
        assert_eq!(c.attempt_timeout(), Duration::from_secs(5));
        assert_eq!(c.overall_timeout(), None);
    }

    #[test]
    fn empty_override_clears() {
        let mut c = ResolverConfig::new();
        c.set_custom_server("9.9.9.9");
        assert_eq!(c.custom_server(), Some("9.9.9.9"));
        c.set_custom_server("");
        assert_eq!(c, ResolverConfig::new());
    }

    #[test]
    fn current_server_sentinel() {
        let c = ResolverConfig::new();
        assert_eq!(c.current_server(), SYSTEM_DEFAULT);
    }

    #[test]
    fn builtin_primary_appends_ipv6() {
        let c = ResolverConfig::new()
            .with_default_servers(["1.1.1.1"])
            .with_ipv6_servers(["2400:3200::1"]);
        assert_eq!(c.builtin_primary(), vec!["1.1.1.1", "2400:3200::1"]);
    }

    #[test]
    fn next_default_server_rotates() {
        let c = ResolverConfig::new();
        assert_eq!(c.next_default_server(""), Some("114.114.114.114"));
        assert_eq!(c.next_default_server("114.114.114.114"), Some("8.8.8.8"));
        assert_eq!(c.next_default_server("8.8.8.8"), Some("114.114.114.114"));
        assert_eq!(c.next_default_server("10.0.0.1"), Some("114.114.114.114"));
    }

    #[test]
    fn next_default_server_prefers_override() {
        let c = ResolverConfig::new().with_custom_server("9.9.9.9");
        assert_eq!(c.next_default_server("8.8.8.8"), Some("9.9.9.9"));
        let empty = ResolverConfig::new().with_default_servers(Vec::<String>::new());
        assert_eq!(empty.next_default_server(""), None);
    }

    #[test]
    fn loopback_substitutes_are_public() {
        assert_eq!(LOOPBACK_SUBSTITUTE_V4.to_string(), "8.8.8.8:53");
        assert_eq!(LOOPBACK_SUBSTITUTE_V6.to_string(), "[2402:4e00::]:53");
    }
}
