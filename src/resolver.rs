//! The lookup engine: server selection, per-candidate queries, and tiered
//! fallback.
//!
//! Candidates are tried strictly in sequence. Each attempt is bounded by the
//! configured attempt window, and the first candidate that returns any
//! address wins. Per-candidate failures are logged and swallowed; only
//! exhaustion of both the primary and last-resort tiers reaches the caller.

use crate::candidate::{QueryFamily, ServerCandidate};
use crate::config::{IPV4_ONLY_SERVERS, ResolverConfig};
use crate::error::{AttemptError, ResolverError, Result};
use crate::system::{NameServerSource, SystemConf, system_name_servers};
use crate::transport::{Transport, UdpTransport};
use crate::util::{parse_target, substitute_loopback};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Where a list of candidates came from. Only used for log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Custom,
    Builtin,
    System,
    LastResort,
    Ipv4Only,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Custom => "custom",
            Self::Builtin => "builtin",
            Self::System => "system",
            Self::LastResort => "last-resort",
            Self::Ipv4Only => "ipv4-only",
        })
    }
}

/// Resolves hostnames through a tiered chain of DNS servers.
///
/// # Server order
///
/// 1. The custom server, if one is set. Nothing else in the primary tier.
/// 2. Otherwise the default servers followed by the IPv6 servers (or the
///    host's nameservers, if the config opted into them).
/// 3. If every primary candidate failed, the last-resort servers.
///
/// # Example
///
/// ```rust,ignore
/// use fallback_resolver::{DnsResolver, ResolverConfig};
///
/// let resolver = DnsResolver::with_config(ResolverConfig::new());
/// resolver.set_custom_server("223.5.5.5");
/// let addrs = resolver.lookup_ip("example.com").await?;
/// ```
pub struct DnsResolver {
    config: RwLock<Arc<ResolverConfig>>,
    transport: Arc<dyn Transport>,
    name_servers: Arc<dyn NameServerSource>,
}

impl DnsResolver {
    /// Creates a resolver with the built-in tiers and the UDP transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::new())
    }

    /// Creates a resolver over UDP using `config`.
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        let transport = UdpTransport::new(config.attempt_timeout());
        Self::with_transport(config, transport)
    }

    /// Creates a resolver that queries through `transport`.
    #[must_use]
    pub fn with_transport(config: ResolverConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            transport: Arc::new(transport),
            name_servers: Arc::new(SystemConf),
        }
    }

    /// Replaces where the host's nameservers are read from when the config
    /// opts into [`use_system_config`](ResolverConfig::use_system_config).
    #[must_use]
    pub fn with_name_server_source(mut self, source: impl NameServerSource + 'static) -> Self {
        self.name_servers = Arc::new(source);
        self
    }

    /// Returns the current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<ResolverConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Records `server` as the override for every later lookup. An empty
    /// string clears it.
    ///
    /// Lookups already in flight keep the snapshot they started with.
    pub fn set_custom_server(&self, server: &str) {
        {
            let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
            Arc::make_mut(&mut guard).set_custom_server(server);
        }
        if server.is_empty() {
            tracing::info!("DNS server reset to system default");
        } else {
            tracing::info!(server = %server, "DNS server set");
        }
    }

    /// Returns the override, if one is set.
    #[must_use]
    pub fn custom_server(&self) -> Option<String> {
        self.config().custom_server().map(ToString::to_string)
    }

    /// Returns the override, or `"system default"` when none is set.
    #[must_use]
    pub fn current_server(&self) -> String {
        self.config().current_server().to_string()
    }

    /// Resolves `host` to one or more addresses.
    ///
    /// IP literals are returned as-is without any query.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::InvalidInput`] if `host` is empty or malformed.
    /// - [`ResolverError::Exhausted`] if no candidate produced an address.
    /// - [`ResolverError::DeadlineExceeded`] if an overall deadline is
    ///   configured and elapsed first.
    pub async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Some(ip) = parse_target(host)? {
            return Ok(vec![ip]);
        }

        let config = self.config();
        match config.overall_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.search(&config, host))
                .await
                .map_err(|_| {
                    tracing::warn!(host = %host, timeout = ?limit, "DNS lookup exceeded overall deadline");
                    ResolverError::DeadlineExceeded {
                        host: host.to_string(),
                        timeout: limit,
                    }
                })?,
            None => self.search(&config, host).await,
        }
    }

    /// Resolves `host` to IPv4 addresses only, against a fixed set of public
    /// resolvers. The override and the configured tiers are ignored.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::InvalidInput`] if `host` is empty or malformed.
    /// - [`ResolverError::Exhausted`] if no server returned an IPv4 address.
    pub async fn lookup_ipv4_only(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Some(ip) = parse_target(host)? {
            return Ok(vec![ip]);
        }

        let window = self.config().attempt_timeout();
        for entry in IPV4_ONLY_SERVERS {
            let candidate = ServerCandidate::new(entry);
            let attempt = match locate(&candidate, window).await {
                Ok(server) => {
                    self.query_once(server, host, QueryFamily::Ipv4Only, window)
                        .await
                }
                Err(e) => Err(e),
            };
            match attempt {
                Ok(addrs) => return Ok(addrs),
                Err(e) => log_attempt_failure(Tier::Ipv4Only, host, &e),
            }
        }
        Err(exhausted(host))
    }

    /// Blocking form of [`lookup_ip`](Self::lookup_ip) for synchronous callers.
    ///
    /// # Errors
    ///
    /// As [`lookup_ip`](Self::lookup_ip), plus [`ResolverError::Runtime`] if
    /// the runtime cannot be started and [`ResolverError::InsideRuntime`] if
    /// called from within an async runtime.
    pub fn lookup_ip_blocking(&self, host: &str) -> Result<Vec<IpAddr>> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ResolverError::InsideRuntime);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.lookup_ip(host))
    }

    async fn search(&self, config: &ResolverConfig, host: &str) -> Result<Vec<IpAddr>> {
        let window = config.attempt_timeout();
        let (tier, primary) = primary_tier(config, self.name_servers.as_ref());
        if let Some(addrs) = self.try_tier(tier, &primary, host, window).await {
            return Ok(addrs);
        }

        let last_resort = config.fallback_servers();
        if primary.as_slice() != last_resort {
            tracing::warn!(host = %host, tier = %tier, "All primary DNS servers failed, trying last-resort servers");
            if let Some(addrs) = self
                .try_tier(Tier::LastResort, last_resort, host, window)
                .await
            {
                return Ok(addrs);
            }
        }

        tracing::warn!(host = %host, "No configured DNS server could resolve host");
        Err(exhausted(host))
    }

    async fn try_tier(
        &self,
        tier: Tier,
        servers: &[String],
        host: &str,
        window: Duration,
    ) -> Option<Vec<IpAddr>> {
        for entry in servers {
            let candidate = ServerCandidate::new(entry);
            match self.try_candidate(&candidate, host, window).await {
                Ok(addrs) => {
                    tracing::debug!(
                        host = %host,
                        tier = %tier,
                        server = %candidate,
                        count = addrs.len(),
                        "DNS lookup succeeded"
                    );
                    return Some(addrs);
                }
                Err(e) => log_attempt_failure(tier, host, &e),
            }
        }
        None
    }

    /// Queries one candidate, walking its address-family transitions.
    ///
    /// Any failure of a query that has a fallback family, whether empty
    /// answer, error or timeout, retries the same server with that family.
    async fn try_candidate(
        &self,
        candidate: &ServerCandidate,
        host: &str,
        window: Duration,
    ) -> std::result::Result<Vec<IpAddr>, AttemptError> {
        let server = locate(candidate, window).await?;
        let mut family = candidate.initial_family();
        loop {
            match self.query_once(server, host, family, window).await {
                Ok(addrs) => return Ok(addrs),
                Err(e) => match family.fallback() {
                    Some(next) => {
                        tracing::debug!(
                            server = %server,
                            from = %family,
                            to = %next,
                            error = %e,
                            "Retrying with next address family"
                        );
                        family = next;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    async fn query_once(
        &self,
        server: SocketAddr,
        host: &str,
        family: QueryFamily,
        window: Duration,
    ) -> std::result::Result<Vec<IpAddr>, AttemptError> {
        let endpoint = || server.to_string();
        let addrs = tokio::time::timeout(window, self.transport.query(server, host, family))
            .await
            .map_err(|_| AttemptError::Timeout {
                endpoint: endpoint(),
            })??;
        if addrs.is_empty() {
            return Err(AttemptError::NoRecords {
                endpoint: endpoint(),
            });
        }
        Ok(addrs)
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolver")
            .field("config", &self.config())
            .finish_non_exhaustive()
    }
}

fn primary_tier(config: &ResolverConfig, source: &dyn NameServerSource) -> (Tier, Vec<String>) {
    if let Some(custom) = config.custom_server() {
        return (Tier::Custom, vec![custom.to_string()]);
    }
    if !config.ignores_system_dns() {
        if let Some(servers) = system_name_servers(source) {
            return (Tier::System, servers);
        }
    }
    (Tier::Builtin, config.builtin_primary())
}

/// Turns a candidate into the socket address to dial.
///
/// Servers given by name are located through the system resolver,
/// preferring IPv4. Loopback nameservers are substituted either way.
async fn locate(
    candidate: &ServerCandidate,
    window: Duration,
) -> std::result::Result<SocketAddr, AttemptError> {
    let addr = match candidate.socket_addr() {
        Some(addr) => addr,
        None => {
            let unresolvable = || AttemptError::UnresolvableServer {
                endpoint: candidate.endpoint().to_string(),
            };
            let found: Vec<SocketAddr> =
                tokio::time::timeout(window, tokio::net::lookup_host(candidate.endpoint()))
                    .await
                    .map_err(|_| unresolvable())?
                    .map_err(|_| unresolvable())?
                    .collect();
            found
                .iter()
                .find(|a| a.is_ipv4())
                .or_else(|| found.first())
                .copied()
                .ok_or_else(unresolvable)?
        }
    };

    let dialed = substitute_loopback(addr);
    if dialed != addr {
        tracing::debug!(from = %addr, to = %dialed, "Substituting loopback DNS server");
    }
    Ok(dialed)
}

fn log_attempt_failure(tier: Tier, host: &str, error: &AttemptError) {
    tracing::debug!(host = %host, tier = %tier, error = %error, "DNS server attempt failed");
}

fn exhausted(host: &str) -> ResolverError {
    ResolverError::Exhausted {
        host: host.to_string(),
    }
}
