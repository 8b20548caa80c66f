//! The query primitive the engine dials candidates through.
//!
//! [`Transport`] is the seam between candidate iteration and the DNS wire
//! protocol. [`UdpTransport`] is the production implementation, backed by
//! hickory-dns with exactly one UDP nameserver per query.

use crate::candidate::QueryFamily;
use crate::error::AttemptError;
use hickory_resolver::{
    TokioResolver,
    config::{LookupIpStrategy, NameServerConfig, ResolverConfig as HickoryConfig},
    name_server::TokioConnectionProvider,
    proto::xfer::Protocol,
};
use std::{future::Future, net::IpAddr, net::SocketAddr, pin::Pin, sync::Arc, time::Duration};

/// Alias for the `Future` returned by a [`Transport`] query.
pub type Query<'a> = Pin<Box<dyn Future<Output = Result<Vec<IpAddr>, AttemptError>> + Send + 'a>>;

/// Issues one address lookup against one DNS server.
///
/// Implementations must not retry other servers; the engine owns ordering
/// and fallback. Any socket opened for a query is released when the
/// returned future completes or is dropped.
pub trait Transport: Send + Sync {
    /// Looks up `host` at `server`, asking only for `family` records.
    fn query<'a>(&'a self, server: SocketAddr, host: &'a str, family: QueryFamily) -> Query<'a>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn query<'a>(&'a self, server: SocketAddr, host: &'a str, family: QueryFamily) -> Query<'a> {
        (**self).query(server, host, family)
    }
}

impl From<QueryFamily> for LookupIpStrategy {
    fn from(family: QueryFamily) -> Self {
        match family {
            QueryFamily::Ipv4Only => Self::Ipv4Only,
            QueryFamily::Ipv6Only => Self::Ipv6Only,
            QueryFamily::DualStack => Self::Ipv4AndIpv6,
        }
    }
}

/// Datagram transport over hickory-dns.
///
/// Each query builds a throwaway resolver pointed at a single UDP
/// nameserver, with caching disabled and a single attempt, so nothing is
/// held between calls.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
}

impl UdpTransport {
    /// Creates a transport whose queries give up after `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn build_resolver(&self, server: SocketAddr, family: QueryFamily) -> TokioResolver {
        let mut config = HickoryConfig::new();
        config.add_name_server(NameServerConfig::new(server, Protocol::Udp));

        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        let opts = builder.options_mut();
        opts.ip_strategy = family.into();
        opts.timeout = self.timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        builder.build()
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new(crate::config::ATTEMPT_TIMEOUT)
    }
}

impl Transport for UdpTransport {
    fn query<'a>(&'a self, server: SocketAddr, host: &'a str, family: QueryFamily) -> Query<'a> {
        Box::pin(async move {
            let endpoint = server.to_string();
            tracing::debug!(%server, host = %host, %family, "querying over udp");

            let resolver = self.build_resolver(server, family);
            let lookup = resolver.lookup_ip(host).await.map_err(|e| {
                if e.is_no_records_found() {
                    AttemptError::NoRecords {
                        endpoint: endpoint.clone(),
                    }
                } else {
                    AttemptError::Transport {
                        endpoint: endpoint.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

            Ok(lookup.iter().filter(|ip| family.admits(ip)).collect())
        })
    }
}
