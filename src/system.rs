//! Nameservers from the host's own resolver configuration.
//!
//! Only consulted when a config opts in with
//! [`use_system_config(true)`](crate::ResolverConfig::use_system_config).

use crate::util::substitute_loopback;
use std::net::SocketAddr;

/// Supplies the host's configured nameservers.
///
/// [`SystemConf`] is the production source; tests substitute a fixed list.
pub trait NameServerSource: Send + Sync {
    /// Returns the configured nameservers in order, or `None` if the
    /// configuration cannot be read.
    fn name_servers(&self) -> Option<Vec<SocketAddr>>;
}

/// Reads nameservers through hickory's platform configuration parser
/// (`/etc/resolv.conf` on Unix, the registry on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConf;

impl NameServerSource for SystemConf {
    fn name_servers(&self) -> Option<Vec<SocketAddr>> {
        match hickory_resolver::system_conf::read_system_conf() {
            Ok((config, _opts)) => Some(
                config
                    .name_servers()
                    .iter()
                    .map(|ns| ns.socket_addr)
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read system DNS config, using built-in servers");
                None
            }
        }
    }
}

/// Reads the nameservers from `source`, substituting loopback entries.
///
/// Returns `None` if the configuration is missing or unreadable, or lists
/// no nameservers; callers fall back to the built-in tier. Duplicate
/// addresses (hickory lists each server once per protocol) are collapsed.
#[must_use]
pub fn system_name_servers(source: &dyn NameServerSource) -> Option<Vec<String>> {
    let servers = dedup_substituted(source.name_servers()?);
    if servers.is_empty() {
        tracing::warn!("System resolver configuration lists no nameservers");
        return None;
    }
    tracing::debug!(count = servers.len(), "Using system nameservers");
    Some(servers)
}

fn dedup_substituted(addrs: impl IntoIterator<Item = SocketAddr>) -> Vec<String> {
    let mut out: Vec<SocketAddr> = Vec::new();
    for addr in addrs {
        let substituted = substitute_loopback(addr);
        if substituted != addr {
            tracing::debug!(from = %addr, to = %substituted, "Substituting loopback nameserver");
        }
        if !out.contains(&substituted) {
            out.push(substituted);
        }
    }
    out.iter().map(ToString::to_string).collect()
}
