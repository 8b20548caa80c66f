//! # fallback-resolver
//!
//! Hostname resolution that keeps working when the system resolver does not:
//! a missing `/etc/resolv.conf`, a configuration pointing at a dead loopback
//! stub, or a network that silently drops one address family.
//!
//! Instead of the operating system's lookup path, [`DnsResolver`] walks a
//! chain of DNS servers:
//!
//! 1. a custom server, when one is set, and nothing else;
//! 2. otherwise the built-in public IPv4 servers, then IPv6-capable ones;
//! 3. a last-resort list of highly available public resolvers.
//!
//! Each query is bounded by a 5 second window. IPv4 servers are asked for
//! A records first and AAAA records if that query failed or came back empty;
//! IPv6 servers are asked for both at once. The first server with any address
//! wins.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use fallback_resolver::DnsResolver;
//!
//! let resolver = DnsResolver::new();
//! let addrs = resolver.lookup_ip("example.com").await?;
//!
//! // Route every later lookup through one server.
//! resolver.set_custom_server("223.5.5.5");
//!
//! // Back to the built-in chain.
//! resolver.set_custom_server("");
//! ```
//!
//! ## Testing
//!
//! The DNS exchange itself sits behind [`Transport`]. Supply a scripted
//! implementation through [`DnsResolver::with_transport`] to observe which
//! servers are dialed without touching the network.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod candidate;
pub mod config;
pub mod error;
pub mod resolver;
pub mod system;
pub mod transport;
pub mod util;

pub use candidate::{QueryFamily, ServerCandidate};
pub use config::ResolverConfig;
pub use error::{AttemptError, ResolverError, Result};
pub use resolver::DnsResolver;
pub use system::{NameServerSource, SystemConf};
pub use transport::{Query, Transport, UdpTransport};
pub use util::{HostKind, classify, format_endpoint, substitute_loopback};
