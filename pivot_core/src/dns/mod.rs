//! Global dns resolver.
//!
//! Configured once before the first lookup, then shared by every dispatch.
//! Lookup results are returned by value, each dispatch gets its own.

use std::io::{Result, Error, ErrorKind};
use std::net::SocketAddr;

use hickory_resolver as resolver;
use resolver::TokioAsyncResolver;
use resolver::system_conf::read_system_conf;
pub use resolver::config;
use config::{ResolverOpts, ResolverConfig};

use once_cell::sync::{Lazy, OnceCell};

use crate::endpoint::RemoteAddr;

/// Dns config.
#[derive(Debug, Clone)]
pub struct DnsConf {
    pub conf: ResolverConfig,
    pub opts: ResolverOpts,
}

/// Use system config on unix(except android) or windows,
/// otherwise use google's public dns servers.
impl Default for DnsConf {
    fn default() -> Self {
        #[cfg(any(all(unix, not(target_os = "android")), windows))]
        let (conf, opts) = read_system_conf().unwrap_or_default();

        #[cfg(not(any(all(unix, not(target_os = "android")), windows)))]
        let (conf, opts) = Default::default();

        Self { conf, opts }
    }
}

static DNS_CONF: OnceCell<DnsConf> = OnceCell::new();

static DNS: Lazy<TokioAsyncResolver> = Lazy::new(|| {
    let DnsConf { conf, opts } = DNS_CONF.get().cloned().unwrap_or_default();
    TokioAsyncResolver::tokio(conf, opts)
});

/// Force initialization.
pub fn force_init() {
    Lazy::force(&DNS);
}

/// Setup global dns resolver.
pub fn build(conf: Option<ResolverConfig>, opts: Option<ResolverOpts>) {
    build_lazy(conf, opts);
    force_init();
}

/// Setup config of global dns resolver, without initialization.
///
/// Only the first call takes effect, later calls are logged and ignored.
pub fn build_lazy(conf: Option<ResolverConfig>, opts: Option<ResolverOpts>) {
    let mut dns_conf = DnsConf::default();

    if let Some(conf) = conf {
        dns_conf.conf = conf;
    }

    if let Some(opts) = opts {
        dns_conf.opts = opts;
    }

    if DNS_CONF.set(dns_conf).is_err() {
        log::warn!("[dns]resolver already configured, ignored");
    }
}

/// Lookup ip with global dns resolver.
pub async fn resolve_ip(host: &str) -> Result<Vec<std::net::IpAddr>> {
    let ips = DNS
        .lookup_ip(host)
        .await
        .map_err(|e| Error::new(ErrorKind::Other, e))?;
    Ok(ips.iter().collect())
}

/// Turn a next hop into candidate socket addresses, in resolver order.
///
/// Socket addresses are returned as is, without a lookup.
pub async fn resolve_addr(addr: &RemoteAddr) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = match addr {
        RemoteAddr::SocketAddr(addr) => vec![*addr],
        RemoteAddr::DomainName(host, port) => resolve_ip(host)
            .await?
            .into_iter()
            .map(|ip| SocketAddr::new(ip, *port))
            .collect(),
    };

    if addrs.is_empty() {
        return Err(Error::new(ErrorKind::NotFound, format!("no address found for {}", addr)));
    }
    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn literal_skips_lookup() {
        let raddr = RemoteAddr::SocketAddr("10.1.2.3:4".parse().unwrap());
        let addrs = resolve_addr(&raddr).await.unwrap();
        assert_eq!(addrs, vec!["10.1.2.3:4".parse::<SocketAddr>().unwrap()]);
    }
}
