use std::fmt::{Formatter, Display};
use std::net::{IpAddr, SocketAddr};

use serde::{Serialize, Deserialize};

use pivot_core::dns::config::{LookupIpStrategy, NameServerConfig, Protocol};
use pivot_core::dns::config::{ResolverConfig, ResolverOpts};

use super::{Config, ConfError};

// dns mode
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DnsMode {
    Ipv4Only,
    Ipv6Only,
    Ipv4AndIpv6,
    #[default]
    Ipv4ThenIpv6,
    Ipv6ThenIpv4,
}

impl Display for DnsMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use DnsMode::*;
        let s = match self {
            Ipv4Only => "ipv4_only",
            Ipv6Only => "ipv6_only",
            Ipv4AndIpv6 => "ipv4_and_ipv6",
            Ipv4ThenIpv6 => "ipv4_then_ipv6",
            Ipv6ThenIpv4 => "ipv6_then_ipv4",
        };
        write!(f, "{}", s)
    }
}

impl From<String> for DnsMode {
    fn from(s: String) -> Self {
        use DnsMode::*;
        match s.to_ascii_lowercase().as_str() {
            "ipv4_only" => Ipv4Only,
            "ipv6_only" => Ipv6Only,
            "ipv4_and_ipv6" => Ipv4AndIpv6,
            "ipv4_then_ipv6" => Ipv4ThenIpv6,
            "ipv6_then_ipv4" => Ipv6ThenIpv4,
            _ => Self::default(),
        }
    }
}

impl From<DnsMode> for LookupIpStrategy {
    fn from(mode: DnsMode) -> Self {
        match mode {
            DnsMode::Ipv4Only => LookupIpStrategy::Ipv4Only,
            DnsMode::Ipv6Only => LookupIpStrategy::Ipv6Only,
            DnsMode::Ipv4AndIpv6 => LookupIpStrategy::Ipv4AndIpv6,
            DnsMode::Ipv4ThenIpv6 => LookupIpStrategy::Ipv4thenIpv6,
            DnsMode::Ipv6ThenIpv4 => LookupIpStrategy::Ipv6thenIpv4,
        }
    }
}

// dns protocol
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DnsProtocol {
    Tcp,
    Udp,
    #[default]
    TcpAndUdp,
}

impl Display for DnsProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use DnsProtocol::*;
        let s = match self {
            Tcp => "tcp",
            Udp => "udp",
            TcpAndUdp => "tcp_and_udp",
        };
        write!(f, "{}", s)
    }
}

impl From<String> for DnsProtocol {
    fn from(s: String) -> Self {
        use DnsProtocol::*;
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Tcp,
            "udp" => Udp,
            _ => TcpAndUdp,
        }
    }
}

impl From<DnsProtocol> for Vec<Protocol> {
    fn from(x: DnsProtocol) -> Self {
        use DnsProtocol::*;
        match x {
            Tcp => vec![Protocol::Tcp],
            Udp => vec![Protocol::Udp],
            TcpAndUdp => vec![Protocol::Udp, Protocol::Tcp],
        }
    }
}

// dns config
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct DnsConf {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DnsMode>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<DnsProtocol>,

    /// `ip` or `ip:port`, port 53 if omitted.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<usize>,
}

fn parse_nameserver(s: &str) -> Result<SocketAddr, ConfError> {
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    s.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| ConfError::Invalid("nameserver", s.to_string()))
}

impl Config for DnsConf {
    type Output = Result<(Option<ResolverConfig>, Option<ResolverOpts>), ConfError>;

    fn is_empty(&self) -> bool {
        crate::empty![self => mode, protocol, nameservers, cache_size]
    }

    /// `None` parts are left to the system configuration.
    fn build(self) -> Self::Output {
        let DnsConf {
            mode,
            protocol,
            nameservers,
            cache_size,
        } = self;

        let opts = if mode.is_none() && cache_size.is_none() {
            None
        } else {
            let mut opts = ResolverOpts::default();
            if let Some(mode) = mode {
                opts.ip_strategy = mode.into();
            }
            if let Some(n) = cache_size {
                opts.cache_size = n;
            }
            Some(opts)
        };

        let conf = match nameservers {
            None => None,
            Some(addrs) => {
                let protocols: Vec<Protocol> = protocol.unwrap_or_default().into();
                let mut conf = ResolverConfig::new();
                for addr in addrs.iter() {
                    let addr = parse_nameserver(addr)?;
                    for protocol in protocols.iter() {
                        conf.add_name_server(NameServerConfig::new(addr, *protocol));
                    }
                }
                Some(conf)
            }
        };

        Ok((conf, opts))
    }

    fn rst_field(&mut self, other: &Self) -> &mut Self {
        use crate::rst;
        rst!(self, mode, other);
        rst!(self, protocol, other);
        rst!(self, nameservers, other);
        rst!(self, cache_size, other);
        self
    }

    fn take_field(&mut self, other: &Self) -> &mut Self {
        use crate::take;
        take!(self, mode, other);
        take!(self, protocol, other);
        take!(self, nameservers, other);
        take!(self, cache_size, other);
        self
    }

    fn from_cmd_args(matches: &clap::ArgMatches) -> Self {
        let mode = matches.get_one::<String>("dns_mode").cloned().map(DnsMode::from);

        let protocol = matches
            .get_one::<String>("dns_protocol")
            .cloned()
            .map(DnsProtocol::from);

        let nameservers = matches
            .get_one::<String>("dns_servers")
            .map(|s| s.split(',').map(|x| x.trim().to_string()).collect());

        let cache_size = matches.get_one::<String>("dns_cache_size").and_then(|x| x.parse().ok());

        Self {
            mode,
            protocol,
            nameservers,
            cache_size,
        }
    }
}

impl Display for DnsConf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mode = self.mode.unwrap_or_default();
        let protocol = self.protocol.unwrap_or_default();
        let nameservers = match &self.nameservers {
            Some(s) => s.join(", "),
            None => String::from("system"),
        };

        write!(f, "mode={}, protocol={}, servers={}", mode, protocol, nameservers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_means_system() {
        let (conf, opts) = DnsConf::default().build().unwrap();
        assert!(conf.is_none());
        assert!(opts.is_none());
    }

    #[test]
    fn nameservers_and_protocols() {
        let dns = DnsConf {
            protocol: Some(DnsProtocol::TcpAndUdp),
            nameservers: Some(vec!["8.8.8.8".into(), "[2001:4860:4860::8888]:5353".into()]),
            mode: Some(DnsMode::Ipv6Only),
            ..Default::default()
        };
        let (conf, opts) = dns.build().unwrap();
        let conf = conf.unwrap();
        assert_eq!(conf.name_servers().len(), 4);
        assert_eq!(conf.name_servers()[0].socket_addr, "8.8.8.8:53".parse().unwrap());
        assert_eq!(opts.unwrap().ip_strategy, LookupIpStrategy::Ipv6Only);
    }

    #[test]
    fn bad_nameserver() {
        let dns = DnsConf {
            nameservers: Some(vec!["dns.google".into()]),
            ..Default::default()
        };
        assert!(matches!(dns.build(), Err(ConfError::Invalid("nameserver", _))));
    }
}
