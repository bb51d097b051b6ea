use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};

use serde::{Serialize, Deserialize};

use pivot_core::endpoint::{Endpoint, ConnectOpts};

use super::{Config, ConfError};

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EndpointConf {
    pub listen: String,

    /// Directive used for every connection instead of reading one.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,

    /// Local address for outbound connections, `ip` or `ip:port`.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub through: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<usize>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive_timeout: Option<usize>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_directive_len: Option<usize>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_keepalive: Option<usize>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_keepalive_probe: Option<usize>,
}

fn parse_through(s: &str) -> Result<SocketAddr, ConfError> {
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    s.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 0))
        .map_err(|_| ConfError::Invalid("send-through address", s.to_string()))
}

impl Config for EndpointConf {
    type Output = Result<Endpoint, ConfError>;

    fn is_empty(&self) -> bool {
        self.listen.is_empty()
            && crate::empty![self =>
                seed, through, interface, connect_timeout, directive_timeout,
                max_directive_len, tcp_keepalive, tcp_keepalive_probe
            ]
    }

    fn build(self) -> Self::Output {
        let EndpointConf {
            listen,
            seed,
            through,
            interface,
            connect_timeout,
            directive_timeout,
            max_directive_len,
            tcp_keepalive,
            tcp_keepalive_probe,
        } = self;

        let laddr = listen
            .parse::<SocketAddr>()
            .map_err(|_| ConfError::Invalid("listen address", listen.clone()))?;

        let bind_address = through.as_deref().map(parse_through).transpose()?;

        let seed = seed
            .map(|s| s.trim_end_matches(['\r', '\n']).to_string())
            .filter(|s| !s.is_empty());

        let df = ConnectOpts::default();
        let conn_opts = ConnectOpts {
            connect_timeout: connect_timeout.unwrap_or(df.connect_timeout),
            directive_timeout: directive_timeout.unwrap_or(df.directive_timeout),
            max_directive_len: max_directive_len.unwrap_or(df.max_directive_len),
            tcp_keepalive: tcp_keepalive.unwrap_or(df.tcp_keepalive),
            tcp_keepalive_probe: tcp_keepalive_probe.unwrap_or(df.tcp_keepalive_probe),
            bind_address,
            bind_interface: interface,
        };

        Ok(Endpoint { laddr, seed, conn_opts })
    }

    /// `listen` is never overwritten, it names the endpoint.
    fn rst_field(&mut self, other: &Self) -> &mut Self {
        use crate::rst;
        rst!(self, seed, other);
        rst!(self, through, other);
        rst!(self, interface, other);
        rst!(self, connect_timeout, other);
        rst!(self, directive_timeout, other);
        rst!(self, max_directive_len, other);
        rst!(self, tcp_keepalive, other);
        rst!(self, tcp_keepalive_probe, other);
        self
    }

    fn take_field(&mut self, other: &Self) -> &mut Self {
        use crate::take;
        if self.listen.is_empty() {
            self.listen = other.listen.clone();
        }
        take!(self, seed, other);
        take!(self, through, other);
        take!(self, interface, other);
        take!(self, connect_timeout, other);
        take!(self, directive_timeout, other);
        take!(self, max_directive_len, other);
        take!(self, tcp_keepalive, other);
        take!(self, tcp_keepalive_probe, other);
        self
    }

    fn from_cmd_args(matches: &clap::ArgMatches) -> Self {
        let get = |name: &str| matches.get_one::<String>(name).cloned();
        let num = |name: &str| matches.get_one::<String>(name).and_then(|x| x.parse().ok());

        Self {
            listen: get("listen").unwrap_or_default(),
            seed: get("seed"),
            through: get("through"),
            interface: get("interface"),
            connect_timeout: num("connect_timeout"),
            directive_timeout: num("directive_timeout"),
            max_directive_len: num("max_directive_len"),
            tcp_keepalive: None,
            tcp_keepalive_probe: None,
        }
    }
}

impl Display for EndpointConf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.listen)?;
        if let Some(seed) = &self.seed {
            write!(f, " -> [seed: {}]", seed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in() {
        let ep = EndpointConf {
            listen: "127.0.0.1:7000".into(),
            seed: Some("10.0.0.1:22\n".into()),
            ..Default::default()
        }
        .build()
        .unwrap();

        assert_eq!(ep.seed.as_deref(), Some("10.0.0.1:22"));
        assert_eq!(ep.conn_opts, ConnectOpts::default());
    }

    #[test]
    fn bad_addresses() {
        let listen = EndpointConf {
            listen: "nowhere".into(),
            ..Default::default()
        };
        assert!(matches!(listen.build(), Err(ConfError::Invalid("listen address", _))));

        let through = EndpointConf {
            listen: "0.0.0.0:1".into(),
            through: Some("eth0".into()),
            ..Default::default()
        };
        assert!(matches!(through.build(), Err(ConfError::Invalid("send-through address", _))));
    }
}
