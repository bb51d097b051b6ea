//! Relay endpoint.

use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

/// Default connect timeout, in seconds.
pub const DF_CONNECT_TIMEOUT: usize = 5;
/// Default time allowed for a client to send its directive, in seconds.
pub const DF_DIRECTIVE_TIMEOUT: usize = 10;
/// Default directive length limit, in bytes.
pub const DF_MAX_DIRECTIVE_LEN: usize = 4096;
/// Default keepalive idle time, in seconds.
pub const DF_TCP_KEEPALIVE: usize = 15;
/// Default keepalive probe count.
pub const DF_TCP_KEEPALIVE_PROBE: usize = 3;

/// Next hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAddr {
    SocketAddr(SocketAddr),
    DomainName(String, u16),
}

/// Options applied while reading a directive and connecting onward.
///
/// A timeout of `0` never fires, a keepalive of `0` disables keepalive
/// and a `max_directive_len` of `0` lifts the limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOpts {
    pub connect_timeout: usize,
    pub directive_timeout: usize,
    pub max_directive_len: usize,
    pub tcp_keepalive: usize,
    pub tcp_keepalive_probe: usize,
    pub bind_address: Option<SocketAddr>,
    pub bind_interface: Option<String>,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            connect_timeout: DF_CONNECT_TIMEOUT,
            directive_timeout: DF_DIRECTIVE_TIMEOUT,
            max_directive_len: DF_MAX_DIRECTIVE_LEN,
            tcp_keepalive: DF_TCP_KEEPALIVE,
            tcp_keepalive_probe: DF_TCP_KEEPALIVE_PROBE,
            bind_address: None,
            bind_interface: None,
        }
    }
}

/// Relay endpoint.
///
/// With a `seed`, connections are not asked for a directive;
/// the seed line is used for every one of them.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub laddr: SocketAddr,
    pub seed: Option<String>,
    pub conn_opts: ConnectOpts,
}

impl Display for RemoteAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use RemoteAddr::*;
        match self {
            SocketAddr(addr) => write!(f, "{}", addr),
            DomainName(host, port) => write!(f, "{}:{}", host, port),
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.seed {
            Some(seed) => write!(f, "{} -> [seed: {}]; options: {}", &self.laddr, seed, &self.conn_opts),
            None => write!(f, "{} -> [directive]; options: {}", &self.laddr, &self.conn_opts),
        }
    }
}

impl Display for ConnectOpts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ConnectOpts {
            connect_timeout,
            directive_timeout,
            max_directive_len,
            tcp_keepalive,
            tcp_keepalive_probe,
            bind_address,
            bind_interface,
        } = self;

        if let Some(iface) = bind_interface {
            write!(f, "bind-iface={}, ", iface)?;
        }

        if let Some(send_through) = bind_address {
            write!(f, "send-through={}; ", send_through)?;
        }

        write!(
            f,
            "connect-timeout={}s, directive-timeout={}s, max-directive={}b; keepalive={}s, keepalive-probe={}",
            connect_timeout, directive_timeout, max_directive_len, tcp_keepalive, tcp_keepalive_probe
        )
    }
}
