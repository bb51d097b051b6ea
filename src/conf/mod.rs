//! Configuration.
//!
//! Every section implements [`Config`]. Values given on the command line
//! are merged over those from a config file with [`Config::rst_field`];
//! a section left empty falls back to built-in defaults when built.

use std::fs;
use std::io;

use serde::{Serialize, Deserialize};
use thiserror::Error;

mod log;
pub use self::log::{LogLevel, LogConf};

mod dns;
pub use dns::{DnsMode, DnsProtocol, DnsConf};

mod net;
pub use net::NetConf;

mod endpoint;
pub use endpoint::EndpointConf;

/// A configuration section.
pub trait Config: Sized {
    type Output;

    fn is_empty(&self) -> bool;

    fn build(self) -> Self::Output;

    /// Overwrite fields that are set in `other`.
    fn rst_field(&mut self, other: &Self) -> &mut Self;

    /// Fill fields that are unset here from `other`.
    fn take_field(&mut self, other: &Self) -> &mut Self;

    fn from_cmd_args(matches: &clap::ArgMatches) -> Self;
}

#[macro_export]
macro_rules! rst {
    ($this: ident, $field: ident, $other: expr) => {
        if $other.$field.is_some() {
            $this.$field = $other.$field.clone();
        }
    };
}

#[macro_export]
macro_rules! take {
    ($this: ident, $field: ident, $other: expr) => {
        if $this.$field.is_none() {
            $this.$field = $other.$field.clone();
        }
    };
}

#[macro_export]
macro_rules! empty {
    ($this: expr => $( $field: ident ),* ) => {
        true $( && $this.$field.is_none() )*
    };
}

/// Why a configuration could not be loaded or built.
#[derive(Debug, Error)]
pub enum ConfError {
    #[error("unable to open {0}: {1}")]
    Read(String, #[source] io::Error),

    #[error("unable to parse config: {0}")]
    Parse(String),

    #[error("invalid {0}: {1}")]
    Invalid(&'static str, String),
}

/// Options from the command line that apply on top of any file.
#[derive(Debug, Default)]
pub struct CmdOverride {
    pub log: LogConf,
    pub dns: DnsConf,
    pub network: NetConf,
    pub endpoint: EndpointConf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FullConf {
    #[serde(default)]
    #[serde(skip_serializing_if = "Config::is_empty")]
    pub log: LogConf,

    #[serde(default)]
    #[serde(skip_serializing_if = "Config::is_empty")]
    pub dns: DnsConf,

    #[serde(default)]
    #[serde(skip_serializing_if = "Config::is_empty")]
    pub network: NetConf,

    pub endpoints: Vec<EndpointConf>,
}

impl FullConf {
    /// Read a toml or json file.
    pub fn from_conf_file(file: &str) -> Result<Self, ConfError> {
        let conf = fs::read_to_string(file).map_err(|e| ConfError::Read(file.to_string(), e))?;
        Self::from_conf_str(&conf)
    }

    /// Parse a toml or json document, toml first.
    pub fn from_conf_str(conf: &str) -> Result<Self, ConfError> {
        let toml_err = match toml::from_str(conf) {
            Ok(x) => return Ok(x),
            Err(e) => e,
        };

        serde_json::from_str(conf).map_err(|json_err| {
            ConfError::Parse(format!("not toml ({}), nor json ({})", toml_err, json_err))
        })
    }

    pub fn add_endpoint(&mut self, endpoint: EndpointConf) -> &mut Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Let command line values win over the file.
    pub fn apply_cmd_opts(&mut self, opts: CmdOverride) -> &mut Self {
        let CmdOverride {
            log,
            dns,
            network,
            endpoint,
        } = opts;

        self.log.rst_field(&log);
        self.dns.rst_field(&dns);
        self.network.rst_field(&network);

        for ep in self.endpoints.iter_mut() {
            ep.rst_field(&endpoint);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
[log]
level = "info"
output = "stderr"

[dns]
mode = "ipv4_only"
nameservers = ["1.1.1.1:53", "8.8.8.8"]

[network]
buf_size = 32768

[[endpoints]]
listen = "0.0.0.0:7000"

[[endpoints]]
listen = "127.0.0.1:7001"
seed = "10.0.0.2:7000 10.0.0.3:22"
connect_timeout = 3
"#;

    const JSON: &str = r#"{
    "log": { "level": "debug" },
    "endpoints": [
        { "listen": "[::]:7000", "through": "10.0.0.1", "directive_timeout": 0 }
    ]
}"#;

    #[test]
    fn toml_document() {
        let conf = FullConf::from_conf_str(TOML).unwrap();
        assert_eq!(conf.endpoints.len(), 2);
        assert!(matches!(conf.log.level, Some(LogLevel::Info)));
        assert_eq!(conf.network.buf_size, Some(32768));
        assert_eq!(conf.endpoints[1].seed.as_deref(), Some("10.0.0.2:7000 10.0.0.3:22"));

        let ep = conf.endpoints[1].clone().build().unwrap();
        assert_eq!(ep.conn_opts.connect_timeout, 3);
        assert_eq!(ep.conn_opts.directive_timeout, pivot_core::endpoint::DF_DIRECTIVE_TIMEOUT);
    }

    #[test]
    fn json_document() {
        let conf = FullConf::from_conf_str(JSON).unwrap();
        let ep = conf.endpoints[0].clone().build().unwrap();
        assert_eq!(ep.laddr, "[::]:7000".parse().unwrap());
        assert_eq!(ep.conn_opts.bind_address, Some("10.0.0.1:0".parse().unwrap()));
        assert_eq!(ep.conn_opts.directive_timeout, 0);
    }

    #[test]
    fn garbage_document() {
        assert!(matches!(FullConf::from_conf_str("endpoints = ["), Err(ConfError::Parse(_))));
    }

    #[test]
    fn command_line_wins() {
        let mut conf = FullConf::from_conf_str(TOML).unwrap();
        let opts = CmdOverride {
            log: LogConf {
                level: Some(LogLevel::Trace),
                output: None,
            },
            endpoint: EndpointConf {
                connect_timeout: Some(9),
                ..Default::default()
            },
            ..Default::default()
        };
        conf.apply_cmd_opts(opts);

        assert!(matches!(conf.log.level, Some(LogLevel::Trace)));
        assert_eq!(conf.log.output.as_deref(), Some("stderr"));
        for ep in conf.endpoints {
            assert_eq!(ep.connect_timeout, Some(9));
            assert!(!ep.listen.is_empty());
        }
    }
}
