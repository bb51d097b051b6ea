use std::fmt::{Display, Formatter};

use serde::{Serialize, Deserialize};

use super::Config;

/// Process wide network settings.
#[derive(Serialize, Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetConf {
    /// Relay buffer per direction, in bytes.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buf_size: Option<usize>,

    /// Open file limit to request at startup.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nofile: Option<u64>,
}

impl Config for NetConf {
    type Output = Self;

    fn is_empty(&self) -> bool {
        crate::empty![self => buf_size, nofile]
    }

    fn build(self) -> Self::Output {
        self
    }

    fn rst_field(&mut self, other: &Self) -> &mut Self {
        use crate::rst;
        rst!(self, buf_size, other);
        rst!(self, nofile, other);
        self
    }

    fn take_field(&mut self, other: &Self) -> &mut Self {
        use crate::take;
        take!(self, buf_size, other);
        take!(self, nofile, other);
        self
    }

    fn from_cmd_args(matches: &clap::ArgMatches) -> Self {
        let buf_size = matches.get_one::<String>("buf_size").and_then(|x| x.parse().ok());
        let nofile = matches.get_one::<String>("nofile").and_then(|x| x.parse().ok());

        Self { buf_size, nofile }
    }
}

impl Display for NetConf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let buf_size = self.buf_size.unwrap_or(pivot_io::DF_BUF_SIZE);
        write!(f, "buf-size={}b", buf_size)?;
        if let Some(nofile) = self.nofile {
            write!(f, ", nofile={}", nofile)?;
        }
        Ok(())
    }
}
