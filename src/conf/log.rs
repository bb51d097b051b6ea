use std::io;
use std::fmt::{Formatter, Display};

use serde::{Serialize, Deserialize};
use log::LevelFilter;

use super::Config;
use crate::consts::DEFAULT_LOG_FILE;

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<String> for LogLevel {
    fn from(x: String) -> Self {
        use LogLevel::*;
        match x.to_ascii_lowercase().as_str() {
            "off" => Off,
            "error" => Error,
            "warn" => Warn,
            "info" => Info,
            "debug" => Debug,
            "trace" => Trace,
            _ => Self::default(),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(x: LogLevel) -> Self {
        use LogLevel::*;
        match x {
            Off => LevelFilter::Off,
            Error => LevelFilter::Error,
            Warn => LevelFilter::Warn,
            Info => LevelFilter::Info,
            Debug => LevelFilter::Debug,
            Trace => LevelFilter::Trace,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use LogLevel::*;
        let s = match self {
            Off => "off",
            Error => "error",
            Warn => "warn",
            Info => "info",
            Debug => "debug",
            Trace => "trace",
        };
        write!(f, "{}", s)
    }
}

#[derive(Default, Debug, Serialize, Deserialize, Clone)]
pub struct LogConf {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,

    /// `stdout`, `stderr`, or a file to append to.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Config for LogConf {
    type Output = io::Result<(LevelFilter, fern::Output)>;

    fn is_empty(&self) -> bool {
        crate::empty![self => level, output]
    }

    fn build(self) -> Self::Output {
        use std::fs::OpenOptions;
        let LogConf { level, output } = self;
        let level = level.unwrap_or_default();
        let output = output.unwrap_or_else(|| String::from(DEFAULT_LOG_FILE));

        let output: fern::Output = match output.as_str() {
            "stdout" => io::stdout().into(),
            "stderr" => io::stderr().into(),
            path => OpenOptions::new().append(true).create(true).open(path)?.into(),
        };

        Ok((level.into(), output))
    }

    fn rst_field(&mut self, other: &Self) -> &mut Self {
        use crate::rst;
        rst!(self, level, other);
        rst!(self, output, other);
        self
    }

    fn take_field(&mut self, other: &Self) -> &mut Self {
        use crate::take;
        take!(self, level, other);
        take!(self, output, other);
        self
    }

    fn from_cmd_args(matches: &clap::ArgMatches) -> Self {
        let level = matches.get_one::<String>("log_level").cloned().map(LogLevel::from);
        let output = matches.get_one::<String>("log_output").cloned();

        Self { level, output }
    }
}

impl Display for LogConf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let level = self.level.unwrap_or_default();
        let output = self.output.as_deref().unwrap_or(DEFAULT_LOG_FILE);

        write!(f, "level={}, output={}", level, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(LogLevel::from(String::from("DEBUG")), LogLevel::Debug);
        assert_eq!(LogLevel::from(String::from("nonsense")), LogLevel::Info);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }

    #[test]
    fn fill_unset_only() {
        let mut conf = LogConf {
            level: None,
            output: Some("stderr".into()),
        };
        conf.take_field(&LogConf {
            level: Some(LogLevel::Error),
            output: Some("stdout".into()),
        });
        assert_eq!(conf.level, Some(LogLevel::Error));
        assert_eq!(conf.output.as_deref(), Some("stderr"));
    }
}
