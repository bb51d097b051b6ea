//! Dispatch error taxonomy.

use std::io;

use thiserror::Error;

/// A directive line that cannot name a next hop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty directive")]
    Empty,

    #[error("directive contains a newline")]
    EmbeddedNewline,

    #[error("hop `{0}` is not valid utf-8")]
    NotUtf8(String),

    #[error("hop `{0}` has no ':'")]
    MissingColon(String),

    #[error("hop `{0}` has an empty host")]
    EmptyHost(String),

    #[error("hop `{0}` has an empty port")]
    EmptyPort(String),

    #[error("hop `{0}` has an invalid port")]
    InvalidPort(String),
}

/// Why a single dispatch was abandoned.
///
/// None of these outlive the connection they belong to.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to read directive: {0}")]
    Directive(#[source] io::Error),

    #[error("bad directive: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to resolve {0}: {1}")]
    Resolve(String, #[source] io::Error),

    #[error("failed to connect {0}: {1}")]
    Connect(String, #[source] io::Error),

    #[error("{0}")]
    Io(#[from] io::Error),
}
