//! Chain directives.
//!
//! A directive is the first line a client sends to a pivot:
//!
//! ```text
//! <host>:<port>[ <remainder>]\n
//! ```
//!
//! The pivot connects to `host:port` and forwards `remainder`, followed by
//! a newline, before relaying anything else. Since the remainder may itself
//! start with a hop, a single line can route a connection through a chain
//! of pivots:
//!
//! ```
//! use pivot_core::directive::{compose, parse};
//!
//! let line = compose(["10.0.0.2:7000", "10.0.0.3:7000", "db.internal:5432"], b"");
//! assert_eq!(line, b"10.0.0.2:7000 10.0.0.3:7000 db.internal:5432\n");
//!
//! let first = parse(&line[..line.len() - 1]).unwrap();
//! assert_eq!(first.host, "10.0.0.2");
//! assert_eq!(first.remainder, b"10.0.0.3:7000 db.internal:5432");
//! ```

use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};

use crate::endpoint::RemoteAddr;
use crate::error::ParseError;

/// A parsed directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub host: String,
    pub port: String,
    pub remainder: Vec<u8>,
}

#[inline]
const fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Parse a directive line, the trailing newline already stripped.
///
/// The hop is everything before the first whitespace byte and splits at
/// its first `:`. The remainder is everything after that whitespace byte
/// with leading spaces removed, kept byte for byte.
pub fn parse(line: &[u8]) -> Result<Directive, ParseError> {
    if line.is_empty() {
        return Err(ParseError::Empty);
    }
    if line.contains(&b'\n') {
        return Err(ParseError::EmbeddedNewline);
    }

    let (hop, rest) = match line.iter().position(|b| is_space(*b)) {
        Some(i) => (&line[..i], &line[i + 1..]),
        None => (line, &line[line.len()..]),
    };

    let hop = std::str::from_utf8(hop).map_err(|_| ParseError::NotUtf8(String::from_utf8_lossy(hop).into_owned()))?;

    let (host, port) = hop
        .split_once(':')
        .ok_or_else(|| ParseError::MissingColon(hop.to_string()))?;

    if host.is_empty() {
        return Err(ParseError::EmptyHost(hop.to_string()));
    }
    if port.is_empty() {
        return Err(ParseError::EmptyPort(hop.to_string()));
    }

    let skip = rest.iter().take_while(|b| **b == b' ').count();

    Ok(Directive {
        host: host.to_string(),
        port: port.to_string(),
        remainder: rest[skip..].to_vec(),
    })
}

/// Build the line that routes a connection through `hops` in order,
/// then hands `payload` to the last one.
///
/// Every hop strips one entry, so the destination receives `payload`
/// followed by a newline, or nothing when `payload` is empty.
pub fn compose<I, S>(hops: I, payload: &[u8]) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = Vec::new();
    for hop in hops {
        if !line.is_empty() {
            line.push(b' ');
        }
        line.extend_from_slice(hop.as_ref().as_bytes());
    }
    if !payload.is_empty() {
        line.push(b' ');
        line.extend_from_slice(payload);
    }
    line.push(b'\n');
    line
}

impl Directive {
    /// Where to connect.
    ///
    /// An ip literal host (`[..]` for v6) is used as is,
    /// anything else is looked up later.
    pub fn remote_addr(&self) -> Result<RemoteAddr, ParseError> {
        let port: u16 = self
            .port
            .parse()
            .map_err(|_| ParseError::InvalidPort(self.to_string()))?;

        let host = self.host.as_str();
        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        Ok(match bare.parse::<IpAddr>() {
            Ok(ip) => RemoteAddr::SocketAddr(SocketAddr::new(ip, port)),
            Err(_) => RemoteAddr::DomainName(host.to_string(), port),
        })
    }

    /// The line to hand to the next hop, if any: the remainder
    /// terminated by a newline.
    pub fn forward_line(&self) -> Option<Vec<u8>> {
        if self.remainder.is_empty() {
            return None;
        }
        let mut line = Vec::with_capacity(self.remainder.len() + 1);
        line.extend_from_slice(&self.remainder);
        line.push(b'\n');
        Some(line)
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
