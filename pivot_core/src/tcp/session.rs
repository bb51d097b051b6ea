use std::fmt::{Display, Formatter};

use tokio::net::TcpStream;

use pivot_io::{bidi_pump, PumpReport};

use crate::registry::{SessionGuard, SessionId};

/// One inbound connection paired with its next hop.
///
/// The session owns both connections; nothing else reads or writes
/// them once it is built. Each direction has exactly one writer, the
/// pump that owns its write half.
pub struct RelaySession {
    guard: SessionGuard,
    inbound: TcpStream,
    outbound: TcpStream,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Both directions ran to EOF, or one of them failed and the other
    /// was cut short.
    Finished { upload: PumpReport, download: PumpReport },
    /// Closed through the registry, connections dropped mid-flight.
    Closed,
}

impl RelaySession {
    pub fn new(inbound: TcpStream, outbound: TcpStream, guard: SessionGuard) -> Self {
        Self {
            guard,
            inbound,
            outbound,
        }
    }

    #[inline]
    pub const fn id(&self) -> SessionId {
        self.guard.id()
    }

    /// Relay until both directions reached EOF, until either one fails,
    /// or until the registry closes this session. In every case both
    /// connections are closed and the session is deregistered when this
    /// returns.
    pub async fn start(self) -> SessionEnd {
        let RelaySession {
            guard,
            inbound,
            outbound,
        } = self;

        let (mut in_r, mut in_w) = inbound.into_split();
        let (mut out_r, mut out_w) = outbound.into_split();

        let end = tokio::select! {
            (upload, download) = bidi_pump(&mut in_r, &mut in_w, &mut out_r, &mut out_w) => {
                SessionEnd::Finished { upload, download }
            }
            _ = guard.closed() => SessionEnd::Closed,
        };

        drop((in_r, in_w, out_r, out_w));
        drop(guard);
        end
    }
}

impl Display for SessionEnd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEnd::Finished { upload, download } => {
                write!(f, "upload: {}b, download: {}b", upload.amt, download.amt)
            }
            SessionEnd::Closed => write!(f, "closed"),
        }
    }
}
