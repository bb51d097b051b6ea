use std::io::{Error, ErrorKind};
use std::fmt::{Display, Formatter};
use std::future::poll_fn;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{buf_size, CopyBuffer, HalfClose};

/// Outcome of one direction.
#[derive(Debug)]
pub struct PumpReport {
    /// Bytes delivered to the destination.
    pub amt: u64,
    /// The error that stopped the pump early, `None` on clean EOF.
    pub error: Option<Error>,
}

impl PumpReport {
    #[inline]
    pub const fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

impl Display for PumpReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.error {
            None => write!(f, "{}b, eof", self.amt),
            Some(e) => write!(f, "{}b, {}", self.amt, e),
        }
    }
}

/// Relay bytes from `from` to `to` until EOF or error.
///
/// Uses a heap buffer of [`buf_size`] bytes.
#[inline]
pub async fn pump<R, W>(from: &mut R, to: &mut W) -> PumpReport
where
    R: AsyncRead + HalfClose + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = CopyBuffer::new(vec![0u8; buf_size()]);
    pump_buf(from, to, &mut buf).await
}

/// Relay bytes from `from` to `to` through a caller-provided buffer.
///
/// Whatever ends the transfer, the read half of `from` and the write
/// half of `to` are shut down afterwards. The opposite direction of
/// both connections is left alone. Errors never escape: they are
/// logged and carried in the report.
///
/// If this future is dropped early, `buf.amount()` still tells how
/// much was delivered.
pub async fn pump_buf<B, R, W>(from: &mut R, to: &mut W, buf: &mut CopyBuffer<B>) -> PumpReport
where
    B: AsMut<[u8]>,
    R: AsyncRead + HalfClose + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let res = poll_fn(|cx| buf.poll_copy(cx, &mut *from, &mut *to)).await;

    if let Err(e) = from.shutdown_read() {
        if e.kind() != ErrorKind::NotConnected {
            log::debug!("[pump]failed to shutdown read half: {}", e);
        }
    }

    if let Err(e) = to.shutdown().await {
        if e.kind() != ErrorKind::NotConnected {
            log::debug!("[pump]failed to shutdown write half: {}", e);
        }
    }

    PumpReport {
        amt: buf.amount(),
        error: res.err(),
    }
}
