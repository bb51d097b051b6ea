use std::io::{ErrorKind, Result};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A one-way copy buffer.
///
/// Every chunk read from the source is written out completely before
/// the next read is issued, so a direction never holds more than one
/// buffer of pending data and bytes leave in the order they arrived.
pub struct CopyBuffer<B> {
    read_done: bool,
    need_flush: bool,
    pos: usize,
    cap: usize,
    amt: u64,
    buf: B,
}

impl<B> CopyBuffer<B> {
    /// Constructor, take the provided buffer.
    pub const fn new(buf: B) -> Self {
        Self {
            read_done: false,
            need_flush: false,
            pos: 0,
            cap: 0,
            amt: 0,
            buf,
        }
    }

    /// Bytes written to the destination so far.
    #[inline]
    pub const fn amount(&self) -> u64 {
        self.amt
    }
}

impl<B: AsMut<[u8]>> CopyBuffer<B> {
    /// Copy data from reader to writer until the reader reaches EOF.
    ///
    /// Returns the total amount of bytes written.
    pub fn poll_copy<R, W>(&mut self, cx: &mut Context<'_>, r: &mut R, w: &mut W) -> Poll<Result<u64>>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        loop {
            // buffer drained, read more
            if self.pos == self.cap && !self.read_done {
                let n = match self.poll_read_buf(cx, r) {
                    Poll::Ready(Ok(n)) => n,
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                    Poll::Pending => {
                        // the peer may wait for what we have buffered
                        // before it sends anything else
                        if self.need_flush {
                            ready!(Pin::new(&mut *w).poll_flush(cx))?;
                            self.need_flush = false;
                        }

                        return Poll::Pending;
                    }
                };

                if n == 0 {
                    self.read_done = true;
                } else {
                    self.pos = 0;
                    self.cap = n;
                }
            }

            while self.pos < self.cap {
                let i = ready!(Pin::new(&mut *w).poll_write(cx, &self.buf.as_mut()[self.pos..self.cap]))?;

                if i == 0 {
                    return Poll::Ready(Err(ErrorKind::WriteZero.into()));
                }
                self.pos += i;
                self.amt += i as u64;
                self.need_flush = true;
            }

            debug_assert!(self.pos <= self.cap, "writer returned length larger than input slice");

            if self.pos == self.cap && self.read_done {
                ready!(Pin::new(&mut *w).poll_flush(cx))?;
                return Poll::Ready(Ok(self.amt));
            }
        }
    }

    #[inline]
    fn poll_read_buf<R>(&mut self, cx: &mut Context<'_>, r: &mut R) -> Poll<Result<usize>>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut buf = ReadBuf::new(self.buf.as_mut());
        Pin::new(r).poll_read(cx, &mut buf).map_ok(|_| buf.filled().len())
    }
}
