//! Pivot's relay IO.
//!
//! ## Example
//!
//! ```no_run
//! async {
//!     use tokio::net::TcpStream;
//!     use pivot_io::bidi_pump;
//!
//!     let left = TcpStream::connect("abc").await.unwrap();
//!     let right = TcpStream::connect("def").await.unwrap();
//!
//!     let (mut lr, mut lw) = left.into_split();
//!     let (mut rr, mut rw) = right.into_split();
//!
//!     // both directions, returns once both have finished
//!     let (up, down) = bidi_pump(&mut lr, &mut lw, &mut rr, &mut rw).await;
//!     println!("upload: {}, download: {}", up, down);
//! };
//! ```
//!
//! ## About Half Close
//!
//! A direction that hits EOF (or an error) shuts down the read half of its
//! source and the write half of its destination, then stops. The opposite
//! direction keeps running until it ends on its own, so a peer that
//! finished sending can still receive the rest of the response.
//!
//! A direction that fails is different: [`bidi_pump`] stops the other
//! one right away, since a broken connection is not resumed.

mod buf;
mod half_close;
mod pump;

pub use buf::CopyBuffer;
pub use half_close::HalfClose;
pub use pump::{pump, pump_buf, PumpReport};

use std::io::{Error, ErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncRead, AsyncWrite};

static BUF_SIZE: AtomicUsize = AtomicUsize::new(DF_BUF_SIZE);

/// Default per-direction buffer size, 16k.
pub const DF_BUF_SIZE: usize = 0x4000;

/// Get the per-direction buffer size.
#[inline]
pub fn buf_size() -> usize {
    BUF_SIZE.load(Ordering::Relaxed)
}

/// Set the per-direction buffer size. Zero is ignored.
#[inline]
pub fn set_buf_size(n: usize) {
    if n != 0 {
        BUF_SIZE.store(n, Ordering::Relaxed);
    }
}

/// Run `a -> b` and `b -> a` concurrently.
///
/// Returns once both directions reached EOF, or as soon as one of them
/// fails. In the latter case the other direction is cut short and its
/// report carries a `ConnectionAborted` error.
///
/// Returns the reports of `a -> b` and `b -> a`, in that order.
pub async fn bidi_pump<AR, AW, BR, BW>(
    a_r: &mut AR,
    a_w: &mut AW,
    b_r: &mut BR,
    b_w: &mut BW,
) -> (PumpReport, PumpReport)
where
    AR: AsyncRead + HalfClose + Unpin + ?Sized,
    AW: AsyncWrite + Unpin + ?Sized,
    BR: AsyncRead + HalfClose + Unpin + ?Sized,
    BW: AsyncWrite + Unpin + ?Sized,
{
    let mut a_buf = CopyBuffer::new(vec![0u8; buf_size()]);
    let mut b_buf = CopyBuffer::new(vec![0u8; buf_size()]);

    let mut a_to_b: Option<PumpReport> = None;
    let mut b_to_a: Option<PumpReport> = None;

    {
        let ab = pump_buf(a_r, b_w, &mut a_buf);
        let ba = pump_buf(b_r, a_w, &mut b_buf);
        tokio::pin!(ab, ba);

        while a_to_b.is_none() || b_to_a.is_none() {
            let failed = tokio::select! {
                report = &mut ab, if a_to_b.is_none() => {
                    let failed = !report.is_clean();
                    a_to_b = Some(report);
                    failed
                }
                report = &mut ba, if b_to_a.is_none() => {
                    let failed = !report.is_clean();
                    b_to_a = Some(report);
                    failed
                }
            };

            if failed {
                break;
            }
        }
    }

    let cut = |buf: &CopyBuffer<Vec<u8>>| PumpReport {
        amt: buf.amount(),
        error: Some(Error::new(ErrorKind::ConnectionAborted, "opposite direction failed")),
    };

    (
        a_to_b.unwrap_or_else(|| cut(&a_buf)),
        b_to_a.unwrap_or_else(|| cut(&b_buf)),
    )
}
