//! Optional timeouts.

use std::pin::Pin;
use std::task::{Poll, Context};
use std::future::Future;
use std::time::Duration;
use std::io::{Result, ErrorKind};

use tokio::time::Sleep;

use pin_project::pin_project;

#[allow(clippy::large_enum_variant)]
#[pin_project(project = DelayP)]
enum Delay {
    Some(#[pin] Sleep),
    None,
}

/// Future returned by [`timeoutfut`].
#[pin_project]
pub struct Timeout<T> {
    #[pin]
    value: T,

    #[pin]
    delay: Delay,
}

impl<T: Future> Future for Timeout<T> {
    type Output = Result<T::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(v) = this.value.poll(cx) {
            return Poll::Ready(Ok(v));
        }

        if let DelayP::Some(delay) = this.delay.project() {
            if delay.poll(cx).is_ready() {
                return Poll::Ready(Err(ErrorKind::TimedOut.into()));
            }
        }

        Poll::Pending
    }
}

/// Bound `future` by `secs` seconds, `0` means never time out.
pub fn timeoutfut<F: Future>(future: F, secs: usize) -> Timeout<F> {
    let delay = match secs {
        0 => Delay::None,
        x => Delay::Some(tokio::time::sleep(Duration::from_secs(x as u64))),
    };
    Timeout { value: future, delay }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_deadline() {
        let res = timeoutfut(std::future::pending::<()>(), 3).await;
        assert_eq!(res.unwrap_err().kind(), ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn zero_never_fires() {
        let res = timeoutfut(async { 7 }, 0).await;
        assert_eq!(res.unwrap(), 7);
    }
}
