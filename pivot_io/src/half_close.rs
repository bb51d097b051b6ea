use std::io::Result;

use tokio::io::DuplexStream;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;

/// A readable stream whose read half can be closed on its own.
pub trait HalfClose {
    /// Stop receiving. Writing, if the stream supports it, is unaffected.
    fn shutdown_read(&self) -> Result<()>;
}

impl HalfClose for TcpStream {
    #[inline]
    fn shutdown_read(&self) -> Result<()> {
        pivot_syscall::shutdown_read(self)
    }
}

impl HalfClose for OwnedReadHalf {
    #[inline]
    fn shutdown_read(&self) -> Result<()> {
        pivot_syscall::shutdown_read(self.as_ref())
    }
}

/// In-memory pipes have no kernel read half; dropping the reader
/// is what the writing side observes.
impl HalfClose for DuplexStream {
    #[inline]
    fn shutdown_read(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: HalfClose + ?Sized> HalfClose for &mut T {
    #[inline]
    fn shutdown_read(&self) -> Result<()> {
        (**self).shutdown_read()
    }
}
