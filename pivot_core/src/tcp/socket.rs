use std::io::{Result, Error, ErrorKind};
use std::net::SocketAddr;
use std::time::Duration;

use pivot_syscall::new_tcp_socket;
use tokio::net::{TcpSocket, TcpStream, TcpListener};

use crate::time::timeoutfut;
use crate::endpoint::{RemoteAddr, ConnectOpts};

/// Bind a listener. IPv6 addresses accept IPv4 too.
pub fn bind(laddr: &SocketAddr) -> Result<TcpListener> {
    let socket = new_tcp_socket(laddr)?;

    // dual stack
    if let SocketAddr::V6(_) = laddr {
        let _ = socket.set_only_v6(false);
    }

    // ignore error
    let _ = socket.set_reuse_address(true);

    socket.bind(&(*laddr).into())?;
    socket.listen(1024)?;

    TcpListener::from_std(socket.into())
}

/// Connect to the first reachable candidate of `raddr`.
pub async fn connect(raddr: &RemoteAddr, candidates: &[SocketAddr], conn_opts: &ConnectOpts) -> Result<TcpStream> {
    let ConnectOpts {
        connect_timeout,
        bind_address,

        #[cfg(target_os = "linux")]
        bind_interface,
        ..
    } = conn_opts;

    let mut last_err = None;
    let keepalive = keepalive::build(conn_opts);

    for addr in candidates {
        let socket = new_tcp_socket(addr)?;

        // ignore error
        let _ = socket.set_nodelay(true);

        if let Some(bind) = *bind_address {
            socket.bind(&bind.into())?;
        }

        #[cfg(target_os = "linux")]
        if let Some(iface) = bind_interface {
            pivot_syscall::bind_to_device(&socket, iface)?;
        }

        if let Some(kpa) = &keepalive {
            socket.set_tcp_keepalive(kpa)?;
        }

        let socket = TcpSocket::from_std_stream(socket.into());

        match timeoutfut(socket.connect(*addr), *connect_timeout).await {
            Ok(Ok(stream)) => {
                log::debug!("[tcp]connect to {} as {}", raddr, addr);
                return Ok(stream);
            }
            Ok(Err(e)) => {
                log::warn!("[tcp]connect to {} as {}: {}, try next ip", raddr, addr, &e);
                last_err = Some(e);
            }
            Err(e) => {
                log::warn!("[tcp]connect to {} as {} timeout, try next ip", raddr, addr);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Error::new(ErrorKind::InvalidInput, "could not connect to any address")))
}

mod keepalive {
    use super::*;
    use pivot_syscall::socket2::TcpKeepalive;

    pub fn build(conn_opts: &ConnectOpts) -> Option<TcpKeepalive> {
        let ConnectOpts {
            tcp_keepalive,
            tcp_keepalive_probe,
            ..
        } = conn_opts;
        if *tcp_keepalive == 0 {
            return None;
        };
        let secs = Duration::from_secs(*tcp_keepalive as u64);
        let mut kpa = TcpKeepalive::new().with_time(secs);
        #[cfg(not(target_os = "openbsd"))]
        {
            kpa = kpa.with_interval(secs);
        }
        #[cfg(not(any(target_os = "openbsd", target_os = "windows")))]
        {
            kpa = kpa.with_retries(*tcp_keepalive_probe as u32);
        }
        #[cfg(any(target_os = "openbsd", target_os = "windows"))]
        let _ = tcp_keepalive_probe;

        Some(kpa)
    }
}
