use std::io::Result;
use std::net::{Shutdown, SocketAddr};

use socket2::{Domain, Socket, SockRef, Type};

/// Create a new non-blocking tcp socket whose family matches `addr`.
#[inline]
pub fn new_tcp_socket(addr: &SocketAddr) -> Result<Socket> {
    new_socket(Domain::for_address(*addr), Type::STREAM)
}

/// Create a new socket.
///
/// Sockets are opened with `SOCK_NONBLOCK | SOCK_CLOEXEC` in a single call
/// where the platform allows it.
#[cfg(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "illumos",
    target_os = "linux",
    target_os = "netbsd",
    target_os = "openbsd"
))]
#[inline]
pub fn new_socket(domain: Domain, ty: Type) -> Result<Socket> {
    use std::os::unix::prelude::FromRawFd;
    use libc::{SOCK_NONBLOCK, SOCK_CLOEXEC};

    let fd = unsafe { libc::socket(domain.into(), libc::c_int::from(ty) | SOCK_NONBLOCK | SOCK_CLOEXEC, 0) };

    if fd < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(unsafe { Socket::from_raw_fd(fd) })
    }
}

/// Create a new socket.
#[cfg(not(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "illumos",
    target_os = "linux",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
#[inline]
pub fn new_socket(domain: Domain, ty: Type) -> Result<Socket> {
    let socket = Socket::new(domain, ty, None)?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Shut down the read half of a connected socket.
///
/// Peer data arriving afterwards is discarded by the kernel,
/// the write half stays usable.
#[cfg(unix)]
pub fn shutdown_read<T: std::os::unix::io::AsFd>(socket: &T) -> Result<()> {
    SockRef::from(socket).shutdown(Shutdown::Read)
}

/// Shut down the read half of a connected socket.
#[cfg(windows)]
pub fn shutdown_read<T: std::os::windows::io::AsSocket>(socket: &T) -> Result<()> {
    SockRef::from(socket).shutdown(Shutdown::Read)
}

/// Bind a socket to a specific network interface.
///
/// `SO_BINDTODEVICE` is linux only.
#[cfg(target_os = "linux")]
pub fn bind_to_device<T: std::os::unix::io::AsRawFd>(socket: &T, iface: &str) -> Result<()> {
    let iface_bytes = iface.as_bytes();

    if unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_BINDTODEVICE,
            iface_bytes.as_ptr() as *const libc::c_void,
            iface_bytes.len() as libc::socklen_t,
        )
    } < 0
    {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};

    #[test]
    fn read_shutdown_keeps_write_half() {
        let lis = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(lis.local_addr().unwrap()).unwrap();
        let (mut server, _) = lis.accept().unwrap();

        shutdown_read(&server).unwrap();

        server.write_all(b"still writable").unwrap();
        let mut buf = [0u8; 14];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"still writable");

        let mut rest = [0u8; 1];
        assert_eq!(server.read(&mut rest).unwrap(), 0);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn socket_family_follows_address() {
        let v4 = new_tcp_socket(&"127.0.0.1:0".parse().unwrap()).unwrap();
        assert_eq!(v4.domain().unwrap(), Domain::IPV4);
    }
}
