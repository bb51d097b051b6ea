#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, Instant};

use pivot_core::endpoint::ConnectOpts;
use pivot_core::registry::Registry;
use pivot_core::tcp::{bind, serve_listener};

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Start a pivot on an ephemeral port.
pub fn spawn_pivot(seed: Option<&str>) -> (SocketAddr, Registry) {
    spawn_pivot_with(seed, ConnectOpts::default())
}

pub fn spawn_pivot_with(seed: Option<&str>, conn_opts: ConnectOpts) -> (SocketAddr, Registry) {
    let lis = bind(&"127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = lis.local_addr().unwrap();
    let registry = Registry::new();
    tokio::spawn(serve_listener(lis, seed.map(String::from), conn_opts, registry.clone()));
    (addr, registry)
}

/// Echo every byte back, then half-close once the peer has.
pub async fn spawn_echo() -> SocketAddr {
    let lis = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = lis.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (stream, _) = lis.accept().await.unwrap();
            tokio::spawn(async move {
                let (mut r, mut w) = stream.into_split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
                let _ = w.shutdown().await;
            });
        }
    });
    addr
}

/// Send everything, half-close, collect everything.
pub async fn round_trip(stream: TcpStream, data: &[u8]) -> Vec<u8> {
    let (mut r, mut w) = stream.into_split();
    let data = data.to_vec();
    let writer = tokio::spawn(async move {
        w.write_all(&data).await.unwrap();
        w.shutdown().await.unwrap();
        w
    });
    let mut out = Vec::new();
    r.read_to_end(&mut out).await.unwrap();
    let _ = writer.await.unwrap();
    out
}

/// Poll `f` until it holds, panic after two seconds.
pub async fn eventually<F: FnMut() -> bool>(mut f: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !f() {
        assert!(Instant::now() < deadline, "condition not met in time");
        sleep(Duration::from_millis(10)).await;
    }
}
