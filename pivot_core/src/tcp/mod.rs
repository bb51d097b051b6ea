//! TCP relay entrance.
//!
//! [`serve`] binds and loops over `accept`; each connection is handed to
//! [`dispatch`] in its own task, which starts a [`RelaySession`] in yet
//! another task once the next hop is connected.

mod socket;
mod session;
mod dispatch;

use std::io::{ErrorKind, Result};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::endpoint::{Endpoint, ConnectOpts};
use crate::registry::Registry;

pub use socket::{bind, connect};
pub use session::{RelaySession, SessionEnd};
pub use dispatch::dispatch;

/// Bind `endpoint.laddr` and serve it until a fatal listener error.
pub async fn serve(endpoint: Endpoint, registry: Registry) -> Result<()> {
    let Endpoint {
        laddr,
        seed,
        conn_opts,
    } = endpoint;

    let lis = bind(&laddr).map_err(|e| {
        log::error!("[tcp]failed to bind {}: {}", &laddr, &e);
        e
    })?;

    serve_listener(lis, seed, conn_opts, registry).await
}

/// Accept on an already bound listener.
///
/// Transient accept errors are logged and skipped. Any other accept
/// error ends the loop and is returned; sessions already running are
/// left alone. Dispatches still in progress are aborted when the loop
/// ends or is dropped.
pub async fn serve_listener(
    lis: TcpListener,
    seed: Option<String>,
    conn_opts: ConnectOpts,
    registry: Registry,
) -> Result<()> {
    let seed: Option<Arc<str>> = seed.map(Arc::from);
    let conn_opts = Arc::new(conn_opts);
    let mut dispatching = JoinSet::new();

    loop {
        let accepted = tokio::select! {
            x = lis.accept() => x,
            Some(_) = dispatching.join_next(), if !dispatching.is_empty() => continue,
        };

        let (local, addr) = match accepted {
            Ok(x) => x,
            Err(e) if is_transient(&e) => {
                log::warn!("[tcp]failed to accept: {}", &e);
                if pivot_syscall::is_resource_exhausted(&e) {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                continue;
            }
            Err(e) => {
                log::error!("[tcp]listener failed: {}", &e);
                return Err(e);
            }
        };

        if let Err(e) = local.set_nodelay(true) {
            log::warn!("[tcp]failed to set no_delay option for incoming stream: {}", e);
        }

        let seed = seed.clone();
        let conn_opts = conn_opts.clone();
        let registry = registry.clone();

        dispatching.spawn(async move {
            if let Err(e) = dispatch(local, seed.as_deref(), &conn_opts, &registry).await {
                log::error!("[tcp]{}, dispatch aborted: {}", addr, e);
            }
        });
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted | ErrorKind::WouldBlock
    ) || pivot_syscall::is_resource_exhausted(e)
}
