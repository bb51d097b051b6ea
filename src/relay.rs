use std::future::Future;
use std::time::Duration;

use futures::future::join_all;

use pivot_core::endpoint::Endpoint;
use pivot_core::tcp::serve;
use pivot_core::Registry;

use crate::consts::SHUTDOWN_GRACE_MS;

/// Serve every endpoint until ctrl-c.
pub async fn run(endpoints: Vec<Endpoint>) {
    let registry = Registry::new();
    run_until(endpoints, registry, ctrl_c()).await
}

/// Serve every endpoint until `shutdown` resolves or every listener has
/// stopped, then hang up the sessions that are still live, including
/// those a pending dispatch registers afterwards.
pub async fn run_until<F>(endpoints: Vec<Endpoint>, registry: Registry, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut workers: Vec<_> = endpoints
        .into_iter()
        .map(|ep| tokio::spawn(serve(ep, registry.clone())))
        .collect();

    tokio::select! {
        _ = join_all(workers.iter_mut()) => {
            log::warn!("[relay]no listener left");
        }
        _ = shutdown => {
            log::info!("[relay]shutting down, {} live sessions", registry.len());
        }
    }

    // sessions a dispatch registers from here on are closed at once
    let closed = registry.shutdown();

    for worker in workers.iter() {
        worker.abort();
    }
    // dropping a listener task aborts its pending dispatches
    join_all(workers).await;

    if closed == 0 && registry.is_empty() {
        return;
    }

    let drained = tokio::time::timeout(Duration::from_millis(SHUTDOWN_GRACE_MS), async {
        while !registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    match drained {
        Ok(_) => log::info!("[relay]all sessions closed"),
        Err(_) => log::warn!("[relay]{} sessions still open at exit", registry.len()),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("[relay]unable to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
