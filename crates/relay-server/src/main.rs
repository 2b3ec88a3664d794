//! Relay daemon entry point.
//!
//! Wires the shared registry, peer table, and dispatcher together, then
//! runs the accept loop, event loop, and expiry sweeper until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_core::ServerRegistry;
use relay_server::application::relay::run_event_loop;
use relay_server::application::sweeper::run_sweeper;
use relay_server::application::transport::PeerSink;
use relay_server::application::Dispatcher;
use relay_server::infrastructure::network::{self, PeerTable};
use relay_server::infrastructure::storage::load_config;

/// Depth of the transport event channel feeding the event loop.
const EVENT_QUEUE_DEPTH: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;

    // RUST_LOG wins over the configured level when set.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.relay.log_level.clone())),
        )
        .init();

    info!("game server relay starting");

    let listen_addr = config.listen_addr().context("invalid listen address")?;
    let listener = network::bind(listen_addr)
        .await
        .context("failed to bind relay listener")?;
    info!("listening on {listen_addr}");

    let registry = Arc::new(Mutex::new(ServerRegistry::new()));
    let peers = Arc::new(PeerTable::new());
    let sink: Arc<dyn PeerSink> = Arc::clone(&peers) as Arc<dyn PeerSink>;
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), Arc::clone(&sink)));

    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let accept_task = tokio::spawn(network::run_accept_loop(
        listener,
        config.network.max_connections,
        Arc::clone(&peers),
        event_tx,
        shutdown_rx.clone(),
    ));
    let sweeper_task = tokio::spawn(run_sweeper(
        Arc::clone(&registry),
        Arc::clone(&sink),
        config.sweep_interval(),
        config.stale_timeout(),
        shutdown_rx.clone(),
    ));
    let event_loop_task = tokio::spawn(run_event_loop(event_rx, dispatcher, shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = accept_task.await;
    let _ = sweeper_task.await;
    let _ = event_loop_task.await;
    peers.clear().await;

    info!("relay stopped");
    Ok(())
}
