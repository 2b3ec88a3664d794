//! Background eviction of servers whose heartbeats stopped.
//!
//! A server that neither pings nor removes itself is presumed dead once
//! its last heartbeat is older than the stale timeout. The sweeper evicts
//! it and deadvertises its system to every connected peer, so listings
//! never accumulate unreachable servers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use relay_core::{Notification, ServerRegistry};
use tokio::sync::{watch, Mutex};
use tokio::time::interval;
use tracing::info;

use crate::application::transport::PeerSink;

/// Runs sweep cycles on a fixed period until shutdown is signalled.
pub async fn run_sweeper(
    registry: Arc<Mutex<ServerRegistry>>,
    peers: Arc<dyn PeerSink>,
    period: Duration,
    stale_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    // The first tick of `interval` fires immediately.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep_cycle(&registry, peers.as_ref(), stale_timeout, Instant::now()).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("expiry sweeper stopped");
}

/// Evicts every record staler than `stale_timeout` as of `now` and
/// deadvertises each evicted system. Returns the eviction count.
pub async fn sweep_cycle(
    registry: &Mutex<ServerRegistry>,
    peers: &dyn PeerSink,
    stale_timeout: Duration,
    now: Instant,
) -> usize {
    let evicted = {
        let mut registry = registry.lock().await;
        registry.evict_stale(stale_timeout, now)
    };
    let count = evicted.len();
    for record in evicted {
        info!(
            "evicted stale server {} hosting {} (last heartbeat {:?} ago)",
            record.id,
            record.system,
            record.age(now)
        );
        peers
            .broadcast(
                Notification::Deadvertise {
                    system: record.system,
                }
                .encode(),
                None,
            )
            .await;
    }
    count
}

// ── Tests ─────────────────────────────────────────────────────────────────────
