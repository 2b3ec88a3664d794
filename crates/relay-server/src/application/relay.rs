//! The relay's single event loop.
//!
//! All transport events funnel through one receiver and are handled to
//! completion in arrival order, so registry mutations and the broadcasts
//! they trigger are never interleaved between two requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::info;

use crate::application::dispatcher::Dispatcher;
use crate::application::transport::TransportEvent;

/// Upper bound on one wait for an event before re-checking shutdown.
const EVENT_WAIT: Duration = Duration::from_millis(250);

/// Drains transport events until shutdown is signalled or every event
/// sender has gone away.
pub async fn run_event_loop(
    mut events: mpsc::Receiver<TransportEvent>,
    dispatcher: Arc<Dispatcher>,
    shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        match timeout(EVENT_WAIT, events.recv()).await {
            Ok(Some(event)) => dispatcher.handle_event(event).await,
            Ok(None) => break,
            Err(_) => {} // no event within the window, re-check shutdown
        }
    }
    info!("event loop stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
