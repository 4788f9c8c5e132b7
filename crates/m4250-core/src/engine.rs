// ── Poll loop ──
//
// One tick = ensure a valid token, then fetch device status, PoE config
// and port stats one after another, merge whatever succeeded, and diff.
// The next tick is armed only after the current one finishes, so ticks
// never overlap and the delay is measured from completion.

use std::time::Duration;

use m4250_api::Error as ApiError;
use serde::Serialize;
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::diff::{ChangeSet, Resource};
use crate::error::CoreError;
use crate::store::{Fetched, StateStore};
use crate::switch::Switch;

/// Poll loop state, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum EngineState {
    /// Waiting for the next tick.
    Idle,
    /// A tick is fetching.
    Ticking,
    /// No tick will run until the loop is started again.
    Stopped,
}

/// What one tick did.
#[derive(Debug, Default)]
pub(crate) struct TickReport {
    pub changes: ChangeSet,
    /// Fetches that failed this tick; their resources kept their old values.
    pub failures: Vec<(Resource, CoreError)>,
}

impl TickReport {
    const FETCH_COUNT: usize = 3;

    pub fn all_failed(&self) -> bool {
        self.failures.len() == Self::FETCH_COUNT
    }
}

/// Run one tick against `conn`, publishing into `store`.
///
/// Fails only when no valid token could be obtained; individual fetch
/// failures are reported in the [`TickReport`].
pub(crate) async fn tick(conn: &Connection, store: &StateStore) -> Result<TickReport, CoreError> {
    let _tick = conn.lock_tick().await;
    let token = conn.session.ensure_valid().await?;
    let mut failures = Vec::new();

    let device_status = keep_ok(
        conn,
        Resource::DeviceStatus,
        conn.client.device_info(&token).await,
        &mut failures,
    );

    let poe_config = {
        let _gate = conn.poe_write_gate().await;
        keep_ok(
            conn,
            Resource::PoeConfig,
            conn.client.poe_config(&token).await,
            &mut failures,
        )
    };

    let port_stats = keep_ok(
        conn,
        Resource::PortStats,
        conn.client.port_stats(&token).await,
        &mut failures,
    );

    let changes = store.apply(Fetched {
        device_status,
        poe_config,
        port_stats,
    });
    debug!(
        changes = changes.len(),
        layout_changed = changes.layout_changed,
        failed = failures.len(),
        "tick complete"
    );

    Ok(TickReport { changes, failures })
}

fn keep_ok<T>(
    conn: &Connection,
    resource: Resource,
    result: Result<T, ApiError>,
    failures: &mut Vec<(Resource, CoreError)>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%resource, error = %e, "fetch failed");
            if e.is_auth_expired() {
                conn.session.invalidate();
            }
            failures.push((resource, e.into()));
            None
        }
    }
}

/// The background loop: sleep, tick, repeat until cancelled.
///
/// Cancellation drops an in-flight tick; its results are never published.
pub(crate) async fn poll_task(switch: Switch, interval: Duration, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = switch.poll_once() => {}
        }
    }
    debug!("poll loop stopped");
}
