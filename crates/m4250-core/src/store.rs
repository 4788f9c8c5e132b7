// ── Published state ──
//
// The last-known view of the switch, published through a watch channel.
// Every resource is replaced wholesale; a resource whose fetch failed in
// a tick keeps its previous value. Only the poll loop writes, so merges
// never race each other.

use std::sync::Arc;

use m4250_api::{DeviceStatus, PoeConfigTable, PortStatsTable};
use tokio::sync::watch;

use crate::diff::{self, ChangeSet};

/// One consistent view of the switch.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub device_status: Option<Arc<DeviceStatus>>,
    pub poe_config: Option<Arc<PoeConfigTable>>,
    pub port_stats: Option<Arc<PortStatsTable>>,
    /// Port ids whose per-port definitions have been announced.
    announced_poe_ports: Vec<u32>,
    announced_stats_ports: Vec<u32>,
}

impl Snapshot {
    pub fn poe_enabled(&self, port_id: u32) -> Option<bool> {
        self.poe_config
            .as_ref()
            .and_then(|t| t.find(port_id))
            .map(|p| p.enabled)
    }

    pub fn has_link(&self, port_id: u32) -> Option<bool> {
        self.port_stats
            .as_ref()
            .and_then(|t| t.find(port_id))
            .map(m4250_api::PortStats::has_link)
    }

    pub fn poe_port_ids(&self) -> Vec<u32> {
        self.poe_config
            .as_ref()
            .map(|t| t.port_ids())
            .unwrap_or_default()
    }

    pub fn stats_port_ids(&self) -> Vec<u32> {
        self.port_stats
            .as_ref()
            .map(|t| t.port_ids())
            .unwrap_or_default()
    }
}

/// Results of one tick's fetches. `None` means that fetch failed.
#[derive(Debug, Default)]
pub struct Fetched {
    pub device_status: Option<DeviceStatus>,
    pub poe_config: Option<PoeConfigTable>,
    pub port_stats: Option<PortStatsTable>,
}

/// Owner of the published [`Snapshot`].
#[derive(Debug)]
pub struct StateStore {
    snapshot: watch::Sender<Arc<Snapshot>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::default()));
        Self { snapshot }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    /// Merge successful fetches, diff them against the previous snapshot,
    /// and publish the result.
    pub fn apply(&self, fetched: Fetched) -> ChangeSet {
        let previous = self.snapshot();
        let mut next = (*previous).clone();
        let mut changes = ChangeSet::default();

        // PoE first so a port switched off never reads as still linked
        // within the same tick.
        if let Some(poe) = fetched.poe_config {
            changes
                .changes
                .extend(diff::diff_poe(previous.poe_config.as_deref(), &poe));
            let ids = poe.port_ids();
            if !ids.is_empty() && ids != next.announced_poe_ports {
                next.announced_poe_ports = ids;
                changes.layout_changed = true;
            }
            next.poe_config = Some(Arc::new(poe));
        }

        if let Some(stats) = fetched.port_stats {
            changes
                .changes
                .extend(diff::diff_stats(previous.port_stats.as_deref(), &stats));
            let ids = stats.port_ids();
            if !ids.is_empty() && ids != next.announced_stats_ports {
                next.announced_stats_ports = ids;
                changes.layout_changed = true;
            }
            next.port_stats = Some(Arc::new(stats));
        }

        if let Some(status) = fetched.device_status {
            changes
                .changes
                .extend(diff::diff_device(previous.device_status.as_deref(), &status));
            next.device_status = Some(Arc::new(status));
        }

        self.snapshot.send_replace(Arc::new(next));
        changes
    }

    /// Discard everything, including the announced layout.
    pub fn clear(&self) {
        self.snapshot.send_replace(Arc::new(Snapshot::default()));
    }
}
