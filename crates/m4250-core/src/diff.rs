// ── Field-level diff ──
//
// Compares two successive observations of a resource and reports which
// (port, field) pairs changed. A port seen for the first time reports all
// of its fields. Ports are matched by id, never by position.

use m4250_api::{DeviceStatus, PoeConfigTable, PoePortConfig, PortStats, PortStatsTable};
use serde::Serialize;
use strum::Display;

/// A published resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    DeviceStatus,
    PoeConfig,
    PortStats,
}

/// A tracked field of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    // device status
    ActivePorts,
    CpuUsage,
    MemoryUsage,
    Uptime,
    // PoE config
    PoeEnabled,
    PoeStatus,
    PoePower,
    // port stats
    LinkSpeed,
    Vlans,
}

impl Field {
    pub fn resource(self) -> Resource {
        match self {
            Self::ActivePorts | Self::CpuUsage | Self::MemoryUsage | Self::Uptime => {
                Resource::DeviceStatus
            }
            Self::PoeEnabled | Self::PoeStatus | Self::PoePower => Resource::PoeConfig,
            Self::LinkSpeed | Self::Vlans => Resource::PortStats,
        }
    }
}

/// One changed field. `port_id` is `None` for device-wide fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Change {
    pub resource: Resource,
    pub port_id: Option<u32>,
    pub field: Field,
}

impl Change {
    fn device(field: Field) -> Self {
        Self {
            resource: field.resource(),
            port_id: None,
            field,
        }
    }

    fn port(port_id: u32, field: Field) -> Self {
        Self {
            resource: field.resource(),
            port_id: Some(port_id),
            field,
        }
    }
}

/// Everything that changed in one tick, in emission order: PoE first,
/// then link statistics, then device status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
    /// The set of known ports changed, so per-port definitions must be
    /// announced again.
    pub layout_changed: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && !self.layout_changed
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn contains(&self, port_id: Option<u32>, field: Field) -> bool {
        self.changes
            .iter()
            .any(|c| c.port_id == port_id && c.field == field)
    }

    pub fn for_port(&self, port_id: u32) -> impl Iterator<Item = &Change> {
        self.changes
            .iter()
            .filter(move |c| c.port_id == Some(port_id))
    }
}

pub fn diff_poe(previous: Option<&PoeConfigTable>, next: &PoeConfigTable) -> Vec<Change> {
    let mut changes = Vec::new();
    for port in next {
        let prior = previous.and_then(|p| p.find(port.port_id));
        for field in poe_changed_fields(prior, port) {
            changes.push(Change::port(port.port_id, field));
        }
    }
    changes
}

fn poe_changed_fields(prior: Option<&PoePortConfig>, port: &PoePortConfig) -> Vec<Field> {
    let Some(prior) = prior else {
        return vec![Field::PoeEnabled, Field::PoeStatus, Field::PoePower];
    };
    let mut fields = Vec::new();
    if prior.enabled != port.enabled {
        fields.push(Field::PoeEnabled);
    }
    if prior.status != port.status {
        fields.push(Field::PoeStatus);
    }
    if !same_f64(prior.current_power_mw, port.current_power_mw) {
        fields.push(Field::PoePower);
    }
    fields
}

pub fn diff_stats(previous: Option<&PortStatsTable>, next: &PortStatsTable) -> Vec<Change> {
    let mut changes = Vec::new();
    for port in next {
        let prior = previous.and_then(|p| p.find(port.port_id));
        for field in stats_changed_fields(prior, port) {
            changes.push(Change::port(port.port_id, field));
        }
    }
    changes
}

fn stats_changed_fields(prior: Option<&PortStats>, port: &PortStats) -> Vec<Field> {
    let Some(prior) = prior else {
        return vec![Field::LinkSpeed, Field::Vlans];
    };
    let mut fields = Vec::new();
    if prior.link_speed != port.link_speed {
        fields.push(Field::LinkSpeed);
    }
    if prior.vlans != port.vlans {
        fields.push(Field::Vlans);
    }
    fields
}

pub fn diff_device(previous: Option<&DeviceStatus>, next: &DeviceStatus) -> Vec<Change> {
    let Some(prior) = previous else {
        return [
            Field::ActivePorts,
            Field::CpuUsage,
            Field::MemoryUsage,
            Field::Uptime,
        ]
        .into_iter()
        .map(Change::device)
        .collect();
    };
    let mut changes = Vec::new();
    if prior.active_port_count != next.active_port_count {
        changes.push(Change::device(Field::ActivePorts));
    }
    if !same_f64(prior.cpu_usage_percent, next.cpu_usage_percent) {
        changes.push(Change::device(Field::CpuUsage));
    }
    if !same_f64(prior.memory_usage_percent, next.memory_usage_percent) {
        changes.push(Change::device(Field::MemoryUsage));
    }
    if prior.uptime != next.uptime {
        changes.push(Change::device(Field::Uptime));
    }
    changes
}

/// Bitwise equality: the values come from the same parser, so identical
/// wire text yields identical bits.
fn same_f64(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}
