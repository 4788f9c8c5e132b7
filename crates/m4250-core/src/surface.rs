// ── Control-surface adapter ──
//
// Read-only mapping from the published snapshot to what a button panel
// consumes: named variables, boolean feedbacks, preset buttons, and the
// actions those buttons trigger. Definitions are re-announced only when
// the port layout changes, and variable values only for changed fields.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::command::{Command, CommandResult, PoeMode};
use crate::diff::{Change, ChangeSet, Field};
use crate::error::CoreError;
use crate::store::Snapshot;
use crate::switch::Switch;

// ── Colors & styles ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Self = Self(255, 255, 255);
    pub const BLACK: Self = Self(0, 0, 0);
    pub const GREEN: Self = Self(0, 200, 0);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonStyle {
    pub text: String,
    pub size: u8,
    pub color: Rgb,
    pub bgcolor: Rgb,
}

const BUTTON_TEXT_SIZE: u8 = 14;

// ── Variables ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDefinition {
    pub variable_id: String,
    pub name: String,
}

impl VariableDefinition {
    fn new(variable_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            variable_id: variable_id.into(),
            name: name.into(),
        }
    }
}

/// Variable id for a changed field.
///
/// `poe_enabled` has no variable; it is exposed through the
/// `poeEnabled` feedback.
pub fn variable_id(change: &Change) -> Option<String> {
    let port = change.port_id;
    match (change.field, port) {
        (Field::ActivePorts, None) => Some("active_ports".into()),
        (Field::CpuUsage, None) => Some("cpu_usage".into()),
        (Field::MemoryUsage, None) => Some("memory_usage".into()),
        (Field::Uptime, None) => Some("uptime".into()),
        (Field::LinkSpeed, Some(id)) => Some(format!("port_{id}_speed")),
        (Field::Vlans, Some(id)) => Some(format!("port_{id}_vlans")),
        (Field::PoeStatus, Some(id)) => Some(format!("port_{id}_poe_status")),
        (Field::PoePower, Some(id)) => Some(format!("port_{id}_poe_current_power")),
        _ => None,
    }
}

/// All variable definitions for the current port layout.
pub fn variable_definitions(snapshot: &Snapshot) -> Vec<VariableDefinition> {
    let mut definitions = vec![
        VariableDefinition::new("active_ports", "Active Ports"),
        VariableDefinition::new("memory_usage", "Memory Usage"),
        VariableDefinition::new("cpu_usage", "CPU Usage"),
        VariableDefinition::new("uptime", "Uptime"),
    ];
    for id in snapshot.stats_port_ids() {
        definitions.push(VariableDefinition::new(
            format!("port_{id}_speed"),
            format!("Port {id} - Speed"),
        ));
        definitions.push(VariableDefinition::new(
            format!("port_{id}_vlans"),
            format!("Port {id} - VLANS"),
        ));
    }
    for id in snapshot.poe_port_ids() {
        definitions.push(VariableDefinition::new(
            format!("port_{id}_poe_status"),
            format!("Port {id} - POE Status"),
        ));
        definitions.push(VariableDefinition::new(
            format!("port_{id}_poe_current_power"),
            format!("Port {id} - POE Draw"),
        ));
    }
    definitions
}

fn variable_value(snapshot: &Snapshot, change: &Change) -> Option<String> {
    let port = change.port_id;
    match change.field {
        Field::ActivePorts => snapshot
            .device_status
            .as_ref()
            .map(|d| d.active_port_count.to_string()),
        Field::CpuUsage => snapshot
            .device_status
            .as_ref()
            .map(|d| format!("{}%", d.cpu_usage_percent)),
        Field::MemoryUsage => snapshot
            .device_status
            .as_ref()
            .map(|d| format!("{}%", d.memory_usage_percent)),
        Field::Uptime => snapshot
            .device_status
            .as_ref()
            .map(|d| d.uptime.to_string()),
        Field::LinkSpeed => stats_port(snapshot, port).map(|p| p.link_speed.to_string()),
        Field::Vlans => stats_port(snapshot, port).map(m4250_api::PortStats::vlans_display),
        Field::PoeStatus => poe_port(snapshot, port).map(|p| p.status.to_string()),
        Field::PoePower => poe_port(snapshot, port).map(|p| format!("{} W", p.current_power_watts())),
        Field::PoeEnabled => None,
    }
}

fn stats_port(snapshot: &Snapshot, port: Option<u32>) -> Option<&m4250_api::PortStats> {
    snapshot.port_stats.as_ref()?.find(port?)
}

fn poe_port(snapshot: &Snapshot, port: Option<u32>) -> Option<&m4250_api::PoePortConfig> {
    snapshot.poe_config.as_ref()?.find(port?)
}

/// Values for the variables touched by `changes`.
pub fn variable_values(snapshot: &Snapshot, changes: &ChangeSet) -> BTreeMap<String, String> {
    changes
        .changes
        .iter()
        .filter_map(|change| Some((variable_id(change)?, variable_value(snapshot, change)?)))
        .collect()
}

/// Values for every variable the snapshot can fill.
pub fn all_variable_values(snapshot: &Snapshot) -> BTreeMap<String, String> {
    let mut changes = Vec::new();
    if snapshot.device_status.is_some() {
        changes.extend(
            [
                Field::ActivePorts,
                Field::CpuUsage,
                Field::MemoryUsage,
                Field::Uptime,
            ]
            .map(|field| Change {
                resource: field.resource(),
                port_id: None,
                field,
            }),
        );
    }
    for id in snapshot.stats_port_ids() {
        changes.extend([Field::LinkSpeed, Field::Vlans].map(|field| Change {
            resource: field.resource(),
            port_id: Some(id),
            field,
        }));
    }
    for id in snapshot.poe_port_ids() {
        changes.extend([Field::PoeStatus, Field::PoePower].map(|field| Change {
            resource: field.resource(),
            port_id: Some(id),
            field,
        }));
    }
    variable_values(
        snapshot,
        &ChangeSet {
            changes,
            layout_changed: false,
        },
    )
}

// ── Feedbacks ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString)]
pub enum FeedbackKind {
    #[strum(serialize = "poeEnabled")]
    #[serde(rename = "poeEnabled")]
    PoeEnabled,
    #[strum(serialize = "linkStatus")]
    #[serde(rename = "linkStatus")]
    LinkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackDefinition {
    pub id: FeedbackKind,
    pub name: &'static str,
    pub description: &'static str,
    /// Background applied while the feedback is true.
    pub active_bgcolor: Rgb,
}

pub fn feedback_definitions() -> Vec<FeedbackDefinition> {
    vec![
        FeedbackDefinition {
            id: FeedbackKind::PoeEnabled,
            name: "POE Enabled",
            description: "Change style if port has POE enabled",
            active_bgcolor: Rgb::GREEN,
        },
        FeedbackDefinition {
            id: FeedbackKind::LinkStatus,
            name: "Link Status",
            description: "Change style if port has active link",
            active_bgcolor: Rgb::GREEN,
        },
    ]
}

/// Evaluate a feedback. `None` means unknown: the port is not in the
/// snapshot.
pub fn evaluate_feedback(kind: FeedbackKind, port_id: u32, snapshot: &Snapshot) -> Option<bool> {
    match kind {
        FeedbackKind::PoeEnabled => snapshot.poe_enabled(port_id),
        FeedbackKind::LinkStatus => snapshot.has_link(port_id),
    }
}

/// Feedbacks whose result may differ after `changes`.
pub fn affected_feedbacks(changes: &ChangeSet) -> Vec<(FeedbackKind, u32)> {
    let mut affected: Vec<(FeedbackKind, u32)> = changes
        .changes
        .iter()
        .filter_map(|c| match (c.field, c.port_id) {
            (Field::PoeEnabled, Some(id)) => Some((FeedbackKind::PoeEnabled, id)),
            (Field::LinkSpeed, Some(id)) => Some((FeedbackKind::LinkStatus, id)),
            _ => None,
        })
        .collect();
    affected.dedup();
    affected
}

// ── Actions ──────────────────────────────────────────────────────

/// A button action. Port lists run one command per port, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetPoeEnabled { ports: Vec<u32>, mode: PoeMode },
    PowerCyclePoe { ports: Vec<u32> },
    Reboot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub takes_port: bool,
    pub takes_mode: bool,
}

pub fn action_definitions() -> Vec<ActionDefinition> {
    vec![
        ActionDefinition {
            id: Action::SET_POE_ENABLED,
            name: "Set POE",
            takes_port: true,
            takes_mode: true,
        },
        ActionDefinition {
            id: Action::POWER_CYCLE_POE,
            name: "Power Cycle POE",
            takes_port: true,
            takes_mode: false,
        },
        ActionDefinition {
            id: Action::REBOOT,
            name: "Reboot Switch",
            takes_port: false,
            takes_mode: false,
        },
    ]
}

impl Action {
    pub const SET_POE_ENABLED: &'static str = "setPoeEnabled";
    pub const POWER_CYCLE_POE: &'static str = "powerCyclePoe";
    pub const REBOOT: &'static str = "reboot";

    pub fn id(&self) -> &'static str {
        match self {
            Self::SetPoeEnabled { .. } => Self::SET_POE_ENABLED,
            Self::PowerCyclePoe { .. } => Self::POWER_CYCLE_POE,
            Self::Reboot => Self::REBOOT,
        }
    }

    /// Parse an invocation as a control surface sends it: an action id and
    /// an options object with `port` (number or list) and, for
    /// `setPoeEnabled`, `enabled` (`true`, `false` or `"toggle"`).
    pub fn from_invocation(action_id: &str, options: &Map<String, Value>) -> Result<Self, CoreError> {
        match action_id {
            Self::SET_POE_ENABLED => Ok(Self::SetPoeEnabled {
                ports: ports_option(options)?,
                mode: mode_option(options)?,
            }),
            Self::POWER_CYCLE_POE => Ok(Self::PowerCyclePoe {
                ports: ports_option(options)?,
            }),
            Self::REBOOT => Ok(Self::Reboot),
            other => Err(CoreError::Config {
                message: format!("unknown action '{other}'"),
            }),
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        match self {
            Self::SetPoeEnabled { ports, mode } => ports
                .iter()
                .map(|&port_id| Command::SetPoe {
                    port_id,
                    mode: *mode,
                })
                .collect(),
            Self::PowerCyclePoe { ports } => ports
                .iter()
                .map(|&port_id| Command::PowerCyclePoe { port_id })
                .collect(),
            Self::Reboot => vec![Command::Reboot],
        }
    }

    /// Run every command of the action against `switch`.
    pub async fn run(&self, switch: &Switch) -> Vec<(Command, Result<CommandResult, CoreError>)> {
        switch.execute_all(self.commands()).await
    }
}

fn ports_option(options: &Map<String, Value>) -> Result<Vec<u32>, CoreError> {
    let invalid = || CoreError::Config {
        message: "option 'port' must be a port number or a list of port numbers".into(),
    };
    let as_port = |v: &Value| -> Result<u32, CoreError> {
        v.as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|&n| n >= 1)
            .ok_or_else(invalid)
    };
    match options.get("port") {
        Some(Value::Array(items)) if !items.is_empty() => items.iter().map(as_port).collect(),
        Some(value @ Value::Number(_)) => Ok(vec![as_port(value)?]),
        _ => Err(invalid()),
    }
}

fn mode_option(options: &Map<String, Value>) -> Result<PoeMode, CoreError> {
    match options.get("enabled") {
        None | Some(Value::Bool(true)) => Ok(PoeMode::On),
        Some(Value::Bool(false)) => Ok(PoeMode::Off),
        Some(Value::String(s)) => s.parse().map_err(|_| CoreError::Config {
            message: format!("invalid PoE mode '{s}'"),
        }),
        Some(other) => Err(CoreError::Config {
            message: format!("invalid PoE mode {other}"),
        }),
    }
}

// ── Presets ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetDefinition {
    pub id: String,
    pub category: &'static str,
    pub name: String,
    pub style: ButtonStyle,
    /// Action run on press, if the button does anything.
    #[serde(skip)]
    pub on_press: Option<Action>,
    pub feedback: FeedbackKind,
    pub port_id: u32,
    pub feedback_bgcolor: Rgb,
}

/// One PoE toggle per PoE port, one link indicator per stats port.
pub fn preset_definitions(snapshot: &Snapshot) -> Vec<PresetDefinition> {
    let mut presets = Vec::new();
    for id in snapshot.poe_port_ids() {
        presets.push(PresetDefinition {
            id: format!("poe_{id}"),
            category: "POE",
            name: format!("POE Port {id}"),
            style: button_style(format!("POE\\nPort {id}")),
            on_press: Some(Action::SetPoeEnabled {
                ports: vec![id],
                mode: PoeMode::Toggle,
            }),
            feedback: FeedbackKind::PoeEnabled,
            port_id: id,
            feedback_bgcolor: Rgb::GREEN,
        });
    }
    for id in snapshot.stats_port_ids() {
        presets.push(PresetDefinition {
            id: format!("link_{id}"),
            category: "Link Status",
            name: format!("Link Status Port {id}"),
            style: button_style(format!("Link\\nPort {id}")),
            on_press: None,
            feedback: FeedbackKind::LinkStatus,
            port_id: id,
            feedback_bgcolor: Rgb::GREEN,
        });
    }
    presets
}

fn button_style(text: String) -> ButtonStyle {
    ButtonStyle {
        text,
        size: BUTTON_TEXT_SIZE,
        color: Rgb::WHITE,
        bgcolor: Rgb::BLACK,
    }
}

// ── Surface sink ─────────────────────────────────────────────────

/// Something that renders the adapter's output.
pub trait ControlSurface {
    fn set_variable_definitions(&mut self, definitions: &[VariableDefinition]);
    fn set_variable_values(&mut self, values: &BTreeMap<String, String>);
    fn set_preset_definitions(&mut self, _presets: &[PresetDefinition]) {}
    fn check_feedbacks(&mut self, _affected: &[(FeedbackKind, u32)]) {}
}

/// Push one tick's changes to a surface.
pub fn publish(surface: &mut impl ControlSurface, snapshot: &Snapshot, changes: &ChangeSet) {
    if changes.layout_changed {
        surface.set_variable_definitions(&variable_definitions(snapshot));
        surface.set_preset_definitions(&preset_definitions(snapshot));
    }
    let values = variable_values(snapshot, changes);
    if !values.is_empty() {
        surface.set_variable_values(&values);
    }
    let affected = affected_feedbacks(changes);
    if !affected.is_empty() {
        surface.check_feedbacks(&affected);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use m4250_api::PortCollection;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::store::{Fetched, StateStore};

    fn populated() -> (StateStore, ChangeSet) {
        let store = StateStore::new();
        let changes = store.apply(Fetched {
            device_status: Some(
                serde_json::from_value(json!({
                    "numOfActivePorts": 2, "cpuUsage": "7%", "memoryUsage": 40.5, "upTime": 3725
                }))
                .unwrap(),
            ),
            poe_config: Some(
                PortCollection::new(vec![
                    serde_json::from_value(json!({
                        "portid": 1, "enable": true, "status": 2, "currentPower": 4300
                    }))
                    .unwrap(),
                ])
                .unwrap(),
            ),
            port_stats: Some(
                PortCollection::new(vec![
                    serde_json::from_value(json!({ "portId": 1, "speed": 5, "vlans": [1, 20] }))
                        .unwrap(),
                    serde_json::from_value(json!({ "portId": 2, "speed": 130, "vlans": [1] }))
                        .unwrap(),
                ])
                .unwrap(),
            ),
        });
        (store, changes)
    }

    #[test]
    fn definitions_follow_port_layout() {
        let (store, _) = populated();
        let ids: Vec<String> = variable_definitions(&store.snapshot())
            .into_iter()
            .map(|d| d.variable_id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "active_ports",
                "memory_usage",
                "cpu_usage",
                "uptime",
                "port_1_speed",
                "port_1_vlans",
                "port_2_speed",
                "port_2_vlans",
                "port_1_poe_status",
                "port_1_poe_current_power",
            ]
        );
    }

    #[test]
    fn first_tick_values() {
        let (store, changes) = populated();
        let values = variable_values(&store.snapshot(), &changes);
        assert_eq!(values["port_1_poe_status"], "Delivering Power");
        assert_eq!(values["port_1_poe_current_power"], "4.3 W");
        assert_eq!(values["port_2_speed"], "Down");
        assert_eq!(values["port_1_vlans"], "1,20");
        assert_eq!(values["cpu_usage"], "7%");
        assert_eq!(values["uptime"], "01:02:05");
        assert_eq!(values, all_variable_values(&store.snapshot()));
    }

    #[test]
    fn feedbacks_unknown_for_absent_ports() {
        let (store, _) = populated();
        let snapshot = store.snapshot();
        assert_eq!(
            evaluate_feedback(FeedbackKind::PoeEnabled, 1, &snapshot),
            Some(true)
        );
        assert_eq!(
            evaluate_feedback(FeedbackKind::LinkStatus, 2, &snapshot),
            Some(false)
        );
        assert_eq!(evaluate_feedback(FeedbackKind::PoeEnabled, 9, &snapshot), None);
        assert_eq!(FeedbackKind::LinkStatus.to_string(), "linkStatus");
    }

    #[test]
    fn presets_per_port() {
        let (store, _) = populated();
        let presets = preset_definitions(&store.snapshot());
        let ids: Vec<&str> = presets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["poe_1", "link_1", "link_2"]);
        assert_eq!(
            presets[0].on_press,
            Some(Action::SetPoeEnabled {
                ports: vec![1],
                mode: PoeMode::Toggle
            })
        );
        assert_eq!(presets[0].feedback_bgcolor, Rgb::GREEN);
        assert_eq!(presets[1].on_press, None);
    }

    #[test]
    fn action_invocation_parsing() {
        let options = json!({ "port": 3, "enabled": "toggle" });
        let action = Action::from_invocation("setPoeEnabled", options.as_object().unwrap()).unwrap();
        assert_eq!(
            action.commands(),
            vec![Command::SetPoe {
                port_id: 3,
                mode: PoeMode::Toggle
            }]
        );

        let options = json!({ "port": [1, 2] });
        let action = Action::from_invocation("powerCyclePoe", options.as_object().unwrap()).unwrap();
        assert_eq!(action.commands().len(), 2);

        let options = json!({ "port": 0 });
        assert!(Action::from_invocation("powerCyclePoe", options.as_object().unwrap()).is_err());
        assert!(Action::from_invocation("explode", &Map::new()).is_err());
        assert_eq!(
            Action::from_invocation("reboot", &Map::new()).unwrap().commands(),
            vec![Command::Reboot]
        );
    }

    #[derive(Default)]
    struct Recorder {
        definitions: usize,
        values: Vec<BTreeMap<String, String>>,
        feedbacks: Vec<(FeedbackKind, u32)>,
    }

    impl ControlSurface for Recorder {
        fn set_variable_definitions(&mut self, definitions: &[VariableDefinition]) {
            self.definitions = definitions.len();
        }
        fn set_variable_values(&mut self, values: &BTreeMap<String, String>) {
            self.values.push(values.clone());
        }
        fn check_feedbacks(&mut self, affected: &[(FeedbackKind, u32)]) {
            self.feedbacks.extend_from_slice(affected);
        }
    }

    #[test]
    fn publish_announces_layout_once() {
        let (store, changes) = populated();
        let mut surface = Recorder::default();
        publish(&mut surface, &store.snapshot(), &changes);
        assert_eq!(surface.definitions, 10);
        assert_eq!(surface.values.len(), 1);
        assert!(surface.feedbacks.contains(&(FeedbackKind::PoeEnabled, 1)));

        let mut quiet = Recorder::default();
        publish(&mut quiet, &store.snapshot(), &ChangeSet::default());
        assert_eq!(quiet.definitions, 0);
        assert!(quiet.values.is_empty());
    }
}
