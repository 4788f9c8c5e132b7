// Switch API response types
//
// Wire models for the M4250 `/api/v1/` endpoints. Shapes are validated at
// this boundary: enum codes outside their documented range and missing
// required fields fail deserialization instead of propagating as nulls.
// Numeric metrics are parsed leniently because firmware versions disagree
// on whether they are JSON numbers or strings like `"12.5%"`.

use std::fmt;

use secrecy::SecretString;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use strum::Display;

use crate::error::Error;

/// Read-only key carried by every PoE port object; must not be sent back.
pub const POE_PORT_ID_FIELD: &str = "portid";

/// `speed` code the switch reports for a port with no link.
pub const NO_LINK_SPEED_CODE: i64 = 130;

// ── Response status block ────────────────────────────────────────────

/// The `resp` block attached to switch responses.
///
/// ```json
/// { "resp": { "status": "success", "respCode": 0, "respMsg": "Operation success" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub resp_code: Option<i64>,
    #[serde(default)]
    pub resp_msg: Option<String>,
}

impl RespStatus {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// Best available human-readable failure description.
    pub fn message(&self) -> String {
        self.resp_msg
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("status={}", self.status))
    }
}

// ── Login ────────────────────────────────────────────────────────────

/// Body of `POST login`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub resp: RespStatus,
    #[serde(default)]
    pub login: Option<LoginBody>,
}

#[derive(Deserialize)]
pub(crate) struct LoginBody {
    token: String,
    #[serde(deserialize_with = "lenient::u64")]
    expire: u64,
}

impl fmt::Debug for LoginBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginBody")
            .field("token", &"[REDACTED]")
            .field("expire", &self.expire)
            .finish()
    }
}

/// A freshly issued bearer token and its server-declared lifetime.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub token: SecretString,
    /// Token lifetime in seconds.
    pub expire_secs: u64,
}

impl From<LoginBody> for LoginGrant {
    fn from(body: LoginBody) -> Self {
        Self {
            token: SecretString::from(body.token),
            expire_secs: body.expire,
        }
    }
}

// ── Device info ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceInfoEnvelope {
    pub device_info: DeviceStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceNameEnvelope {
    pub device_name: DeviceName,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceName {
    pub name: String,
}

/// Health summary from `GET device_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(
        rename(deserialize = "numOfActivePorts"),
        deserialize_with = "lenient::u32"
    )]
    pub active_port_count: u32,
    #[serde(rename(deserialize = "cpuUsage"), deserialize_with = "lenient::f64")]
    pub cpu_usage_percent: f64,
    #[serde(rename(deserialize = "memoryUsage"), deserialize_with = "lenient::f64")]
    pub memory_usage_percent: f64,
    #[serde(rename(deserialize = "upTime"))]
    pub uptime: Uptime,
}

/// Device uptime. Numeric values are seconds; anything else is the
/// firmware's own formatted text, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Uptime {
    Seconds(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for Uptime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .map(Uptime::Seconds)
                .ok_or_else(|| de::Error::custom(format!("invalid uptime: {n}"))),
            Value::String(s) => Ok(s
                .trim()
                .parse::<u64>()
                .map_or(Uptime::Text(s), Uptime::Seconds)),
            other => Err(de::Error::custom(format!("invalid uptime: {other}"))),
        }
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Seconds(total) => {
                let days = total / 86_400;
                let hours = (total % 86_400) / 3_600;
                let minutes = (total % 3_600) / 60;
                let seconds = total % 60;
                if days > 0 {
                    write!(f, "{days}d {hours:02}:{minutes:02}:{seconds:02}")
                } else {
                    write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
                }
            }
        }
    }
}

// ── Enumerated codes ─────────────────────────────────────────────────

/// PoE delivery state reported in `swcfg_poe` (`status`, codes -1..=7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(try_from = "i64", into = "i64")]
pub enum PoeStatus {
    /// -1: the switch could not determine a state.
    Invalid,
    Disabled,
    Searching,
    #[strum(serialize = "Delivering Power")]
    DeliveringPower,
    Test,
    Fault,
    #[strum(serialize = "Other Fault")]
    OtherFault,
    #[strum(serialize = "Requesting Power")]
    RequestingPower,
    Overload,
}

impl PoeStatus {
    pub fn code(self) -> i64 {
        match self {
            Self::Invalid => -1,
            Self::Disabled => 0,
            Self::Searching => 1,
            Self::DeliveringPower => 2,
            Self::Test => 3,
            Self::Fault => 4,
            Self::OtherFault => 5,
            Self::RequestingPower => 6,
            Self::Overload => 7,
        }
    }

    pub fn is_fault(self) -> bool {
        matches!(self, Self::Fault | Self::OtherFault | Self::Overload)
    }
}

impl TryFrom<i64> for PoeStatus {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Ok(match code {
            -1 => Self::Invalid,
            0 => Self::Disabled,
            1 => Self::Searching,
            2 => Self::DeliveringPower,
            3 => Self::Test,
            4 => Self::Fault,
            5 => Self::OtherFault,
            6 => Self::RequestingPower,
            7 => Self::Overload,
            other => return Err(format!("PoE status code {other} outside -1..=7")),
        })
    }
}

impl From<PoeStatus> for i64 {
    fn from(status: PoeStatus) -> Self {
        status.code()
    }
}

/// Negotiated link speed from `sw_portstats` (`speed`).
///
/// Only the "no link" sentinel has a documented meaning; every other code
/// means the port is up and is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum LinkSpeed {
    NoLink,
    Linked { code: u16 },
}

impl LinkSpeed {
    pub fn is_up(self) -> bool {
        matches!(self, Self::Linked { .. })
    }

    pub fn code(self) -> i64 {
        match self {
            Self::NoLink => NO_LINK_SPEED_CODE,
            Self::Linked { code } => i64::from(code),
        }
    }
}

impl TryFrom<i64> for LinkSpeed {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        if code == NO_LINK_SPEED_CODE {
            return Ok(Self::NoLink);
        }
        u16::try_from(code)
            .map(|code| Self::Linked { code })
            .map_err(|_| format!("link speed code {code} out of range"))
    }
}

impl From<LinkSpeed> for i64 {
    fn from(speed: LinkSpeed) -> Self {
        speed.code()
    }
}

impl fmt::Display for LinkSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLink => f.write_str("Down"),
            Self::Linked { code } => write!(f, "Up ({code})"),
        }
    }
}

// ── PoE port configuration ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PoeConfigEnvelope {
    pub poe_port_config: Vec<PoePortConfig>,
}

/// Per-port PoE configuration from `GET swcfg_poe?portid=ALL`.
///
/// The switch expects writes to carry the whole object back, so the
/// original JSON object is retained alongside the typed view and used as
/// the base of every write body.
#[derive(Debug, Clone, PartialEq)]
pub struct PoePortConfig {
    pub port_id: u32,
    pub enabled: bool,
    pub status: PoeStatus,
    pub current_power_mw: f64,
    raw: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoePortFields {
    #[serde(deserialize_with = "lenient::u32")]
    portid: u32,
    enable: bool,
    status: PoeStatus,
    #[serde(deserialize_with = "lenient::f64")]
    current_power: f64,
}

impl PoePortConfig {
    /// Parse a single port object, keeping every field the switch sent.
    pub fn from_raw(raw: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let fields: PoePortFields = serde_json::from_value(Value::Object(raw.clone()))?;
        Ok(Self {
            port_id: fields.portid,
            enabled: fields.enable,
            status: fields.status,
            current_power_mw: fields.current_power,
            raw,
        })
    }

    /// The object exactly as the switch reported it.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn current_power_watts(&self) -> f64 {
        self.current_power_mw / 1000.0
    }

    /// The write body for an enable/disable: every field as read, the
    /// read-only port id stripped, `enable` overwritten.
    pub fn with_enabled(&self, enabled: bool) -> Map<String, Value> {
        let mut body = self.writable_fields();
        body.insert("enable".into(), Value::Bool(enabled));
        body
    }

    /// The write body for a PoE power cycle.
    pub fn with_reset(&self) -> Map<String, Value> {
        let mut body = self.writable_fields();
        body.insert("reset".into(), Value::Bool(true));
        body
    }

    fn writable_fields(&self) -> Map<String, Value> {
        let mut body = self.raw.clone();
        body.remove(POE_PORT_ID_FIELD);
        body
    }
}

impl<'de> Deserialize<'de> for PoePortConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(de::Error::custom)
    }
}

impl Serialize for PoePortConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

// ── Port statistics ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PortStatsEnvelope {
    pub switch_stats_port: Vec<PortStats>,
}

/// Per-port link statistics from `GET sw_portstats?portid=ALL`.
///
/// Only the fields the engine tracks are typed; the rest land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortStats {
    #[serde(rename = "portId", deserialize_with = "lenient::u32")]
    pub port_id: u32,
    #[serde(rename = "speed")]
    pub link_speed: LinkSpeed,
    /// VLAN membership, opaque to the engine.
    #[serde(default)]
    pub vlans: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PortStats {
    pub fn has_link(&self) -> bool {
        self.link_speed.is_up()
    }

    /// VLAN membership rendered for display.
    pub fn vlans_display(&self) -> String {
        match &self.vlans {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            other => other.to_string(),
        }
    }
}

// ── Keyed collections ────────────────────────────────────────────────

/// An entry addressable by its physical port id.
pub trait PortEntry {
    fn port_id(&self) -> u32;
}

impl PortEntry for PoePortConfig {
    fn port_id(&self) -> u32 {
        self.port_id
    }
}

impl PortEntry for PortStats {
    fn port_id(&self) -> u32 {
        self.port_id
    }
}

/// Ordered per-port collection, in the order the switch returned it.
///
/// Switches have a few dozen ports at most, so lookups are linear scans.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PortCollection<T> {
    entries: Vec<T>,
}

pub type PoeConfigTable = PortCollection<PoePortConfig>;
pub type PortStatsTable = PortCollection<PortStats>;

impl<T> Default for PortCollection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: PortEntry> PortCollection<T> {
    /// Build a collection, rejecting duplicate port ids.
    pub fn new(entries: Vec<T>) -> Result<Self, Error> {
        for (idx, entry) in entries.iter().enumerate() {
            let id = entry.port_id();
            if entries.iter().skip(idx + 1).any(|e| e.port_id() == id) {
                return Err(Error::Deserialization {
                    message: format!("duplicate port id {id}"),
                    body: String::new(),
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn all(&self) -> &[T] {
        &self.entries
    }

    pub fn has(&self, port_id: u32) -> bool {
        self.entries.iter().any(|e| e.port_id() == port_id)
    }

    pub fn find(&self, port_id: u32) -> Option<&T> {
        self.entries.iter().find(|e| e.port_id() == port_id)
    }

    pub fn get(&self, port_id: u32) -> Result<&T, Error> {
        self.find(port_id).ok_or(Error::PortNotFound { port_id })
    }

    pub fn port_ids(&self) -> Vec<u32> {
        self.entries.iter().map(PortEntry::port_id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

impl<'a, T> IntoIterator for &'a PortCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Decode `value` as `T`, keeping the body for diagnostics on failure.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

// ── Lenient scalar parsing ───────────────────────────────────────────

mod lenient {
    use serde::de::{self, Deserialize, Deserializer};
    use serde_json::Value;

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').trim_end().parse().ok(),
            _ => None,
        }
    }

    fn as_u64(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub(super) fn f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        as_f64(&value).ok_or_else(|| de::Error::custom(format!("expected a number, got {value}")))
    }

    pub(super) fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        as_u64(&value)
            .ok_or_else(|| de::Error::custom(format!("expected an unsigned integer, got {value}")))
    }

    pub(super) fn u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let wide = u64(deserializer)?;
        ::core::primitive::u32::try_from(wide)
            .map_err(|_| de::Error::custom(format!("{wide} does not fit in u32")))
    }

    pub(super) fn opt_i64<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(None);
        }
        as_i64(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an integer, got {value}")))
    }
}
