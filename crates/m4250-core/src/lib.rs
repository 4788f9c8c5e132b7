//! Synchronization engine between `m4250-api` and control surfaces.
//!
//! - **[`Switch`]**: facade owning one switch connection. [`connect()`](Switch::connect)
//!   logs in, takes an initial snapshot, then runs a non-overlapping poll
//!   loop. [`Switch::oneshot()`] is the lightweight mode for single CLI
//!   invocations.
//!
//! - **[`SessionManager`]**: owns the bearer token, renews it ahead of
//!   expiry and after a failed liveness probe.
//!
//! - **[`StateStore`]**: the published [`Snapshot`] of device status, PoE
//!   configuration and port statistics, with field-level diffs
//!   ([`ChangeSet`]) emitted once per tick.
//!
//! - **[`Command`]**: read-modify-write mutations (PoE on/off/toggle,
//!   power cycle, reboot), serialized per port against each other and
//!   against the poll loop's PoE fetch.
//!
//! - **[`surface`]**: the control-surface adapter (variables, feedbacks,
//!   actions, presets) derived from the published state.

pub mod clock;
pub mod command;
pub mod config;
mod connection;
pub mod diff;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;
pub mod surface;
pub mod switch;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, CommandResult, PoeMode};
pub use config::{Credentials, SwitchConfig, TlsVerification};
pub use diff::{Change, ChangeSet, Field, Resource};
pub use engine::EngineState;
pub use error::CoreError;
pub use session::{Session, SessionManager};
pub use store::{Snapshot, StateStore};
pub use switch::{ConnectStage, ConnectionState, Switch};

// Wire types consumers need to read the snapshot.
pub use m4250_api::{
    DEFAULT_API_PORT, DeviceStatus, LinkSpeed, PoeConfigTable, PoePortConfig, PoeStatus,
    PortStats, PortStatsTable, Uptime,
};
