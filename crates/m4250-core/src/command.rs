// ── Command API ──
//
// Mutations against the switch. PoE writes are read-modify-write: the
// port's current object is fetched fresh, one field is changed, and the
// whole object is posted back. Each sequence holds its port's lock and
// the shared PoE gate, so neither another command on that port nor a
// poll fetch can land between the read and the write.

use std::fmt;

use m4250_api::REBOOT_DELAY_SECS;
use serde::Serialize;
use strum::{Display, EnumString};
use tracing::info;

use crate::connection::Connection;
use crate::error::CoreError;

/// Desired PoE state for a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum PoeMode {
    #[strum(to_string = "on", serialize = "enable", serialize = "true")]
    On,
    #[strum(to_string = "off", serialize = "disable", serialize = "false")]
    Off,
    /// Flip the state observed at the time of the write.
    #[strum(to_string = "toggle")]
    Toggle,
}

impl PoeMode {
    /// The `enable` value to write given the currently observed one.
    pub fn resolve(self, currently_enabled: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::Toggle => !currently_enabled,
        }
    }
}

/// All write operations against a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetPoe { port_id: u32, mode: PoeMode },
    PowerCyclePoe { port_id: u32 },
    Reboot,
}

impl Command {
    /// The port a command targets, if any.
    pub fn port_id(&self) -> Option<u32> {
        match self {
            Self::SetPoe { port_id, .. } | Self::PowerCyclePoe { port_id } => Some(*port_id),
            Self::Reboot => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetPoe { port_id, mode } => write!(f, "set PoE {mode} on port {port_id}"),
            Self::PowerCyclePoe { port_id } => write!(f, "power cycle PoE on port {port_id}"),
            Self::Reboot => f.write_str("reboot switch"),
        }
    }
}

/// Outcome of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    PoeSet { port_id: u32, enabled: bool },
    PoeCycled { port_id: u32 },
    RebootScheduled { after_secs: u64 },
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoeSet { port_id, enabled } => {
                let state = if *enabled { "enabled" } else { "disabled" };
                write!(f, "Port {port_id}: PoE {state}")
            }
            Self::PoeCycled { port_id } => write!(f, "Port {port_id}: PoE power cycled"),
            Self::RebootScheduled { after_secs } => {
                write!(f, "Switch rebooting in {after_secs}s")
            }
        }
    }
}

pub(crate) async fn execute(conn: &Connection, command: Command) -> Result<CommandResult, CoreError> {
    match command {
        Command::SetPoe { port_id, mode } => set_poe(conn, port_id, mode).await,
        Command::PowerCyclePoe { port_id } => power_cycle_poe(conn, port_id).await,
        Command::Reboot => reboot(conn).await,
    }
}

async fn set_poe(conn: &Connection, port_id: u32, mode: PoeMode) -> Result<CommandResult, CoreError> {
    let token = conn.session.ensure_valid().await?;
    let port = conn.lock_port(port_id).await;
    let _gate = conn.poe_read_gate().await;

    let table = conn.client.poe_config(&token).await?;
    let current = match table.get(port_id) {
        Ok(current) => current,
        Err(e) => {
            conn.forget_port(port_id, port);
            return Err(e.into());
        }
    };
    let enabled = mode.resolve(current.enabled);

    info!(port = port_id, %mode, enabled, "writing PoE state");
    conn.client.set_poe_enabled(&token, current, enabled).await?;
    Ok(CommandResult::PoeSet { port_id, enabled })
}

async fn power_cycle_poe(conn: &Connection, port_id: u32) -> Result<CommandResult, CoreError> {
    let token = conn.session.ensure_valid().await?;
    let port = conn.lock_port(port_id).await;
    let _gate = conn.poe_read_gate().await;

    let table = conn.client.poe_config(&token).await?;
    let current = match table.get(port_id) {
        Ok(current) => current,
        Err(e) => {
            conn.forget_port(port_id, port);
            return Err(e.into());
        }
    };

    info!(port = port_id, "power cycling PoE");
    conn.client.power_cycle_poe(&token, current).await?;
    Ok(CommandResult::PoeCycled { port_id })
}

async fn reboot(conn: &Connection) -> Result<CommandResult, CoreError> {
    let token = conn.session.ensure_valid().await?;
    info!(after_secs = REBOOT_DELAY_SECS, "rebooting switch");
    conn.client.reboot(&token).await?;
    Ok(CommandResult::RebootScheduled {
        after_secs: REBOOT_DELAY_SECS,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn poe_mode_parses_aliases() {
        assert_eq!("on".parse::<PoeMode>().unwrap(), PoeMode::On);
        assert_eq!("Enable".parse::<PoeMode>().unwrap(), PoeMode::On);
        assert_eq!("false".parse::<PoeMode>().unwrap(), PoeMode::Off);
        assert_eq!("TOGGLE".parse::<PoeMode>().unwrap(), PoeMode::Toggle);
        assert!("maybe".parse::<PoeMode>().is_err());
        assert_eq!(PoeMode::Off.to_string(), "off");
    }

    #[test]
    fn toggle_flips_observed_state() {
        assert!(PoeMode::Toggle.resolve(false));
        assert!(!PoeMode::Toggle.resolve(true));
        assert!(PoeMode::On.resolve(true));
        assert!(!PoeMode::Off.resolve(true));
    }

    #[test]
    fn command_display() {
        let cmd = Command::SetPoe {
            port_id: 3,
            mode: PoeMode::Toggle,
        };
        assert_eq!(cmd.to_string(), "set PoE toggle on port 3");
        assert_eq!(cmd.port_id(), Some(3));
        assert_eq!(Command::Reboot.port_id(), None);
        assert_eq!(
            CommandResult::PoeSet {
                port_id: 3,
                enabled: true
            }
            .to_string(),
            "Port 3: PoE enabled"
        );
    }
}
