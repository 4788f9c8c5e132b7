//! PoE command handlers.

use m4250_core::{Command, PoeMode, PoePortConfig, Switch, SwitchConfig};
use tabled::Tabled;

use crate::cli::{GlobalOpts, PoeArgs, PoeCommand, PortList};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PoeRow {
    #[tabled(rename = "Port")]
    port: u32,
    #[tabled(rename = "PoE")]
    enabled: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Power")]
    power: String,
}

fn row(p: &PoePortConfig, color: bool) -> PoeRow {
    PoeRow {
        port: p.port_id,
        enabled: output::paint_state(on_off(p.enabled), p.enabled, color),
        status: output::paint_fault(&p.status.to_string(), p.status.is_fault(), color),
        power: format!("{:.1} W", p.current_power_watts()),
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

/// One command per port, in the order given.
fn commands_for(ports: &PortList, build: impl Fn(u32) -> Command) -> Vec<Command> {
    ports.ports.iter().copied().map(build).collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(config: SwitchConfig, args: PoeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let commands = match args.command {
        PoeCommand::List => return list(config, global).await,
        PoeCommand::On(ports) => commands_for(&ports, |port_id| Command::SetPoe {
            port_id,
            mode: PoeMode::On,
        }),
        PoeCommand::Off(ports) => commands_for(&ports, |port_id| Command::SetPoe {
            port_id,
            mode: PoeMode::Off,
        }),
        PoeCommand::Toggle(ports) => commands_for(&ports, |port_id| Command::SetPoe {
            port_id,
            mode: PoeMode::Toggle,
        }),
        PoeCommand::Cycle(ports) => {
            commands_for(&ports, |port_id| Command::PowerCyclePoe { port_id })
        }
    };

    let results =
        Switch::oneshot(config, |switch| async move { Ok(switch.execute_all(commands).await) })
            .await?;
    util::report_outcomes(results, global)
}

async fn list(config: SwitchConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let table = Switch::oneshot(config, |switch| async move {
        switch.refresh().await?;
        Ok(switch.poe_config())
    })
    .await?
    .ok_or_else(|| CliError::ApiError {
        message: "PoE configuration could not be read".into(),
    })?;

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        table.all(),
        |p| row(p, color),
        |p| format!("{}\t{}\t{}", p.port_id, on_off(p.enabled), p.status),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
