//! Port link command handlers.

use m4250_core::{PortStats, Switch, SwitchConfig};
use tabled::Tabled;

use crate::cli::{GlobalOpts, PortsArgs, PortsCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Port")]
    port: u32,
    #[tabled(rename = "Link")]
    link: String,
    #[tabled(rename = "VLANs")]
    vlans: String,
}

pub async fn handle(config: SwitchConfig, args: PortsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PortsCommand::List => list(config, global).await,
    }
}

async fn list(config: SwitchConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let stats = Switch::oneshot(config, |switch| async move {
        switch.refresh().await?;
        Ok(switch.port_stats())
    })
    .await?
    .ok_or_else(|| CliError::ApiError {
        message: "port statistics could not be read".into(),
    })?;

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        stats.all(),
        |p: &PortStats| PortRow {
            port: p.port_id,
            link: output::paint_state(&p.link_speed.to_string(), p.has_link(), color),
            vlans: p.vlans_display(),
        },
        |p| format!("{}\t{}", p.port_id, if p.has_link() { "up" } else { "down" }),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
