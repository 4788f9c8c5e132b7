//! `m4250 status`: device health summary.

use m4250_core::{Switch, SwitchConfig, Uptime};
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct StatusView {
    name: String,
    host: String,
    active_ports: u32,
    cpu_usage_percent: f64,
    memory_usage_percent: f64,
    uptime: Uptime,
}

fn detail(s: &StatusView) -> String {
    [
        format!("Name:         {}", s.name),
        format!("Host:         {}", s.host),
        format!("Active ports: {}", s.active_ports),
        format!("CPU:          {:.1}%", s.cpu_usage_percent),
        format!("Memory:       {:.1}%", s.memory_usage_percent),
        format!("Uptime:       {}", uptime_display(&s.uptime)),
    ]
    .join("\n")
}

fn uptime_display(uptime: &Uptime) -> String {
    match uptime {
        Uptime::Seconds(secs) => {
            humantime::format_duration(std::time::Duration::from_secs(*secs)).to_string()
        }
        Uptime::Text(text) => text.clone(),
    }
}

pub async fn handle(config: SwitchConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let host = config
        .url
        .host_str()
        .map_or_else(|| config.url.to_string(), str::to_owned);

    let view = Switch::oneshot(config, |switch| async move {
        let name = switch.device_name().await?;
        switch.refresh().await?;
        Ok(switch.device_status().map(|status| StatusView {
            name,
            host,
            active_ports: status.active_port_count,
            cpu_usage_percent: status.cpu_usage_percent,
            memory_usage_percent: status.memory_usage_percent,
            uptime: status.uptime.clone(),
        }))
    })
    .await?;

    let view = view.ok_or_else(|| CliError::ApiError {
        message: "device status could not be read".into(),
    })?;

    let out = output::render_single(&global.output, &view, detail, |s| {
        format!("{}\t{}", s.name, uptime_display(&s.uptime))
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
