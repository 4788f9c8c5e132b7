//! `m4250 reboot`.

use m4250_core::{Switch, SwitchConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn reboot(config: SwitchConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let host = config.url.host_str().unwrap_or("the switch").to_owned();
    if !util::confirm(&format!("Reboot {host}?"), "reboot", global.yes)? {
        return Ok(());
    }

    let result = Switch::oneshot(config, |switch| async move { switch.reboot().await }).await?;
    output::print_output(&result.to_string(), global.quiet);
    Ok(())
}
