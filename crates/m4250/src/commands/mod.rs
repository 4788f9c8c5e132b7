//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod poe;
pub mod ports;
pub mod status;
pub mod system;
pub mod util;
pub mod watch;

use m4250_core::SwitchConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a switch-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    config: SwitchConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(config, global).await,
        Command::Poe(args) => poe::handle(config, args, global).await,
        Command::Ports(args) => ports::handle(config, args, global).await,
        Command::Reboot => system::reboot(config, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
