//! Shared helpers for command handlers.

use std::io::IsTerminal;

use m4250_core::{Command, CommandResult, CoreError};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Command outcomes ────────────────────────────────────────────────

/// One command's outcome, as rendered.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub port: Option<u32>,
    pub ok: bool,
    pub message: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Print every outcome, then turn failures into an error.
///
/// A single command's failure is returned as-is so it keeps its own
/// exit code; with several commands any failure yields `PartialFailure`.
pub fn report_outcomes(
    results: Vec<(Command, Result<CommandResult, CoreError>)>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let total = results.len();

    let mut outcomes = Vec::with_capacity(total);
    let mut errors = Vec::new();
    for (command, result) in results {
        let (ok, message) = match result {
            Ok(done) => (true, done.to_string()),
            Err(e) => {
                let message = format!("{command}: {e}");
                errors.push(e);
                (false, message)
            }
        };
        outcomes.push(Outcome {
            port: command.port_id(),
            ok,
            message,
        });
    }

    if total == 1 {
        if let Some(e) = errors.pop() {
            return Err(e.into());
        }
    }

    let out = output::render_list(
        &global.output,
        &outcomes,
        |o| OutcomeRow {
            port: o.port.map_or_else(|| "-".into(), |p| p.to_string()),
            result: if o.ok {
                output::paint_state("ok", true, color)
            } else {
                output::paint_fault("failed", true, color)
            },
            message: o.message.clone(),
        },
        |o| o.message.clone(),
    );
    output::print_output(&out, global.quiet);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::PartialFailure {
            failed: errors.len(),
            total,
        })
    }
}
