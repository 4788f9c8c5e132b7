//! `m4250 watch`: run the poll loop and print every change.
//!
//! The terminal acts as a control surface: variable values are printed as
//! they change, feedback flips are printed with their new state, and
//! connection state transitions go to stderr.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures_util::StreamExt;
use m4250_core::surface::{
    self, ControlSurface, FeedbackKind, PresetDefinition, VariableDefinition,
};
use m4250_core::{ConnectionState, Snapshot, Switch, SwitchConfig};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct TickView<'a> {
    at: String,
    variables: &'a BTreeMap<String, String>,
}

struct TerminalSurface<'a> {
    global: &'a GlobalOpts,
    color: bool,
    snapshot: Arc<Snapshot>,
}

impl<'a> TerminalSurface<'a> {
    fn new(global: &'a GlobalOpts, snapshot: Arc<Snapshot>) -> Self {
        Self {
            global,
            color: output::should_color(&global.color),
            snapshot,
        }
    }

    fn line_oriented(&self) -> bool {
        matches!(self.global.output, OutputFormat::Table | OutputFormat::Plain)
    }
}

fn timestamp() -> String {
    humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
}

impl ControlSurface for TerminalSurface<'_> {
    fn set_variable_definitions(&mut self, definitions: &[VariableDefinition]) {
        debug!(count = definitions.len(), "variable definitions announced");
        if self.line_oriented() && !self.global.quiet {
            eprintln!("tracking {} variables", definitions.len());
        }
    }

    fn set_variable_values(&mut self, values: &BTreeMap<String, String>) {
        let at = timestamp();
        let out = if self.line_oriented() {
            values
                .iter()
                .map(|(id, value)| format!("{at} {id} = {value}"))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            let view = TickView {
                at,
                variables: values,
            };
            output::render_single(&self.global.output, &view, |_| String::new(), |_| String::new())
        };
        output::print_output(&out, self.global.quiet);
    }

    fn set_preset_definitions(&mut self, presets: &[PresetDefinition]) {
        debug!(count = presets.len(), "preset definitions announced");
    }

    fn check_feedbacks(&mut self, affected: &[(FeedbackKind, u32)]) {
        if !self.line_oriented() {
            return;
        }
        let at = timestamp();
        let lines: Vec<String> = affected
            .iter()
            .map(|&(kind, port_id)| {
                let state = match surface::evaluate_feedback(kind, port_id, &self.snapshot) {
                    Some(true) => output::paint_state("on", true, self.color),
                    Some(false) => output::paint_state("off", false, self.color),
                    None => "unknown".into(),
                };
                format!("{at} {kind}({port_id}) -> {state}")
            })
            .collect();
        output::print_output(&lines.join("\n"), self.global.quiet);
    }
}

pub async fn handle(
    mut config: SwitchConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(ms) = args.interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }

    let switch = Switch::new(config)?;
    // Subscribe first so the initial snapshot's changes are seen too.
    let mut changes = switch.change_stream();
    let mut states = switch.connection_state();
    let mut terminal = TerminalSurface::new(global, switch.snapshot());

    switch.connect().await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                report_state(&state, global);
            }
            next = changes.next() => {
                match next {
                    Some(Ok(change_set)) => {
                        let snapshot = switch.snapshot();
                        terminal.snapshot = Arc::clone(&snapshot);
                        surface::publish(&mut terminal, &snapshot, &change_set);
                    }
                    Some(Err(lagged)) => warn!(error = %lagged, "missed change notifications"),
                    None => break,
                }
            }
        }
    }

    switch.disconnect().await;
    Ok(())
}

fn report_state(state: &ConnectionState, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    match state {
        ConnectionState::Failed { reason } => eprintln!("connection failed: {reason}"),
        other => eprintln!("{other}"),
    }
}
