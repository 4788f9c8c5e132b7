// ── Switch facade ──
//
// Full lifecycle of one switch connection: login, initial snapshot,
// background polling, command execution, and the observable connection
// and engine state.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use m4250_api::{DeviceStatus, PoeConfigTable, PortStatsTable};
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::command::{self, Command, CommandResult, PoeMode};
use crate::config::SwitchConfig;
use crate::connection::Connection;
use crate::diff::ChangeSet;
use crate::engine::{self, EngineState, TickReport};
use crate::error::CoreError;
use crate::store::{Snapshot, StateStore};

const CHANGE_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Progress of [`Switch::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum ConnectStage {
    #[strum(to_string = "Opening connection")]
    OpeningConnection,
    #[strum(to_string = "Logging in")]
    LoggingIn,
    #[strum(to_string = "Refreshing data")]
    RefreshingData,
}

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting { stage: ConnectStage },
    Connected,
    Failed { reason: String },
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => f.write_str("Disconnected"),
            Self::Connecting { stage } => write!(f, "{stage}"),
            Self::Connected => f.write_str("Connected"),
            Self::Failed { reason } => write!(f, "Failed: {reason}"),
        }
    }
}

// ── Switch ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SwitchInner>`. One instance manages exactly
/// one switch; several instances are independent.
#[derive(Clone)]
pub struct Switch {
    inner: Arc<SwitchInner>,
}

struct SwitchInner {
    connection: ArcSwap<Connection>,
    clock: Arc<dyn Clock>,
    store: StateStore,
    connection_state: watch::Sender<ConnectionState>,
    engine_state: watch::Sender<EngineState>,
    changes: broadcast::Sender<Arc<ChangeSet>>,
    /// Token for the running poll loop; replaced on every start.
    cancel: Mutex<CancellationToken>,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Switch {
    /// Create a switch handle. Does NOT connect: call
    /// [`connect()`](Self::connect) to log in and start polling.
    pub fn new(config: SwitchConfig) -> Result<Self, CoreError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`new`](Self::new), with an explicit time source for session
    /// expiry.
    pub fn with_clock(config: SwitchConfig, clock: Arc<dyn Clock>) -> Result<Self, CoreError> {
        let connection = Connection::new(config, Arc::clone(&clock))?;
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (engine_state, _) = watch::channel(EngineState::Stopped);
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(SwitchInner {
                connection: ArcSwap::from_pointee(connection),
                clock,
                store: StateStore::new(),
                connection_state,
                engine_state,
                changes,
                cancel: Mutex::new(CancellationToken::new()),
                poll_handle: Mutex::new(None),
            }),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> SwitchConfig {
        self.connection().config.clone()
    }

    fn connection(&self) -> Arc<Connection> {
        self.inner.connection.load_full()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in, take one snapshot, and start the poll loop.
    ///
    /// A failed login leaves the state `Failed` and starts nothing. A
    /// failed initial refresh is logged; polling starts anyway and keeps
    /// retrying.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.stop().await;
        let conn = self.connection();

        self.set_connection_state(ConnectionState::Connecting {
            stage: ConnectStage::OpeningConnection,
        });
        debug!(url = %conn.config.url, "connecting");

        self.set_connection_state(ConnectionState::Connecting {
            stage: ConnectStage::LoggingIn,
        });
        if let Err(e) = conn.session.login().await {
            warn!(error = %e, "login failed");
            self.set_connection_state(ConnectionState::Failed {
                reason: e.to_string(),
            });
            return Err(e);
        }

        self.set_connection_state(ConnectionState::Connecting {
            stage: ConnectStage::RefreshingData,
        });
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial refresh failed");
        }

        info!(url = %conn.config.url, "connected to switch");
        self.start().await;
        Ok(())
    }

    /// Start the poll loop. No-op if it is already running.
    pub async fn start(&self) {
        let mut handle = self.inner.poll_handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let cancel = CancellationToken::new();
        *self.inner.cancel.lock().await = cancel.clone();

        let interval = self.connection().config.poll_interval;
        self.inner.engine_state.send_replace(EngineState::Idle);
        *handle = Some(tokio::spawn(engine::poll_task(
            self.clone(),
            interval,
            cancel,
        )));
        debug!(?interval, "poll loop started");
    }

    /// Stop the poll loop. Any pending tick is cancelled; an in-flight
    /// one is dropped without publishing.
    pub async fn stop(&self) {
        self.inner.cancel.lock().await.cancel();
        let handle = self.inner.poll_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "poll loop ended abnormally");
            }
        }
        self.inner.engine_state.send_replace(EngineState::Stopped);
    }

    pub async fn restart(&self) {
        self.stop().await;
        self.start().await;
    }

    /// Stop polling, forget the session and the snapshot.
    pub async fn disconnect(&self) {
        self.stop().await;
        self.connection().session.invalidate();
        self.inner.store.clear();
        self.set_connection_state(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Replace the configuration and reconnect with it.
    pub async fn reconfigure(&self, config: SwitchConfig) -> Result<(), CoreError> {
        self.disconnect().await;
        let connection = Connection::new(config, Arc::clone(&self.inner.clock))?;
        self.inner.connection.store(Arc::new(connection));
        info!("configuration replaced");
        self.connect().await
    }

    /// Run one tick now and publish its result.
    ///
    /// Waits for an in-flight tick rather than overlapping it. Returns the
    /// changes, or an error when no token could be obtained or every fetch
    /// failed.
    pub async fn refresh(&self) -> Result<ChangeSet, CoreError> {
        let conn = self.connection();
        let result = engine::tick(&conn, &self.inner.store).await;
        self.publish(result)
    }

    /// One tick as driven by the poll loop.
    pub(crate) async fn poll_once(&self) {
        self.inner.engine_state.send_replace(EngineState::Ticking);
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "poll tick failed");
        }
        self.inner.engine_state.send_replace(EngineState::Idle);
    }

    fn publish(&self, result: Result<TickReport, CoreError>) -> Result<ChangeSet, CoreError> {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "could not obtain a session");
                self.set_connection_state(ConnectionState::Failed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        if !report.changes.is_empty() {
            // No receivers is fine.
            let _ = self.inner.changes.send(Arc::new(report.changes.clone()));
        }

        if report.all_failed() {
            let mut failures = report.failures.into_iter();
            let Some((_, first)) = failures.next() else {
                return Ok(report.changes);
            };
            self.set_connection_state(ConnectionState::Failed {
                reason: first.to_string(),
            });
            return Err(first);
        }

        self.set_connection_state(ConnectionState::Connected);
        Ok(report.changes)
    }

    fn set_connection_state(&self, next: ConnectionState) {
        self.inner.connection_state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command. Failures are returned, never retried.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        let conn = self.connection();
        command::execute(&conn, command).await
    }

    /// Execute commands one after another, collecting each outcome.
    pub async fn execute_all(
        &self,
        commands: Vec<Command>,
    ) -> Vec<(Command, Result<CommandResult, CoreError>)> {
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let result = self.execute(command).await;
            if let Err(ref e) = result {
                warn!(%command, error = %e, "command failed");
            }
            results.push((command, result));
        }
        results
    }

    pub async fn set_poe_enabled(
        &self,
        port_id: u32,
        mode: PoeMode,
    ) -> Result<CommandResult, CoreError> {
        self.execute(Command::SetPoe { port_id, mode }).await
    }

    pub async fn power_cycle_poe(&self, port_id: u32) -> Result<CommandResult, CoreError> {
        self.execute(Command::PowerCyclePoe { port_id }).await
    }

    pub async fn reboot(&self) -> Result<CommandResult, CoreError> {
        self.execute(Command::Reboot).await
    }

    // ── Direct reads ─────────────────────────────────────────────

    /// The switch's configured name.
    pub async fn device_name(&self) -> Result<String, CoreError> {
        let conn = self.connection();
        let token = conn.session.ensure_valid().await?;
        Ok(conn.client.device_name(&token).await?)
    }

    /// Whether the port has link, from the last-known port stats.
    pub fn port_has_link(&self, port_id: u32) -> Result<bool, CoreError> {
        self.snapshot()
            .has_link(port_id)
            .ok_or(CoreError::PortNotFound { port_id })
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: log in, run closure, disconnect. No poll loop and no
    /// initial snapshot; call [`refresh()`](Self::refresh) inside the
    /// closure if one is needed.
    pub async fn oneshot<F, Fut, T>(config: SwitchConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Switch) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let switch = Switch::new(config)?;
        if let Err(e) = switch.connection().session.login().await {
            switch.set_connection_state(ConnectionState::Failed {
                reason: e.to_string(),
            });
            return Err(e);
        }
        switch.set_connection_state(ConnectionState::Connected);

        let result = f(switch.clone()).await;
        switch.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn engine_state(&self) -> watch::Receiver<EngineState> {
        self.inner.engine_state.subscribe()
    }

    /// Subscribe to per-tick change sets. Empty ticks are not sent.
    pub fn changes(&self) -> broadcast::Receiver<Arc<ChangeSet>> {
        self.inner.changes.subscribe()
    }

    /// [`changes()`](Self::changes) as a `Stream`.
    pub fn change_stream(&self) -> BroadcastStream<Arc<ChangeSet>> {
        BroadcastStream::new(self.changes())
    }

    /// Subscribe to snapshot replacements.
    pub fn snapshots(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.store.subscribe()
    }

    // ── Snapshot accessors ───────────────────────────────────────

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.snapshot()
    }

    pub fn device_status(&self) -> Option<Arc<DeviceStatus>> {
        self.snapshot().device_status.clone()
    }

    pub fn poe_config(&self) -> Option<Arc<PoeConfigTable>> {
        self.snapshot().poe_config.clone()
    }

    pub fn port_stats(&self) -> Option<Arc<PortStatsTable>> {
        self.snapshot().port_stats.clone()
    }
}
