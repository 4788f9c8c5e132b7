// ── Connection context ──
//
// Everything tied to one configured switch: the HTTP client, the session,
// and the locks that order poll fetches against command read-modify-write
// sequences. Replaced wholesale on reconfigure.

use std::sync::Arc;

use dashmap::DashMap;
use m4250_api::SwitchClient;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::clock::Clock;
use crate::config::SwitchConfig;
use crate::error::CoreError;
use crate::session::SessionManager;

#[derive(Debug)]
pub(crate) struct Connection {
    pub config: SwitchConfig,
    pub client: SwitchClient,
    pub session: SessionManager,
    /// Held shared by commands for their whole read-modify-write, and
    /// exclusively by the poll loop while it fetches PoE config.
    poe_gate: RwLock<()>,
    /// One lock per port id, serializing commands on the same port.
    port_locks: DashMap<u32, Arc<Mutex<()>>>,
    /// At most one tick in flight, whether from the loop or `refresh()`.
    tick_lock: Mutex<()>,
}

impl Connection {
    pub fn new(config: SwitchConfig, clock: Arc<dyn Clock>) -> Result<Self, CoreError> {
        let client = config.build_client()?;
        let session = SessionManager::new(
            client.clone(),
            config.credentials.clone(),
            config.token_safety_margin,
            clock,
        );
        Ok(Self {
            config,
            client,
            session,
            poe_gate: RwLock::new(()),
            port_locks: DashMap::new(),
            tick_lock: Mutex::new(()),
        })
    }

    pub async fn lock_tick(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.tick_lock.lock().await
    }

    pub async fn lock_port(&self, port_id: u32) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.port_locks.entry(port_id).or_default());
        lock.lock_owned().await
    }

    /// Release a port lock taken for an id the switch does not have, and
    /// drop its map entry unless another command is waiting on it.
    pub fn forget_port(&self, port_id: u32, guard: OwnedMutexGuard<()>) {
        drop(guard);
        self.port_locks
            .remove_if(&port_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub async fn poe_read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.poe_gate.read().await
    }

    pub async fn poe_write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.poe_gate.write().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Credentials;

    fn connection() -> Connection {
        let config = SwitchConfig::for_host(
            "10.0.0.2",
            Credentials {
                username: "admin".into(),
                password: SecretString::from("secret".to_string()),
            },
        )
        .unwrap();
        Connection::new(config, Arc::new(ManualClock::at_epoch())).unwrap()
    }

    #[tokio::test]
    async fn forgotten_port_leaves_no_entry() {
        let conn = connection();
        for port_id in 100..110 {
            let guard = conn.lock_port(port_id).await;
            conn.forget_port(port_id, guard);
        }
        assert!(conn.port_locks.is_empty());
    }

    #[tokio::test]
    async fn forgetting_keeps_entry_while_another_command_holds_it() {
        let conn = connection();
        let guard = conn.lock_port(4).await;
        let waiter = Arc::clone(&conn.port_locks.get(&4).unwrap());

        conn.forget_port(4, guard);
        assert_eq!(conn.port_locks.len(), 1);

        drop(waiter);
        let guard = conn.lock_port(4).await;
        conn.forget_port(4, guard);
        assert!(conn.port_locks.is_empty());
    }

    #[tokio::test]
    async fn known_ports_keep_their_lock() {
        let conn = connection();
        drop(conn.lock_port(1).await);
        drop(conn.lock_port(1).await);
        assert_eq!(conn.port_locks.len(), 1);
    }
}
