// ── Session management ──
//
// Owns the bearer token. A token is used only while it is both inside its
// lifetime (minus the safety margin) and still accepted by the switch,
// which is checked with a cheap authenticated GET before each use. The
// switch drops every token when it reboots or when someone logs in on its
// web UI, so expiry alone is not enough.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, TimeDelta, Utc};
use m4250_api::{LoginGrant, SwitchClient};
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::Credentials;
use crate::error::CoreError;

/// One issued token. Replaced wholesale on every login.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
    issued_at: DateTime<Utc>,
    ttl: TimeDelta,
}

impl Session {
    pub fn new(token: SecretString, issued_at: DateTime<Utc>, ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            token,
            issued_at,
            ttl,
        }
    }

    fn from_grant(grant: LoginGrant, issued_at: DateTime<Utc>) -> Self {
        Self::new(grant.token, issued_at, grant.expire_secs)
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Declared expiry of the token.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// The instant from which the token must be renewed.
    ///
    /// A margin that is not smaller than the lifetime is ignored and the
    /// token is trusted until its declared expiry.
    pub fn renew_at(&self, safety_margin: TimeDelta) -> DateTime<Utc> {
        let expires_at = self.expires_at();
        if safety_margin >= self.ttl {
            return expires_at;
        }
        expires_at
            .checked_sub_signed(safety_margin)
            .unwrap_or(expires_at)
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>, safety_margin: TimeDelta) -> bool {
        now < self.renew_at(safety_margin)
    }
}

/// Acquires and renews the switch session.
///
/// Logins are serialized, so concurrent callers that all find the token
/// stale produce a single login and then share its result.
#[derive(Debug)]
pub struct SessionManager {
    client: SwitchClient,
    credentials: Credentials,
    safety_margin: TimeDelta,
    clock: Arc<dyn Clock>,
    session: ArcSwapOption<Session>,
    renew_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        client: SwitchClient,
        credentials: Credentials,
        safety_margin: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            credentials,
            safety_margin: TimeDelta::from_std(safety_margin).unwrap_or(TimeDelta::MAX),
            clock,
            session: ArcSwapOption::empty(),
            renew_lock: Mutex::new(()),
        }
    }

    /// The currently held session, if any.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.session.load_full()
    }

    /// Log in unconditionally and replace the held session.
    pub async fn login(&self) -> Result<Arc<Session>, CoreError> {
        let _guard = self.renew_lock.lock().await;
        self.login_locked().await
    }

    /// Whether a session exists and is outside the renewal window.
    /// Does not contact the switch.
    pub fn is_valid(&self) -> bool {
        self.usable_session().is_some()
    }

    /// Return a token the switch currently accepts, logging in again if the
    /// held one is missing, close to expiry, or fails the liveness probe.
    pub async fn ensure_valid(&self) -> Result<SecretString, CoreError> {
        let _guard = self.renew_lock.lock().await;

        if let Some(session) = self.usable_session() {
            match self.client.device_name(session.token()).await {
                Ok(_) => return Ok(session.token().clone()),
                Err(e) => {
                    info!(error = %e, "liveness probe failed, logging in again");
                    self.session.store(None);
                }
            }
        } else {
            debug!("no usable session, logging in");
        }

        let session = self.login_locked().await?;
        Ok(session.token().clone())
    }

    /// Forget the held session without contacting the switch.
    pub fn invalidate(&self) {
        self.session.store(None);
    }

    fn usable_session(&self) -> Option<Arc<Session>> {
        self.session
            .load_full()
            .filter(|s| s.is_usable_at(self.clock.now(), self.safety_margin))
    }

    async fn login_locked(&self) -> Result<Arc<Session>, CoreError> {
        let issued_at = self.clock.now();
        let result = self
            .client
            .login(&self.credentials.username, &self.credentials.password)
            .await;

        match result {
            Ok(grant) => {
                let session = Arc::new(Session::from_grant(grant, issued_at));
                info!(
                    username = %self.credentials.username,
                    expires_at = %session.expires_at(),
                    "logged in to switch"
                );
                self.session.store(Some(Arc::clone(&session)));
                Ok(session)
            }
            Err(e) => {
                self.session.store(None);
                Err(e.into())
            }
        }
    }
}
