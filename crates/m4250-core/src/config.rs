// ── Runtime connection configuration ──
//
// Describes *how* to reach one switch. Carries credentials and tuning but
// never touches disk: the CLI (via m4250-config) builds a `SwitchConfig`
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use m4250_api::{SwitchClient, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Username and password for `POST login`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. The switch ships a self-signed certificate.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one switch connection.
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    /// API root, e.g. `https://192.168.0.239:8443/api/v1/`.
    pub url: Url,
    pub credentials: Credentials,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Delay between the end of one poll tick and the start of the next.
    pub poll_interval: Duration,
    /// A token is renewed this long before its declared expiry.
    pub token_safety_margin: Duration,
}

impl SwitchConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
    pub const DEFAULT_TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(3600);

    /// Config with default tuning for a switch at `host` on the standard
    /// API port.
    pub fn for_host(host: &str, credentials: Credentials) -> Result<Self, CoreError> {
        let url = Self::base_url(host, m4250_api::DEFAULT_API_PORT)?;
        Ok(Self::new(url, credentials))
    }

    /// The API root for a switch at `host`. A host given with a scheme is
    /// used as-is.
    pub fn base_url(host: &str, port: u16) -> Result<Url, CoreError> {
        Ok(SwitchClient::base_url_for_host(host, port)?)
    }

    pub fn new(url: Url, credentials: Credentials) -> Self {
        Self {
            url,
            credentials,
            tls: TlsVerification::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            token_safety_margin: Self::DEFAULT_TOKEN_SAFETY_MARGIN,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    pub(crate) fn build_client(&self) -> Result<SwitchClient, CoreError> {
        Ok(SwitchClient::new(self.url.clone(), &self.transport())?)
    }
}
