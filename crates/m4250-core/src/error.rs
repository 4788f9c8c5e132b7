// ── Core error types ──
//
// Errors surfaced by the engine. Consumers see three families: the
// credentials or token were refused (`is_auth`), the switch could not be
// reached or answered badly (`is_transport`), or a port id does not exist
// (`is_not_found`). The `From<m4250_api::Error>` impl does the mapping.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot connect to switch at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Switch request timed out")]
    Timeout,

    #[error("Switch request failed: {message}")]
    Transport {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Switch rejected request: {message}")]
    Rejected { message: String },

    #[error("Unexpected response from switch: {message}")]
    Decode { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Port {port_id} not found")]
    PortNotFound { port_id: u32 },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Credentials refused, or a token the switch no longer accepts.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// Network failure, non-success status, device rejection, or a body
    /// that did not match the expected shape.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Timeout
                | Self::Transport { .. }
                | Self::Rejected { .. }
                | Self::Decode { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PortNotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<m4250_api::Error> for CoreError {
    fn from(err: m4250_api::Error) -> Self {
        match err {
            m4250_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            m4250_api::Error::Api { status: 401, .. } => CoreError::AuthenticationFailed {
                message: "token rejected by switch".into(),
            },
            m4250_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Transport {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            m4250_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            m4250_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            m4250_api::Error::Api { status, message } => CoreError::Transport {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            m4250_api::Error::Rejected { code, message } => CoreError::Rejected {
                message: format!("{message} (code {code})"),
            },
            m4250_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
            m4250_api::Error::PortNotFound { port_id } => CoreError::PortNotFound { port_id },
        }
    }
}
