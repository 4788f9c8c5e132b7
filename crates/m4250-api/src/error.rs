use thiserror::Error;

/// Top-level error type for the `m4250-api` crate.
///
/// Covers every failure mode of talking to the switch: authentication,
/// transport, non-success HTTP status, device-level rejections, and
/// JSON shapes that do not match the documented schema.
/// `m4250-core` maps these into the engine's error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, or a bearer token refused by the switch.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Device API ──────────────────────────────────────────────────
    /// Non-success HTTP status.
    #[error("Switch API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP 200 but the `resp` block reports a failure.
    #[error("Switch rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Body is not JSON, or does not match the expected schema.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A lookup by port id found no matching entry.
    #[error("Port {port_id} not found")]
    PortNotFound { port_id: u32 },
}

impl Error {
    /// Returns `true` if the token is no longer accepted and a fresh
    /// login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::PortNotFound { .. } => true,
            Self::Api { status, .. } => *status == 404,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }
}
