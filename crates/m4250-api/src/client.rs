// Switch HTTP client
//
// Wraps `reqwest::Client` with base-URL handling, bearer authentication,
// and `resp` status checking. Endpoint groups (login, device, PoE, port
// stats) are implemented as inherent methods in separate files to keep
// this module focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{self, RespStatus};
use crate::transport::TransportConfig;

/// Default HTTPS port of the switch's REST API.
pub const DEFAULT_API_PORT: u16 = 8443;

/// Raw HTTP client for a single switch's `/api/v1/` surface.
///
/// Holds no authentication state: every authenticated call takes the
/// bearer token explicitly, so the session owner decides when to renew it.
#[derive(Debug, Clone)]
pub struct SwitchClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SwitchClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `https://192.168.0.239:8443/api/v1/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
        }
    }

    /// The API root for a switch reachable at `host`.
    pub fn base_url_for_host(host: &str, port: u16) -> Result<Url, Error> {
        let host = host.trim().trim_end_matches('/');
        let raw = if host.contains("://") {
            format!("{host}/api/v1/")
        } else {
            format!("https://{host}:{port}/api/v1/")
        };
        Ok(Url::parse(&raw)?)
    }

    /// The API root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve an endpoint path (optionally with a query) against the API root.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET request and decode the body as `T`.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &SecretString,
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let body = Self::parse_response(resp).await?;
        models::decode(body)
    }

    /// Send an authenticated POST request with a JSON body.
    ///
    /// Returns the decoded response body, or `Value::Null` if the switch
    /// answered with an empty body.
    pub(crate) async fn post(
        &self,
        url: Url,
        token: &SecretString,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        Self::parse_response(resp).await
    }

    /// Unauthenticated POST, used only by login. Returns status + raw body.
    pub(crate) async fn post_anonymous(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<(reqwest::StatusCode, String), Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        Ok((status, text))
    }

    /// Check HTTP status and the `resp` block, returning the JSON body.
    async fn parse_response(resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "token expired or rejected".into(),
            });
        }

        let body = resp.text().await?;
        trace!(status = %status, len = body.len(), "response received");

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        check_resp(&value)?;
        Ok(value)
    }
}

/// Fail if the body carries a `resp` block that does not report success.
pub(crate) fn check_resp(value: &Value) -> Result<(), Error> {
    let Some(resp) = value.get("resp") else {
        return Ok(());
    };
    let resp: RespStatus = models::decode(resp.clone())?;
    if resp.is_success() {
        return Ok(());
    }
    Err(Error::Rejected {
        code: resp.resp_code.unwrap_or_default(),
        message: resp.message(),
    })
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
