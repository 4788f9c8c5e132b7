// Switch authentication
//
// Username/password login returning a bearer token with a server-declared
// lifetime. The client stores nothing; the caller owns the token.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::SwitchClient;
use crate::error::Error;
use crate::models::{LoginGrant, LoginResponse};

impl SwitchClient {
    /// Authenticate with the switch.
    ///
    /// `POST login` with `{"login": {"username", "password"}}`.
    ///
    /// Every failure mode (HTTP error, `resp.status != "success"`, a body
    /// that is not the documented shape) surfaces as
    /// [`Error::Authentication`], carrying the switch's `respMsg` when it
    /// sent one. Transport failures stay [`Error::Transport`].
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<LoginGrant, Error> {
        let url = self.api_url("login")?;
        debug!("logging in at {}", url);

        let body = json!({
            "login": {
                "username": username,
                "password": password.expose_secret(),
            }
        });

        let (status, text) = self.post_anonymous(url, &body).await?;
        let parsed = serde_json::from_str::<LoginResponse>(&text);

        let response = match parsed {
            Ok(response) => response,
            Err(e) if status.is_success() => {
                return Err(Error::Authentication {
                    message: format!("malformed login response: {e}"),
                });
            }
            Err(_) => {
                return Err(Error::Authentication {
                    message: format!("login failed (HTTP {status})"),
                });
            }
        };

        if !status.is_success() || !response.resp.is_success() {
            return Err(Error::Authentication {
                message: response.resp.message(),
            });
        }

        let grant: LoginGrant = response
            .login
            .ok_or_else(|| Error::Authentication {
                message: "login response carried no token".into(),
            })?
            .into();

        debug!(expire_secs = grant.expire_secs, "login successful");
        Ok(grant)
    }
}
