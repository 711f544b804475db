//! Okta authorization-code sign-in.
//!
//! `GET /login` sends the browser to Okta's authorize endpoint. Okta calls
//! back with a one-time code, which is exchanged at the token endpoint for an
//! access token; the browser is then forwarded to the dashboard with it.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::config::OktaConfig;
use crate::error::OidcError;

/// Scope requested from Okta.
pub const EMBED_SCOPE: &str = "tableau:views:embed";

#[derive(Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
}

/// Client for one Okta authorization server.
#[derive(Debug, Clone)]
pub struct OktaClient {
    http: reqwest::Client,
    config: OktaConfig,
}

impl OktaClient {
    /// Build a client whose token requests time out after `timeout`.
    pub fn new(config: OktaConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    /// Okta authorize URL for a code-flow sign-in carrying `state`.
    pub fn authorize_url(&self, state: &str) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", EMBED_SCOPE)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", state);
        url
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// * [`OidcError::Transport`] if the token endpoint cannot be reached.
    /// * [`OidcError::ExchangeFailed`] if Okta refuses the code or its answer
    ///   carries no `access_token`.
    pub async fn exchange_code(&self, code: &str) -> Result<String, OidcError> {
        let res = self
            .http
            .post(self.config.token_url.clone())
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(OidcError::ExchangeFailed(format!(
                "token endpoint returned {status}: {text}"
            )));
        }

        let body: TokenEndpointResponse = res
            .json()
            .await
            .map_err(|e| OidcError::ExchangeFailed(format!("unexpected token response: {e}")))?;
        debug!(%status, "Okta access token received");
        Ok(body.access_token)
    }

    /// Dashboard URL that hands `access_token` to the front end.
    pub fn dashboard_redirect(&self, access_token: &str) -> Url {
        let mut url = self.config.dashboard_url.clone();
        url.query_pairs_mut().append_pair("token", access_token);
        url
    }
}
