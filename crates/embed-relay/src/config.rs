//! Relay configuration.
//!
//! Built once from environment variables at startup and injected into Axum
//! handlers via [`axum::extract::State`]. Nothing reads the environment after
//! [`AppConfig::from_env`] returns.

use std::time::Duration;

use axum::http::HeaderValue;
use reqwest::Url;
use tableau_embed_models::{CredentialKind, SiteContentUrl};

use crate::error::ConfigError;
use crate::profile::DeploymentProfile;
use crate::secret::Secret;

/// Default upstream: Tableau Cloud REST sign-in, API 3.22.
pub const DEFAULT_SIGNIN_URL: &str = "https://us-west-2b.online.tableau.com/api/3.22/auth/signin";

/// Connected-app credentials used to sign embed tokens.
#[derive(Debug, Clone)]
pub struct ConnectedApp {
    /// Client id; the token issuer.
    pub client_id: String,
    /// Secret id; the token `kid`.
    pub secret_id: String,
    /// Secret value; the HMAC key.
    pub secret_key: Secret,
}

/// Default landing page for a completed Okta sign-in.
pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:3000/dashboard";

/// Okta authorization-code client. Present only when `OKTA_ISSUER` is set.
#[derive(Debug, Clone)]
pub struct OktaConfig {
    /// `{issuer}/v1/authorize`.
    pub authorize_url: Url,
    /// `{issuer}/v1/token`.
    pub token_url: Url,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: Secret,
    /// Callback registered with Okta; must route to `/authorization-code/callback`.
    pub redirect_uri: String,
    /// Front-end page that receives the access token.
    pub dashboard_url: Url,
}

impl OktaConfig {
    fn from_lookup<F>(issuer: &str, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let issuer = issuer.trim_end_matches('/');
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let dashboard =
            var("OKTA_DASHBOARD_URL").unwrap_or_else(|| DEFAULT_DASHBOARD_URL.to_string());

        Ok(Self {
            authorize_url: parse_url("OKTA_ISSUER", &format!("{issuer}/v1/authorize"))?,
            token_url: parse_url("OKTA_ISSUER", &format!("{issuer}/v1/token"))?,
            client_id: required("OKTA_CLIENT_ID")?,
            client_secret: Secret::new(required("OKTA_CLIENT_SECRET")?),
            redirect_uri: required("OKTA_REDIRECT_URI")?,
            dashboard_url: parse_url("OKTA_DASHBOARD_URL", &dashboard)?,
        })
    }
}

/// Global configuration shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to listen on (default `5000`).
    pub listen_port: u16,
    /// Deployment constants.
    pub profile: DeploymentProfile,
    /// Tableau REST sign-in URL.
    pub signin_url: String,
    /// Connected-app signing material.
    pub connected_app: ConnectedApp,
    /// The single origin allowed by CORS.
    pub cors_origin: HeaderValue,
    /// Maximum accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Timeout for the whole outbound sign-in call.
    pub upstream_timeout: Duration,
    /// Okta authorization-code routes; disabled when `None`.
    pub okta: Option<OktaConfig>,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                   | Default                   | Description                    |
    /// |----------------------------|---------------------------|--------------------------------|
    /// | `PORT`                     | `5000`                    | HTTP listen port               |
    /// | `RELAY_PROFILE`            | `pat`                     | `pat` or `password`            |
    /// | `TABLEAU_SIGNIN_URL`       | [`DEFAULT_SIGNIN_URL`]    | Tableau sign-in endpoint       |
    /// | `TABLEAU_SITE_CONTENT_URL` | profile                   | Site forced onto every sign-in |
    /// | `EMBED_SUBJECT`            | profile                   | `sub` claim                    |
    /// | `CONNECTED_APP_CLIENT_ID`  | required                  | Token issuer                   |
    /// | `CONNECTED_APP_SECRET_ID`  | empty                     | Token key id                   |
    /// | `CONNECTED_APP_SECRET_KEY` | empty                     | HMAC secret                    |
    /// | `CORS_ALLOWED_ORIGIN`      | `http://localhost:3000`   | Allowed browser origin         |
    /// | `RELAY_MAX_BODY_BYTES`     | `65536`                   | Inbound body limit             |
    /// | `TABLEAU_TIMEOUT_SECS`     | `10`                      | Outbound request timeout       |
    /// | `OKTA_ISSUER`              | unset                     | Enables the Okta routes        |
    /// | `OKTA_CLIENT_ID`           | required with issuer      | OAuth client id                |
    /// | `OKTA_CLIENT_SECRET`       | required with issuer      | OAuth client secret            |
    /// | `OKTA_REDIRECT_URI`        | required with issuer      | Registered callback URL        |
    /// | `OKTA_DASHBOARD_URL`       | [`DEFAULT_DASHBOARD_URL`] | Where the access token is sent |
    ///
    /// The secret id and key are checked when a token is signed, not here.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let listen_port = parse_or("PORT", var("PORT"), 5000)?;
        let max_body_bytes =
            parse_or("RELAY_MAX_BODY_BYTES", var("RELAY_MAX_BODY_BYTES"), 64 * 1024)?;
        let timeout_secs: u64 = parse_or("TABLEAU_TIMEOUT_SECS", var("TABLEAU_TIMEOUT_SECS"), 10)?;

        let kind = match var("RELAY_PROFILE") {
            Some(raw) => raw.parse::<CredentialKind>().map_err(|e| ConfigError::Invalid {
                var: "RELAY_PROFILE",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => CredentialKind::PersonalAccessToken,
        };
        let mut profile = DeploymentProfile::for_kind(kind);
        if let Some(site) = lookup("TABLEAU_SITE_CONTENT_URL") {
            // Empty is meaningful here: it selects Tableau's default site.
            profile.site = SiteContentUrl::from(site);
        }
        if let Some(subject) = var("EMBED_SUBJECT") {
            profile.subject = subject;
        }

        let client_id =
            var("CONNECTED_APP_CLIENT_ID").ok_or(ConfigError::Missing("CONNECTED_APP_CLIENT_ID"))?;

        let origin =
            var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let cors_origin = HeaderValue::from_str(&origin).map_err(|e| ConfigError::Invalid {
            var: "CORS_ALLOWED_ORIGIN",
            value: origin.clone(),
            reason: e.to_string(),
        })?;

        let okta = match var("OKTA_ISSUER") {
            Some(issuer) => Some(OktaConfig::from_lookup(&issuer, &var)?),
            None => None,
        };

        Ok(Self {
            listen_port,
            profile,
            signin_url: var("TABLEAU_SIGNIN_URL").unwrap_or_else(|| DEFAULT_SIGNIN_URL.to_string()),
            connected_app: ConnectedApp {
                client_id,
                secret_id: var("CONNECTED_APP_SECRET_ID").unwrap_or_default(),
                secret_key: Secret::new(var("CONNECTED_APP_SECRET_KEY").unwrap_or_default()),
            },
            cors_origin,
            max_body_bytes,
            upstream_timeout: Duration::from_secs(timeout_secs),
            okta,
        })
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => match value.parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        },
        None => Ok(default),
    }
}
