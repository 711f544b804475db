//! Error types for the Tableau embed relay.
//!
//! [`RelayError`] covers every per-request failure and implements
//! [`axum::response::IntoResponse`] so handlers can return `Result<…, RelayError>`
//! directly. Each variant answers with a fixed plain-text body; the detail
//! carried by the variant is logged, never returned.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tableau_embed_models::ModelError;

/// Errors that end a single `/tableau-signin` request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The inbound body could not be read (I/O error or size limit).
    #[error("failed to read request body: {0}")]
    ReadBody(String),

    /// The inbound body was not a valid sign-in JSON document.
    #[error("invalid JSON request body: {0}")]
    InvalidRequestBody(#[source] serde_json::Error),

    /// The credential pair for this deployment was incomplete.
    #[error(transparent)]
    MissingCredentials(#[from] ModelError),

    /// The validated payload could not be re-encoded for Tableau.
    #[error("failed to encode Tableau payload: {0}")]
    EncodePayload(#[source] serde_json::Error),

    /// Tableau could not be reached or did not answer in time.
    #[error("failed to reach Tableau: {0}")]
    TransportFailure(#[from] reqwest::Error),

    /// Tableau answered with a non-200 status.
    #[error("Tableau rejected the sign-in with status {0}")]
    UpstreamAuthFailure(StatusCode),

    /// The embed token could not be produced.
    #[error("failed to sign embed token: {0}")]
    Signing(#[from] SigningError),
}

impl RelayError {
    /// Status code and public body for this error.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Self::ReadBody(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read request body",
            ),
            Self::InvalidRequestBody(_) => (StatusCode::BAD_REQUEST, "Invalid JSON request body"),
            Self::MissingCredentials(ModelError::MissingCredentials(kind)) => {
                (StatusCode::BAD_REQUEST, kind.missing_message())
            }
            Self::EncodePayload(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process JSON request",
            ),
            Self::TransportFailure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to authenticate with Tableau",
            ),
            Self::UpstreamAuthFailure(status) => (*status, "Tableau authentication failed"),
            Self::Signing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate JWT token",
            ),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }
        (status, message).into_response()
    }
}

/// Errors of the Okta authorization-code routes.
#[derive(Debug, thiserror::Error)]
pub enum OidcError {
    /// The callback arrived without a `code` query parameter.
    #[error("Missing authorization code")]
    MissingCode,

    /// Okta's token endpoint could not be reached.
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Okta refused the code or answered without an access token.
    #[error("code exchange failed: {0}")]
    ExchangeFailed(String),
}

impl IntoResponse for OidcError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingCode => {
                tracing::warn!("callback without authorization code");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": self.to_string() })),
                )
                    .into_response()
            }
            Self::Transport(_) | Self::ExchangeFailed(_) => {
                tracing::error!(error = %self, "Okta code exchange failed");
                let body = json!({
                    "message": "Failed to authenticate",
                    "error": self.to_string(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Failures of the claims signer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    /// `CONNECTED_APP_SECRET_KEY` is empty.
    #[error("missing CONNECTED_APP_SECRET_KEY")]
    MissingSecret,

    /// `CONNECTED_APP_CLIENT_ID` is empty.
    #[error("missing CONNECTED_APP_CLIENT_ID")]
    MissingIssuer,

    /// `CONNECTED_APP_SECRET_ID` is empty.
    #[error("missing CONNECTED_APP_SECRET_ID")]
    MissingKeyId,

    /// The MAC or the JSON encoding failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Startup configuration errors. Any of these stops the process before it binds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value read from the environment.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use tableau_embed_models::CredentialKind;

    use super::*;

    async fn body_text(err: RelayError) -> (StatusCode, String) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 1024).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn upstream_status_is_mirrored_with_generic_body() {
        let (status, body) =
            body_text(RelayError::UpstreamAuthFailure(StatusCode::UNAUTHORIZED)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Tableau authentication failed");
    }

    #[tokio::test]
    async fn missing_credentials_use_kind_message() {
        let err = RelayError::from(ModelError::MissingCredentials(CredentialKind::Password));
        let (status, body) = body_text(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing username or password");
    }

    #[tokio::test]
    async fn signing_failure_hides_detail() {
        let (status, body) = body_text(RelayError::Signing(SigningError::MissingSecret)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to generate JWT token");
    }

    #[tokio::test]
    async fn invalid_json_is_bad_request() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let (status, body) = body_text(RelayError::InvalidRequestBody(parse_err)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid JSON request body");
    }

    #[tokio::test]
    async fn missing_code_is_bad_request_json() {
        let (status, body) = body_text_oidc(OidcError::MissingCode).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Missing authorization code" }));
    }

    #[tokio::test]
    async fn failed_exchange_is_internal_error_json() {
        let (status, body) =
            body_text_oidc(OidcError::ExchangeFailed("invalid_grant".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to authenticate");
        assert_eq!(body["error"], "code exchange failed: invalid_grant");
    }

    async fn body_text_oidc(err: OidcError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn config_error_display() {
        assert_eq!(
            ConfigError::Missing("CONNECTED_APP_CLIENT_ID").to_string(),
            "required environment variable CONNECTED_APP_CLIENT_ID is not set"
        );
        let err = ConfigError::Invalid {
            var: "PORT",
            value: "http".into(),
            reason: "invalid digit found in string".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"http\" for PORT: invalid digit found in string"
        );
    }
}
