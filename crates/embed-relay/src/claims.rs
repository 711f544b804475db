//! Embed token generation.
//!
//! Signs the short-lived connected-app token that the Tableau embedding SDK
//! presents in place of a user session. Tokens are HS256 JWTs carrying the
//! connected app's client id as issuer and its secret id as `kid`.

use std::time::{Duration, SystemTime};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;

use crate::config::ConnectedApp;
use crate::error::SigningError;
use crate::profile::{DeploymentProfile, EMBED_AUDIENCE};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of every embed token.
pub const TOKEN_TTL: Duration = Duration::from_secs(5 * 60);

// ---------------------------------------------------------------------------
// Token layout
// ---------------------------------------------------------------------------

/// JOSE header. Tableau reads both `kid` and `iss` from here.
#[derive(Serialize)]
struct EmbedHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    kid: &'a str,
    iss: &'a str,
}

#[derive(Serialize)]
struct EmbedClaims<'a> {
    iss: &'a str,
    exp: u64,
    jti: String,
    aud: &'static str,
    sub: &'a str,
    scp: &'a [String],
    #[serde(rename = "https://tableau.com/oda")]
    oda: &'a Value,
    #[serde(rename = "https://tableau.com/groups")]
    groups: &'a Value,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Builds and signs embed tokens for one deployment.
#[derive(Debug, Clone)]
pub struct ClaimsSigner {
    app: ConnectedApp,
    profile: DeploymentProfile,
}

impl ClaimsSigner {
    /// Signer for `app` issuing tokens with `profile`'s subject and claims.
    pub fn new(app: ConnectedApp, profile: DeploymentProfile) -> Self {
        Self { app, profile }
    }

    /// Sign a fresh embed token.
    ///
    /// Every call draws a new random `jti` and sets `exp` to now plus
    /// [`TOKEN_TTL`], so two calls never yield the same token.
    ///
    /// # Errors
    ///
    /// * [`SigningError::MissingSecret`] if the connected-app secret is empty.
    /// * [`SigningError::MissingIssuer`] / [`SigningError::MissingKeyId`] if
    ///   the client id or secret id is empty.
    /// * [`SigningError::Signing`] if encoding or the MAC fails.
    pub fn generate(&self) -> Result<String, SigningError> {
        if self.app.secret_key.is_empty() {
            return Err(SigningError::MissingSecret);
        }
        if self.app.client_id.is_empty() {
            return Err(SigningError::MissingIssuer);
        }
        if self.app.secret_id.is_empty() {
            return Err(SigningError::MissingKeyId);
        }

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| SigningError::Signing(e.to_string()))?;

        let header = EmbedHeader {
            alg: "HS256",
            typ: "JWT",
            kid: &self.app.secret_id,
            iss: &self.app.client_id,
        };
        let claims = EmbedClaims {
            iss: &self.app.client_id,
            exp: (now + TOKEN_TTL).as_secs(),
            jti: uuid::Uuid::new_v4().to_string(),
            aud: EMBED_AUDIENCE,
            sub: &self.profile.subject,
            scp: &self.profile.scopes,
            oda: &self.profile.oda,
            groups: &self.profile.groups,
        };

        let token = encode_and_sign(self.app.secret_key.expose(), &header, &claims)?;
        tracing::debug!(jti = %claims.jti, exp = claims.exp, "embed token signed");
        Ok(token)
    }
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// Encode as a compact JWS: `base64url(header).base64url(body).base64url(mac)`.
fn encode_and_sign(
    key: &[u8],
    header: &EmbedHeader<'_>,
    claims: &EmbedClaims<'_>,
) -> Result<String, SigningError> {
    let signing_input = format!("{}.{}", encode_json(header)?, encode_json(claims)?);

    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SigningError::Signing(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{sig}"))
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, SigningError> {
    let json = serde_json::to_vec(value).map_err(|e| SigningError::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
