//! Sign-in payloads and the relay's token response.

use serde::{Deserialize, Serialize};

use crate::credentials::{RawCredentials, SiteContentUrl};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Body of `POST /tableau-signin`.
///
/// A body without a `credentials` object deserialises to empty credentials
/// and is rejected later as incomplete.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SignInRequest {
    /// The credential object as sent by the client.
    #[serde(default)]
    pub credentials: RawCredentials,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Tableau site selector inside a sign-in payload.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Site {
    /// Site identifier.
    #[serde(rename = "contentUrl", default)]
    pub content_url: SiteContentUrl,
}

/// One validated credential pair, serialised with Tableau's field names.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum CredentialPair {
    /// Personal access token sign-in.
    PersonalAccessToken {
        /// Token name.
        #[serde(rename = "personalAccessTokenName")]
        token_name: String,
        /// Token secret.
        #[serde(rename = "personalAccessTokenSecret")]
        token_secret: String,
    },
    /// Username/password sign-in.
    Password {
        /// Username.
        name: String,
        /// Password.
        password: String,
    },
}

/// The `credentials` object sent to Tableau.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutboundCredentials {
    /// Validated credential pair, flattened into the object.
    #[serde(flatten)]
    pub pair: CredentialPair,
    /// Server-chosen site.
    pub site: Site,
}

/// JSON body posted to the Tableau REST sign-in endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TableauSignIn {
    /// Credentials with the server-side site identifier applied.
    pub credentials: OutboundCredentials,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Successful response of `POST /tableau-signin`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// Compact signed token for the embedding SDK.
    #[serde(rename = "jwtToken")]
    pub jwt_token: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
