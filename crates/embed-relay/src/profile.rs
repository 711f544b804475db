//! Deployment profiles.
//!
//! A profile fixes everything that differs between relay deployments: the
//! credential pair clients send, the Tableau site they are signed into, and
//! the constant claims placed in the embed token.

use serde_json::{Value, json};
use tableau_embed_models::{CredentialKind, SiteContentUrl};

/// Audience expected by Tableau connected apps.
pub const EMBED_AUDIENCE: &str = "tableau";

/// Per-deployment constants, selected once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentProfile {
    /// Credential pair accepted from clients.
    pub credential_kind: CredentialKind,
    /// Site forced onto every sign-in, whatever the client sent.
    pub site: SiteContentUrl,
    /// `sub` claim.
    pub subject: String,
    /// `scp` claim.
    pub scopes: Vec<String>,
    /// Value of the `https://tableau.com/oda` claim.
    pub oda: Value,
    /// Value of the `https://tableau.com/groups` claim.
    pub groups: Value,
}

impl DeploymentProfile {
    /// Built-in profile for deployments that sign in with personal access tokens.
    pub fn personal_access_token() -> Self {
        Self {
            credential_kind: CredentialKind::PersonalAccessToken,
            site: SiteContentUrl::new("embedseubl"),
            subject: "odatest".to_string(),
            scopes: vec!["tableau:views:embed".to_string()],
            oda: json!("true"),
            groups: json!(["odatest"]),
        }
    }

    /// Built-in profile for deployments that sign in with username/password.
    pub fn password() -> Self {
        Self {
            credential_kind: CredentialKind::Password,
            site: SiteContentUrl::new("eacloud"),
            subject: "embed-user".to_string(),
            scopes: vec![
                "tableau:views:embed".to_string(),
                "tableau:metrics:embed".to_string(),
            ],
            oda: json!(true),
            groups: json!("odatest"),
        }
    }

    /// The built-in profile for a credential kind.
    pub fn for_kind(kind: CredentialKind) -> Self {
        match kind {
            CredentialKind::PersonalAccessToken => Self::personal_access_token(),
            CredentialKind::Password => Self::password(),
        }
    }

    /// Short name used in logs and `/health`.
    pub fn name(&self) -> String {
        self.credential_kind.to_string()
    }
}
