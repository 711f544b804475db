//! Credential shapes accepted by the relay.
//!
//! Tableau accepts two credential pairs at sign-in: a personal access token
//! (name + secret) or a username/password. A deployment accepts exactly one
//! of them, selected by its [`CredentialKind`].

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::signin::{CredentialPair, OutboundCredentials, Site, TableauSignIn};

// ---------------------------------------------------------------------------
// CredentialKind
// ---------------------------------------------------------------------------

/// Which credential pair a deployment forwards to Tableau.
///
/// # Examples
///
/// ```
/// use tableau_embed_models::CredentialKind;
///
/// let kind: CredentialKind = "PAT".parse().unwrap();
/// assert_eq!(kind, CredentialKind::PersonalAccessToken);
/// assert_eq!(kind.to_string(), "pat");
/// ```
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    /// `personalAccessTokenName` + `personalAccessTokenSecret`.
    #[strum(to_string = "pat", serialize = "personal-access-token")]
    PersonalAccessToken,
    /// `name` + `password`.
    #[strum(to_string = "password")]
    Password,
}

impl CredentialKind {
    /// JSON field names of the credential pair, identifier first.
    pub fn field_names(self) -> (&'static str, &'static str) {
        match self {
            Self::PersonalAccessToken => ("personalAccessTokenName", "personalAccessTokenSecret"),
            Self::Password => ("name", "password"),
        }
    }

    /// Body returned to the caller when the pair is incomplete.
    pub fn missing_message(self) -> &'static str {
        match self {
            Self::PersonalAccessToken => "Missing personal access token name or secret",
            Self::Password => "Missing username or password",
        }
    }
}

// ---------------------------------------------------------------------------
// SiteContentUrl
// ---------------------------------------------------------------------------

/// Tableau site identifier (`contentUrl`) scoping a sign-in to one tenant.
///
/// The empty string is Tableau's default site.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct SiteContentUrl(String);

impl SiteContentUrl {
    /// Create a new `SiteContentUrl` from a string slice.
    pub fn new(url: &str) -> Self {
        Self(url.to_string())
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteContentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteContentUrl {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SiteContentUrl {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for SiteContentUrl {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// RawCredentials
// ---------------------------------------------------------------------------

/// The `credentials` object exactly as a client sent it.
///
/// Every field is optional so that a structurally valid but incomplete body
/// is reported as missing credentials rather than as malformed JSON.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawCredentials {
    /// Personal access token name.
    #[serde(default)]
    pub personal_access_token_name: Option<String>,
    /// Personal access token secret.
    #[serde(default)]
    pub personal_access_token_secret: Option<String>,
    /// Tableau username.
    #[serde(default)]
    pub name: Option<String>,
    /// Tableau password.
    #[serde(default)]
    pub password: Option<String>,
    /// Client-supplied site; always replaced server-side.
    #[serde(default)]
    pub site: Option<Site>,
}

impl RawCredentials {
    /// Validate the pair selected by `kind` and build the upstream payload.
    ///
    /// The client's `site` is discarded in favour of `site`. Fields of the
    /// other credential kind are never forwarded.
    ///
    /// # Errors
    ///
    /// [`ModelError::MissingCredentials`] when either half of the pair is
    /// absent or empty. No format checks are applied to the values.
    pub fn into_sign_in(
        self,
        kind: CredentialKind,
        site: SiteContentUrl,
    ) -> Result<TableauSignIn, ModelError> {
        let (id, secret) = match kind {
            CredentialKind::PersonalAccessToken => {
                (self.personal_access_token_name, self.personal_access_token_secret)
            }
            CredentialKind::Password => (self.name, self.password),
        };

        let (id, secret) = match (non_empty(id), non_empty(secret)) {
            (Some(id), Some(secret)) => (id, secret),
            _ => return Err(ModelError::MissingCredentials(kind)),
        };

        let pair = match kind {
            CredentialKind::PersonalAccessToken => CredentialPair::PersonalAccessToken {
                token_name: id,
                token_secret: secret,
            },
            CredentialKind::Password => CredentialPair::Password {
                name: id,
                password: secret,
            },
        };

        Ok(TableauSignIn {
            credentials: OutboundCredentials {
                pair,
                site: Site { content_url: site },
            },
        })
    }

    /// The identifier half of the pair for `kind`, if present.
    pub fn identity(&self, kind: CredentialKind) -> Option<&str> {
        match kind {
            CredentialKind::PersonalAccessToken => self.personal_access_token_name.as_deref(),
            CredentialKind::Password => self.name.as_deref(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn password_creds(name: &str, password: &str) -> RawCredentials {
        RawCredentials {
            name: Some(name.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    #[test]
    fn credential_kind_parses_aliases() {
        assert_eq!(
            "pat".parse::<CredentialKind>().unwrap(),
            CredentialKind::PersonalAccessToken
        );
        assert_eq!(
            "Personal-Access-Token".parse::<CredentialKind>().unwrap(),
            CredentialKind::PersonalAccessToken
        );
        assert_eq!(
            "PASSWORD".parse::<CredentialKind>().unwrap(),
            CredentialKind::Password
        );
        assert!("oauth".parse::<CredentialKind>().is_err());
    }

    #[test]
    fn credential_kind_display() {
        assert_eq!(CredentialKind::PersonalAccessToken.to_string(), "pat");
        assert_eq!(CredentialKind::Password.to_string(), "password");
    }

    #[test]
    fn credential_kind_covers_both_field_sets() {
        use strum::IntoEnumIterator;
        let names: Vec<_> = CredentialKind::iter().map(CredentialKind::field_names).collect();
        assert_eq!(
            names,
            vec![
                ("personalAccessTokenName", "personalAccessTokenSecret"),
                ("name", "password"),
            ]
        );
    }

    #[test]
    fn site_content_url_display_and_from() {
        let a = SiteContentUrl::new("eacloud");
        let b: SiteContentUrl = "eacloud".into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "eacloud");
        assert_eq!(a.as_str(), "eacloud");
    }

    #[test]
    fn raw_credentials_accept_partial_objects() {
        let raw: RawCredentials = serde_json::from_str(r#"{"name":"u"}"#).unwrap();
        assert_eq!(raw.name.as_deref(), Some("u"));
        assert!(raw.password.is_none());
        assert!(raw.site.is_none());
    }

    #[test]
    fn into_sign_in_replaces_site() {
        let mut raw = password_creds("u", "p");
        raw.site = Some(Site {
            content_url: "client-choice".into(),
        });

        let signin = raw
            .into_sign_in(CredentialKind::Password, "eacloud".into())
            .unwrap();
        assert_eq!(signin.credentials.site.content_url.as_str(), "eacloud");
    }

    #[test]
    fn into_sign_in_rejects_empty_password() {
        let err = password_creds("u", "")
            .into_sign_in(CredentialKind::Password, "eacloud".into())
            .unwrap_err();
        assert_eq!(err, ModelError::MissingCredentials(CredentialKind::Password));
    }

    #[test]
    fn into_sign_in_rejects_absent_token_secret() {
        let raw = RawCredentials {
            personal_access_token_name: Some("ci".into()),
            ..Default::default()
        };
        let err = raw
            .into_sign_in(CredentialKind::PersonalAccessToken, "site".into())
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingCredentials(CredentialKind::PersonalAccessToken)
        );
    }

    #[test]
    fn into_sign_in_ignores_pair_of_other_kind() {
        // A username/password body sent to a token deployment is incomplete.
        let err = password_creds("u", "p")
            .into_sign_in(CredentialKind::PersonalAccessToken, "site".into())
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingCredentials(CredentialKind::PersonalAccessToken)
        );
    }

    #[test]
    fn identity_reads_selected_pair() {
        let raw = password_creds("analyst", "p");
        assert_eq!(raw.identity(CredentialKind::Password), Some("analyst"));
        assert_eq!(raw.identity(CredentialKind::PersonalAccessToken), None);
    }
}
