//! Error types for the `tableau-embed-models` crate.

use crate::credentials::CredentialKind;

/// Errors produced when validating an inbound sign-in payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// One or both halves of the credential pair were absent or empty.
    ///
    /// The message is the exact text returned to the caller.
    #[error("{}", .0.missing_message())]
    MissingCredentials(CredentialKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pat_message() {
        let err = ModelError::MissingCredentials(CredentialKind::PersonalAccessToken);
        assert_eq!(
            err.to_string(),
            "Missing personal access token name or secret"
        );
    }

    #[test]
    fn missing_password_message() {
        let err = ModelError::MissingCredentials(CredentialKind::Password);
        assert_eq!(err.to_string(), "Missing username or password");
    }
}
