//! Wrapper for secrets read from the environment.

use std::fmt;

use zeroize::Zeroize;

/// Sensitive string: the connected-app HMAC key or the Okta client secret.
/// Redacted in `Debug` and wiped on drop.
#[derive(Clone, Default)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `true` when the variable was unset or empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Expose the key bytes for signing.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Expose the value for form-encoding into an outbound request.
    pub fn expose_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let secret = Secret::new("hunter2");
        let debug = format!("{secret:?}");
        assert_eq!(debug, "[REDACTED]");
    }

    #[test]
    fn expose_returns_bytes() {
        assert_eq!(Secret::new("k").expose(), b"k");
        assert_eq!(Secret::new("k").expose_str(), "k");
        assert!(Secret::default().is_empty());
    }
}
