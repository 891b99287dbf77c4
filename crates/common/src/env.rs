//! Environment variable helpers
//!
//! Empty and whitespace-only values are treated the same as unset, so an
//! `export X_OAUTH2_REFRESH_TOKEN=""` left in a shell profile does not count
//! as a credential.

use crate::Secret;

/// Read a non-empty, trimmed environment variable.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Read a non-empty environment variable as a secret.
pub fn env_secret(name: &str) -> Option<Secret<String>> {
    env_var(name).map(Secret::new)
}
