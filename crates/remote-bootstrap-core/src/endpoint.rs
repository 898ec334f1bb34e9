//! Target endpoint for the bootstrap session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the target host address.
pub const HOST_ENV: &str = "REMOTE_BOOTSTRAP_HOST";
/// Environment variable overriding the remote username.
pub const USER_ENV: &str = "REMOTE_BOOTSTRAP_USER";
/// Environment variable overriding the remote password.
pub const PASSWORD_ENV: &str = "REMOTE_BOOTSTRAP_PASSWORD";

const DEFAULT_HOST: &str = "159.89.113.242";
const DEFAULT_USER: &str = "root";
const DEFAULT_PASSWORD: &str = "AVallon1231402@rooot";

/// The remote host/user/password triple one run connects to.
///
/// Defaults are baked in; each field can be overridden from the environment
/// so the password does not have to live in source or on a command line.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Remote hostname or IP address.
    pub host: String,
    /// Username for authentication.
    pub user: String,
    password: String,
}

impl Endpoint {
    /// Create an endpoint from explicit values.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    /// Resolve the endpoint from the process environment, falling back to
    /// the built-in defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve the endpoint through an arbitrary variable lookup.
    #[must_use]
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            user: lookup(USER_ENV).unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: lookup(PASSWORD_ENV).unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
        }
    }

    /// The remote password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The `user@host` destination handed to the SSH client.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

// The password must never reach logs through Debug formatting.
impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_overrides() {
        let endpoint = Endpoint::resolve(|_| None);
        assert_eq!(endpoint.host, "159.89.113.242");
        assert_eq!(endpoint.user, "root");
        assert_eq!(endpoint.destination(), "root@159.89.113.242");
    }

    #[test]
    fn test_env_overrides_win() {
        let endpoint = Endpoint::resolve(|key| match key {
            HOST_ENV => Some("203.0.113.7".to_string()),
            PASSWORD_ENV => Some("hunter2".to_string()),
            _ => None,
        });
        assert_eq!(endpoint.host, "203.0.113.7");
        assert_eq!(endpoint.user, "root");
        assert_eq!(endpoint.password(), "hunter2");
    }

    #[test]
    fn test_debug_redacts_password() {
        let endpoint = Endpoint::new("203.0.113.7", "root", "hunter2");
        let rendered = format!("{endpoint:?}");
        assert!(rendered.contains("203.0.113.7"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_endpoint_serialization() {
        let endpoint = Endpoint::new("203.0.113.7", "admin", "hunter2");
        let json = serde_json::to_string(&endpoint).unwrap();
        let parsed: Endpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, endpoint);
    }
}
