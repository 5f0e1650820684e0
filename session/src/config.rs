//! Session configuration

use std::time::Duration;

use serde::Deserialize;

/// Session manager settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Storage key the bearer token is persisted under
    pub token_key: String,

    /// Prefix stripped from role claims before they are exposed
    pub role_prefix: String,

    /// Message reported for failed logins when the backend doesn't provide one
    pub fallback_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token_key: "jwtToken".to_owned(),
            role_prefix: "ROLE_".to_owned(),
            fallback_message: "Invalid credentials. Please try again.".to_owned(),
        }
    }
}

/// Storefront backend endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    /// Backend root, eg. `http://localhost:8080` or `https://host/api`; endpoint paths are
    /// resolved below it
    pub base_url: String,

    /// Credential exchange endpoint
    #[serde(default = "Api::default_login_path")]
    pub login_path: String,

    /// User registration endpoint
    #[serde(default = "Api::default_register_path")]
    pub register_path: String,

    /// Request timeout in milliseconds
    #[serde(default = "Api::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Api {
    /// Endpoints of a backend hosted at `base_url` with default paths
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login_path: Self::default_login_path(),
            register_path: Self::default_register_path(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn default_login_path() -> String {
        "/auth/login".to_owned()
    }

    fn default_register_path() -> String {
        "/auth/register".to_owned()
    }

    fn default_timeout_ms() -> u64 {
        30_000
    }
}
