//! Claims carried by a bearer token

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the user a token was issued for
///
/// Backends emit it either as a JSON number or as a string, both shapes are kept as they came.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_owned())
    }
}

/// Role claim as found in the token
///
/// Some backends send a single role string, some a list of roles. Only the decode boundary deals
/// with both shapes - everything past it sees a single canonical role, see [`RoleClaim::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    Single(String),
    List(Vec<String>),
}

impl RoleClaim {
    /// Authoritative role string, before prefix stripping
    ///
    /// A session carries exactly one role: when the claim is a list the first element wins and
    /// the rest is ignored.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(role) => Some(role.as_str()),
            Self::List(roles) => roles.first().map(String::as_str),
        }
    }

    /// Canonical role exposed by the session
    ///
    /// Strips `prefix` if present. Empty roles are reported as no role at all.
    pub fn normalize(&self, prefix: &str) -> Option<String> {
        let role = self.primary()?.trim();
        let role = role.strip_prefix(prefix).unwrap_or(role);
        (!role.is_empty()).then(|| role.to_owned())
    }
}

/// Decoded claim set of a session token
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    /// Token expiration time
    pub expires_at: DateTime<Utc>,
    /// Role claim, if the token carries one
    pub role: Option<RoleClaim>,
    /// Subject the token was issued for
    pub subject: Option<UserId>,
}

impl Claims {
    /// Checks whether the token is still valid at `now`
    ///
    /// Expiration is exclusive - a token expiring exactly now is not valid anymore.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
