//! Session information

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::model::claims::{Claims, UserId};

/// Newtype for the bearer token string
///
/// The token is a credential on its own, so neither `Debug` nor logs ever show it - use
/// [`SessionToken::fingerprint`] to tell tokens apart.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token string, as sent in the `Authorization` header
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, non-reversible token identifier for diagnostics
    pub fn fingerprint(&self) -> String {
        let digest = Sha3_256::digest(self.0.as_bytes());
        digest[..6].iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&self.fingerprint()).finish()
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Session data
///
/// Can only be built unauthenticated or from the claims of its own token, so `role` and `user_id`
/// never outlive the token they were derived from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    token: Option<SessionToken>,
    is_authenticated: bool,
    role: Option<String>,
    user_id: Option<UserId>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Logged out session
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Authenticated session derived from a decoded token
    ///
    /// The caller is responsible for checking the claims are still valid.
    pub fn authenticated(token: SessionToken, claims: &Claims, role_prefix: &str) -> Self {
        Self {
            token: Some(token),
            is_authenticated: true,
            role: claims
                .role
                .as_ref()
                .and_then(|role| role.normalize(role_prefix)),
            user_id: claims.subject.clone(),
            expires_at: Some(claims.expires_at),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Role with the configured prefix stripped
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Checks if the session holds the given role
    pub fn has_role(&self, role: &str) -> bool {
        self.is_authenticated && self.role.as_deref() == Some(role)
    }

    /// Checks if an authenticated session passed its expiration time
    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated && self.expires_at.is_none_or(|expires_at| expires_at <= now)
    }
}
