//! Local token decoding
//!
//! Tokens are decoded only to learn what the backend thinks about the session. Signatures are not
//! verified - the backend does that on every request, and the client has no key to do it anyway.

use base64::prelude::*;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::claims::{Claims, RoleClaim, UserId};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Token is not made of three segments")]
    InvalidSegments,
    #[error("Token payload is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("Token payload is not a valid claim set: {0}")]
    InvalidClaims(#[from] serde_json::Error),
    #[error("Missing claim {0}")]
    MissingClaim(&'static str),
    #[error("Invalid claim {0}")]
    InvalidClaim(&'static str),
}

/// Decodes opaque token strings into claims
///
/// Decoding is pure: no I/O, same input always gives the same output.
pub trait TokenCodec: Send + Sync {
    fn decode(&self, token: &str) -> Result<Claims, DecodeError>;
}

/// Claims as they are laid out in the JWT payload
///
/// Only `exp` is typed strictly. Identity claims of an unexpected shape are ignored instead of
/// invalidating the whole token.
#[derive(Debug, Deserialize)]
struct Payload {
    exp: Option<f64>,
    roles: Option<Value>,
    role: Option<Value>,
    id: Option<Value>,
    sub: Option<Value>,
}

fn role_claim(value: Option<Value>) -> Option<RoleClaim> {
    serde_json::from_value(value?).ok()
}

fn user_id(value: Option<Value>) -> Option<UserId> {
    match value? {
        Value::Number(id) => id.as_i64().map(UserId::Numeric),
        Value::String(id) if !id.is_empty() => Some(UserId::Text(id)),
        _ => None,
    }
}

/// JWT payload decoder
///
/// Expects the usual `header.payload.signature` layout. The role is taken from `roles`, falling
/// back to `role`; the subject from `id`, falling back to `sub`. Only `exp` is mandatory.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtCodec;

impl TokenCodec for JwtCodec {
    fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        let mut segments = token.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(DecodeError::InvalidSegments);
        };

        let payload = BASE64_URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let payload: Payload = serde_json::from_slice(&payload)?;

        let exp = payload.exp.ok_or(DecodeError::MissingClaim("exp"))?;
        let expires_at = exp
            .is_finite()
            .then(|| DateTime::from_timestamp(exp.floor() as i64, 0))
            .flatten()
            .ok_or(DecodeError::InvalidClaim("exp"))?;

        Ok(Claims {
            expires_at,
            role: role_claim(payload.roles).or_else(|| role_claim(payload.role)),
            subject: user_id(payload.id).or_else(|| user_id(payload.sub)),
        })
    }
}
