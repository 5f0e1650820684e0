//! Test helpers

use base64::prelude::*;
use serde_json::{Value, json};

/// Builds an unsigned JWT carrying given payload
pub fn jwt(payload: Value) -> String {
    let header = BASE64_URL_SAFE_NO_PAD.encode(json!({ "alg": "HS256", "typ": "JWT" }).to_string());
    let payload = BASE64_URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Token for user `id` with a `roles` list, expiring at `exp`
pub fn user_token(id: i64, roles: &[&str], exp: i64) -> String {
    jwt(json!({
        "sub": format!("user{id}@example.com"),
        "id": id,
        "roles": roles,
        "exp": exp,
    }))
}
