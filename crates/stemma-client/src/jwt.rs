//! Minimal JWT claim decoding.
//!
//! Only the payload segment is decoded; signature verification is the
//! server's concern. The segment is base64url-decoded after padding to a
//! multiple of 4 with `=`, then parsed as JSON.

use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Claims this client consumes from an access token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenClaims {
    /// Expiry, seconds since epoch.
    pub exp: Option<i64>,
    /// Capability strings granted to this token.
    pub permissions: HashSet<String>,
}

/// Decode the payload segment of a JWT.
pub fn decode_claims(token: &str) -> ClientResult<TokenClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ClientError::InvalidResponse("token has no payload segment".into()))?;

    let padding = (4 - payload.len() % 4) % 4;
    let padded = format!("{}{}", payload, "=".repeat(padding));
    let bytes = URL_SAFE
        .decode(padded)
        .map_err(|e| ClientError::InvalidResponse(format!("token payload is not base64: {e}")))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::InvalidResponse(format!("token payload is not JSON: {e}")))?;

    let exp = value.get("exp").and_then(Value::as_i64);
    let permissions = value
        .get("permissions")
        .and_then(Value::as_array)
        .map(|perms| {
            perms
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(TokenClaims { exp, permissions })
}
