//! Reading claims out of access tokens.
//!
//! The signature is not verified; the backend does that. The client only
//! reads the payload to learn who is logged in and when the token expires.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::Value;

/// Claims the backend puts into its access tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenClaims {
    /// User id.
    pub sub: Option<String>,
    pub role: Option<String>,
    pub jti: Option<String>,
    /// Issued-at, seconds since epoch.
    pub iat: Option<f64>,
    /// Expiry, seconds since epoch.
    pub exp: Option<f64>,
}

/// Decode the payload of a three-part JWT. `None` if the token is malformed.
pub fn decode_token_claims(token: &str) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    let claims = value.as_object()?;

    let string = |key: &str| claims.get(key).and_then(Value::as_str).map(str::to_string);
    Some(TokenClaims {
        sub: string("sub"),
        role: string("role"),
        jti: string("jti"),
        iat: claims.get("iat").and_then(Value::as_f64),
        exp: claims.get("exp").and_then(Value::as_f64),
    })
}

/// Expiry of `token` in milliseconds since epoch. `None` if the token is
/// malformed or its `exp` claim is not a number.
pub fn parse_token_expiry(token: &str) -> Option<i64> {
    let exp = decode_token_claims(token)?.exp?;
    Some((exp * 1000.0) as i64)
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}
