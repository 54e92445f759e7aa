//! Credential extraction from the `Authorization` value and form fields.
//!
//! Basic extraction is strict: a present but malformed value is an error.
//! Bearer extraction is lenient: a malformed header degrades to the `code`
//! field, or to no credential at all. Callers relying on either behavior
//! should not expect the other.

use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::debug;

use crate::AuthResult;
use crate::error::AuthError;
use crate::form::FormAccessor;

/// Field carrying an access code for bearer-style lookups.
pub const CODE_FIELD: &str = "code";

/// Credentials from an HTTP Basic `Authorization` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredential {
    /// Text before the first `:` of the decoded payload.
    pub username: String,
    /// Text after the first `:`; may itself contain `:`.
    pub password: String,
}

/// Token from a `Bearer` header or the `code` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerCredential {
    /// The opaque token.
    pub token: String,
}

/// Extracts Basic credentials from the request.
///
/// Returns `Ok(None)` when no authorization value was sent.
///
/// # Errors
///
/// - `MalformedAuthHeader` if the value is not `Basic <payload>`
///   (the scheme is matched case-sensitively)
/// - `MalformedAuthPayload` if the payload is not base64 of `user:pass`
pub fn extract_basic<F: FormAccessor + ?Sized>(
    request: &F,
) -> AuthResult<Option<BasicCredential>> {
    let header = match request.authorization() {
        Some(h) if !h.is_empty() => h,
        _ => return Ok(None),
    };

    let payload = match header.split_once(' ') {
        Some(("Basic", payload)) => payload,
        _ => return Err(AuthError::malformed_header("invalid authorization header")),
    };

    let decoded = STANDARD
        .decode(payload)
        .map_err(|e| AuthError::malformed_payload(e.to_string()))?;

    let decoded = String::from_utf8(decoded)
        .map_err(|e| AuthError::malformed_payload(e.to_string()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| AuthError::malformed_payload("invalid authorization message"))?;

    debug!(client_id = %username, "Basic credentials extracted");

    Ok(Some(BasicCredential {
        username: username.to_string(),
        password: password.to_string(),
    }))
}

/// Extracts a bearer token from the request.
///
/// A well-formed `Bearer` header wins over the `code` field. A header with
/// another scheme or shape falls back to the field, and yields `None` when
/// the field is empty too. This function never fails.
pub fn extract_bearer<F: FormAccessor + ?Sized>(request: &F) -> Option<BearerCredential> {
    let header = request.authorization().unwrap_or_default();
    let field = request.value(CODE_FIELD).unwrap_or_default();

    if header.is_empty() && field.is_empty() {
        return None;
    }

    let mut token = field;
    if !header.is_empty() {
        match header.split_once(' ') {
            Some((scheme, payload)) if scheme.eq_ignore_ascii_case("bearer") => {
                token = payload;
            }
            _ if token.is_empty() => {
                debug!("Authorization value is not a bearer token and no code was sent");
                return None;
            }
            _ => {
                debug!("Authorization value is not a bearer token, using code field");
            }
        }
    }

    Some(BearerCredential {
        token: token.to_string(),
    })
}
