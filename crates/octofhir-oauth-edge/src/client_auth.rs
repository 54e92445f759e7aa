//! Client authentication for token and authorize endpoints.
//!
//! Resolves the client identity a request claims, without checking it
//! against any registry. Two sources are supported:
//!
//! - `client_secret_post` - `client_id` and `client_secret` as request
//!   parameters, only when the caller allows it
//! - `client_secret_basic` - HTTP Basic `Authorization` value
//!
//! Failures are recorded on the [`ResponseEnvelope`] as `invalid_request`,
//! with the cause attached as an internal diagnostic.

use tracing::{debug, warn};

use crate::credentials::{BasicCredential, extract_basic};
use crate::error::AuthError;
use crate::form::FormAccessor;
use crate::response::ResponseEnvelope;

/// Field carrying the client identifier.
pub const CLIENT_ID_FIELD: &str = "client_id";

/// Field carrying the client secret.
pub const CLIENT_SECRET_FIELD: &str = "client_secret";

/// Resolves the client credentials of a request.
///
/// With `allow_query_params`, a non-empty `client_secret` paired with a
/// non-empty `client_id` is returned directly and headers are not read. An
/// empty `client_id` falls through to the Basic header.
///
/// Returns `None` after recording an error on `envelope` when the header is
/// malformed or no credentials were sent. An error already recorded on the
/// envelope is left in place.
pub fn resolve_client_auth<F: FormAccessor + ?Sized>(
    envelope: &mut ResponseEnvelope,
    request: &F,
    allow_query_params: bool,
) -> Option<BasicCredential> {
    if allow_query_params {
        let secret = request.value(CLIENT_SECRET_FIELD).unwrap_or_default();
        if !secret.is_empty() {
            let client_id = request.value(CLIENT_ID_FIELD).unwrap_or_default();
            if !client_id.is_empty() {
                debug!(client_id = %client_id, "Client credentials taken from request parameters");
                return Some(BasicCredential {
                    username: client_id.to_string(),
                    password: secret.to_string(),
                });
            }
        }
    }

    match extract_basic(request) {
        Ok(Some(credential)) => Some(credential),
        Ok(None) => {
            record_failure(
                envelope,
                AuthError::missing_credential("client authentication not sent"),
            );
            None
        }
        Err(e) => {
            record_failure(envelope, e);
            None
        }
    }
}

fn record_failure(envelope: &mut ResponseEnvelope, err: AuthError) {
    warn!(
        error = %err,
        category = %err.category(),
        "Client authentication failed"
    );

    if envelope.is_error() {
        return;
    }
    envelope.set_error(err.oauth_error_code(), "");
    envelope.set_internal_error(err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OAuthErrorCode;
    use crate::form::RequestForm;
    use base64::{Engine, engine::general_purpose::STANDARD};

    fn basic(payload: &str) -> String {
        format!("Basic {}", STANDARD.encode(payload))
    }

    #[test]
    fn test_query_params_bypass_headers() {
        // A malformed header would fail if it were read.
        let form = RequestForm::from_query("client_id=id&client_secret=s")
            .with_authorization("Garbage");
        let mut envelope = ResponseEnvelope::new();

        let cred = resolve_client_auth(&mut envelope, &form, true).unwrap();
        assert_eq!(cred.username, "id");
        assert_eq!(cred.password, "s");
        assert!(!envelope.is_error());
    }

    #[test]
    fn test_query_params_ignored_when_not_allowed() {
        let form = RequestForm::from_query("client_id=id&client_secret=s");
        let mut envelope = ResponseEnvelope::new();

        assert!(resolve_client_auth(&mut envelope, &form, false).is_none());
        assert!(matches!(
            envelope.internal_error(),
            Some(AuthError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_empty_client_id_falls_through_to_header() {
        let form = RequestForm::from_query("client_id=&client_secret=s")
            .with_authorization(basic("header-id:header-secret"));
        let mut envelope = ResponseEnvelope::new();

        let cred = resolve_client_auth(&mut envelope, &form, true).unwrap();
        assert_eq!(cred.username, "header-id");
        assert_eq!(cred.password, "header-secret");
    }

    #[test]
    fn test_unreadable_header_not_replaced_by_query_field() {
        let (parts, ()) = axum::http::Request::post("/token?Authorization=Basic%20YXR0YWNrZXI6cHc%3D")
            .header(
                "authorization",
                axum::http::HeaderValue::from_bytes(b"Basic \xe9\xe9\xe9").unwrap(),
            )
            .body(())
            .unwrap()
            .into_parts();
        let form = RequestForm::from_parts(&parts, b"");
        let mut envelope = ResponseEnvelope::new();

        assert!(resolve_client_auth(&mut envelope, &form, false).is_none());
        assert_eq!(envelope.error().unwrap().code, OAuthErrorCode::InvalidRequest);
        assert!(matches!(
            envelope.internal_error(),
            Some(AuthError::MalformedAuthPayload { .. })
        ));
    }

    #[test]
    fn test_empty_client_id_without_header_fails() {
        let form = RequestForm::from_query("client_id=&client_secret=s");
        let mut envelope = ResponseEnvelope::new();

        assert!(resolve_client_auth(&mut envelope, &form, true).is_none());
        assert_eq!(envelope.error().unwrap().code, OAuthErrorCode::InvalidRequest);
    }

    #[test]
    fn test_empty_secret_falls_through_to_header() {
        let form = RequestForm::from_query("client_id=id&client_secret=")
            .with_authorization(basic("header-id:"));
        let mut envelope = ResponseEnvelope::new();

        let cred = resolve_client_auth(&mut envelope, &form, true).unwrap();
        assert_eq!(cred.username, "header-id");
        assert_eq!(cred.password, "");
    }

    #[test]
    fn test_malformed_header_sets_error() {
        let form = RequestForm::default().with_authorization("Bearer abc");
        let mut envelope = ResponseEnvelope::new();

        assert!(resolve_client_auth(&mut envelope, &form, false).is_none());
        let state = envelope.error().unwrap();
        assert_eq!(state.code, OAuthErrorCode::InvalidRequest);
        assert!(matches!(
            state.internal_error,
            Some(AuthError::MalformedAuthHeader { .. })
        ));
        assert_eq!(envelope.output["error"], "invalid_request");
    }

    #[test]
    fn test_missing_auth_sets_error() {
        let mut envelope = ResponseEnvelope::new();
        assert!(resolve_client_auth(&mut envelope, &RequestForm::default(), false).is_none());
        assert_eq!(
            envelope.internal_error(),
            Some(&AuthError::missing_credential("client authentication not sent"))
        );
        // The diagnostic stays internal.
        assert!(
            !envelope.output["error_description"]
                .as_str()
                .unwrap()
                .contains("not sent")
        );
    }

    #[test]
    fn test_existing_error_is_preserved() {
        let mut envelope = ResponseEnvelope::new();
        envelope.set_error_state(OAuthErrorCode::InvalidScope, "bad scope", "st");

        assert!(resolve_client_auth(&mut envelope, &RequestForm::default(), false).is_none());
        let state = envelope.error().unwrap();
        assert_eq!(state.code, OAuthErrorCode::InvalidScope);
        assert_eq!(state.description, "bad scope");
        assert!(state.internal_error.is_none());
    }
}
