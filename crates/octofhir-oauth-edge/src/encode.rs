//! Response encoding.
//!
//! [`output_json`] writes a [`ResponseEnvelope`] onto anything implementing
//! [`ResponseWriter`]. The writer is implemented for axum's [`Response`], so
//! handlers can also return an envelope directly:
//!
//! ```ignore
//! async fn token(form: RequestForm) -> ResponseEnvelope {
//!     let mut envelope = ResponseEnvelope::new();
//!     // ...
//!     envelope
//! }
//! ```

use axum::{
    Json,
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

use crate::AuthResult;
use crate::error::{AuthError, OAuthErrorCode};
use crate::response::{ResponseEnvelope, ResponseType};

/// Content type applied to data responses that do not declare one.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The HTTP response operations the encoder relies on.
pub trait ResponseWriter {
    /// Appends a header value without removing existing values.
    fn append_header(&mut self, name: &str, value: &str) -> AuthResult<()>;

    /// Returns `true` if the header has at least one value.
    fn has_header(&self, name: &str) -> bool;

    /// Replaces all values of a header.
    fn set_header(&mut self, name: &str, value: &str) -> AuthResult<()>;

    /// Sets the status code.
    fn set_status(&mut self, status: u16) -> AuthResult<()>;

    /// Writes the complete body.
    fn write_body(&mut self, body: Vec<u8>) -> AuthResult<()>;
}

/// Writes the envelope onto `response`.
///
/// Envelope headers are appended first. A redirect envelope then gets a
/// `Location` header and status `302` with no body. A data envelope gets a
/// `Content-Type` of `application/json` unless one is already present, its
/// status code, and its output serialized as a JSON object.
///
/// # Errors
///
/// - `RedirectBuildFailure` if the redirect URL cannot be built; no status,
///   `Location` or body is written
/// - `EncodeFailure` if a header is invalid or the output cannot be
///   serialized; the body is not written
pub fn output_json<W: ResponseWriter + ?Sized>(
    envelope: &ResponseEnvelope,
    response: &mut W,
) -> AuthResult<()> {
    for (name, values) in &envelope.headers {
        for value in values {
            response.append_header(name, value)?;
        }
    }

    match envelope.response_type {
        ResponseType::Redirect => {
            let location = envelope.redirect_url()?;
            debug!(location = %location, "Encoding redirect response");
            response.append_header(header::LOCATION.as_str(), &location)?;
            response.set_status(StatusCode::FOUND.as_u16())?;
        }
        ResponseType::Data => {
            if !response.has_header(header::CONTENT_TYPE.as_str()) {
                response.set_header(header::CONTENT_TYPE.as_str(), JSON_CONTENT_TYPE)?;
            }
            let body = serde_json::to_vec(&envelope.output)
                .map_err(|e| AuthError::encode(e.to_string()))?;
            debug!(
                status = envelope.status_code,
                is_error = envelope.is_error(),
                "Encoding data response"
            );
            response.set_status(envelope.status_code)?;
            response.write_body(body)?;
        }
    }

    Ok(())
}

/// Builds a fresh axum response from the envelope.
///
/// # Errors
///
/// Same as [`output_json`].
pub fn to_http_response(envelope: &ResponseEnvelope) -> AuthResult<Response> {
    let mut response = Response::new(Body::empty());
    output_json(envelope, &mut response)?;
    Ok(response)
}

impl ResponseWriter for Response {
    fn append_header(&mut self, name: &str, value: &str) -> AuthResult<()> {
        let (name, value) = header_pair(name, value)?;
        self.headers_mut().append(name, value);
        Ok(())
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers().contains_key(name)
    }

    fn set_header(&mut self, name: &str, value: &str) -> AuthResult<()> {
        let (name, value) = header_pair(name, value)?;
        self.headers_mut().insert(name, value);
        Ok(())
    }

    fn set_status(&mut self, status: u16) -> AuthResult<()> {
        *self.status_mut() = StatusCode::from_u16(status)
            .map_err(|e| AuthError::encode(format!("invalid status code {status}: {e}")))?;
        Ok(())
    }

    fn write_body(&mut self, body: Vec<u8>) -> AuthResult<()> {
        *self.body_mut() = Body::from(body);
        Ok(())
    }
}

fn header_pair(name: &str, value: &str) -> AuthResult<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| AuthError::encode(format!("invalid header name '{name}': {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| AuthError::encode(format!("invalid value for header '{name}': {e}")))?;
    Ok((name, value))
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        match to_http_response(&self) {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Failed to encode OAuth response");
                let code = OAuthErrorCode::ServerError;
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": code.as_str(),
                        "error_description": code.default_description(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingWriter {
        headers: Vec<(String, String)>,
        status: Option<u16>,
        body: Option<Vec<u8>>,
        fail_status: bool,
    }

    impl ResponseWriter for RecordingWriter {
        fn append_header(&mut self, name: &str, value: &str) -> AuthResult<()> {
            self.headers.push((name.to_ascii_lowercase(), value.to_string()));
            Ok(())
        }

        fn has_header(&self, name: &str) -> bool {
            self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
        }

        fn set_header(&mut self, name: &str, value: &str) -> AuthResult<()> {
            self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            self.append_header(name, value)
        }

        fn set_status(&mut self, status: u16) -> AuthResult<()> {
            if self.fail_status {
                return Err(AuthError::encode("connection closed"));
            }
            self.status = Some(status);
            Ok(())
        }

        fn write_body(&mut self, body: Vec<u8>) -> AuthResult<()> {
            self.body = Some(body);
            Ok(())
        }
    }

    impl RecordingWriter {
        fn values(&self, name: &str) -> Vec<&str> {
            self.headers
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
                .collect()
        }
    }

    #[test]
    fn test_data_response() {
        let mut envelope = ResponseEnvelope::new();
        envelope.set_output("access_token", "abc");
        envelope.set_output("token_type", "bearer");

        let mut writer = RecordingWriter::default();
        output_json(&envelope, &mut writer).unwrap();

        assert_eq!(writer.status, Some(200));
        assert_eq!(writer.values("content-type"), vec!["application/json"]);
        assert_eq!(writer.values("pragma"), vec!["no-cache"]);
        let body: serde_json::Value = serde_json::from_slice(&writer.body.unwrap()).unwrap();
        assert_eq!(body, json!({"access_token": "abc", "token_type": "bearer"}));
    }

    #[test]
    fn test_data_response_keeps_upstream_content_type() {
        let envelope = ResponseEnvelope::new();
        let mut writer = RecordingWriter::default();
        writer
            .append_header("Content-Type", "application/fhir+json")
            .unwrap();

        output_json(&envelope, &mut writer).unwrap();
        assert_eq!(writer.values("content-type"), vec!["application/fhir+json"]);
    }

    #[test]
    fn test_data_response_keeps_envelope_content_type() {
        let mut envelope = ResponseEnvelope::new();
        envelope.add_header("Content-Type", "text/plain");

        let mut writer = RecordingWriter::default();
        output_json(&envelope, &mut writer).unwrap();
        assert_eq!(writer.values("content-type"), vec!["text/plain"]);
    }

    #[test]
    fn test_headers_are_additive() {
        let mut envelope = ResponseEnvelope::new();
        envelope.add_header("X-Trace", "a");
        envelope.add_header("X-Trace", "b");

        let mut writer = RecordingWriter::default();
        writer.append_header("X-Trace", "upstream").unwrap();
        output_json(&envelope, &mut writer).unwrap();

        assert_eq!(writer.values("x-trace"), vec!["upstream", "a", "b"]);
    }

    #[test]
    fn test_redirect_response() {
        let mut envelope = ResponseEnvelope::new();
        envelope.set_redirect("https://app.example.com/callback");
        envelope.set_output("code", "xyz");

        let mut writer = RecordingWriter::default();
        output_json(&envelope, &mut writer).unwrap();

        assert_eq!(writer.status, Some(302));
        assert_eq!(
            writer.values("location"),
            vec!["https://app.example.com/callback?code=xyz"]
        );
        assert!(writer.body.is_none());
        assert!(writer.values("content-type").is_empty());
    }

    #[test]
    fn test_redirect_failure_writes_nothing() {
        let mut envelope = ResponseEnvelope::new();
        envelope.set_redirect("::not a url::");

        let mut writer = RecordingWriter::default();
        let err = output_json(&envelope, &mut writer).unwrap_err();

        assert!(matches!(err, AuthError::RedirectBuildFailure { .. }));
        assert!(writer.status.is_none());
        assert!(writer.body.is_none());
        assert!(writer.values("location").is_empty());
    }

    #[test]
    fn test_write_failure_leaves_no_body() {
        let envelope = ResponseEnvelope::new();
        let mut writer = RecordingWriter {
            fail_status: true,
            ..RecordingWriter::default()
        };

        let err = output_json(&envelope, &mut writer).unwrap_err();
        assert!(matches!(err, AuthError::EncodeFailure { .. }));
        assert!(writer.body.is_none());
    }

    #[test]
    fn test_axum_response_invalid_header() {
        let mut envelope = ResponseEnvelope::new();
        envelope.add_header("bad header", "x");

        let err = to_http_response(&envelope).unwrap_err();
        assert!(matches!(err, AuthError::EncodeFailure { .. }));
    }

    #[test]
    fn test_axum_response_invalid_status() {
        let mut envelope = ResponseEnvelope::new();
        envelope.status_code = 42;
        assert!(to_http_response(&envelope).is_err());

        let response = envelope.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_axum_redirect() {
        let mut envelope = ResponseEnvelope::new();
        envelope.set_redirect("https://app.example.com/callback");
        envelope.set_error_state(OAuthErrorCode::AccessDenied, "denied", "s1");

        let response = to_http_response(&envelope).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://app.example.com/callback?"));
        assert!(location.contains("error=access_denied"));
        assert!(location.contains("state=s1"));
        assert_eq!(response.headers().get_all(header::PRAGMA).iter().count(), 1);
    }
}
