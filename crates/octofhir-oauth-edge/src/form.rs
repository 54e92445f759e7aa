//! Single-value access to request parameters.
//!
//! Credential extraction only ever needs one value per field name. The
//! [`FormAccessor`] trait is that seam; [`RequestForm`] implements it over an
//! HTTP request head plus an `application/x-www-form-urlencoded` body.
//!
//! # Precedence
//!
//! Query string values win over body values, and within each source the
//! first occurrence of a name wins. The `Authorization` value is read from the
//! HTTP header, falling back to a parameter of the same name only when no
//! header was sent. Header bytes that are not valid UTF-8 are kept with
//! replacement characters so they fail credential parsing.

use axum::{
    Json,
    extract::{FromRequest, Request},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use indexmap::IndexMap;
use serde::Serialize;

/// Name of the field carrying the authorization value.
pub const AUTHORIZATION: &str = "Authorization";

/// Largest request body read by the [`RequestForm`] extractor.
pub const MAX_FORM_BYTES: usize = 64 * 1024;

/// Read-only access to single request values.
///
/// An absent field returns `None`; a field sent with no value returns
/// `Some("")`.
pub trait FormAccessor {
    /// Returns the value of a query or form field.
    fn value(&self, name: &str) -> Option<&str>;

    /// Returns the authorization value of the request.
    fn authorization(&self) -> Option<&str> {
        self.value(AUTHORIZATION)
    }
}

impl<T: FormAccessor + ?Sized> FormAccessor for &T {
    fn value(&self, name: &str) -> Option<&str> {
        (**self).value(name)
    }

    fn authorization(&self) -> Option<&str> {
        (**self).authorization()
    }
}

/// Request parameters captured from an HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestForm {
    authorization: Option<String>,
    query: IndexMap<String, String>,
    body: IndexMap<String, String>,
}

impl RequestForm {
    /// Captures parameters from a request head and its body bytes.
    ///
    /// The body is only parsed when the request declares
    /// `application/x-www-form-urlencoded` content.
    pub fn from_parts(parts: &Parts, body: &[u8]) -> Self {
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let query = parts
            .uri
            .query()
            .map(|q| parse_pairs(q.as_bytes()))
            .unwrap_or_default();

        let body = if is_form_urlencoded(&parts.headers) {
            parse_pairs(body)
        } else {
            IndexMap::new()
        };

        Self {
            authorization,
            query,
            body,
        }
    }

    /// Creates a form from a raw query string.
    pub fn from_query(query: &str) -> Self {
        Self {
            query: parse_pairs(query.trim_start_matches('?').as_bytes()),
            ..Self::default()
        }
    }

    /// Sets the urlencoded body parameters.
    #[must_use]
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = parse_pairs(body.as_bytes());
        self
    }

    /// Sets the `Authorization` header value.
    #[must_use]
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }
}

impl FormAccessor for RequestForm {
    fn value(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .or_else(|| self.body.get(name))
            .map(String::as_str)
    }

    fn authorization(&self) -> Option<&str> {
        self.authorization
            .as_deref()
            .or_else(|| self.value(AUTHORIZATION))
    }
}

/// Error returned when the request body cannot be read.
#[derive(Debug, Clone, Serialize)]
pub struct FormRejection {
    pub error: String,
    pub error_description: String,
}

impl IntoResponse for FormRejection {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

impl<S> FromRequest<S> for RequestForm
where
    S: Send + Sync,
{
    type Rejection = FormRejection;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
            .await
            .map_err(|e| FormRejection {
                error: "invalid_request".to_string(),
                error_description: format!("Failed to read request body: {}", e),
            })?;
        Ok(Self::from_parts(&parts, &bytes))
    }
}

fn parse_pairs(input: &[u8]) -> IndexMap<String, String> {
    let mut pairs = IndexMap::new();
    for (name, value) in url::form_urlencoded::parse(input) {
        pairs
            .entry(name.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    pairs
}

fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}
