//! In-memory representation of an OAuth endpoint response.
//!
//! Authorization logic fills a [`ResponseEnvelope`] and hands it to
//! [`output_json`](crate::encode::output_json), which serializes it onto
//! the HTTP response exactly once.
//!
//! # Example
//!
//! ```
//! use octofhir_oauth_edge::response::{ResponseEnvelope, ResponseType};
//!
//! let mut envelope = ResponseEnvelope::new();
//! envelope.set_output("code", "SplxlOBeZQQYbYS6WxSbIA");
//! envelope.set_output("state", "xyz");
//! envelope.set_redirect("https://app.example.com/callback");
//!
//! assert_eq!(envelope.response_type, ResponseType::Redirect);
//! let url = envelope.redirect_url().unwrap();
//! assert!(url.starts_with("https://app.example.com/callback?"));
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use url::{Url, form_urlencoded};

use crate::AuthResult;
use crate::config::EdgeConfig;
use crate::error::{AuthError, OAuthErrorCode};

/// How the envelope is written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// JSON body with the envelope status code.
    #[default]
    Data,
    /// `302 Found` with the output encoded into the `Location` URL.
    Redirect,
}

/// Error recorded on an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    /// OAuth error code sent to the caller.
    pub code: OAuthErrorCode,
    /// Description sent to the caller.
    pub description: String,
    /// Diagnostic for logs only. Never written to the output.
    pub internal_error: Option<AuthError>,
}

/// A prepared response awaiting encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// Data or redirect.
    pub response_type: ResponseType,
    /// Status for data responses.
    pub status_code: u16,
    /// Status applied when an error is recorded.
    pub error_status_code: u16,
    /// Headers appended to the HTTP response, in insertion order.
    pub headers: IndexMap<String, Vec<String>>,
    /// Body fields, or query parameters for redirects.
    pub output: Map<String, Value>,
    /// Base URL for redirect responses.
    pub redirect_url: Option<String>,
    /// Encode redirect parameters into the fragment instead of the query.
    pub redirect_in_fragment: bool,
    error: Option<ErrorState>,
}

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseEnvelope {
    /// Creates a `200` data envelope with no-cache headers.
    #[must_use]
    pub fn new() -> Self {
        let mut envelope = Self {
            response_type: ResponseType::Data,
            status_code: 200,
            error_status_code: 200,
            headers: IndexMap::new(),
            output: Map::new(),
            redirect_url: None,
            redirect_in_fragment: false,
            error: None,
        };
        envelope.set_header(
            "Cache-Control",
            "no-cache, no-store, max-age=0, must-revalidate",
        );
        envelope.set_header("Pragma", "no-cache");
        envelope.set_header("Expires", "Fri, 01 Jan 1990 00:00:00 GMT");
        envelope
    }

    /// Creates an envelope seeded from the edge configuration.
    #[must_use]
    pub fn with_config(config: &EdgeConfig) -> Self {
        let mut envelope = Self::new();
        envelope.error_status_code = config.error_status_code;
        envelope.redirect_in_fragment = config.redirect_in_fragment;
        envelope
    }

    /// Appends a header value, keeping earlier values for the same name.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// Replaces all values of a header.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), vec![value.into()]);
    }

    /// Sets a string output field.
    pub fn set_output(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.output.insert(key.into(), Value::String(value.into()));
    }

    /// Sets an output field from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `EncodeFailure` if the value cannot be represented as JSON.
    pub fn set_output_value<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> AuthResult<()> {
        let value = serde_json::to_value(value).map_err(|e| AuthError::encode(e.to_string()))?;
        self.output.insert(key.into(), value);
        Ok(())
    }

    /// Records an error with no `state` echo.
    pub fn set_error(&mut self, code: OAuthErrorCode, description: &str) {
        self.set_error_state(code, description, "");
    }

    /// Records an error, replacing the output with the error fields.
    ///
    /// An empty description is replaced with the code's standard text. The
    /// status code becomes [`error_status_code`](Self::error_status_code).
    pub fn set_error_state(&mut self, code: OAuthErrorCode, description: &str, state: &str) {
        let description = if description.is_empty() {
            code.default_description()
        } else {
            description
        };

        self.status_code = self.error_status_code;
        self.output = Map::new();
        self.set_output("error", code.as_str());
        self.set_output("error_description", description);
        if !state.is_empty() {
            self.set_output("state", state);
        }

        self.error = Some(ErrorState {
            code,
            description: description.to_string(),
            internal_error: None,
        });
    }

    /// Attaches an internal diagnostic to the recorded error.
    ///
    /// Has no effect when no error is recorded.
    pub fn set_internal_error(&mut self, err: AuthError) {
        if let Some(state) = self.error.as_mut() {
            state.internal_error = Some(err);
        }
    }

    /// Returns `true` once an error has been recorded.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the recorded error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorState> {
        self.error.as_ref()
    }

    /// Returns the internal diagnostic of the recorded error, if any.
    #[must_use]
    pub fn internal_error(&self) -> Option<&AuthError> {
        self.error.as_ref().and_then(|e| e.internal_error.as_ref())
    }

    /// Turns the envelope into a redirect to `url`.
    pub fn set_redirect(&mut self, url: impl Into<String>) {
        self.response_type = ResponseType::Redirect;
        self.redirect_url = Some(url.into());
    }

    /// Selects fragment encoding for redirect parameters.
    pub fn set_redirect_fragment(&mut self, in_fragment: bool) {
        self.redirect_in_fragment = in_fragment;
    }

    /// Builds the final redirect URL with the output as parameters.
    ///
    /// Output fields replace same-named query parameters already on the URL.
    /// In fragment mode the query string and any existing fragment are
    /// dropped, and the merged parameters become the new fragment.
    ///
    /// # Errors
    ///
    /// Returns `RedirectBuildFailure` if the envelope is not a redirect, has
    /// no URL, or the URL does not parse.
    pub fn redirect_url(&self) -> AuthResult<String> {
        if self.response_type != ResponseType::Redirect {
            return Err(AuthError::redirect_build("not a redirect response"));
        }

        let base = self
            .redirect_url
            .as_deref()
            .ok_or_else(|| AuthError::redirect_build("redirect url not set"))?;

        let mut url = Url::parse(base).map_err(|e| AuthError::redirect_build(e.to_string()))?;

        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| !self.output.contains_key(name.as_ref()))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        params.extend(
            self.output
                .iter()
                .map(|(name, value)| (name.clone(), param_value(value))),
        );

        url.set_query(None);
        if self.redirect_in_fragment {
            let mut fragment = form_urlencoded::Serializer::new(String::new());
            fragment.extend_pairs(&params);
            url.set_fragment(Some(&fragment.finish()));
        } else if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(&params);
        }

        Ok(url.to_string())
    }
}

fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
