//! # octofhir-oauth-edge
//!
//! Request and response edge of the OctoFHIR OAuth 2.0 endpoints.
//!
//! This crate provides:
//! - Basic and Bearer credential extraction from the `Authorization`
//!   header and request parameters
//! - Client credential resolution with optional `client_secret_post`
//!   support
//! - Client secret matching with pluggable comparison
//! - Encoding of prepared responses as JSON bodies or redirects
//!
//! It does not decide whether credentials are valid and does not issue
//! tokens; grant handling consumes the extracted credentials and produces
//! the [`ResponseEnvelope`] this crate encodes.
//!
//! ## Modules
//!
//! - [`form`] - Single-value access to query and form parameters
//! - [`credentials`] - Basic and Bearer credential extraction
//! - [`client_auth`] - Client credential resolution
//! - [`client`] - Client model and secret matching
//! - [`response`] - Response envelope
//! - [`encode`] - Envelope encoding onto HTTP responses
//! - [`config`] - Edge configuration
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use octofhir_oauth_edge::prelude::*;
//!
//! let form = RequestForm::from_query("client_id=my-app&client_secret=s3cret");
//! let mut envelope = ResponseEnvelope::new();
//!
//! let credential = resolve_client_auth(&mut envelope, &form, true).unwrap();
//! assert_eq!(credential.username, "my-app");
//!
//! envelope.set_output("access_token", "abc");
//! envelope.set_output("token_type", "bearer");
//! let response = to_http_response(&envelope).unwrap();
//! assert_eq!(response.status(), 200);
//! ```

pub mod client;
pub mod client_auth;
pub mod config;
pub mod credentials;
pub mod encode;
pub mod error;
pub mod form;
pub mod response;

pub use client::{
    Client, ClientSecretMatcher, DefaultClient, HashedSecretClient, check_client_secret,
    hash_client_secret,
};
pub use client_auth::resolve_client_auth;
pub use self::config::{ConfigError, EdgeConfig, load_config};
pub use credentials::{BasicCredential, BearerCredential, extract_basic, extract_bearer};
pub use encode::{ResponseWriter, output_json, to_http_response};
pub use error::{AuthError, ErrorCategory, OAuthErrorCode};
pub use form::{FormAccessor, FormRejection, RequestForm};
pub use response::{ErrorState, ResponseEnvelope, ResponseType};

/// Type alias for extraction and encoding results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use octofhir_oauth_edge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::client::{
        Client, ClientSecretMatcher, DefaultClient, HashedSecretClient, check_client_secret,
    };
    pub use crate::client_auth::resolve_client_auth;
    pub use crate::config::{ConfigError, EdgeConfig};
    pub use crate::credentials::{
        BasicCredential, BearerCredential, extract_basic, extract_bearer,
    };
    pub use crate::encode::{ResponseWriter, output_json, to_http_response};
    pub use crate::error::{AuthError, ErrorCategory, OAuthErrorCode};
    pub use crate::form::{FormAccessor, RequestForm};
    pub use crate::response::{ErrorState, ResponseEnvelope, ResponseType};
}
