//! Client model and secret matching.
//!
//! A [`Client`] always exposes its stored secret. Clients that can compare a
//! supplied secret themselves (hashed storage, constant-time comparison)
//! also expose the [`ClientSecretMatcher`] capability, and
//! [`check_client_secret`] prefers it over reading the stored value.
//!
//! # Example
//!
//! ```
//! use octofhir_oauth_edge::client::{DefaultClient, check_client_secret};
//!
//! let client = DefaultClient::new("my-app", "s3cret", "https://app.example.com/callback");
//! assert!(check_client_secret(&client, "s3cret"));
//! assert!(!check_client_secret(&client, "wrong"));
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::AuthResult;
use crate::error::AuthError;

/// A registered OAuth client as seen by the endpoint.
pub trait Client {
    /// Client identifier.
    fn id(&self) -> &str;

    /// Stored secret. Empty for public clients.
    fn secret(&self) -> &str;

    /// Registered redirect URI.
    fn redirect_uri(&self) -> &str;

    /// Opaque data attached by the application.
    fn user_data(&self) -> Option<&Value> {
        None
    }

    /// Returns the secret comparison capability, if the client has one.
    fn as_secret_matcher(&self) -> Option<&dyn ClientSecretMatcher> {
        None
    }
}

/// Capability for clients that compare supplied secrets themselves.
pub trait ClientSecretMatcher {
    /// Returns `true` if `secret` is this client's secret.
    fn client_secret_matches(&self, secret: &str) -> bool;
}

/// Returns `true` if `secret` matches the client's secret.
///
/// Delegates to the client's [`ClientSecretMatcher`] when present and
/// otherwise compares against [`Client::secret`]. A public client matches the
/// empty secret.
pub fn check_client_secret<C: Client + ?Sized>(client: &C, secret: &str) -> bool {
    match client.as_secret_matcher() {
        Some(matcher) => matcher.client_secret_matches(secret),
        None => client.secret() == secret,
    }
}

/// Client holding its secret in plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultClient {
    /// Client identifier.
    pub id: String,
    /// Plain text secret; empty for public clients.
    #[serde(default)]
    pub secret: String,
    /// Registered redirect URI.
    pub redirect_uri: String,
    /// Application data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Value>,
}

impl DefaultClient {
    /// Creates a client with no user data.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            redirect_uri: redirect_uri.into(),
            user_data: None,
        }
    }

    /// Attaches application data.
    #[must_use]
    pub fn with_user_data(mut self, data: Value) -> Self {
        self.user_data = Some(data);
        self
    }
}

impl Client for DefaultClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn secret(&self) -> &str {
        &self.secret
    }

    fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn user_data(&self) -> Option<&Value> {
        self.user_data.as_ref()
    }
}

/// Client holding an Argon2id hash of its secret.
///
/// [`Client::secret`] returns the PHC hash string, so plain equality never
/// matches; comparison goes through [`ClientSecretMatcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashedSecretClient {
    /// Client identifier.
    pub id: String,
    /// PHC-formatted Argon2id hash.
    pub secret_hash: String,
    /// Registered redirect URI.
    pub redirect_uri: String,
}

impl HashedSecretClient {
    /// Creates a client by hashing `secret`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the secret cannot be hashed.
    pub fn from_secret(
        id: impl Into<String>,
        secret: &str,
        redirect_uri: impl Into<String>,
    ) -> AuthResult<Self> {
        Ok(Self {
            id: id.into(),
            secret_hash: hash_client_secret(secret)?,
            redirect_uri: redirect_uri.into(),
        })
    }
}

impl Client for HashedSecretClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn secret(&self) -> &str {
        &self.secret_hash
    }

    fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn as_secret_matcher(&self) -> Option<&dyn ClientSecretMatcher> {
        Some(self)
    }
}

impl ClientSecretMatcher for HashedSecretClient {
    fn client_secret_matches(&self, secret: &str) -> bool {
        let parsed = match PasswordHash::new(&self.secret_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(client_id = %self.id, error = %e, "Stored client secret hash is invalid");
                return false;
            }
        };
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Hashes a client secret with Argon2id for storage.
///
/// # Errors
///
/// Returns `Configuration` if hashing fails.
pub fn hash_client_secret(secret: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AuthError::configuration(format!("failed to hash client secret: {e}")))?;
    Ok(hash.to_string())
}
