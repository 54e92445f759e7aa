//! Error types for credential extraction and response encoding.
//!
//! Extraction failures (`MalformedAuthHeader`, `MalformedAuthPayload`,
//! `MissingCredential`) are normally recorded on a
//! [`ResponseEnvelope`](crate::response::ResponseEnvelope) as an internal
//! diagnostic. Encoding failures are returned to the caller as hard errors.

use std::fmt;

/// Errors produced while parsing credentials or encoding responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` value has the wrong scheme or shape.
    #[error("Malformed authorization header: {message}")]
    MalformedAuthHeader {
        /// Description of what is wrong with the header.
        message: String,
    },

    /// The credential payload could not be decoded or split.
    #[error("Malformed authorization payload: {message}")]
    MalformedAuthPayload {
        /// Description of the decode or split failure.
        message: String,
    },

    /// No credentials were sent where they are required.
    #[error("Missing credential: {message}")]
    MissingCredential {
        /// Which credential was expected.
        message: String,
    },

    /// The redirect URL for a redirect response could not be built.
    #[error("Redirect build failure: {message}")]
    RedirectBuildFailure {
        /// Description of why the URL could not be built.
        message: String,
    },

    /// The response could not be serialized or written.
    #[error("Encode failure: {message}")]
    EncodeFailure {
        /// Description of the serialization or write failure.
        message: String,
    },

    /// The edge configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `MalformedAuthHeader` error.
    #[must_use]
    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedAuthHeader {
            message: message.into(),
        }
    }

    /// Creates a new `MalformedAuthPayload` error.
    #[must_use]
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::MalformedAuthPayload {
            message: message.into(),
        }
    }

    /// Creates a new `MissingCredential` error.
    #[must_use]
    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::MissingCredential {
            message: message.into(),
        }
    }

    /// Creates a new `RedirectBuildFailure` error.
    #[must_use]
    pub fn redirect_build(message: impl Into<String>) -> Self {
        Self::RedirectBuildFailure {
            message: message.into(),
        }
    }

    /// Creates a new `EncodeFailure` error.
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::EncodeFailure {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if the error was caused by caller input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedAuthHeader { .. }
                | Self::MalformedAuthPayload { .. }
                | Self::MissingCredential { .. }
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedAuthHeader { .. } => ErrorCategory::Validation,
            Self::MalformedAuthPayload { .. } => ErrorCategory::Validation,
            Self::MissingCredential { .. } => ErrorCategory::Authentication,
            Self::RedirectBuildFailure { .. } => ErrorCategory::Encoding,
            Self::EncodeFailure { .. } => ErrorCategory::Encoding,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> OAuthErrorCode {
        if self.is_client_error() {
            OAuthErrorCode::InvalidRequest
        } else {
            OAuthErrorCode::ServerError
        }
    }
}

/// Categories of errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed request input.
    Validation,
    /// Credentials absent where required.
    Authentication,
    /// Failures while producing the HTTP response.
    Encoding,
    /// Configuration errors.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authentication => write!(f, "authentication"),
            Self::Encoding => write!(f, "encoding"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// OAuth 2.0 error codes written into error responses.
///
/// Defined in RFC 6749 Sections 4.1.2.1 and 5.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthErrorCode {
    /// The request is missing a parameter or is otherwise malformed.
    InvalidRequest,
    /// The client is not authorized to use this method.
    UnauthorizedClient,
    /// The resource owner or server denied the request.
    AccessDenied,
    /// The response type is not supported.
    UnsupportedResponseType,
    /// The requested scope is invalid.
    InvalidScope,
    /// The server encountered an unexpected condition.
    ServerError,
    /// The server is temporarily unable to handle the request.
    TemporarilyUnavailable,
    /// The grant type is not supported.
    UnsupportedGrantType,
    /// The grant is invalid, expired or revoked.
    InvalidGrant,
    /// Client authentication failed.
    InvalidClient,
}

impl OAuthErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::AccessDenied => "access_denied",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidClient => "invalid_client",
        }
    }

    /// Returns the description used when none is supplied.
    #[must_use]
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::InvalidRequest => {
                "The request is missing a required parameter, includes an invalid parameter value, includes a parameter more than once, or is otherwise malformed."
            }
            Self::UnauthorizedClient => {
                "The client is not authorized to request a token using this method."
            }
            Self::AccessDenied => "The resource owner or authorization server denied the request.",
            Self::UnsupportedResponseType => {
                "The authorization server does not support obtaining a token using this method."
            }
            Self::InvalidScope => "The requested scope is invalid, unknown, or malformed.",
            Self::ServerError => {
                "The authorization server encountered an unexpected condition that prevented it from fulfilling the request."
            }
            Self::TemporarilyUnavailable => {
                "The authorization server is currently unable to handle the request due to a temporary overloading or maintenance of the server."
            }
            Self::UnsupportedGrantType => {
                "The authorization grant type is not supported by the authorization server."
            }
            Self::InvalidGrant => {
                "The provided authorization grant is invalid, expired, revoked, or was issued to another client."
            }
            Self::InvalidClient => "Client authentication failed.",
        }
    }
}

impl fmt::Display for OAuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
