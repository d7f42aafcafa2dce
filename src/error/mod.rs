//! Error Types
//!
//! Error hierarchy for discovery, flows, verification and enrichment calls.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the diagnostic client.
#[derive(Error, Debug)]
pub enum OidcError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("Device flow error: {0}")]
    DeviceFlow(#[from] DeviceFlowError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl OidcError {
    /// Get error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "OIDC_CONFIG",
            Self::Authorization(_) => "OIDC_AUTH",
            Self::Token(_) => "OIDC_TOKEN",
            Self::Verification(_) => "OIDC_VERIFY",
            Self::DeviceFlow(_) => "OIDC_DEVICE",
            Self::Network(_) => "OIDC_NETWORK",
            Self::Protocol(_) => "OIDC_PROTOCOL",
            Self::Provider(_) => "OIDC_PROVIDER",
            Self::Session(_) => "OIDC_SESSION",
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Discovery failed: {message}")]
    DiscoveryFailed { message: String },

    #[error("Provider does not advertise a {endpoint} endpoint")]
    EndpointNotAdvertised { endpoint: &'static str },
}

/// Authorization callback error.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("No flow session bound to this request")]
    MissingSession,

    #[error("State parameter missing from callback")]
    MissingState,

    #[error("State parameter mismatch (possible CSRF attack)")]
    StateMismatch,

    #[error("State parameter expired or already used")]
    StateConsumed,

    #[error("Authorization code missing from callback")]
    MissingCode,

    #[error("Provider returned {error}: {}", error_description.as_deref().unwrap_or("no description"))]
    Denied {
        error: String,
        error_description: Option<String>,
    },
}

/// Token-related error.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("No id_token field in token response")]
    MissingIdToken,

    #[error("No refresh token available")]
    NoRefreshToken,
}

/// ID token verification error.
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Malformed token: {message}")]
    Malformed { message: String },

    #[error("No verification key for kid {kid}")]
    KeyNotFound { kid: String },

    #[error("Unsupported signing algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Issuer mismatch: expected {expected}")]
    InvalidIssuer { expected: String },

    #[error("Audience does not contain {client_id}")]
    InvalidAudience { client_id: String },

    #[error("Token expired")]
    Expired,

    #[error("Token issued in the future (iat {issued_at}, now {now})")]
    IssuedInFuture { issued_at: i64, now: i64 },

    #[error("Missing required claim: {claim}")]
    MissingClaim { claim: String },
}

/// Device flow error.
#[derive(Error, Debug)]
pub enum DeviceFlowError {
    #[error("Access denied by user")]
    AccessDenied,

    #[error("Device code expired")]
    ExpiredToken,

    #[error("Device flow failed with {error}: {}", error_description.as_deref().unwrap_or("no description"))]
    Provider {
        error: String,
        error_description: Option<String>,
    },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: String, body: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// Provider (token endpoint) error.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid client credentials")]
    InvalidClient { error_description: Option<String> },

    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid scope: {scope}")]
    InvalidScope { scope: String },

    #[error("Unauthorized client for this grant type")]
    UnauthorizedClient { error_description: Option<String> },

    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType { grant_type: String },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Server temporarily unavailable")]
    TemporarilyUnavailable,
}

/// Session store error.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to encode session: {message}")]
    EncodeFailed { message: String },

    #[error("Invalid session key: {message}")]
    InvalidKey { message: String },
}

/// Result type for client operations.
pub type OidcResult<T> = Result<T, OidcError>;

/// Outcome of a failed authorization-code finalize.
///
/// `Rejected` covers everything an unauthenticated caller can provoke and is
/// answered with a redirect to the flow start. `Internal` is a local defect on
/// an already trusted path and is surfaced as a server error.
#[derive(Error, Debug)]
pub enum FinalizeError {
    #[error("callback rejected: {0}")]
    Rejected(OidcError),

    #[error("internal failure: {0}")]
    Internal(OidcError),
}

impl FinalizeError {
    pub fn inner(&self) -> &OidcError {
        match self {
            Self::Rejected(e) | Self::Internal(e) => e,
        }
    }

    /// Whether the callback got far enough to spend the flow session.
    ///
    /// A missing or mismatched `state` leaves the session in place so a
    /// forged callback cannot cancel a login in progress.
    pub fn spends_session(&self) -> bool {
        !matches!(
            self.inner(),
            OidcError::Authorization(
                AuthorizationError::MissingState | AuthorizationError::StateMismatch
            )
        )
    }
}

/// OAuth2 error response body.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Map token endpoint error response to error type.
pub fn map_token_error(response: &OAuth2ErrorResponse) -> ProviderError {
    let description = response.error_description.clone();
    match response.error.as_str() {
        "invalid_client" => ProviderError::InvalidClient {
            error_description: description,
        },
        "invalid_grant" => ProviderError::InvalidGrant {
            message: description.unwrap_or_else(|| "Invalid grant".to_string()),
        },
        "invalid_scope" => ProviderError::InvalidScope {
            scope: description.unwrap_or_default(),
        },
        "unauthorized_client" => ProviderError::UnauthorizedClient {
            error_description: description,
        },
        "unsupported_grant_type" => ProviderError::UnsupportedGrantType {
            grant_type: description.unwrap_or_default(),
        },
        "server_error" => ProviderError::ServerError {
            message: description.unwrap_or_else(|| "Server error".to_string()),
        },
        "temporarily_unavailable" => ProviderError::TemporarilyUnavailable,
        _ => ProviderError::InvalidRequest {
            message: description.unwrap_or_else(|| response.error.clone()),
        },
    }
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Create error from a non-success token endpoint response.
pub fn create_error_from_response(status: u16, body: &str) -> OidcError {
    if let Some(response) = parse_error_response(body) {
        return OidcError::Provider(map_token_error(&response));
    }

    let error = match status {
        400 => ProviderError::InvalidRequest {
            message: "Bad request".to_string(),
        },
        401 => ProviderError::InvalidClient {
            error_description: Some("Unauthorized".to_string()),
        },
        403 => ProviderError::UnauthorizedClient {
            error_description: Some("Forbidden".to_string()),
        },
        429 | 503 => ProviderError::TemporarilyUnavailable,
        _ => ProviderError::ServerError {
            message: format!("HTTP {}", status),
        },
    };

    OidcError::Provider(error)
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match error.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnsupportedAlgorithm {
                    algorithm: error.to_string(),
                }
            }
            ErrorKind::MissingRequiredClaim(claim) => Self::MissingClaim {
                claim: claim.clone(),
            },
            _ => Self::Malformed {
                message: error.to_string(),
            },
        }
    }
}
