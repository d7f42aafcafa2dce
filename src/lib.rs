//! OIDC Test Client
//!
//! Diagnostic relying party that drives OAuth2/OIDC flows against one
//! identity provider and reports everything the provider returned.
//!
//! # Features
//!
//! - OIDC Discovery with JWKS resolution
//! - Authorization Code Flow (RFC 6749 Section 4.1) with single-use state
//! - ID token verification against the provider's keys
//! - User info, token introspection (RFC 7662) and refresh (RFC 6749 Section 6)
//!   as individually switchable enrichment stages
//! - Implicit Flow page, verified in the browser
//! - Device Authorization Flow (RFC 8628) from the terminal
//!
//! # Example
//!
//! ```rust,ignore
//! use oidc_test_client::{client_config, OidcTestClient};
//! use oidc_test_client::server::{router, serve, AppState};
//! use oidc_test_client::session::SessionKey;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = client_config()
//!         .client_id("diag-client")
//!         .client_secret("diag-secret")
//!         .provider_url("https://idp.example.com")
//!         .root_url("http://localhost:9009")
//!         .build()?;
//!
//!     let client = OidcTestClient::connect(config).await?;
//!     let state = AppState::new(&client, SessionKey::generate());
//!     serve(router(state, "static"), "localhost:9009").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, token and device-code data
//! - `error`: error hierarchy and provider error mapping
//! - `core`: HTTP transport, discovery, state ledger, form encoding
//! - `verify`: ID token verification
//! - `token`: code exchange, refresh, user info and introspection
//! - `report`: enrichment pipeline and the aggregated flow report
//! - `flows`: authorization-code, implicit and device drivers
//! - `session`: encrypted flow-session cookie
//! - `server`: HTTP front
//! - `builders`: fluent configuration builder
//! - `client`: provider-bound client wiring the drivers together
//! - `cli`: binary arguments and environment

pub mod builders;
pub mod cli;
pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod report;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod types;
pub mod verify;

// Re-export main client
pub use client::OidcTestClient;

// Re-export builders
pub use builders::{client_config, ClientConfigBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, map_token_error, parse_error_response, AuthorizationError,
    ConfigurationError, DeviceFlowError, FinalizeError, NetworkError, OAuth2ErrorResponse,
    OidcError, OidcResult, ProtocolError, ProviderError, SessionError, TokenError,
    VerificationError,
};

// Re-export types
pub use types::{
    // Config
    CheckToggles, ClientAuthMethod, ClientConfig, ClientCredentials, GrantType,
    // Token
    TokenResponse, TokenSet,
    // Callback
    CallbackParams,
    // Device
    DeviceAuthorizationResponse, DeviceCode, DevicePollResult,
};

// Re-export core components
pub use crate::core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // State
    InMemoryStateManager, MockStateManager, StateManager,
    // Discovery
    DefaultDiscoveryClient, DiscoveryClient, DiscoveryDocument, MockDiscoveryClient,
    ProviderDescriptor,
};

// Re-export flows
pub use flows::{
    AuthorizationCodeDriver, DeviceDriver, FlowDriver, ImplicitContext, ImplicitDriver,
};

// Re-export verification and reporting
pub use report::{EnrichmentPipeline, FlowReport, StageOutcome};
pub use verify::{IdTokenClaims, JwksTokenVerifier, MockTokenVerifier, TokenVerifier};

// Re-export telemetry
pub use telemetry::{LogFormat, LogLevel, LoggingConfig};
