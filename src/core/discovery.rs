//! OIDC Discovery
//!
//! Resolves the provider descriptor from `/.well-known/openid-configuration`
//! and loads the provider's signing keys.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::transport::{HttpRequest, HttpTransport};
use crate::error::{ConfigurationError, OidcError};

/// OIDC discovery document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// Issuer identifier.
    pub issuer: String,
    /// Authorization endpoint URL.
    pub authorization_endpoint: String,
    /// Token endpoint URL.
    pub token_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_authorization_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
    /// Everything else the provider advertises.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resolved provider metadata plus verification keys.
///
/// Immutable once discovered; shared read-only across requests.
#[derive(Clone, Debug)]
pub struct ProviderDescriptor {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: Option<String>,
    pub introspection_endpoint: Option<String>,
    pub revocation_endpoint: Option<String>,
    pub device_authorization_endpoint: Option<String>,
    pub jwks_uri: Option<String>,
    pub signing_algorithms: Vec<String>,
    pub jwks: JwkSet,
    pub extra: Map<String, Value>,
}

impl ProviderDescriptor {
    /// Build a descriptor from a validated document and its key set.
    pub fn from_document(document: DiscoveryDocument, jwks: JwkSet) -> Self {
        Self {
            issuer: document.issuer,
            authorization_endpoint: document.authorization_endpoint,
            token_endpoint: document.token_endpoint,
            userinfo_endpoint: document.userinfo_endpoint,
            introspection_endpoint: document.introspection_endpoint,
            revocation_endpoint: document.revocation_endpoint,
            device_authorization_endpoint: document.device_authorization_endpoint,
            jwks_uri: document.jwks_uri,
            signing_algorithms: document.id_token_signing_alg_values_supported,
            jwks,
            extra: document.extra,
        }
    }

    /// Introspection endpoint, or an error naming the missing metadata.
    pub fn require_introspection_endpoint(&self) -> Result<&str, OidcError> {
        self.introspection_endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                OidcError::Configuration(ConfigurationError::EndpointNotAdvertised {
                    endpoint: "introspection",
                })
            })
    }
}

/// Strip trailing slashes from an issuer for comparison and URL building.
pub fn normalize_issuer(issuer: &str) -> String {
    issuer.trim_end_matches('/').to_string()
}

/// Discovery client interface (for dependency injection).
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Resolve the provider descriptor for an issuer.
    async fn discover(&self, issuer: &str) -> Result<ProviderDescriptor, OidcError>;
}

/// Default discovery client implementation.
pub struct DefaultDiscoveryClient {
    transport: Arc<dyn HttpTransport>,
}

impl DefaultDiscoveryClient {
    /// Create new discovery client.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    async fn fetch_document(&self, issuer: &str) -> Result<DiscoveryDocument, OidcError> {
        let normalized_issuer = normalize_issuer(issuer);
        let discovery_url = format!("{}/.well-known/openid-configuration", normalized_issuer);

        let request = HttpRequest::get(discovery_url).header("Accept", "application/json");
        let response = self.transport.send(request).await?;

        if response.status != 200 {
            return Err(discovery_failed(format!(
                "discovery request failed with status {}: {}",
                response.status, response.body
            )));
        }

        let document: DiscoveryDocument = response.json()?;

        if document.authorization_endpoint.is_empty() || document.token_endpoint.is_empty() {
            return Err(discovery_failed(
                "discovery document missing required endpoints".to_string(),
            ));
        }

        let response_issuer = normalize_issuer(&document.issuer);
        if response_issuer != normalized_issuer {
            return Err(discovery_failed(format!(
                "issuer did not match the issuer returned by provider, expected {:?} got {:?}",
                normalized_issuer, response_issuer
            )));
        }

        Ok(document)
    }

    async fn fetch_jwks(&self, jwks_uri: &str) -> Result<JwkSet, OidcError> {
        let request = HttpRequest::get(jwks_uri).header("Accept", "application/json");
        let response = self.transport.send(request).await?;

        if response.status != 200 {
            return Err(discovery_failed(format!(
                "JWKS request failed with status {}",
                response.status
            )));
        }

        response.json()
    }
}

#[async_trait]
impl DiscoveryClient for DefaultDiscoveryClient {
    async fn discover(&self, issuer: &str) -> Result<ProviderDescriptor, OidcError> {
        let document = self.fetch_document(issuer).await?;

        let jwks = match document.jwks_uri.as_deref().filter(|u| !u.is_empty()) {
            Some(uri) => self.fetch_jwks(uri).await?,
            None => {
                tracing::warn!(issuer = %document.issuer, "provider advertises no jwks_uri");
                JwkSet { keys: Vec::new() }
            }
        };

        tracing::info!(
            issuer = %document.issuer,
            keys = jwks.keys.len(),
            "discovered provider"
        );

        Ok(ProviderDescriptor::from_document(document, jwks))
    }
}

fn discovery_failed(message: String) -> OidcError {
    OidcError::Configuration(ConfigurationError::DiscoveryFailed { message })
}

/// Mock discovery client for testing.
#[derive(Default)]
pub struct MockDiscoveryClient {
    descriptors: Mutex<HashMap<String, ProviderDescriptor>>,
    discover_history: Mutex<Vec<String>>,
}

impl MockDiscoveryClient {
    /// Create new mock discovery client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set descriptor for issuer.
    pub fn set_descriptor(&self, issuer: &str, descriptor: ProviderDescriptor) -> &Self {
        self.descriptors.lock().insert(issuer.to_string(), descriptor);
        self
    }

    /// Get discover history.
    pub fn get_discover_history(&self) -> Vec<String> {
        self.discover_history.lock().clone()
    }
}

#[async_trait]
impl DiscoveryClient for MockDiscoveryClient {
    async fn discover(&self, issuer: &str) -> Result<ProviderDescriptor, OidcError> {
        self.discover_history.lock().push(issuer.to_string());
        self.descriptors
            .lock()
            .get(issuer)
            .cloned()
            .ok_or_else(|| discovery_failed(format!("no mock descriptor for issuer: {}", issuer)))
    }
}

/// Create mock provider descriptor for testing.
pub fn create_mock_descriptor(issuer: &str) -> ProviderDescriptor {
    ProviderDescriptor {
        issuer: issuer.to_string(),
        authorization_endpoint: format!("{}/authorize", issuer),
        token_endpoint: format!("{}/token", issuer),
        userinfo_endpoint: Some(format!("{}/userinfo", issuer)),
        introspection_endpoint: Some(format!("{}/introspect", issuer)),
        revocation_endpoint: Some(format!("{}/revoke", issuer)),
        device_authorization_endpoint: Some(format!("{}/device", issuer)),
        jwks_uri: Some(format!("{}/jwks", issuer)),
        signing_algorithms: vec!["RS256".to_string()],
        jwks: JwkSet { keys: Vec::new() },
        extra: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::MockHttpTransport;
    use serde_json::json;

    fn document(issuer: &str) -> Value {
        json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{}/authorize", issuer),
            "token_endpoint": format!("{}/token", issuer),
            "userinfo_endpoint": format!("{}/userinfo", issuer),
            "introspection_endpoint": format!("{}/introspect", issuer),
            "jwks_uri": format!("{}/jwks", issuer),
            "end_session_endpoint": format!("{}/logout", issuer),
        })
    }

    #[tokio::test]
    async fn test_discover_fetches_document_and_keys() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &document("https://idp.example.com"));
        transport.queue_json_response(200, &json!({"keys": []}));

        let client = DefaultDiscoveryClient::new(transport.clone());
        let descriptor = client.discover("https://idp.example.com/").await.unwrap();

        assert_eq!(descriptor.issuer, "https://idp.example.com");
        assert_eq!(descriptor.token_endpoint, "https://idp.example.com/token");
        assert_eq!(
            descriptor.require_introspection_endpoint().unwrap(),
            "https://idp.example.com/introspect"
        );
        assert!(descriptor.extra.contains_key("end_session_endpoint"));

        let requests = transport.get_requests();
        assert_eq!(
            requests[0].url,
            "https://idp.example.com/.well-known/openid-configuration"
        );
        assert_eq!(requests[1].url, "https://idp.example.com/jwks");
    }

    #[tokio::test]
    async fn test_discover_rejects_issuer_mismatch() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &document("https://other.example.com"));

        let client = DefaultDiscoveryClient::new(transport);
        let result = client.discover("https://idp.example.com").await;
        assert!(matches!(
            result,
            Err(OidcError::Configuration(ConfigurationError::DiscoveryFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_discover_non_200() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(404, &json!({"error": "not_found"}));

        let client = DefaultDiscoveryClient::new(transport);
        assert!(client.discover("https://idp.example.com").await.is_err());
    }

    #[test]
    fn test_missing_introspection_endpoint() {
        let mut descriptor = create_mock_descriptor("https://idp.example.com");
        descriptor.introspection_endpoint = None;
        assert!(matches!(
            descriptor.require_introspection_endpoint(),
            Err(OidcError::Configuration(
                ConfigurationError::EndpointNotAdvertised { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_mock_discovery_client() {
        let client = MockDiscoveryClient::new();
        client.set_descriptor(
            "https://idp.example.com",
            create_mock_descriptor("https://idp.example.com"),
        );

        let descriptor = client.discover("https://idp.example.com").await.unwrap();
        assert_eq!(descriptor.authorization_endpoint, "https://idp.example.com/authorize");
        assert!(client.discover("https://unknown.example.com").await.is_err());
        assert_eq!(client.get_discover_history().len(), 2);
    }
}
