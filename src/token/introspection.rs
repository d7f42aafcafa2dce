//! Token Introspection
//!
//! RFC 7662 - OAuth 2.0 Token Introspection.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::core::{basic_auth_header, encode_form, HttpRequest, HttpTransport, ProviderDescriptor};
use crate::error::{ConfigurationError, OidcError, ProtocolError};
use crate::types::{ClientCredentials, TokenSet};

/// Token introspection interface.
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    /// Introspect an access token.
    async fn introspect(&self, tokens: &TokenSet) -> Result<Value, OidcError>;
}

/// Default token introspector implementation.
///
/// Confidential clients authenticate with Basic credentials; public clients
/// present the access token itself as a bearer credential.
pub struct DefaultTokenIntrospector {
    endpoint: Option<String>,
    credentials: ClientCredentials,
    transport: Arc<dyn HttpTransport>,
}

impl DefaultTokenIntrospector {
    pub fn new(
        descriptor: &ProviderDescriptor,
        credentials: ClientCredentials,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            endpoint: descriptor.introspection_endpoint.clone(),
            credentials,
            transport,
        }
    }

    fn build_request(&self, endpoint: &str, tokens: &TokenSet) -> HttpRequest {
        let body = encode_form([("token", tokens.access_token.as_str())]);
        let authorization = match self.credentials.secret() {
            Some(secret) => basic_auth_header(&self.credentials.client_id, secret),
            None => tokens.authorization_header(),
        };
        HttpRequest::post_form(endpoint, body).header("Authorization", authorization)
    }
}

#[async_trait]
impl TokenIntrospector for DefaultTokenIntrospector {
    async fn introspect(&self, tokens: &TokenSet) -> Result<Value, OidcError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(ConfigurationError::EndpointNotAdvertised {
                endpoint: "introspection",
            })?;

        let response = self
            .transport
            .send(self.build_request(endpoint, tokens))
            .await?;

        if !response.is_success() {
            return Err(ProtocolError::UnexpectedStatus {
                status: format!("{} {}", response.status, response.status_text),
                body: response.body,
            }
            .into());
        }

        response.json()
    }
}
