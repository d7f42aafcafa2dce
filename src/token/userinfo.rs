//! User Info
//!
//! OIDC Core section 5.3 user-info retrieval.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::core::{HttpRequest, HttpTransport, ProviderDescriptor};
use crate::error::{ConfigurationError, OidcError, ProtocolError};
use crate::types::TokenSet;

/// User-info interface.
#[async_trait]
pub trait UserInfoFetcher: Send + Sync {
    /// Fetch the user-info claims for an access token.
    async fn fetch(&self, tokens: &TokenSet) -> Result<Value, OidcError>;
}

/// Default user-info fetcher.
pub struct DefaultUserInfoFetcher {
    endpoint: Option<String>,
    transport: Arc<dyn HttpTransport>,
}

impl DefaultUserInfoFetcher {
    pub fn new(descriptor: &ProviderDescriptor, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            endpoint: descriptor.userinfo_endpoint.clone().filter(|e| !e.is_empty()),
            transport,
        }
    }
}

#[async_trait]
impl UserInfoFetcher for DefaultUserInfoFetcher {
    async fn fetch(&self, tokens: &TokenSet) -> Result<Value, OidcError> {
        let endpoint = self.endpoint.as_deref().ok_or(
            ConfigurationError::EndpointNotAdvertised {
                endpoint: "userinfo",
            },
        )?;

        let request = HttpRequest::get(endpoint)
            .header("Authorization", tokens.authorization_header())
            .header("Accept", "application/json");

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(ProtocolError::UnexpectedStatus {
                status: format!("{} {}", response.status, response.status_text),
                body: response.body,
            }
            .into());
        }

        let is_jwt = response
            .headers
            .get("content-type")
            .is_some_and(|ct| ct.starts_with("application/jwt"));
        if is_jwt {
            return Err(ProtocolError::InvalidResponse {
                message: "signed user-info responses are not supported".to_string(),
            }
            .into());
        }

        response.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{create_mock_descriptor, MockHttpTransport};
    use chrono::Utc;
    use serde_json::json;

    fn tokens() -> TokenSet {
        TokenSet::from_response(
            serde_json::from_value(json!({"access_token": "at-1"})).unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"sub": "user-1", "email": "u@example.com"}));

        let descriptor = create_mock_descriptor("https://idp.example.com");
        let fetcher = DefaultUserInfoFetcher::new(&descriptor, transport.clone());
        let info = fetcher.fetch(&tokens()).await.unwrap();

        assert_eq!(info["sub"], "user-1");
        let request = transport.get_last_request().unwrap();
        assert_eq!(request.url, "https://idp.example.com/userinfo");
        assert_eq!(
            request.headers.get("Authorization").map(String::as_str),
            Some("Bearer at-1")
        );
    }

    #[tokio::test]
    async fn test_fetch_non_success() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(401, &json!({"error": "invalid_token"}));

        let descriptor = create_mock_descriptor("https://idp.example.com");
        let fetcher = DefaultUserInfoFetcher::new(&descriptor, transport);
        let error = fetcher.fetch(&tokens()).await.unwrap_err();
        assert!(matches!(
            error,
            OidcError::Protocol(ProtocolError::UnexpectedStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_without_endpoint() {
        let mut descriptor = create_mock_descriptor("https://idp.example.com");
        descriptor.userinfo_endpoint = None;
        let fetcher = DefaultUserInfoFetcher::new(&descriptor, Arc::new(MockHttpTransport::new()));
        assert!(matches!(
            fetcher.fetch(&tokens()).await,
            Err(OidcError::Configuration(
                ConfigurationError::EndpointNotAdvertised { .. }
            ))
        ));
    }
}
