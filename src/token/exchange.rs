//! Token Endpoint
//!
//! Authorization-code and refresh-token grants against the provider's token
//! endpoint (RFC 6749 sections 4.1.3 and 6).

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::{client_form_request, HttpTransport};
use crate::error::{create_error_from_response, OidcError, ProviderError};
use crate::types::{ClientCredentials, GrantType, TokenResponse, TokenSet};

/// Token endpoint interface.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet, OidcError>;

    /// Redeem a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OidcError>;
}

/// Default token endpoint client.
pub struct DefaultTokenEndpoint {
    token_endpoint: String,
    credentials: ClientCredentials,
    transport: Arc<dyn HttpTransport>,
}

impl DefaultTokenEndpoint {
    pub fn new(
        token_endpoint: impl Into<String>,
        credentials: ClientCredentials,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            token_endpoint: token_endpoint.into(),
            credentials,
            transport,
        }
    }

    async fn request(&self, params: &[(&str, &str)]) -> Result<TokenSet, OidcError> {
        let request = client_form_request(&self.token_endpoint, &self.credentials, params);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let token_response: TokenResponse = response.json()?;
        if token_response.access_token.is_empty() {
            return Err(ProviderError::ServerError {
                message: "server response missing access_token".to_string(),
            }
            .into());
        }

        Ok(TokenSet::from_response(token_response, Utc::now()))
    }
}

#[async_trait]
impl TokenEndpoint for DefaultTokenEndpoint {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet, OidcError> {
        self.request(&[
            ("grant_type", GrantType::AuthorizationCode.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OidcError> {
        self.request(&[
            ("grant_type", GrantType::RefreshToken.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

/// Mock token endpoint for testing.
#[derive(Default)]
pub struct MockTokenEndpoint {
    responses: Mutex<VecDeque<Result<TokenSet, OidcError>>>,
    exchange_history: Mutex<Vec<String>>,
    refresh_history: Mutex<Vec<String>>,
}

impl MockTokenEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next call.
    pub fn queue(&self, outcome: Result<TokenSet, OidcError>) -> &Self {
        self.responses.lock().push_back(outcome);
        self
    }

    /// Codes passed to `exchange_code`.
    pub fn get_exchange_history(&self) -> Vec<String> {
        self.exchange_history.lock().clone()
    }

    /// Refresh tokens passed to `refresh`.
    pub fn get_refresh_history(&self) -> Vec<String> {
        self.refresh_history.lock().clone()
    }

    fn next(&self) -> Result<TokenSet, OidcError> {
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(ProviderError::ServerError {
                message: "no mock token response queued".to_string(),
            }
            .into())
        })
    }
}

#[async_trait]
impl TokenEndpoint for MockTokenEndpoint {
    async fn exchange_code(&self, code: &str, _redirect_uri: &str) -> Result<TokenSet, OidcError> {
        self.exchange_history.lock().push(code.to_string());
        self.next()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OidcError> {
        self.refresh_history.lock().push(refresh_token.to_string());
        self.next()
    }
}
