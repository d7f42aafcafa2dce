//! Token Refresh
//!
//! Token-source semantics: hand back the current token while it is valid,
//! otherwise redeem the refresh token and carry it forward when the provider
//! does not rotate it.

use std::sync::Arc;

use crate::error::{OidcError, TokenError};
use crate::token::TokenEndpoint;
use crate::types::TokenSet;

/// Refreshing token source over a token endpoint.
pub struct TokenSource {
    endpoint: Arc<dyn TokenEndpoint>,
}

impl TokenSource {
    pub fn new(endpoint: Arc<dyn TokenEndpoint>) -> Self {
        Self { endpoint }
    }

    /// Return a valid token set, refreshing `current` if it has expired.
    pub async fn token(&self, current: &TokenSet) -> Result<TokenSet, OidcError> {
        if !current.is_expired() {
            return Ok(current.clone());
        }

        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or(TokenError::NoRefreshToken)?;

        let refreshed = self.endpoint.refresh(refresh_token).await.map_err(|e| {
            tracing::debug!(error = %e, "refresh grant failed");
            e
        })?;

        Ok(refreshed.inherit_refresh_token(current))
    }

    /// Force `current` to expire and refresh it.
    pub async fn force_refresh(&self, current: &TokenSet) -> Result<TokenSet, OidcError> {
        let mut expired = current.clone();
        expired.expire_now();
        self.token(&expired).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MockTokenEndpoint;
    use chrono::Utc;
    use serde_json::json;

    fn token_set(value: serde_json::Value) -> TokenSet {
        TokenSet::from_response(serde_json::from_value(value).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn test_valid_token_returned_unchanged() {
        let endpoint = Arc::new(MockTokenEndpoint::new());
        let source = TokenSource::new(endpoint.clone());
        let current = token_set(json!({"access_token": "at", "expires_in": 3600, "refresh_token": "rt"}));

        let token = source.token(&current).await.unwrap();
        assert_eq!(token.access_token, "at");
        assert!(endpoint.get_refresh_history().is_empty());
    }

    #[tokio::test]
    async fn test_force_refresh_keeps_refresh_token() {
        let endpoint = Arc::new(MockTokenEndpoint::new());
        endpoint.queue(Ok(token_set(json!({"access_token": "at-2", "id_token": "x.y.z"}))));
        let source = TokenSource::new(endpoint.clone());
        let current = token_set(json!({"access_token": "at", "expires_in": 3600, "refresh_token": "rt"}));

        let refreshed = source.force_refresh(&current).await.unwrap();
        assert_eq!(refreshed.access_token, "at-2");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("rt"));
        assert_eq!(refreshed.id_token.as_deref(), Some("x.y.z"));
        assert_eq!(endpoint.get_refresh_history(), vec!["rt"]);
        assert!(!current.is_expired());
    }

    #[tokio::test]
    async fn test_force_refresh_without_refresh_token() {
        let source = TokenSource::new(Arc::new(MockTokenEndpoint::new()));
        let current = token_set(json!({"access_token": "at", "expires_in": 3600}));

        assert!(matches!(
            source.force_refresh(&current).await,
            Err(OidcError::Token(TokenError::NoRefreshToken))
        ));
    }
}
