//! Configuration Builder
//!
//! Fluent builder for the client configuration.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{ConfigurationError, OidcError};
use crate::types::{CheckToggles, ClientConfig, ClientCredentials, DEFAULT_SCOPES, DEFAULT_TIMEOUT};

/// Root URL used when none is configured.
pub const DEFAULT_ROOT_URL: &str = "http://localhost:9009";

/// Client configuration builder.
#[derive(Default)]
pub struct ClientConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    provider_url: Option<String>,
    root_url: Option<String>,
    redirect_url: Option<String>,
    scopes: Vec<String>,
    checks: CheckToggles,
    tls_verify: bool,
    timeout: Duration,
}

impl ClientConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            tls_verify: true,
            timeout: DEFAULT_TIMEOUT,
            ..Default::default()
        }
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret. An empty secret means a public client.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        let secret = client_secret.into();
        self.client_secret = if secret.is_empty() {
            None
        } else {
            Some(SecretString::new(secret))
        };
        self
    }

    /// Set the issuer URL used for discovery.
    pub fn provider_url(mut self, provider_url: impl Into<String>) -> Self {
        self.provider_url = Some(provider_url.into());
        self
    }

    /// Set the externally visible root URL.
    pub fn root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = Some(root_url.into());
        self
    }

    /// Override the redirect URL (defaults to `{root}/auth/callback`).
    pub fn redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = Some(redirect_url.into());
        self
    }

    /// Set scopes to request.
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Add a scope.
    pub fn add_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Enable or disable the user-info stage.
    pub fn user_info_check(mut self, enable: bool) -> Self {
        self.checks.user_info = enable;
        self
    }

    /// Enable or disable the introspection stage.
    pub fn introspection_check(mut self, enable: bool) -> Self {
        self.checks.introspection = enable;
        self
    }

    /// Enable or disable the refresh stage.
    pub fn refresh_check(mut self, enable: bool) -> Self {
        self.checks.refresh = enable;
        self
    }

    /// Verify provider TLS certificates.
    pub fn tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> Result<ClientConfig, OidcError> {
        let client_id = self
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConfigurationError::MissingRequired {
                field: "client_id".to_string(),
            })?;

        let provider_url = self
            .provider_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigurationError::MissingRequired {
                field: "provider_url".to_string(),
            })?;
        Url::parse(&provider_url).map_err(|_| ConfigurationError::InvalidEndpoint {
            url: provider_url.clone(),
        })?;

        let root = self
            .root_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_ROOT_URL.to_string());
        let root_url = Url::parse(&root).map_err(|_| ConfigurationError::InvalidEndpoint {
            url: root.clone(),
        })?;

        let redirect_url = self.redirect_url.unwrap_or_else(|| {
            format!("{}/auth/callback", root_url.as_str().trim_end_matches('/'))
        });

        let scopes = if self.scopes.is_empty() {
            DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
        } else {
            self.scopes
        };

        if self.timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(ClientConfig {
            credentials: ClientCredentials::new(client_id, self.client_secret),
            provider_url,
            root_url,
            redirect_url,
            scopes,
            checks: self.checks,
            tls_verify: self.tls_verify,
            timeout: self.timeout,
        })
    }
}

/// Create a new client configuration builder.
pub fn client_config() -> ClientConfigBuilder {
    ClientConfigBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = client_config()
            .client_id("test-client")
            .provider_url("https://idp.example.com")
            .build()
            .unwrap();

        assert_eq!(config.credentials.client_id, "test-client");
        assert!(config.credentials.client_secret.is_none());
        assert_eq!(config.redirect_url, "http://localhost:9009/auth/callback");
        assert_eq!(
            config.scopes,
            vec!["openid", "offline_access", "profile", "email"]
        );
        assert_eq!(config.checks, CheckToggles::default());
        assert!(config.tls_verify);
    }

    #[test]
    fn test_builder_root_with_path() {
        let config = client_config()
            .client_id("test-client")
            .client_secret("s3cret")
            .provider_url("https://idp.example.com/")
            .root_url("https://tools.example.com/oidc/")
            .add_scope("openid")
            .introspection_check(false)
            .build()
            .unwrap();

        assert_eq!(
            config.redirect_url,
            "https://tools.example.com/oidc/auth/callback"
        );
        assert_eq!(config.root_path(), "/oidc");
        assert_eq!(config.scopes, vec!["openid"]);
        assert!(!config.checks.introspection);
        assert!(config.checks.user_info);
        assert_eq!(config.credentials.secret(), Some("s3cret"));
    }

    #[test]
    fn test_builder_missing_client_id() {
        let result = client_config().provider_url("https://idp.example.com").build();
        assert!(matches!(
            result,
            Err(OidcError::Configuration(ConfigurationError::MissingRequired { .. }))
        ));
    }

    #[test]
    fn test_builder_invalid_root_url() {
        let result = client_config()
            .client_id("c")
            .provider_url("https://idp.example.com")
            .root_url("not a url")
            .build();
        assert!(matches!(
            result,
            Err(OidcError::Configuration(ConfigurationError::InvalidEndpoint { .. }))
        ));
    }

    #[test]
    fn test_empty_secret_is_public_client() {
        let config = client_config()
            .client_id("c")
            .client_secret("")
            .provider_url("https://idp.example.com")
            .build()
            .unwrap();
        assert!(config.credentials.client_secret.is_none());
    }
}
