//! Configuration Types
//!
//! Client configuration for one provider per process.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Scopes requested when no override is configured.
pub const DEFAULT_SCOPES: [&str; 4] = ["openid", "offline_access", "profile", "email"];

/// Default outbound request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Diagnostic client configuration.
///
/// Built once through [`crate::builders::ClientConfigBuilder`] and shared
/// read-only by every request.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Client credentials.
    pub credentials: ClientCredentials,
    /// Issuer URL used for discovery, as configured.
    pub provider_url: String,
    /// Externally visible root URL of this service.
    pub root_url: Url,
    /// Redirect URL registered with the provider.
    pub redirect_url: String,
    /// Scopes to request.
    pub scopes: Vec<String>,
    /// Enrichment stage toggles.
    pub checks: CheckToggles,
    /// Verify provider TLS certificates.
    pub tls_verify: bool,
    /// Outbound HTTP timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Route prefix derived from the root URL path, without trailing slash.
    ///
    /// Empty when the service is mounted at `/`.
    pub fn root_path(&self) -> String {
        self.root_url.path().trim_end_matches('/').to_string()
    }

    /// Root URL as a string, without trailing slash.
    pub fn root_url_str(&self) -> String {
        self.root_url.as_str().trim_end_matches('/').to_string()
    }

    /// Scopes joined for an authorization request.
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Per-stage switches for the enrichment pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckToggles {
    pub user_info: bool,
    pub introspection: bool,
    pub refresh: bool,
}

impl Default for CheckToggles {
    fn default() -> Self {
        Self {
            user_info: true,
            introspection: true,
            refresh: true,
        }
    }
}

/// Client credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client identifier.
    pub client_id: String,
    /// Client secret (for confidential clients).
    pub client_secret: Option<SecretString>,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: Option<SecretString>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// Authentication method implied by the presence of a secret.
    pub fn auth_method(&self) -> ClientAuthMethod {
        match &self.client_secret {
            Some(secret) if !secret.expose_secret().is_empty() => {
                ClientAuthMethod::ClientSecretBasic
            }
            _ => ClientAuthMethod::None,
        }
    }

    /// Secret value when one is configured and non-empty.
    pub fn secret(&self) -> Option<&str> {
        self.client_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Client authentication method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientAuthMethod {
    /// HTTP Basic Authentication header.
    ClientSecretBasic,
    /// Public client: `client_id` in the request body only.
    None,
}

/// Grant type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
    DeviceCode,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
            Self::DeviceCode => "urn:ietf:params:oauth:grant-type:device_code",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &str) -> ClientConfig {
        ClientConfig {
            credentials: ClientCredentials::new("client", None),
            provider_url: "https://idp.example.com".to_string(),
            root_url: Url::parse(root).unwrap(),
            redirect_url: format!("{}/auth/callback", root),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            checks: CheckToggles::default(),
            tls_verify: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[test]
    fn test_root_path() {
        assert_eq!(config("http://localhost:9009").root_path(), "");
        assert_eq!(config("https://example.com/oidc/").root_path(), "/oidc");
        assert_eq!(
            config("https://example.com/oidc/").root_url_str(),
            "https://example.com/oidc"
        );
    }

    #[test]
    fn test_scope_param() {
        assert_eq!(
            config("http://localhost:9009").scope_param(),
            "openid offline_access profile email"
        );
    }

    #[test]
    fn test_auth_method_follows_secret() {
        let public = ClientCredentials::new("c", None);
        assert_eq!(public.auth_method(), ClientAuthMethod::None);

        let empty = ClientCredentials::new("c", Some(SecretString::new(String::new())));
        assert_eq!(empty.auth_method(), ClientAuthMethod::None);
        assert!(empty.secret().is_none());

        let confidential = ClientCredentials::new("c", Some(SecretString::new("s".into())));
        assert_eq!(confidential.auth_method(), ClientAuthMethod::ClientSecretBasic);
        assert_eq!(confidential.secret(), Some("s"));
    }

    #[test]
    fn test_grant_type_as_str() {
        assert_eq!(GrantType::AuthorizationCode.as_str(), "authorization_code");
        assert_eq!(GrantType::RefreshToken.as_str(), "refresh_token");
        assert_eq!(
            GrantType::DeviceCode.as_str(),
            "urn:ietf:params:oauth:grant-type:device_code"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = ClientCredentials::new("c", Some(SecretString::new("hunter2".into())));
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
