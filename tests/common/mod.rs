//! In-process identity provider for integration tests.
//!
//! Serves discovery, an empty key set, and a token endpoint that issues
//! HS256 ID tokens keyed with the client secret.

#![allow(dead_code)]

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oidc_test_client::{client_config, ClientConfig};

pub const CLIENT_ID: &str = "diag-client";
pub const CLIENT_SECRET: &str = "diag-secret-with-enough-entropy";
pub const ROOT_URL: &str = "http://localhost:9009";

pub struct MockProvider {
    pub server: MockServer,
}

impl MockProvider {
    /// Start a provider with discovery and JWKS mounted.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let issuer = server.uri();

        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": issuer,
                "authorization_endpoint": format!("{}/authorize", issuer),
                "token_endpoint": format!("{}/token", issuer),
                "userinfo_endpoint": format!("{}/userinfo", issuer),
                "introspection_endpoint": format!("{}/introspect", issuer),
                "jwks_uri": format!("{}/jwks", issuer),
                "id_token_signing_alg_values_supported": ["HS256"]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"keys": []})))
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn issuer(&self) -> String {
        self.server.uri()
    }

    /// Answer the authorization-code grant.
    pub async fn mount_code_exchange(&self, subject: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(self.token_body(
                "access-1",
                Some("refresh-1"),
                subject,
            )))
            .mount(&self.server)
            .await;
    }

    /// Answer the refresh grant. The response carries no refresh token.
    pub async fn mount_refresh(&self, subject: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(self.token_body("access-2", None, subject)),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_user_info(&self, subject: &str) {
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": subject,
                "email": format!("{}@example.com", subject)
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_introspection(&self) {
        Mock::given(method("POST"))
            .and(path("/introspect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "active": true,
                "client_id": CLIENT_ID
            })))
            .mount(&self.server)
            .await;
    }

    fn token_body(&self, access_token: &str, refresh_token: Option<&str>, subject: &str) -> Value {
        let mut body = json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": 3600,
            "id_token": self.id_token(subject),
        });
        if let Some(refresh_token) = refresh_token {
            body["refresh_token"] = json!(refresh_token);
        }
        body
    }

    /// HS256 ID token for `subject`, valid for an hour.
    pub fn id_token(&self, subject: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = json!({
            "iss": self.issuer(),
            "aud": CLIENT_ID,
            "sub": subject,
            "iat": now,
            "exp": now + 3600,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(CLIENT_SECRET.as_bytes()),
        )
        .unwrap()
    }

    /// Confidential client configuration pointed at this provider.
    pub fn client_config(&self) -> ClientConfig {
        client_config()
            .client_id(CLIENT_ID)
            .client_secret(CLIENT_SECRET)
            .provider_url(self.issuer())
            .root_url(ROOT_URL)
            .build()
            .unwrap()
    }
}
