//! Token Types
//!
//! Token endpoint responses and the token set carried through a flow.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tokens are treated as expired this long before their actual expiry.
const EXPIRY_DELTA_SECS: i64 = 10;

/// Token response from authorization server.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    /// ID token (OIDC).
    #[serde(default)]
    pub id_token: Option<String>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token set produced by a token endpoint exchange.
///
/// Serializes as `{access_token, token_type, refresh_token?, expiry?}`;
/// the raw ID token and extra response fields stay out of the report.
#[derive(Clone, Debug, Serialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub id_token: Option<String>,
    #[serde(skip)]
    pub scope: Option<String>,
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl TokenSet {
    /// Create from token response, anchoring `expires_in` at `now`.
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expiry = response
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| now + Duration::seconds(secs));

        let mut extra = response.extra;
        let id_token = response
            .id_token
            .or_else(|| extra.remove("id_token").and_then(|v| v.as_str().map(String::from)));

        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
            expiry,
            id_token: id_token.filter(|t| !t.is_empty()),
            scope: response.scope,
            extra,
        }
    }

    /// Check if token is expired (or about to be).
    pub fn is_expired(&self) -> bool {
        self.expiry
            .map(|exp| exp - Duration::seconds(EXPIRY_DELTA_SECS) <= Utc::now())
            .unwrap_or(false)
    }

    /// Force the token into the past so the next use must refresh it.
    pub fn expire_now(&mut self) {
        self.expiry = Some(Utc::now() - Duration::seconds(1));
    }

    /// Authorization header value for resource requests.
    pub fn authorization_header(&self) -> String {
        let token_type = if self.token_type.is_empty()
            || self.token_type.eq_ignore_ascii_case("bearer")
        {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", token_type, self.access_token)
    }

    /// Keep the previous refresh token when a refresh response omits one.
    pub fn inherit_refresh_token(mut self, previous: &TokenSet) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = previous.refresh_token.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> TokenResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_token_response_parsing() {
        let parsed = response(
            r#"{
                "access_token": "test-token",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "test-refresh",
                "id_token": "a.b.c",
                "session_state": "xyz"
            }"#,
        );
        assert_eq!(parsed.access_token, "test-token");
        assert_eq!(parsed.expires_in, Some(3600));
        assert_eq!(parsed.id_token.as_deref(), Some("a.b.c"));
        assert_eq!(parsed.extra.get("session_state"), Some(&Value::from("xyz")));
    }

    #[test]
    fn test_token_set_from_response() {
        let now = Utc::now();
        let set = TokenSet::from_response(
            response(r#"{"access_token":"at","expires_in":60,"refresh_token":""}"#),
            now,
        );
        assert_eq!(set.token_type, "Bearer");
        assert_eq!(set.expiry, Some(now + Duration::seconds(60)));
        assert!(set.refresh_token.is_none());
        assert!(set.id_token.is_none());
        assert!(!set.is_expired());
    }

    #[test]
    fn test_expire_now() {
        let mut set = TokenSet::from_response(
            response(r#"{"access_token":"at","expires_in":3600}"#),
            Utc::now(),
        );
        assert!(!set.is_expired());
        set.expire_now();
        assert!(set.is_expired());
    }

    #[test]
    fn test_serialized_shape_hides_raw_id_token() {
        let set = TokenSet::from_response(
            response(r#"{"access_token":"at","id_token":"a.b.c","refresh_token":"rt"}"#),
            Utc::now(),
        );
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["access_token"], "at");
        assert_eq!(value["token_type"], "Bearer");
        assert_eq!(value["refresh_token"], "rt");
        assert!(value.get("id_token").is_none());
        assert!(value.get("expiry").is_none());
    }

    #[test]
    fn test_inherit_refresh_token() {
        let previous = TokenSet::from_response(
            response(r#"{"access_token":"old","refresh_token":"rt-1"}"#),
            Utc::now(),
        );
        let refreshed = TokenSet::from_response(response(r#"{"access_token":"new"}"#), Utc::now())
            .inherit_refresh_token(&previous);
        assert_eq!(refreshed.refresh_token.as_deref(), Some("rt-1"));

        let rotated = TokenSet::from_response(
            response(r#"{"access_token":"new","refresh_token":"rt-2"}"#),
            Utc::now(),
        )
        .inherit_refresh_token(&previous);
        assert_eq!(rotated.refresh_token.as_deref(), Some("rt-2"));
    }

    #[test]
    fn test_authorization_header() {
        let set = TokenSet::from_response(
            response(r#"{"access_token":"at","token_type":"bearer"}"#),
            Utc::now(),
        );
        assert_eq!(set.authorization_header(), "Bearer at");
    }
}
