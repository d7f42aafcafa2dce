//! Flow Sessions
//!
//! Per-browser flow session kept in an encrypted cookie. The cookie only
//! carries the anti-CSRF state and its creation time; redemption is tracked
//! server-side by the state ledger.

use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::DEFAULT_STATE_MAX_AGE;
use crate::error::{OidcError, SessionError};

/// Cookie holding the flow session.
pub const SESSION_COOKIE: &str = "session-name";

/// Key material for encrypting session cookies.
///
/// Generated fresh per process unless supplied; restarting the process
/// invalidates every outstanding session.
#[derive(Clone)]
pub struct SessionKey(Key);

impl SessionKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self(Key::generate())
    }

    /// Derive a key from at least 64 bytes of material.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OidcError> {
        Key::try_from(bytes).map(Self).map_err(|e| {
            OidcError::Session(SessionError::InvalidKey {
                message: e.to_string(),
            })
        })
    }

    pub fn key(&self) -> &Key {
        &self.0
    }
}

impl From<SessionKey> for Key {
    fn from(key: SessionKey) -> Self {
        key.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

/// State bound to one in-flight browser interaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSession {
    pub state: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl FlowSession {
    pub fn new(state: String) -> Self {
        Self {
            state,
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        Utc::now().timestamp() - self.created_at > max_age.as_secs() as i64
    }
}

/// Reads and writes the flow session cookie.
#[derive(Clone, Debug)]
pub struct CookieSessionStore {
    cookie_path: String,
    secure: bool,
    max_age: Duration,
}

impl CookieSessionStore {
    /// Scope cookies to `root_path`; mark them `Secure` when served over TLS.
    pub fn new(root_path: &str, secure: bool) -> Self {
        let cookie_path = if root_path.is_empty() {
            "/".to_string()
        } else {
            root_path.to_string()
        };
        Self {
            cookie_path,
            secure,
            max_age: DEFAULT_STATE_MAX_AGE,
        }
    }

    /// Load the caller's flow session, if one exists and is still fresh.
    pub fn load(&self, jar: &PrivateCookieJar) -> Option<FlowSession> {
        let cookie = jar.get(SESSION_COOKIE)?;
        match serde_json::from_str::<FlowSession>(cookie.value()) {
            Ok(session) if !session.is_expired(self.max_age) => Some(session),
            Ok(_) => {
                tracing::debug!("flow session expired");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "discarding undecodable flow session");
                None
            }
        }
    }

    /// Persist a session into the jar.
    pub fn save(
        &self,
        jar: PrivateCookieJar,
        session: &FlowSession,
    ) -> Result<PrivateCookieJar, OidcError> {
        let value = serde_json::to_string(session).map_err(|e| {
            OidcError::Session(SessionError::EncodeFailed {
                message: e.to_string(),
            })
        })?;

        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path(self.cookie_path.clone())
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);

        Ok(jar.add(cookie))
    }

    /// Remove the session cookie.
    pub fn clear(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path(self.cookie_path.clone()))
    }
}
