//! Device Authorization Types
//!
//! Types for the OAuth2 Device Authorization Grant (RFC 8628).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use super::TokenResponse;

/// Polling interval used when the provider does not send one.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Upper bound applied to a provider's `expires_in` and `interval`.
pub const MAX_DEVICE_CODE_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Device authorization response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceAuthorizationResponse {
    /// Device verification code (not shown to user).
    pub device_code: String,
    /// User code to display.
    pub user_code: String,
    /// URI for user to visit.
    #[serde(alias = "verification_url")]
    pub verification_uri: String,
    /// URI with code pre-filled (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_uri_complete: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: u64,
    /// Minimum polling interval in seconds.
    #[serde(default)]
    pub interval: Option<u64>,
}

impl DeviceAuthorizationResponse {
    /// Get polling interval (default 5 seconds per RFC 8628).
    pub fn polling_interval(&self) -> u64 {
        self.interval.filter(|i| *i > 0).unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
    }
}

/// Device code issued to this client, anchored to the moment it was received.
#[derive(Clone, Debug)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: Option<String>,
    pub interval: Duration,
    pub expires_at: Instant,
}

impl DeviceCode {
    pub fn from_response(response: DeviceAuthorizationResponse, issued_at: Instant) -> Self {
        let capped = |secs: u64| Duration::from_secs(secs).min(MAX_DEVICE_CODE_LIFETIME);
        Self {
            interval: capped(response.polling_interval()),
            expires_at: issued_at + capped(response.expires_in),
            device_code: response.device_code,
            user_code: response.user_code,
            verification_uri: response.verification_uri,
            verification_uri_complete: response.verification_uri_complete,
        }
    }
}

/// Result of a single device token poll.
#[derive(Clone, Debug)]
pub enum DevicePollResult {
    /// Token received successfully.
    Success(TokenResponse),
    /// Authorization still pending (user hasn't completed yet).
    Pending,
    /// Slow down - increase polling interval.
    SlowDown,
}
