//! Device Authorization Flow
//!
//! RFC 8628 - OAuth 2.0 Device Authorization Grant, run from a terminal.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::core::{client_form_request, HttpTransport};
use crate::error::{create_error_from_response, parse_error_response, DeviceFlowError, OidcError};
use crate::flows::FlowDriver;
use crate::types::{
    ClientCredentials, DeviceAuthorizationResponse, DeviceCode, DevicePollResult, GrantType,
    TokenResponse, TokenSet,
};

/// Interval increase applied on every `slow_down` response.
pub const DEVICE_SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Scopes to request with a new device code.
#[derive(Clone, Debug, Default)]
pub struct DeviceCodeRequest {
    pub scopes: Vec<String>,
}

/// Device flow driver for a public client.
pub struct DeviceDriver {
    device_url: String,
    token_url: String,
    credentials: ClientCredentials,
    transport: Arc<dyn HttpTransport>,
}

impl DeviceDriver {
    pub fn new(
        device_url: impl Into<String>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            device_url: device_url.into(),
            token_url: token_url.into(),
            credentials: ClientCredentials::new(client_id, None),
            transport,
        }
    }

    /// Request a device and user code.
    pub async fn request_code(&self, scopes: &[String]) -> Result<DeviceCode, OidcError> {
        let scope = scopes.join(" ");
        let params: Vec<(&str, &str)> = if scope.is_empty() {
            Vec::new()
        } else {
            vec![("scope", scope.as_str())]
        };

        let request = client_form_request(&self.device_url, &self.credentials, &params);
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let device_response: DeviceAuthorizationResponse = response.json()?;
        tracing::debug!(
            verification_uri = %device_response.verification_uri,
            expires_in = device_response.expires_in,
            interval = device_response.polling_interval(),
            "device code issued"
        );

        Ok(DeviceCode::from_response(device_response, Instant::now()))
    }

    /// Make one token request for `code`.
    ///
    /// Transient answers come back as `Pending`/`SlowDown`; terminal ones as
    /// errors. Some providers answer polls with `200` and an error body, so
    /// the body is checked for `error` before the status.
    pub async fn poll_once(&self, code: &DeviceCode) -> Result<DevicePollResult, OidcError> {
        let request = client_form_request(
            &self.token_url,
            &self.credentials,
            &[
                ("grant_type", GrantType::DeviceCode.as_str()),
                ("device_code", code.device_code.as_str()),
            ],
        );
        let response = self.transport.send(request).await?;

        if let Some(error) = parse_error_response(&response.body) {
            return match error.error.as_str() {
                "authorization_pending" => Ok(DevicePollResult::Pending),
                "slow_down" => Ok(DevicePollResult::SlowDown),
                "access_denied" => Err(DeviceFlowError::AccessDenied.into()),
                "expired_token" => Err(DeviceFlowError::ExpiredToken.into()),
                _ => Err(DeviceFlowError::Provider {
                    error: error.error,
                    error_description: error.error_description,
                }
                .into()),
            };
        }

        if !response.is_success() {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let token_response: TokenResponse = response.json()?;
        Ok(DevicePollResult::Success(token_response))
    }

    /// Poll until the user authorizes, a terminal error arrives, or the device
    /// code expires.
    ///
    /// Waits the current interval before every request.
    pub async fn poll_token(&self, code: &DeviceCode) -> Result<TokenSet, OidcError> {
        let mut interval = code.interval;

        loop {
            tokio::time::sleep(interval).await;
            if Instant::now() >= code.expires_at {
                return Err(DeviceFlowError::ExpiredToken.into());
            }

            match self.poll_once(code).await? {
                DevicePollResult::Success(token_response) => {
                    return Ok(TokenSet::from_response(token_response, Utc::now()));
                }
                DevicePollResult::Pending => {
                    tracing::debug!("authorization pending");
                }
                DevicePollResult::SlowDown => {
                    interval = interval.saturating_add(DEVICE_SLOW_DOWN_STEP);
                    tracing::info!(
                        interval_secs = interval.as_secs(),
                        "provider asked to slow down"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl FlowDriver for DeviceDriver {
    type Start = DeviceCodeRequest;
    type Initiation = DeviceCode;
    type Callback = DeviceCode;
    type Completion = TokenSet;
    type Error = OidcError;

    async fn initiate(&self, start: DeviceCodeRequest) -> Result<DeviceCode, OidcError> {
        self.request_code(&start.scopes).await
    }

    async fn finalize(&self, code: DeviceCode) -> Result<TokenSet, OidcError> {
        self.poll_token(&code).await
    }
}
