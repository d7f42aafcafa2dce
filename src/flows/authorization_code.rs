//! Authorization Code Flow
//!
//! RFC 6749 Section 4.1 - Authorization Code Grant, followed by ID token
//! verification and the enrichment pipeline.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::core::{ProviderDescriptor, StateManager};
use crate::error::{AuthorizationError, ConfigurationError, FinalizeError, OidcError};
use crate::flows::FlowDriver;
use crate::report::{EnrichmentPipeline, FlowReport};
use crate::session::FlowSession;
use crate::token::TokenEndpoint;
use crate::types::{CallbackParams, ClientConfig};
use crate::verify::{verify_exchange, TokenVerifier};

/// Where to send the browser, and the session to bind to it.
#[derive(Clone, Debug)]
pub struct AuthorizationRedirect {
    pub url: String,
    pub session: FlowSession,
}

/// Inbound redirect from the provider.
#[derive(Clone, Debug)]
pub struct AuthCallback {
    /// Session loaded from the caller's cookie, if any.
    pub session: Option<FlowSession>,
    pub params: CallbackParams,
}

/// Server-mediated authorization-code driver.
pub struct AuthorizationCodeDriver {
    config: ClientConfig,
    descriptor: Arc<ProviderDescriptor>,
    states: Arc<dyn StateManager>,
    token_endpoint: Arc<dyn TokenEndpoint>,
    verifier: Arc<dyn TokenVerifier>,
    pipeline: EnrichmentPipeline,
}

impl AuthorizationCodeDriver {
    pub fn new(
        config: ClientConfig,
        descriptor: Arc<ProviderDescriptor>,
        states: Arc<dyn StateManager>,
        token_endpoint: Arc<dyn TokenEndpoint>,
        verifier: Arc<dyn TokenVerifier>,
        pipeline: EnrichmentPipeline,
    ) -> Self {
        Self {
            config,
            descriptor,
            states,
            token_endpoint,
            verifier,
            pipeline,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_authorization_url(&self, state: &str) -> Result<String, OidcError> {
        let mut url = Url::parse(&self.descriptor.authorization_endpoint).map_err(|_| {
            ConfigurationError::InvalidEndpoint {
                url: self.descriptor.authorization_endpoint.clone(),
            }
        })?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.credentials.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("scope", &self.config.scope_param())
            .append_pair("state", state);

        Ok(url.into())
    }

    /// Compare the callback's state against the session's, then redeem it.
    ///
    /// The ledger entry is only consumed once the values match, so a forged
    /// callback cannot spend the state of a flow still in progress.
    fn check_state(
        &self,
        session: Option<&FlowSession>,
        params: &CallbackParams,
    ) -> Result<(), AuthorizationError> {
        let session = session.ok_or(AuthorizationError::MissingSession)?;
        let received = params
            .state
            .as_deref()
            .ok_or(AuthorizationError::MissingState)?;
        if received != session.state {
            return Err(AuthorizationError::StateMismatch);
        }
        if !self.states.consume(&session.state) {
            return Err(AuthorizationError::StateConsumed);
        }
        Ok(())
    }
}

fn reject(error: impl Into<OidcError>) -> FinalizeError {
    let error = error.into();
    tracing::warn!(
        error = %error,
        code = error.error_code(),
        "rejecting authorization callback"
    );
    FinalizeError::Rejected(error)
}

#[async_trait]
impl FlowDriver for AuthorizationCodeDriver {
    type Start = Option<FlowSession>;
    type Initiation = AuthorizationRedirect;
    type Callback = AuthCallback;
    type Completion = FlowReport;
    type Error = FinalizeError;

    /// Issue a fresh state and build the provider redirect.
    ///
    /// A state still held by the caller's previous session is revoked.
    async fn initiate(
        &self,
        previous: Option<FlowSession>,
    ) -> Result<AuthorizationRedirect, OidcError> {
        if let Some(previous) = previous {
            self.states.revoke(&previous.state);
        }

        let state = self.states.issue();
        let url = self.build_authorization_url(&state)?;
        tracing::debug!(
            authorization_endpoint = %self.descriptor.authorization_endpoint,
            "starting authorization code flow"
        );

        Ok(AuthorizationRedirect {
            url,
            session: FlowSession::new(state),
        })
    }

    async fn finalize(&self, callback: AuthCallback) -> Result<FlowReport, FinalizeError> {
        let AuthCallback { session, params } = callback;

        self.check_state(session.as_ref(), &params).map_err(reject)?;

        if let Some(error) = params.error {
            return Err(reject(AuthorizationError::Denied {
                error,
                error_description: params.error_description,
            }));
        }

        let code = params.code.ok_or_else(|| reject(AuthorizationError::MissingCode))?;

        let tokens = self
            .token_endpoint
            .exchange_code(&code, &self.config.redirect_url)
            .await
            .map_err(reject)?;

        let primary = verify_exchange(self.verifier.as_ref(), tokens).map_err(reject)?;
        tracing::info!(sub = primary.claims().subject().unwrap_or_default(), "verified ID token");

        let enrichment = self.pipeline.run(&primary).await.map_err(|e| {
            tracing::error!(error = %e, "enrichment pipeline failed");
            FinalizeError::Internal(e)
        })?;

        Ok(FlowReport::aggregate(primary, enrichment))
    }
}
