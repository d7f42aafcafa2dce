//! OIDC Test Client
//!
//! Resolves the provider once and assembles the flow drivers around it.

use std::sync::Arc;

use crate::core::{
    DefaultDiscoveryClient, DiscoveryClient, HttpTransport, InMemoryStateManager,
    ProviderDescriptor, ReqwestHttpTransport, StateManager,
};
use crate::error::OidcError;
use crate::flows::{AuthorizationCodeDriver, ImplicitDriver};
use crate::report::EnrichmentPipeline;
use crate::token::{
    DefaultTokenEndpoint, DefaultTokenIntrospector, DefaultUserInfoFetcher, TokenSource,
};
use crate::types::ClientConfig;
use crate::verify::{JwksTokenVerifier, TokenVerifier};

/// Diagnostic client bound to exactly one provider.
pub struct OidcTestClient {
    config: ClientConfig,
    descriptor: Arc<ProviderDescriptor>,
    transport: Arc<dyn HttpTransport>,
    states: Arc<dyn StateManager>,
}

impl OidcTestClient {
    /// Build the outbound transport from `config` and discover the provider.
    pub async fn connect(config: ClientConfig) -> Result<Self, OidcError> {
        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled for provider calls");
        }
        let transport = Arc::new(ReqwestHttpTransport::with_options(
            config.timeout,
            config.tls_verify,
        )?);
        Self::discover(config, transport).await
    }

    /// Discover the provider over a caller-supplied transport.
    pub async fn discover(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, OidcError> {
        let descriptor = DefaultDiscoveryClient::new(transport.clone())
            .discover(&config.provider_url)
            .await?;
        Ok(Self::with_descriptor(config, descriptor, transport))
    }

    /// Use an already resolved descriptor.
    pub fn with_descriptor(
        config: ClientConfig,
        descriptor: ProviderDescriptor,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            config,
            descriptor: Arc::new(descriptor),
            transport,
            states: Arc::new(InMemoryStateManager::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    /// ID token verifier for this provider and client.
    pub fn verifier(&self) -> Arc<dyn TokenVerifier> {
        Arc::new(JwksTokenVerifier::new(&self.descriptor, &self.config))
    }

    /// Authorization-code driver with the enrichment pipeline configured from
    /// the client's check toggles.
    pub fn authorization_code_driver(&self) -> AuthorizationCodeDriver {
        let verifier = self.verifier();
        let token_endpoint = Arc::new(DefaultTokenEndpoint::new(
            self.descriptor.token_endpoint.clone(),
            self.config.credentials.clone(),
            self.transport.clone(),
        ));

        let pipeline = EnrichmentPipeline::new(
            self.config.checks,
            self.descriptor.clone(),
            Arc::new(DefaultUserInfoFetcher::new(
                &self.descriptor,
                self.transport.clone(),
            )),
            Arc::new(DefaultTokenIntrospector::new(
                &self.descriptor,
                self.config.credentials.clone(),
                self.transport.clone(),
            )),
            TokenSource::new(token_endpoint.clone()),
            verifier.clone(),
        );

        AuthorizationCodeDriver::new(
            self.config.clone(),
            self.descriptor.clone(),
            self.states.clone(),
            token_endpoint,
            verifier,
            pipeline,
        )
    }

    pub fn implicit_driver(&self) -> ImplicitDriver {
        ImplicitDriver::new(&self.config)
    }
}
