//! Enrichment Pipeline
//!
//! Best-effort follow-up calls made after a verified primary exchange.
//! Stages run in a fixed order and each one yields its own outcome; a failed
//! stage is logged and omitted without touching its siblings.

use serde_json::Value;
use std::sync::Arc;

use crate::core::ProviderDescriptor;
use crate::error::OidcError;
use crate::report::StageOutcome;
use crate::token::{TokenIntrospector, TokenSource, UserInfoFetcher};
use crate::types::CheckToggles;
use crate::verify::{verify_exchange, TokenVerifier, VerifiedExchange};

/// Per-stage results of one pipeline run.
#[derive(Debug)]
pub struct Enrichment {
    pub user_info: StageOutcome<Value>,
    pub introspection: StageOutcome<Value>,
    pub refresh: StageOutcome<VerifiedExchange>,
}

pub struct EnrichmentPipeline {
    checks: CheckToggles,
    descriptor: Arc<ProviderDescriptor>,
    user_info: Arc<dyn UserInfoFetcher>,
    introspector: Arc<dyn TokenIntrospector>,
    token_source: TokenSource,
    verifier: Arc<dyn TokenVerifier>,
}

impl EnrichmentPipeline {
    pub fn new(
        checks: CheckToggles,
        descriptor: Arc<ProviderDescriptor>,
        user_info: Arc<dyn UserInfoFetcher>,
        introspector: Arc<dyn TokenIntrospector>,
        token_source: TokenSource,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            checks,
            descriptor,
            user_info,
            introspector,
            token_source,
            verifier,
        }
    }

    /// Run every enabled stage against `primary`.
    ///
    /// Only a provider without an introspection endpoint, while introspection
    /// is enabled, fails the run.
    pub async fn run(&self, primary: &VerifiedExchange) -> Result<Enrichment, OidcError> {
        let user_info = self.user_info_stage(primary).await;
        let introspection = self.introspection_stage(primary).await?;
        let refresh = self.refresh_stage(primary).await;

        Ok(Enrichment {
            user_info,
            introspection,
            refresh,
        })
    }

    async fn user_info_stage(&self, primary: &VerifiedExchange) -> StageOutcome<Value> {
        if !self.checks.user_info {
            return StageOutcome::Disabled;
        }

        match self.user_info.fetch(primary.tokens()).await {
            Ok(info) => StageOutcome::Completed(info),
            Err(e) => {
                tracing::error!(error = %e, "failed to get userinfo");
                StageOutcome::omitted(e)
            }
        }
    }

    async fn introspection_stage(
        &self,
        primary: &VerifiedExchange,
    ) -> Result<StageOutcome<Value>, OidcError> {
        if !self.checks.introspection {
            return Ok(StageOutcome::Disabled);
        }

        self.descriptor.require_introspection_endpoint()?;

        Ok(match self.introspector.introspect(primary.tokens()).await {
            Ok(result) => StageOutcome::Completed(result),
            Err(e) => {
                tracing::error!(error = %e, "failed to do token introspection");
                StageOutcome::omitted(e)
            }
        })
    }

    async fn refresh_stage(&self, primary: &VerifiedExchange) -> StageOutcome<VerifiedExchange> {
        if !self.checks.refresh {
            return StageOutcome::Disabled;
        }

        let refreshed = match self.token_source.force_refresh(primary.tokens()).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh token");
                return StageOutcome::omitted(e);
            }
        };

        match verify_exchange(self.verifier.as_ref(), refreshed) {
            Ok(exchange) => StageOutcome::Completed(exchange),
            Err(e) => {
                tracing::warn!(error = %e, "failed to verify ID token in refresh token");
                StageOutcome::omitted(e)
            }
        }
    }
}
