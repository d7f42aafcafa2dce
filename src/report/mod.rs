//! Flow Report
//!
//! The aggregate returned by a completed authorization-code flow: the verified
//! primary exchange plus whatever the enrichment stages produced.

pub mod pipeline;

pub use pipeline::{Enrichment, EnrichmentPipeline};

use serde::Serialize;
use serde_json::Value;

use crate::types::TokenSet;
use crate::verify::{IdTokenClaims, VerifiedExchange};

/// Outcome of one enrichment stage.
#[derive(Clone, Debug)]
pub enum StageOutcome<T> {
    Completed(T),
    Disabled,
    Omitted { reason: String },
}

impl<T> StageOutcome<T> {
    pub fn omitted(reason: impl std::fmt::Display) -> Self {
        Self::Omitted {
            reason: reason.to_string(),
        }
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn status(&self) -> StageStatus {
        match self {
            Self::Completed(_) => StageStatus::Completed,
            Self::Disabled => StageStatus::Disabled,
            Self::Omitted { reason } => StageStatus::Omitted {
                reason: reason.clone(),
            },
        }
    }
}

/// Serialized form of a stage outcome under `Checks`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Disabled,
    Omitted { reason: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct StageChecks {
    #[serde(rename = "UserInfo")]
    pub user_info: StageStatus,
    #[serde(rename = "Introspection")]
    pub introspection: StageStatus,
    #[serde(rename = "Refresh")]
    pub refresh: StageStatus,
}

/// Consolidated result of one finalize call.
#[derive(Clone, Debug, Serialize)]
pub struct FlowReport {
    #[serde(rename = "OAuth2Token")]
    pub oauth2_token: TokenSet,
    #[serde(rename = "IDTokenClaims")]
    pub id_token_claims: IdTokenClaims,
    #[serde(rename = "UserInfo", skip_serializing_if = "Option::is_none")]
    pub user_info: Option<Value>,
    #[serde(rename = "Introspection", skip_serializing_if = "Option::is_none")]
    pub introspection: Option<Value>,
    #[serde(rename = "Refresh", skip_serializing_if = "Option::is_none")]
    pub refresh: Option<TokenSet>,
    #[serde(rename = "RefreshIDToken", skip_serializing_if = "Option::is_none")]
    pub refresh_id_token: Option<IdTokenClaims>,
    #[serde(rename = "Checks")]
    pub checks: StageChecks,
}

impl FlowReport {
    /// Merge a verified primary exchange with the enrichment outcomes.
    pub fn aggregate(primary: VerifiedExchange, enrichment: Enrichment) -> Self {
        let checks = StageChecks {
            user_info: enrichment.user_info.status(),
            introspection: enrichment.introspection.status(),
            refresh: enrichment.refresh.status(),
        };

        let (oauth2_token, id_token_claims) = primary.into_parts();
        let (refresh, refresh_id_token) = match enrichment.refresh {
            StageOutcome::Completed(exchange) => {
                let (tokens, claims) = exchange.into_parts();
                (Some(tokens), Some(claims))
            }
            _ => (None, None),
        };

        Self {
            oauth2_token,
            id_token_claims,
            user_info: into_value(enrichment.user_info),
            introspection: into_value(enrichment.introspection),
            refresh,
            refresh_id_token,
            checks,
        }
    }

    /// Serialize with four-space indentation.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(out)
    }
}

fn into_value(outcome: StageOutcome<Value>) -> Option<Value> {
    match outcome {
        StageOutcome::Completed(value) => Some(value),
        _ => None,
    }
}
