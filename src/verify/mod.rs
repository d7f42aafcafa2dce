//! ID Token Verification
//!
//! Signature, issuer, audience and lifetime checks for ID tokens, backed by
//! `jsonwebtoken` and the provider's published key set.

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::ProviderDescriptor;
use crate::error::{OidcError, VerificationError};
use crate::types::{ClientConfig, TokenSet};

/// Allowed clock skew for `exp` and `iat`, in seconds.
pub const CLOCK_SKEW_LEEWAY_SECS: u64 = 60;

/// Verified ID token claims.
///
/// Only a [`TokenVerifier`] creates these; holding one means the token passed
/// every check.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IdTokenClaims(Map<String, Value>);

impl IdTokenClaims {
    pub(crate) fn from_verified(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// ID token verifier interface.
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw compact-serialized ID token.
    fn verify(&self, raw_id_token: &str) -> Result<IdTokenClaims, VerificationError>;
}

/// Token set whose ID token has been verified.
#[derive(Clone, Debug)]
pub struct VerifiedExchange {
    tokens: TokenSet,
    claims: IdTokenClaims,
}

impl VerifiedExchange {
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    pub fn claims(&self) -> &IdTokenClaims {
        &self.claims
    }

    pub fn into_parts(self) -> (TokenSet, IdTokenClaims) {
        (self.tokens, self.claims)
    }
}

/// Extract and verify the ID token carried by a token set.
pub fn verify_exchange(
    verifier: &dyn TokenVerifier,
    tokens: TokenSet,
) -> Result<VerifiedExchange, OidcError> {
    let raw = tokens
        .id_token
        .as_deref()
        .ok_or(crate::error::TokenError::MissingIdToken)?;
    let claims = verifier.verify(raw)?;
    Ok(VerifiedExchange { tokens, claims })
}

/// Verifier keyed by the provider's JWKS, plus the client secret for HMAC
/// signed tokens.
pub struct JwksTokenVerifier {
    issuer: String,
    client_id: String,
    jwks: JwkSet,
    client_secret: Option<SecretString>,
    leeway: u64,
}

impl JwksTokenVerifier {
    pub fn new(descriptor: &ProviderDescriptor, config: &ClientConfig) -> Self {
        Self {
            issuer: descriptor.issuer.clone(),
            client_id: config.credentials.client_id.clone(),
            jwks: descriptor.jwks.clone(),
            client_secret: config
                .credentials
                .secret()
                .map(|s| SecretString::new(s.to_string())),
            leeway: CLOCK_SKEW_LEEWAY_SECS,
        }
    }

    fn decoding_key(
        &self,
        algorithm: Algorithm,
        kid: Option<&str>,
    ) -> Result<DecodingKey, VerificationError> {
        if matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            let secret = self.client_secret.as_ref().ok_or_else(|| {
                VerificationError::UnsupportedAlgorithm {
                    algorithm: format!("{:?} without a client secret", algorithm),
                }
            })?;
            return Ok(DecodingKey::from_secret(secret.expose_secret().as_bytes()));
        }

        let jwk = match kid {
            Some(kid) => self
                .jwks
                .find(kid)
                .ok_or_else(|| VerificationError::KeyNotFound {
                    kid: kid.to_string(),
                })?,
            None => self.key_for_algorithm(algorithm)?,
        };

        Ok(DecodingKey::from_jwk(jwk)?)
    }

    fn key_for_algorithm(&self, algorithm: Algorithm) -> Result<&Jwk, VerificationError> {
        self.jwks
            .keys
            .iter()
            .find(|jwk| {
                jwk.common
                    .key_algorithm
                    .as_ref()
                    .map_or(true, |alg| format!("{:?}", alg) == format!("{:?}", algorithm))
            })
            .ok_or_else(|| VerificationError::KeyNotFound {
                kid: "(none)".to_string(),
            })
    }
}

impl TokenVerifier for JwksTokenVerifier {
    fn verify(&self, raw_id_token: &str) -> Result<IdTokenClaims, VerificationError> {
        let header = decode_header(raw_id_token)?;
        let key = self.decoding_key(header.alg, header.kid.as_deref())?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.leeway;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = decode::<Map<String, Value>>(raw_id_token, &key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::InvalidIssuer => VerificationError::InvalidIssuer {
                    expected: self.issuer.clone(),
                },
                ErrorKind::InvalidAudience => VerificationError::InvalidAudience {
                    client_id: self.client_id.clone(),
                },
                _ => VerificationError::from(e),
            }
        })?;

        check_issued_at(&data.claims, chrono::Utc::now().timestamp(), self.leeway)?;

        Ok(IdTokenClaims::from_verified(data.claims))
    }
}

/// Reject tokens whose `iat` lies further in the future than the leeway.
fn check_issued_at(
    claims: &Map<String, Value>,
    now: i64,
    leeway: u64,
) -> Result<(), VerificationError> {
    if let Some(issued_at) = claims.get("iat").and_then(Value::as_i64) {
        if issued_at > now + leeway as i64 {
            return Err(VerificationError::IssuedInFuture { issued_at, now });
        }
    }
    Ok(())
}

/// Mock token verifier for testing.
///
/// Accepts any token listed with [`MockTokenVerifier::accept`] and rejects the
/// rest with a signature error.
#[derive(Default)]
pub struct MockTokenVerifier {
    accepted: Mutex<Vec<(String, Map<String, Value>)>>,
    verify_history: Mutex<Vec<String>>,
}

impl MockTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `raw` and return `claims` for it.
    pub fn accept(&self, raw: impl Into<String>, claims: Value) -> &Self {
        let claims = match claims {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.accepted.lock().push((raw.into(), claims));
        self
    }

    /// Get verify history.
    pub fn get_verify_history(&self) -> Vec<String> {
        self.verify_history.lock().clone()
    }
}

impl TokenVerifier for MockTokenVerifier {
    fn verify(&self, raw_id_token: &str) -> Result<IdTokenClaims, VerificationError> {
        self.verify_history.lock().push(raw_id_token.to_string());
        self.accepted
            .lock()
            .iter()
            .find(|(raw, _)| raw == raw_id_token)
            .map(|(_, claims)| IdTokenClaims::from_verified(claims.clone()))
            .ok_or(VerificationError::InvalidSignature)
    }
}
