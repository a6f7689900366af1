//! Token verification.
//!
//! Verification re-links a token to its [`VerificationRecord`] through the
//! `kid` header and checks the signature against the key stored in that
//! record. Callers only ever see one of four outcomes. Every cryptographic
//! or claim failure, and every unexpected internal error, collapses into
//! [`VerificationOutcome::InvalidToken`], so a failed token does not reveal
//! why it failed.

use crate::config::KeyAlgorithm;
use crate::error::StoreError;
use crate::jwt::{Claims, JwtSerializer};
use crate::keys::decoding_key;
use crate::metrics;
use crate::storage::{RecordStore, VerificationRecord};
use chrono::Utc;
use jsonwebtoken::errors::Error as JwtError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Per-call verification options.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Verify against this record instead of looking one up.
    pub record: Option<VerificationRecord>,
}

impl VerifyOptions {
    /// Options that look the record up in the store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that verify against `record` directly.
    #[must_use]
    pub fn with_record(record: VerificationRecord) -> Self {
        Self {
            record: Some(record),
        }
    }
}

/// Outcome code reported to callers and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// Token verified.
    #[serde(rename = "success")]
    Success,
    /// No record to verify against.
    #[serde(rename = "noRecordError")]
    NoRecordError,
    /// Record lacks key, issuer or subject.
    #[serde(rename = "invalidRecordError")]
    InvalidRecordError,
    /// Any other failure.
    #[serde(rename = "invalidTokenError")]
    InvalidTokenError,
}

impl VerificationStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoRecordError => "noRecordError",
            Self::InvalidRecordError => "invalidRecordError",
            Self::InvalidTokenError => "invalidTokenError",
        }
    }
}

/// The subject and payload of a token that passed verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedToken {
    /// Subject taken from the resolved record.
    pub subject: Value,
    /// Decoded token claims.
    pub payload: Claims,
}

/// Result of a verification call.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Signature, binding and expiry all check out.
    Success(VerifiedToken),
    /// No record source, or no record under the token's `kid`.
    NoRecord,
    /// A record resolved but lacks `key`, `issuer` or `subject`.
    InvalidRecord,
    /// Anything else.
    InvalidToken,
}

impl VerificationOutcome {
    /// Status code for this outcome.
    #[must_use]
    pub const fn status(&self) -> VerificationStatus {
        match self {
            Self::Success(_) => VerificationStatus::Success,
            Self::NoRecord => VerificationStatus::NoRecordError,
            Self::InvalidRecord => VerificationStatus::InvalidRecordError,
            Self::InvalidToken => VerificationStatus::InvalidTokenError,
        }
    }

    /// True for [`VerificationOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Verified subject, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&Value> {
        match self {
            Self::Success(verified) => Some(&verified.subject),
            _ => None,
        }
    }

    /// Consumes the outcome, keeping only a successful result.
    #[must_use]
    pub fn into_verified(self) -> Option<VerifiedToken> {
        match self {
            Self::Success(verified) => Some(verified),
            _ => None,
        }
    }
}

/// Internal failure reasons. Logged, never returned.
#[derive(Debug, Error)]
enum VerifyFailure {
    #[error("no record source configured")]
    NoRecordSource,

    #[error("no record for kid {0:?}")]
    RecordNotFound(Option<String>),

    #[error("record {id} missing {fields:?}")]
    IncompleteRecord { id: String, fields: Vec<&'static str> },

    #[error("malformed token: {0}")]
    Malformed(#[source] JwtError),

    #[error("record lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("record key unusable: {0}")]
    RecordKey(#[source] JwtError),

    #[error("signature rejected: {0}")]
    Signature(#[source] JwtError),

    #[error("issuer does not match record")]
    IssuerMismatch,

    #[error("subject does not match record")]
    SubjectMismatch,

    #[error("token expired at {0}")]
    Expired(i64),
}

impl VerifyFailure {
    fn outcome(&self) -> VerificationOutcome {
        match self {
            Self::NoRecordSource | Self::RecordNotFound(_) => VerificationOutcome::NoRecord,
            Self::IncompleteRecord { .. } => VerificationOutcome::InvalidRecord,
            _ => VerificationOutcome::InvalidToken,
        }
    }
}

/// Checks tokens against their verification records.
pub struct TokenVerifier {
    serializer: JwtSerializer,
    store: Option<Arc<dyn RecordStore>>,
}

impl TokenVerifier {
    /// Creates a verifier accepting `algorithm`, with an optional record store.
    pub fn new(algorithm: KeyAlgorithm, store: Option<Arc<dyn RecordStore>>) -> Self {
        Self {
            serializer: JwtSerializer::new(algorithm),
            store,
        }
    }

    /// Verify `token`. Never fails: every problem maps to an outcome.
    pub async fn verify(&self, token: &str, options: VerifyOptions) -> VerificationOutcome {
        let outcome = match self.try_verify(token, options).await {
            Ok(verified) => VerificationOutcome::Success(verified),
            Err(failure) => {
                debug!(reason = %failure, "Token verification failed");
                failure.outcome()
            }
        };

        metrics::record_verification(outcome.status().as_str());
        outcome
    }

    async fn try_verify(
        &self,
        token: &str,
        options: VerifyOptions,
    ) -> Result<VerifiedToken, VerifyFailure> {
        let (header, _) = self
            .serializer
            .decode_unverified(token)
            .map_err(VerifyFailure::Malformed)?;

        let record = match options.record {
            Some(record) => record,
            None => self.lookup(header.kid).await?,
        };

        let missing = record.missing_fields();
        let (Some(key), Some(issuer), Some(subject), true) =
            (record.key, record.issuer, record.subject, missing.is_empty())
        else {
            return Err(VerifyFailure::IncompleteRecord {
                id: record.id,
                fields: missing,
            });
        };

        let key = decoding_key(self.serializer.algorithm(), &key)
            .map_err(VerifyFailure::RecordKey)?;
        let claims = self
            .serializer
            .deserialize(token, &key)
            .map_err(VerifyFailure::Signature)?;

        if claims.iss != issuer {
            return Err(VerifyFailure::IssuerMismatch);
        }
        if claims.sub != subject {
            return Err(VerifyFailure::SubjectMismatch);
        }
        if claims.is_expired_at(Utc::now().timestamp()) {
            return Err(VerifyFailure::Expired(claims.exp));
        }

        Ok(VerifiedToken {
            subject,
            payload: claims,
        })
    }

    async fn lookup(&self, kid: Option<String>) -> Result<VerificationRecord, VerifyFailure> {
        let store = self.store.as_ref().ok_or(VerifyFailure::NoRecordSource)?;
        let Some(kid) = kid else {
            return Err(VerifyFailure::RecordNotFound(None));
        };

        store
            .find_by_id(&kid)
            .await?
            .ok_or(VerifyFailure::RecordNotFound(Some(kid)))
    }
}
