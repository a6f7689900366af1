//! Token issuance.
//!
//! Every issued token is paired with a [`VerificationRecord`] that carries
//! the public key of the signing pair. The record is written keyed by
//! subject, replacing whatever that subject held before, so a subject has at
//! most one verifiable token at a time.

use crate::config::{Config, RotationPolicy, WriteMode};
use crate::error::{StoreError, TokenError};
use crate::jwt::{ClaimsBuilder, JwtSerializer};
use crate::keys::KeyRing;
use crate::metrics;
use crate::storage::{RecordStore, VerificationRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Per-call issuance options.
#[derive(Debug, Clone, Default)]
pub struct IssueOptions {
    /// Lifetime override for this token only. May be negative.
    pub duration: Option<chrono::Duration>,
    /// Custom claims. Entries named like a reserved claim are dropped.
    pub payload: Map<String, Value>,
}

impl IssueOptions {
    /// Default lifetime, no custom claims.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the token lifetime.
    #[must_use]
    pub fn with_duration(mut self, duration: chrono::Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Add one custom claim.
    #[must_use]
    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Add custom claims in bulk.
    #[must_use]
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload.extend(payload);
        self
    }
}

/// A signed token and the record that verifies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Record the token verifies against
    pub record: VerificationRecord,
    /// Compact JWS
    pub token: String,
}

/// Builds, signs and records tokens for one issuer identity.
pub struct TokenIssuer {
    issuer_id: String,
    keys: Arc<KeyRing>,
    store: Option<Arc<dyn RecordStore>>,
    serializer: JwtSerializer,
    default_lifetime: chrono::Duration,
    policy: RotationPolicy,
    write_mode: WriteMode,
}

impl TokenIssuer {
    /// Creates an issuer signing as `issuer_id` with keys from `keys`.
    pub fn new(
        issuer_id: String,
        keys: Arc<KeyRing>,
        store: Option<Arc<dyn RecordStore>>,
        config: &Config,
    ) -> Self {
        Self {
            issuer_id,
            serializer: JwtSerializer::new(keys.algorithm()),
            keys,
            store,
            default_lifetime: config.token_lifetime,
            policy: config.rotation_policy(),
            write_mode: config.write_mode,
        }
    }

    /// Issuer identity stamped into every token.
    pub fn issuer_id(&self) -> &str {
        &self.issuer_id
    }

    /// Issue a token for `subject`.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range lifetime, a failed per-issuance key rotation,
    /// a signing error, or an awaited store write error.
    pub async fn issue(
        &self,
        subject: impl Into<Value>,
        options: IssueOptions,
    ) -> Result<IssuedToken, TokenError> {
        let subject = subject.into();
        let now = Utc::now();
        let lifetime = options.duration.unwrap_or(self.default_lifetime);
        let expires_at = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| TokenError::config("Token lifetime out of range"))?;

        let claims = ClaimsBuilder::new(self.issuer_id.clone())
            .subject(subject.clone())
            .issued_at(now)
            .expires_at(expires_at)
            .custom_claims(options.payload)
            .build()?;

        // One pair serves both the record and the signature. Under per-issuance
        // rotation the pair is claimed exclusively for this token.
        let pair = match self.policy {
            RotationPolicy::PerIssuance => self.keys.claim_and_rotate("issuance").await?,
            RotationPolicy::Interval(_) => self.keys.current().await,
        };
        let record = VerificationRecord::new(
            Uuid::new_v4().to_string(),
            subject,
            self.issuer_id.clone(),
            pair.public_key().to_string(),
            now,
            expires_at,
        );

        let token = self
            .serializer
            .serialize(&claims, &pair.encoding_key(), Some(&record.id))?;

        self.persist(&record).await?;

        metrics::record_token_issued(pair.algorithm().as_str());
        info!(
            record_id = %record.id,
            key_generation = pair.generation(),
            expires_at = %record.expires_at,
            "Issued token"
        );

        Ok(IssuedToken { record, token })
    }

    async fn persist(&self, record: &VerificationRecord) -> Result<(), TokenError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        match self.write_mode {
            WriteMode::Awaited => Ok(write_record(store.as_ref(), record).await?),
            WriteMode::Detached => {
                let store = Arc::clone(store);
                let record = record.clone();
                tokio::spawn(async move {
                    if let Err(e) = write_record(store.as_ref(), &record).await {
                        error!(record_id = %record.id, error = %e, "Detached record write failed");
                    }
                });
                Ok(())
            }
        }
    }
}

/// Insert `record`, or replace the record its subject already holds.
async fn write_record(
    store: &dyn RecordStore,
    record: &VerificationRecord,
) -> Result<(), StoreError> {
    let existing = match &record.subject {
        Some(subject) => store.find_by_subject(subject).await?,
        None => None,
    };

    let (operation, result) = match existing {
        Some(previous) => ("replace", store.replace(&previous.id, record).await),
        None => ("insert", store.insert(record).await),
    };

    metrics::record_store_write(operation, if result.is_ok() { "success" } else { "failure" });
    result
}
