//! The credential generator: one issuer identity, one key ring, and the
//! rotation task that goes with it.

use crate::config::{Config, RotationPolicy};
use crate::error::TokenError;
use crate::issuer::{IssueOptions, IssuedToken, TokenIssuer};
use crate::keys::{KeyRing, RotationTask};
use crate::storage::RecordStore;
use crate::verifier::{TokenVerifier, VerificationOutcome, VerifyOptions};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Issues and verifies tokens for a single issuer identity.
///
/// With a positive rotation interval the generator owns a background
/// rotation task; call [`TokenGenerator::dispose`] to stop it. With a zero
/// interval the key pair is rotated after every issuance instead.
///
/// ```no_run
/// use credential_service::{Config, IssueOptions, MemoryRecordStore, TokenGenerator, VerifyOptions};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), credential_service::TokenError> {
/// let store = Arc::new(MemoryRecordStore::new());
/// let generator = TokenGenerator::new(Config::default(), Some(store))?;
///
/// let issued = generator.issue("user-42", IssueOptions::new()).await?;
/// let outcome = generator.verify(&issued.token, VerifyOptions::new()).await;
/// assert!(outcome.is_success());
///
/// generator.dispose().await;
/// # Ok(())
/// # }
/// ```
pub struct TokenGenerator {
    id: String,
    keys: Arc<KeyRing>,
    policy: RotationPolicy,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    rotation: Mutex<Option<RotationTask>>,
}

impl TokenGenerator {
    /// Build a generator and, under an interval policy, start key rotation.
    ///
    /// # Errors
    ///
    /// Returns an error if the first key pair cannot be generated, or if an
    /// interval policy is configured outside a tokio runtime.
    pub fn new(config: Config, store: Option<Arc<dyn RecordStore>>) -> Result<Self, TokenError> {
        let id = config
            .generator_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let keys = Arc::new(KeyRing::new(config.algorithm)?);
        let policy = config.rotation_policy();

        let rotation = match policy {
            RotationPolicy::Interval(interval) => {
                tokio::runtime::Handle::try_current().map_err(|_| {
                    TokenError::config("Periodic key rotation requires a tokio runtime")
                })?;
                Some(keys.start_rotation(interval))
            }
            RotationPolicy::PerIssuance => None,
        };

        let issuer = TokenIssuer::new(id.clone(), Arc::clone(&keys), store.clone(), &config);
        let verifier = TokenVerifier::new(config.algorithm, store);

        info!(
            generator_id = %id,
            algorithm = config.algorithm.as_str(),
            policy = ?policy,
            "Token generator ready"
        );

        Ok(Self {
            id,
            keys,
            policy,
            issuer,
            verifier,
            rotation: Mutex::new(rotation),
        })
    }

    /// Issuer identity stamped into every token.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Rotation strategy chosen at construction.
    pub fn rotation_policy(&self) -> RotationPolicy {
        self.policy
    }

    /// The key ring backing issuance.
    pub fn key_ring(&self) -> &Arc<KeyRing> {
        &self.keys
    }

    /// See [`TokenIssuer::issue`].
    ///
    /// # Errors
    ///
    /// Propagates issuance failures.
    pub async fn issue(
        &self,
        subject: impl Into<Value>,
        options: IssueOptions,
    ) -> Result<IssuedToken, TokenError> {
        self.issuer.issue(subject, options).await
    }

    /// See [`TokenVerifier::verify`].
    pub async fn verify(&self, token: &str, options: VerifyOptions) -> VerificationOutcome {
        self.verifier.verify(token, options).await
    }

    /// Stop scheduled rotation. Once this returns no scheduled rotation will
    /// fire; in-flight issue and verify calls are unaffected.
    pub async fn dispose(&self) {
        let task = self.rotation.lock().await.take();
        if let Some(task) = task {
            task.stop().await;
            info!(generator_id = %self.id, "Token generator disposed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryRecordStore;
    use std::time::Duration;

    #[tokio::test]
    async fn test_generator_id() {
        let generator =
            TokenGenerator::new(Config::default().with_generator_id("gen-a"), None).unwrap();
        assert_eq!(generator.id(), "gen-a");

        let random = TokenGenerator::new(Config::default(), None).unwrap();
        assert!(Uuid::parse_str(random.id()).is_ok());

        generator.dispose().await;
        random.dispose().await;
    }

    #[test]
    fn test_interval_policy_needs_runtime() {
        let result = TokenGenerator::new(Config::default(), None);
        assert!(matches!(result, Err(TokenError::Config(_))));
    }

    #[test]
    fn test_per_issuance_policy_without_runtime() {
        let config = Config::default().with_key_rotation_interval(Duration::ZERO);
        let generator = TokenGenerator::new(config, None).unwrap();
        assert_eq!(generator.rotation_policy(), RotationPolicy::PerIssuance);
    }

    #[tokio::test]
    async fn test_round_trip_through_store() {
        let store = Arc::new(MemoryRecordStore::new());
        let generator = TokenGenerator::new(Config::default(), Some(store)).unwrap();

        let issued = generator.issue("user-42", IssueOptions::new()).await.unwrap();
        let outcome = generator.verify(&issued.token, VerifyOptions::new()).await;

        assert_eq!(outcome.subject(), Some(&Value::from("user-42")));
        generator.dispose().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_is_idempotent() {
        let config = Config::default().with_key_rotation_interval(Duration::from_secs(10));
        let generator = TokenGenerator::new(config, None).unwrap();

        generator.dispose().await;
        generator.dispose().await;

        let generation = generator.key_ring().current().await.generation();
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(generator.key_ring().current().await.generation(), generation);
    }
}
