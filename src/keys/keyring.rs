//! Current key pair ownership and rotation scheduling.

use crate::config::KeyAlgorithm;
use crate::error::TokenError;
use crate::keys::pair::SigningKeyPair;
use crate::metrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Owns the single current signing key pair.
///
/// Readers get an `Arc` snapshot, so a rotation never exposes a mix of two
/// pairs. Pairs already handed out stay usable after rotation.
pub struct KeyRing {
    algorithm: KeyAlgorithm,
    current: RwLock<Arc<SigningKeyPair>>,
    next_generation: AtomicU64,
}

impl KeyRing {
    /// Create a key ring with a freshly generated first pair.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails.
    pub fn new(algorithm: KeyAlgorithm) -> Result<Self, TokenError> {
        let initial = SigningKeyPair::generate(algorithm, 1)?;
        Ok(Self {
            algorithm,
            current: RwLock::new(Arc::new(initial)),
            next_generation: AtomicU64::new(2),
        })
    }

    /// Algorithm of every pair in this ring.
    #[must_use]
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Snapshot of the current pair.
    pub async fn current(&self) -> Arc<SigningKeyPair> {
        Arc::clone(&*self.current.read().await)
    }

    /// Generate a new pair and make it current.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails; the previous pair stays current.
    pub async fn rotate(&self) -> Result<Arc<SigningKeyPair>, TokenError> {
        self.rotate_for("manual").await
    }

    /// Hand out the current pair for exclusive use and make a fresh pair
    /// current in the same step. Concurrent callers never receive the same pair.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails; nothing is handed out then.
    pub async fn claim_and_rotate(
        &self,
        trigger: &'static str,
    ) -> Result<Arc<SigningKeyPair>, TokenError> {
        let (previous, _) = self.swap(trigger).await?;
        Ok(previous)
    }

    async fn rotate_for(
        &self,
        trigger: &'static str,
    ) -> Result<Arc<SigningKeyPair>, TokenError> {
        let (_, next) = self.swap(trigger).await?;
        Ok(next)
    }

    async fn swap(
        &self,
        trigger: &'static str,
    ) -> Result<(Arc<SigningKeyPair>, Arc<SigningKeyPair>), TokenError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let next = Arc::new(SigningKeyPair::generate(self.algorithm, generation)?);

        let previous = {
            let mut current = self.current.write().await;
            std::mem::replace(&mut *current, Arc::clone(&next))
        };

        metrics::record_key_rotation(trigger);
        debug!(
            generation,
            created_at = %next.created_at(),
            trigger,
            "Rotated signing key pair"
        );
        Ok((previous, next))
    }

    /// Spawn a task that rotates every `interval`, first firing one interval
    /// from now. Must be called from within a tokio runtime; `interval` must be
    /// non-zero.
    pub fn start_rotation(self: &Arc<Self>, interval: Duration) -> RotationTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let ring = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = ring.rotate_for("scheduled").await {
                            error!(error = %e, "Scheduled key rotation failed; keeping current key pair");
                        }
                    }
                }
            }

            debug!("Key rotation task exited");
        });

        info!(interval_secs = interval.as_secs_f64(), "Started key rotation task");
        RotationTask {
            shutdown_tx,
            handle: Some(handle),
        }
    }
}

/// Handle to a running rotation task.
///
/// Dropping the handle aborts the task; [`RotationTask::stop`] shuts it down
/// and waits for it to exit.
pub struct RotationTask {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl RotationTask {
    /// Stop the task. No scheduled rotation fires after this returns.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Key rotation task failed during shutdown");
            }
        }

        info!("Stopped key rotation task");
    }

    /// True once the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for RotationTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
