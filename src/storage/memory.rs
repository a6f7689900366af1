//! In-process record store.

use crate::error::StoreError;
use crate::storage::{RecordStore, VerificationRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// [`RecordStore`] backed by a map of record id to record.
///
/// Records are kept forever unless a retention window is configured with
/// [`MemoryRecordStore::with_retention`], which behaves like a TTL index on
/// `expiresAt`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<HashMap<String, VerificationRecord>>>,
    retention: Option<chrono::Duration>,
}

impl MemoryRecordStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide and allow purging of records once `expiresAt + grace` has passed.
    #[must_use]
    pub fn with_retention(mut self, grace: chrono::Duration) -> Self {
        self.retention = Some(grace);
        self
    }

    fn is_retained(&self, record: &VerificationRecord, now: DateTime<Utc>) -> bool {
        // A window reaching past the representable range keeps the record.
        self.retention.map_or(true, |grace| {
            record
                .expires_at
                .checked_add_signed(grace)
                .map_or(true, |until| until > now)
        })
    }

    /// Remove records outside the retention window. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        if self.retention.is_none() {
            return 0;
        }

        let now = Utc::now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| self.is_retained(record, now));
        let purged = before - records.len();

        if purged > 0 {
            debug!(purged, "Purged expired verification records");
        }
        purged
    }

    /// Number of stored records, including any not yet purged.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_by_subject(
        &self,
        subject: &Value,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let now = Utc::now();
        let records = self.records.read().await;

        Ok(records
            .values()
            .filter(|record| record.subject.as_ref() == Some(subject))
            .filter(|record| self.is_retained(record, now))
            .max_by_key(|record| record.issued_at)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<VerificationRecord>, StoreError> {
        let now = Utc::now();
        let records = self.records.read().await;

        Ok(records
            .get(id)
            .filter(|record| self.is_retained(record, now))
            .cloned())
    }

    async fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn replace(&self, id: &str, record: &VerificationRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        if records.remove(id).is_none() {
            debug!(record_id = %id, "Replace target not found");
            return Ok(());
        }

        records.insert(record.id.clone(), record.clone());
        Ok(())
    }
}
